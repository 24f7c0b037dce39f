//! Weekly plan, assignment and progress repository.
//!
//! # Responsibility
//! - Persist published plan snapshots and their assignments.
//! - Store one progress record per assignment.
//!
//! # Invariants
//! - Plans are insert-only; snapshots never change.
//! - The latest assignment of a student is ordered by
//!   `created_at DESC, rowid DESC`.
//! - Progress is upserted on `assignment_id`.
//! - `atomically` spans every repository sharing the connection.

use super::{conflict_on_constraint, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::profile::UserId;
use crate::model::weekly_plan::{
    AssignmentStatus, PlanAssignment, WeeklyPlan, WeeklyProgress, WeeklySnapshot,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

const ASSIGNMENT_SELECT_SQL: &str = "SELECT
    id,
    plan_id,
    teacher_id,
    student_id,
    status,
    created_at
FROM weekly_plan_assignments";

/// Repository interface for weekly plans.
pub trait PlanRepository {
    fn insert_plan(&self, plan: &WeeklyPlan) -> RepoResult<()>;
    fn get_plan(&self, plan_id: Uuid) -> RepoResult<Option<WeeklyPlan>>;
    fn insert_assignment(&self, assignment: &PlanAssignment) -> RepoResult<()>;
    fn get_assignment(&self, assignment_id: Uuid) -> RepoResult<Option<PlanAssignment>>;
    fn latest_assignment_for_student(
        &self,
        student_id: UserId,
    ) -> RepoResult<Option<PlanAssignment>>;
    /// Assignments created by one teacher, newest first.
    fn list_assignments_for_teacher(
        &self,
        teacher_id: UserId,
    ) -> RepoResult<Vec<PlanAssignment>>;
    fn set_assignment_status(
        &self,
        assignment_id: Uuid,
        status: AssignmentStatus,
    ) -> RepoResult<()>;
    fn get_progress(&self, assignment_id: Uuid) -> RepoResult<Option<WeeklyProgress>>;
    /// Inserts or replaces the progress of `progress.assignment_id`.
    ///
    /// The id of an existing row is kept.
    fn upsert_progress(&self, progress: &WeeklyProgress) -> RepoResult<()>;
    /// Runs `work` as one write unit; an `Err` rolls back every write made
    /// inside it, including writes of repositories on the same connection.
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>;
}

/// SQLite-backed plan repository.
pub struct SqlitePlanRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePlanRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["weekly_plans", "weekly_plan_assignments", "weekly_progress"],
        )?;
        Ok(Self { conn })
    }
}

impl PlanRepository for SqlitePlanRepository<'_> {
    fn insert_plan(&self, plan: &WeeklyPlan) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO weekly_plans (
                    id,
                    teacher_id,
                    student_id,
                    week_number,
                    published_at,
                    schedule_snapshot
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    plan.id.to_string(),
                    plan.teacher_id.to_string(),
                    plan.student_id.to_string(),
                    plan.week_number,
                    plan.published_at,
                    to_json_text(&plan.snapshot, "weekly_plans.schedule_snapshot")?,
                ],
            )
            .map_err(|err| {
                conflict_on_constraint(err, format!("plan {} already exists", plan.id))
            })?;
        Ok(())
    }

    fn get_plan(&self, plan_id: Uuid) -> RepoResult<Option<WeeklyPlan>> {
        let row = self
            .conn
            .query_row(
                "SELECT teacher_id, student_id, week_number, published_at, schedule_snapshot
                 FROM weekly_plans
                 WHERE id = ?1;",
                [plan_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;
        let Some((teacher_id, student_id, week_number, published_at, snapshot)) = row else {
            return Ok(None);
        };
        Ok(Some(WeeklyPlan {
            id: plan_id,
            teacher_id: parse_uuid(&teacher_id, "weekly_plans.teacher_id")?,
            student_id: parse_uuid(&student_id, "weekly_plans.student_id")?,
            week_number,
            published_at,
            snapshot: from_json_text::<WeeklySnapshot>(
                &snapshot,
                "weekly_plans.schedule_snapshot",
            )?,
        }))
    }

    fn insert_assignment(&self, assignment: &PlanAssignment) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO weekly_plan_assignments (
                id,
                plan_id,
                teacher_id,
                student_id,
                status,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                assignment.id.to_string(),
                assignment.plan_id.to_string(),
                assignment.teacher_id.to_string(),
                assignment.student_id.to_string(),
                assignment.status.as_str(),
                assignment.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_assignment(&self, assignment_id: Uuid) -> RepoResult<Option<PlanAssignment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ASSIGNMENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([assignment_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_assignment_row(row)?)),
            None => Ok(None),
        }
    }

    fn latest_assignment_for_student(
        &self,
        student_id: UserId,
    ) -> RepoResult<Option<PlanAssignment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ASSIGNMENT_SELECT_SQL}
             WHERE student_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([student_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_assignment_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_assignments_for_teacher(
        &self,
        teacher_id: UserId,
    ) -> RepoResult<Vec<PlanAssignment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ASSIGNMENT_SELECT_SQL}
             WHERE teacher_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([teacher_id.to_string()])?;
        let mut assignments = Vec::new();
        while let Some(row) = rows.next()? {
            assignments.push(parse_assignment_row(row)?);
        }
        Ok(assignments)
    }

    fn set_assignment_status(
        &self,
        assignment_id: Uuid,
        status: AssignmentStatus,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE weekly_plan_assignments SET status = ?2 WHERE id = ?1;",
            params![assignment_id.to_string(), status.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("assignment", assignment_id));
        }
        Ok(())
    }

    fn get_progress(&self, assignment_id: Uuid) -> RepoResult<Option<WeeklyProgress>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, student_id, content, updated_at
                 FROM weekly_progress
                 WHERE assignment_id = ?1;",
                [assignment_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, student_id, content, updated_at)) = row else {
            return Ok(None);
        };
        Ok(Some(WeeklyProgress {
            id: parse_uuid(&id, "weekly_progress.id")?,
            assignment_id,
            student_id: parse_uuid(&student_id, "weekly_progress.student_id")?,
            content: from_json_text(&content, "weekly_progress.content")?,
            updated_at,
        }))
    }

    fn upsert_progress(&self, progress: &WeeklyProgress) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO weekly_progress (id, assignment_id, student_id, content, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(assignment_id) DO UPDATE SET
                student_id = excluded.student_id,
                content = excluded.content,
                updated_at = excluded.updated_at;",
            params![
                progress.id.to_string(),
                progress.assignment_id.to_string(),
                progress.student_id.to_string(),
                to_json_text(&progress.content, "weekly_progress.content")?,
                progress.updated_at,
            ],
        )?;
        Ok(())
    }

    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let output = work()?;
        tx.commit().map_err(RepoError::from)?;
        Ok(output)
    }
}

fn parse_assignment_row(row: &Row<'_>) -> RepoResult<PlanAssignment> {
    let id: String = row.get("id")?;
    let plan_id: String = row.get("plan_id")?;
    let teacher_id: String = row.get("teacher_id")?;
    let student_id: String = row.get("student_id")?;
    let status_text: String = row.get("status")?;
    let status = AssignmentStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in weekly_plan_assignments.status"
        ))
    })?;

    Ok(PlanAssignment {
        id: parse_uuid(&id, "weekly_plan_assignments.id")?,
        plan_id: parse_uuid(&plan_id, "weekly_plan_assignments.plan_id")?,
        teacher_id: parse_uuid(&teacher_id, "weekly_plan_assignments.teacher_id")?,
        student_id: parse_uuid(&student_id, "weekly_plan_assignments.student_id")?,
        status,
        created_at: row.get("created_at")?,
    })
}

fn to_json_text<T: Serialize + ?Sized>(value: &T, column: &'static str) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode {column}: {err}")))
}

fn from_json_text<T: DeserializeOwned>(text: &str, column: &'static str) -> RepoResult<T> {
    serde_json::from_str(text)
        .map_err(|err| RepoError::InvalidData(format!("invalid json in {column}: {err}")))
}
