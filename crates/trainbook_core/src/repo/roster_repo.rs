//! Teacher ↔ student roster repository.
//!
//! # Responsibility
//! - Persist which students a teacher coaches.
//! - Remove a pairing together with the assignments it produced.
//!
//! # Invariants
//! - A pair is bound at most once.
//! - Roster listing order is `created_at ASC` (oldest binding first).

use super::{conflict_on_constraint, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::profile::{parse_role, Profile, UserId};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use serde::Serialize;

/// One bound student with their profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterStudent {
    pub profile: Profile,
    /// Unix epoch milliseconds of the binding.
    pub bound_at: i64,
}

/// Repository interface for roster bindings.
pub trait RosterRepository {
    fn bind(&self, teacher_id: UserId, student_id: UserId, created_at: i64) -> RepoResult<()>;
    fn list_for_teacher(&self, teacher_id: UserId) -> RepoResult<Vec<RosterStudent>>;
    fn is_bound(&self, teacher_id: UserId, student_id: UserId) -> RepoResult<bool>;
    /// Deletes the pairing and the pair's plan assignments.
    fn unbind(&self, teacher_id: UserId, student_id: UserId) -> RepoResult<()>;
}

/// SQLite-backed roster repository.
pub struct SqliteRosterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRosterRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["teacher_students", "weekly_plan_assignments"])?;
        Ok(Self { conn })
    }
}

impl RosterRepository for SqliteRosterRepository<'_> {
    fn bind(&self, teacher_id: UserId, student_id: UserId, created_at: i64) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO teacher_students (teacher_id, student_id, created_at)
                 VALUES (?1, ?2, ?3);",
                params![teacher_id.to_string(), student_id.to_string(), created_at],
            )
            .map_err(|err| conflict_on_constraint(err, "student is already bound"))?;
        Ok(())
    }

    fn list_for_teacher(&self, teacher_id: UserId) -> RepoResult<Vec<RosterStudent>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                p.id,
                p.email,
                p.full_name,
                p.role,
                p.created_at,
                p.updated_at,
                ts.created_at AS bound_at
             FROM teacher_students ts
             JOIN profiles p ON p.id = ts.student_id
             WHERE ts.teacher_id = ?1
             ORDER BY ts.created_at ASC, ts.rowid ASC;",
        )?;
        let mut rows = stmt.query([teacher_id.to_string()])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get("id")?;
            let role_text: String = row.get("role")?;
            let role = parse_role(&role_text).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid role `{role_text}` in profiles.role"))
            })?;
            students.push(RosterStudent {
                profile: Profile {
                    id: parse_uuid(&id, "profiles.id")?,
                    email: row.get("email")?,
                    full_name: row.get("full_name")?,
                    role,
                    created_at: row.get("created_at")?,
                    updated_at: row.get("updated_at")?,
                },
                bound_at: row.get("bound_at")?,
            });
        }
        Ok(students)
    }

    fn is_bound(&self, teacher_id: UserId, student_id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM teacher_students
                WHERE teacher_id = ?1 AND student_id = ?2
            );",
            params![teacher_id.to_string(), student_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn unbind(&self, teacher_id: UserId, student_id: UserId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "DELETE FROM teacher_students WHERE teacher_id = ?1 AND student_id = ?2;",
            params![teacher_id.to_string(), student_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("roster binding", student_id));
        }
        tx.execute(
            "DELETE FROM weekly_plan_assignments WHERE teacher_id = ?1 AND student_id = ?2;",
            params![teacher_id.to_string(), student_id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }
}
