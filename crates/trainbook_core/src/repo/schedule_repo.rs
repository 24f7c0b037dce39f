//! Schedule payload repository.
//!
//! # Responsibility
//! - Store one JSON schedule payload per teacher/student pair.
//!
//! # Invariants
//! - Loads return the raw persisted JSON; repair happens above this layer.
//! - Text that is not JSON is reported as `InvalidData`, never replaced.
//! - Saves are upserts; the last write wins.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::profile::UserId;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// Repository interface for schedule payloads.
pub trait ScheduleRepository {
    fn load_schedule(&self, teacher_id: UserId, student_id: UserId) -> RepoResult<Option<Value>>;
    fn save_schedule(
        &self,
        teacher_id: UserId,
        student_id: UserId,
        payload: &Value,
        updated_at: i64,
    ) -> RepoResult<()>;
}

/// SQLite-backed schedule repository.
pub struct SqliteScheduleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScheduleRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["schedules"])?;
        Ok(Self { conn })
    }
}

impl ScheduleRepository for SqliteScheduleRepository<'_> {
    fn load_schedule(&self, teacher_id: UserId, student_id: UserId) -> RepoResult<Option<Value>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM schedules WHERE teacher_id = ?1 AND student_id = ?2;",
                params![teacher_id.to_string(), student_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(text) = payload else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(
                    "event=schedule_load module=repo status=invalid_payload line={} column={}",
                    err.line(),
                    err.column()
                );
                Err(RepoError::InvalidData(format!("schedules.payload: {err}")))
            }
        }
    }

    fn save_schedule(
        &self,
        teacher_id: UserId,
        student_id: UserId,
        payload: &Value,
        updated_at: i64,
    ) -> RepoResult<()> {
        let text = serde_json::to_string(payload)
            .map_err(|err| RepoError::InvalidData(format!("schedule payload: {err}")))?;
        self.conn.execute(
            "INSERT INTO schedules (teacher_id, student_id, payload, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(teacher_id, student_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![teacher_id.to_string(), student_id.to_string(), text, updated_at],
        )?;
        Ok(())
    }
}
