//! Domain model for catalogs, schedules and weekly plans.
//!
//! # Responsibility
//! - Define the data structures used by core business logic.
//! - Repair persisted JSON payloads into their canonical shapes.
//!
//! # Invariants
//! - Rows are identified by UUIDs; schedule-internal nodes by prefixed ids.
//! - Timestamps are Unix epoch milliseconds.

pub mod catalog;
pub mod macro_plan;
pub mod profile;
pub mod repair;
pub mod schedule;
pub mod weekly_plan;

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
