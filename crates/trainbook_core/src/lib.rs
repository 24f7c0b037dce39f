//! Core domain logic for Trainbook.
//! Roles, catalog, schedules, macro plans and weekly plans live here;
//! the FFI and CLI crates are thin shells around this crate.

pub mod access;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::{require_capability, resolve_access, Access, AccessError, Capability};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::catalog::{TrainingAction, TrainingType};
pub use model::profile::{AuthUser, Page, Profile, Role, UserId};
pub use model::schedule::{Schedule, ScheduleError};
pub use model::weekly_plan::{DayProgress, WeeklyPlan, WeeklyProgress, WeeklySnapshot};
pub use repo::{RepoError, RepoResult};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
