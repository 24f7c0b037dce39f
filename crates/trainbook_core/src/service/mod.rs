//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce role capabilities and teacher/student bindings before writes.
//! - Keep UI/FFI layers decoupled from storage details.
//!
//! # Invariants
//! - Every service method takes the acting profile and checks its
//!   capability before touching storage.

use crate::access::AccessError;
use crate::model::catalog::CatalogValidationError;
use crate::model::macro_plan::MacroPlanError;
use crate::model::profile::UserId;
use crate::model::schedule::ScheduleError;
use crate::model::weekly_plan::ProgressError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod account_service;
pub mod admin_service;
pub mod catalog_service;
pub mod plan_service;
pub mod roster_service;
pub mod schedule_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from use-case services.
#[derive(Debug)]
pub enum ServiceError {
    /// Acting role lacks the required capability.
    Forbidden(AccessError),
    /// Teacher is not bound to the student.
    NotBound {
        teacher_id: UserId,
        student_id: UserId,
    },
    /// Target row does not exist or is not visible to the actor.
    NotFound { entity: &'static str, id: String },
    /// Write violates a uniqueness rule.
    Conflict(String),
    /// No profile matches the e-mail.
    StudentNotFound(String),
    /// Profile exists but does not hold the student role.
    NotAStudent(String),
    /// E-mail input is blank or malformed.
    InvalidEmail(String),
    /// Admin roles are fixed.
    AdminRoleLocked(UserId),
    Catalog(CatalogValidationError),
    Schedule(ScheduleError),
    MacroPlan(MacroPlanError),
    Progress(ProgressError),
    /// Stored payload could not be encoded or decoded.
    Payload(serde_json::Error),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden(err) => write!(f, "{err}"),
            Self::NotBound {
                teacher_id,
                student_id,
            } => write!(f, "student {student_id} is not bound to teacher {teacher_id}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::StudentNotFound(email) => write!(f, "no account registered for {email}"),
            Self::NotAStudent(email) => write!(f, "account {email} cannot be bound as a student"),
            Self::InvalidEmail(value) => write!(f, "invalid e-mail `{value}`"),
            Self::AdminRoleLocked(id) => write!(f, "admin role of {id} cannot be changed"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Schedule(err) => write!(f, "{err}"),
            Self::MacroPlan(err) => write!(f, "{err}"),
            Self::Progress(err) => write!(f, "{err}"),
            Self::Payload(err) => write!(f, "invalid stored payload: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Forbidden(err) => Some(err),
            Self::Catalog(err) => Some(err),
            Self::Schedule(err) => Some(err),
            Self::MacroPlan(err) => Some(err),
            Self::Progress(err) => Some(err),
            Self::Payload(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Conflict(message) => Self::Conflict(message),
            RepoError::Validation(err) => Self::Catalog(err),
            other => Self::Repo(other),
        }
    }
}

impl From<AccessError> for ServiceError {
    fn from(value: AccessError) -> Self {
        Self::Forbidden(value)
    }
}

impl From<CatalogValidationError> for ServiceError {
    fn from(value: CatalogValidationError) -> Self {
        Self::Catalog(value)
    }
}

impl From<ScheduleError> for ServiceError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

impl From<MacroPlanError> for ServiceError {
    fn from(value: MacroPlanError) -> Self {
        Self::MacroPlan(value)
    }
}

impl From<ProgressError> for ServiceError {
    fn from(value: ProgressError) -> Self {
        Self::Progress(value)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Payload(value)
    }
}

impl ServiceError {
    /// Stable machine-readable code for bridge envelopes and log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "forbidden",
            Self::NotBound { .. } => "not_bound",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::StudentNotFound(_) => "student_not_found",
            Self::NotAStudent(_) => "not_a_student",
            Self::InvalidEmail(_) => "invalid_email",
            Self::AdminRoleLocked(_) => "admin_role_locked",
            Self::Catalog(_) | Self::Schedule(_) | Self::MacroPlan(_) | Self::Progress(_) => {
                "invalid_input"
            }
            Self::Payload(_) => "invalid_payload",
            Self::Repo(_) => "storage_error",
        }
    }
}
