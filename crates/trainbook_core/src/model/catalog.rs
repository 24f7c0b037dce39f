//! Training catalog model.
//!
//! # Responsibility
//! - Define teacher-owned training types and their actions.
//! - Provide name validation shared by repository and service layers.
//!
//! # Invariants
//! - Type and action names are trimmed and never blank.
//! - Every action belongs to exactly one type.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable training type identifier.
pub type TrainingTypeId = Uuid;
/// Stable training action identifier.
pub type TrainingActionId = Uuid;

/// Catalog entry grouping related actions (e.g. "Squat pattern").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingType {
    pub id: TrainingTypeId,
    pub owner_id: Uuid,
    pub name: String,
    /// Actions ordered by `sort_order ASC`.
    pub actions: Vec<TrainingAction>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl TrainingType {
    /// Finds one action by id.
    pub fn action(&self, id: TrainingActionId) -> Option<&TrainingAction> {
        self.actions.iter().find(|action| action.id == id)
    }
}

/// Concrete exercise inside a training type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingAction {
    pub id: TrainingActionId,
    pub type_id: TrainingTypeId,
    pub name: String,
    pub sort_order: i64,
}

/// Validation failure for catalog names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogValidationError {
    BlankTypeName,
    BlankActionName,
}

impl Display for CatalogValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTypeName => write!(f, "training type name must not be blank"),
            Self::BlankActionName => write!(f, "training action name must not be blank"),
        }
    }
}

impl Error for CatalogValidationError {}

/// Trims a type name and rejects blank input.
pub fn normalize_type_name(value: &str) -> Result<String, CatalogValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogValidationError::BlankTypeName);
    }
    Ok(trimmed.to_string())
}

/// Trims an action name and rejects blank input.
pub fn normalize_action_name(value: &str) -> Result<String, CatalogValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogValidationError::BlankActionName);
    }
    Ok(trimmed.to_string())
}

/// Read-only view over a teacher's catalog used by schedule editing.
pub trait CatalogLookup {
    fn find_type(&self, id: &str) -> Option<&TrainingType>;
}

impl CatalogLookup for [TrainingType] {
    fn find_type(&self, id: &str) -> Option<&TrainingType> {
        let id = Uuid::parse_str(id).ok()?;
        self.iter().find(|item| item.id == id)
    }
}

impl CatalogLookup for Vec<TrainingType> {
    fn find_type(&self, id: &str) -> Option<&TrainingType> {
        self.as_slice().find_type(id)
    }
}
