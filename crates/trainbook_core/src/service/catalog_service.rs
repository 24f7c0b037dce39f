//! Training catalog use-case service.
//!
//! # Responsibility
//! - Expose type and action CRUD for the acting teacher.
//!
//! # Invariants
//! - Only `Capability::ManageCatalog` holders reach storage.
//! - Every operation is scoped to the actor's own catalog.

use super::ServiceResult;
use crate::access::{require_capability, Capability};
use crate::model::catalog::{TrainingAction, TrainingActionId, TrainingType, TrainingTypeId};
use crate::model::now_epoch_ms;
use crate::model::profile::Profile;
use crate::repo::catalog_repo::CatalogRepository;
use log::info;

/// Catalog service facade.
pub struct CatalogService<C: CatalogRepository> {
    catalog: C,
}

impl<C: CatalogRepository> CatalogService<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn list_types(&self, actor: &Profile) -> ServiceResult<Vec<TrainingType>> {
        require_capability(actor, Capability::ManageCatalog)?;
        Ok(self.catalog.list_types(actor.id)?)
    }

    /// Creates one type; names are trimmed and must be unique per teacher.
    pub fn create_type(&self, actor: &Profile, name: &str) -> ServiceResult<TrainingType> {
        require_capability(actor, Capability::ManageCatalog)?;
        let kind = self.catalog.create_type(actor.id, name, now_epoch_ms())?;
        info!("event=catalog_type_create module=catalog status=ok");
        Ok(kind)
    }

    pub fn rename_type(
        &self,
        actor: &Profile,
        type_id: TrainingTypeId,
        name: &str,
    ) -> ServiceResult<()> {
        require_capability(actor, Capability::ManageCatalog)?;
        Ok(self.catalog.rename_type(actor.id, type_id, name)?)
    }

    /// Deletes one type with all of its actions.
    pub fn delete_type(&self, actor: &Profile, type_id: TrainingTypeId) -> ServiceResult<()> {
        require_capability(actor, Capability::ManageCatalog)?;
        self.catalog.delete_type(actor.id, type_id)?;
        info!("event=catalog_type_delete module=catalog status=ok");
        Ok(())
    }

    pub fn add_action(
        &self,
        actor: &Profile,
        type_id: TrainingTypeId,
        name: &str,
    ) -> ServiceResult<TrainingAction> {
        require_capability(actor, Capability::ManageCatalog)?;
        Ok(self.catalog.add_action(actor.id, type_id, name)?)
    }

    pub fn rename_action(
        &self,
        actor: &Profile,
        action_id: TrainingActionId,
        name: &str,
    ) -> ServiceResult<()> {
        require_capability(actor, Capability::ManageCatalog)?;
        Ok(self.catalog.rename_action(actor.id, action_id, name)?)
    }

    pub fn delete_action(&self, actor: &Profile, action_id: TrainingActionId) -> ServiceResult<()> {
        require_capability(actor, Capability::ManageCatalog)?;
        Ok(self.catalog.delete_action(actor.id, action_id)?)
    }
}
