//! Admin use-case service.
//!
//! # Responsibility
//! - List accounts by role.
//! - Promote students to teachers and demote teachers to students.
//!
//! # Invariants
//! - Only `Capability::ManageRoles` holders reach storage.
//! - Admin profiles keep their role.

use super::{ServiceError, ServiceResult};
use crate::access::{require_capability, Capability};
use crate::model::now_epoch_ms;
use crate::model::profile::{Profile, Role, UserId};
use crate::repo::profile_repo::ProfileRepository;
use log::info;

/// Admin service facade.
pub struct AdminService<P: ProfileRepository> {
    profiles: P,
}

impl<P: ProfileRepository> AdminService<P> {
    pub fn new(profiles: P) -> Self {
        Self { profiles }
    }

    /// Profiles holding `role`, newest first.
    pub fn list_users(&self, actor: &Profile, role: Role) -> ServiceResult<Vec<Profile>> {
        require_capability(actor, Capability::ManageRoles)?;
        Ok(self.profiles.list_by_role(role)?)
    }

    pub fn promote_to_teacher(&self, actor: &Profile, user_id: UserId) -> ServiceResult<Profile> {
        self.change_role(actor, user_id, Role::Teacher)
    }

    pub fn demote_to_student(&self, actor: &Profile, user_id: UserId) -> ServiceResult<Profile> {
        self.change_role(actor, user_id, Role::Student)
    }

    fn change_role(&self, actor: &Profile, user_id: UserId, role: Role) -> ServiceResult<Profile> {
        require_capability(actor, Capability::ManageRoles)?;
        let mut target = self
            .profiles
            .get_profile(user_id)?
            .ok_or_else(|| ServiceError::NotFound {
                entity: "profile",
                id: user_id.to_string(),
            })?;
        if target.role == Role::Admin {
            return Err(ServiceError::AdminRoleLocked(user_id));
        }
        if target.role == role {
            return Ok(target);
        }

        let updated_at = now_epoch_ms();
        self.profiles.set_role(user_id, role, updated_at)?;
        info!(
            "event=role_change module=admin status=ok from={} to={}",
            target.role.as_str(),
            role.as_str()
        );
        target.role = role;
        target.updated_at = updated_at;
        Ok(target)
    }
}
