//! Roster use-case service.
//!
//! # Responsibility
//! - Bind students to the acting teacher by e-mail.
//! - List and remove bound students.
//!
//! # Invariants
//! - Only profiles with `Role::Student` can be bound.
//! - A student is bound to the same teacher at most once.

use super::{ServiceError, ServiceResult};
use crate::access::{require_capability, Capability};
use crate::model::now_epoch_ms;
use crate::model::profile::{is_plausible_email, normalize_email, Profile, Role, UserId};
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::roster_repo::{RosterRepository, RosterStudent};
use log::info;

/// Roster service facade.
pub struct RosterService<R: RosterRepository, P: ProfileRepository> {
    roster: R,
    profiles: P,
}

impl<R: RosterRepository, P: ProfileRepository> RosterService<R, P> {
    pub fn new(roster: R, profiles: P) -> Self {
        Self { roster, profiles }
    }

    /// Binds the student registered under `email` to the actor.
    pub fn bind_student_by_email(
        &self,
        actor: &Profile,
        email: &str,
    ) -> ServiceResult<RosterStudent> {
        require_capability(actor, Capability::ManageRoster)?;
        let email = normalize_email(email);
        if email.is_empty() || !is_plausible_email(&email) {
            return Err(ServiceError::InvalidEmail(email));
        }

        let student = self
            .profiles
            .find_by_email(&email)?
            .ok_or_else(|| ServiceError::StudentNotFound(email.clone()))?;
        if student.role != Role::Student {
            return Err(ServiceError::NotAStudent(email));
        }
        if self.roster.is_bound(actor.id, student.id)? {
            return Err(ServiceError::Conflict(format!(
                "student {email} is already bound"
            )));
        }

        let bound_at = now_epoch_ms();
        self.roster.bind(actor.id, student.id, bound_at)?;
        info!("event=roster_bind module=roster status=ok");
        Ok(RosterStudent {
            profile: student,
            bound_at,
        })
    }

    /// Bound students, oldest binding first.
    pub fn list_students(&self, actor: &Profile) -> ServiceResult<Vec<RosterStudent>> {
        require_capability(actor, Capability::ManageRoster)?;
        Ok(self.roster.list_for_teacher(actor.id)?)
    }

    /// Unbinds one student and drops the pair's plan assignments.
    pub fn remove_student(&self, actor: &Profile, student_id: UserId) -> ServiceResult<()> {
        require_capability(actor, Capability::ManageRoster)?;
        self.roster.unbind(actor.id, student_id)?;
        info!("event=roster_unbind module=roster status=ok");
        Ok(())
    }
}
