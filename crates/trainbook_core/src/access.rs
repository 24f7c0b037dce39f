//! Role-based capability gate and page access resolution.
//!
//! # Responsibility
//! - Declare which role may perform which kind of mutation or read.
//! - Resolve whether a session may open a page, or where it is redirected.
//!
//! # Invariants
//! - Capabilities are granted by role only; there are no per-user grants.
//! - A missing session always redirects to the login page.

use crate::model::profile::{Page, Profile, Role};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Guarded operation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    ManageCatalog,
    ManageRoster,
    EditSchedule,
    PublishPlan,
    ViewOwnPlan,
    SubmitProgress,
    ManageRoles,
}

impl Capability {
    /// Stable id used in log events and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageCatalog => "manage_catalog",
            Self::ManageRoster => "manage_roster",
            Self::EditSchedule => "edit_schedule",
            Self::PublishPlan => "publish_plan",
            Self::ViewOwnPlan => "view_own_plan",
            Self::SubmitProgress => "submit_progress",
            Self::ManageRoles => "manage_roles",
        }
    }
}

impl Role {
    /// Returns whether this role holds one capability.
    pub fn allows(self, capability: Capability) -> bool {
        match self {
            Self::Teacher => matches!(
                capability,
                Capability::ManageCatalog
                    | Capability::ManageRoster
                    | Capability::EditSchedule
                    | Capability::PublishPlan
            ),
            Self::Student => matches!(
                capability,
                Capability::ViewOwnPlan | Capability::SubmitProgress
            ),
            Self::Admin => matches!(capability, Capability::ManageRoles),
        }
    }
}

/// Capability check failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessError {
    pub role: Role,
    pub capability: Capability,
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "role `{}` lacks capability `{}`",
            self.role.as_str(),
            self.capability.as_str()
        )
    }
}

impl Error for AccessError {}

/// Fails unless the profile's role holds `capability`.
pub fn require_capability(profile: &Profile, capability: Capability) -> Result<(), AccessError> {
    if profile.role.allows(capability) {
        return Ok(());
    }
    Err(AccessError {
        role: profile.role,
        capability,
    })
}

/// Outcome of a page guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(Page),
}

/// Page guard: no session goes to login, a disallowed role to its own home.
pub fn resolve_access(profile: Option<&Profile>, allowed: &[Role]) -> Access {
    match profile {
        None => Access::Redirect(Page::Login),
        Some(profile) if allowed.contains(&profile.role) => Access::Granted,
        Some(profile) => Access::Redirect(Page::home_for(profile.role)),
    }
}

#[cfg(test)]
mod tests {
    use super::{require_capability, resolve_access, Access, AccessError, Capability};
    use crate::model::profile::{Page, Profile, Role};
    use uuid::Uuid;

    fn profile(role: Role) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: None,
            full_name: None,
            role,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn capabilities_follow_role_matrix() {
        assert!(Role::Teacher.allows(Capability::EditSchedule));
        assert!(Role::Teacher.allows(Capability::PublishPlan));
        assert!(!Role::Teacher.allows(Capability::SubmitProgress));
        assert!(Role::Student.allows(Capability::SubmitProgress));
        assert!(!Role::Student.allows(Capability::ManageCatalog));
        assert!(Role::Admin.allows(Capability::ManageRoles));
        assert!(!Role::Admin.allows(Capability::EditSchedule));
    }

    #[test]
    fn require_capability_reports_role_and_capability() {
        let student = profile(Role::Student);
        let err = require_capability(&student, Capability::PublishPlan)
            .expect_err("student must not publish");
        assert_eq!(
            err,
            AccessError {
                role: Role::Student,
                capability: Capability::PublishPlan
            }
        );
        assert_eq!(err.to_string(), "role `student` lacks capability `publish_plan`");
        assert!(require_capability(&student, Capability::ViewOwnPlan).is_ok());
    }

    #[test]
    fn resolve_access_redirects_by_role() {
        assert_eq!(
            resolve_access(None, &[Role::Teacher]),
            Access::Redirect(Page::Login)
        );
        let teacher = profile(Role::Teacher);
        assert_eq!(resolve_access(Some(&teacher), &[Role::Teacher]), Access::Granted);
        assert_eq!(
            resolve_access(Some(&teacher), &[Role::Student]),
            Access::Redirect(Page::TeacherHome)
        );
        let admin = profile(Role::Admin);
        assert_eq!(
            resolve_access(Some(&admin), &[Role::Teacher, Role::Student]),
            Access::Redirect(Page::AdminHome)
        );
    }
}
