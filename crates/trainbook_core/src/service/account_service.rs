//! Account use-case service.
//!
//! # Responsibility
//! - Validate sign-up form input before it reaches the auth collaborator.
//! - Resolve and persist the profile of an authenticated identity.
//! - Guard pages by role and compute post-login landing pages.
//!
//! # Invariants
//! - An existing profile role is never overwritten by identity metadata.
//! - A refresh without identity e-mail or name keeps the stored values.
//! - The configured admin e-mail always resolves to `Role::Admin`.
//! - Sign-up never requests the admin role.

use super::ServiceResult;
use crate::access::{resolve_access, Access};
use crate::model::now_epoch_ms;
use crate::model::profile::{is_plausible_email, normalize_email, AuthUser, Page, Profile, Role};
use crate::repo::profile_repo::ProfileRepository;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw sign-up form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Role picker value; anything but `teacher` requests a student account.
    pub role: String,
}

/// Validated sign-up handed to the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpTicket {
    pub email: String,
    pub requested_role: Role,
}

/// Sign-up form validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpError {
    MissingCredentials,
    InvalidEmail(String),
    PasswordMismatch,
}

impl Display for SignUpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "e-mail and password are required"),
            Self::InvalidEmail(value) => write!(f, "invalid e-mail `{value}`"),
            Self::PasswordMismatch => write!(f, "passwords do not match"),
        }
    }
}

impl Error for SignUpError {}

/// Validates sign-up input; the e-mail is normalized.
pub fn validate_sign_up(request: &SignUpRequest) -> Result<SignUpTicket, SignUpError> {
    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(SignUpError::MissingCredentials);
    }
    if !is_plausible_email(&email) {
        return Err(SignUpError::InvalidEmail(email));
    }
    if request.password != request.confirm_password {
        return Err(SignUpError::PasswordMismatch);
    }
    let requested_role = if request.role.trim() == Role::Teacher.as_str() {
        Role::Teacher
    } else {
        Role::Student
    };
    Ok(SignUpTicket {
        email,
        requested_role,
    })
}

/// Resolved profile plus the role to mirror into identity metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileResolution {
    pub profile: Profile,
    /// `Some` when identity metadata disagrees with the resolved role.
    pub mirror_role: Option<Role>,
}

/// Result of a page guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAccess {
    pub access: Access,
    /// Resolved profile of the session, when signed in.
    pub profile: Option<Profile>,
}

/// Account service facade.
pub struct AccountService<P: ProfileRepository> {
    profiles: P,
    admin_email: String,
}

impl<P: ProfileRepository> AccountService<P> {
    /// Creates the service; `admin_email` is compared case-insensitively.
    pub fn new(profiles: P, admin_email: impl AsRef<str>) -> Self {
        Self {
            profiles,
            admin_email: normalize_email(admin_email.as_ref()),
        }
    }

    /// Reads the stored profile without creating one.
    pub fn get_profile(&self, user: &AuthUser) -> ServiceResult<Option<Profile>> {
        Ok(self.profiles.get_profile(user.id)?)
    }

    /// Creates or refreshes the profile row of an authenticated identity.
    ///
    /// Role precedence: stored role, metadata role, requested role, student.
    pub fn resolve_profile(&self, user: &AuthUser) -> ServiceResult<ProfileResolution> {
        let existing = self.profiles.get_profile(user.id)?;
        let email = user
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|email| !email.is_empty())
            .or_else(|| existing.as_ref().and_then(|p| p.email.clone()));

        let mut role = existing
            .as_ref()
            .map(|profile| profile.role)
            .or_else(|| user.preferred_role())
            .unwrap_or(Role::Student);
        if !self.admin_email.is_empty() && email.as_deref() == Some(self.admin_email.as_str()) {
            role = Role::Admin;
        }

        let now = now_epoch_ms();
        let profile = Profile {
            id: user.id,
            email,
            full_name: user
                .full_name
                .clone()
                .or_else(|| existing.as_ref().and_then(|p| p.full_name.clone())),
            role,
            created_at: existing.as_ref().map_or(now, |profile| profile.created_at),
            updated_at: now,
        };
        self.profiles.upsert_profile(&profile)?;

        info!(
            "event=profile_resolve module=account status=ok created={} role={}",
            existing.is_none(),
            role.as_str()
        );
        let mirror_role = (user.preferred_role() != Some(role)).then_some(role);
        Ok(ProfileResolution {
            profile,
            mirror_role,
        })
    }

    /// Page guard: resolves the session profile and checks allowed roles.
    ///
    /// A signed-in identity without a profile gets one created first.
    pub fn require_role(
        &self,
        user: Option<&AuthUser>,
        allowed: &[Role],
    ) -> ServiceResult<SessionAccess> {
        let Some(user) = user else {
            return Ok(SessionAccess {
                access: resolve_access(None, allowed),
                profile: None,
            });
        };
        let profile = match self.profiles.get_profile(user.id)? {
            Some(profile) => profile,
            None => self.resolve_profile(user)?.profile,
        };
        Ok(SessionAccess {
            access: resolve_access(Some(&profile), allowed),
            profile: Some(profile),
        })
    }

    /// Post-login landing page; identities without a profile land on the
    /// student page.
    pub fn landing_page(&self, user: &AuthUser) -> ServiceResult<Page> {
        let profile = self.profiles.get_profile(user.id)?;
        Ok(Page::landing_for(profile.as_ref()))
    }
}
