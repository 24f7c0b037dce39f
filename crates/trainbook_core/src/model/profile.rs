//! Account roles, profiles and page routing.
//!
//! # Responsibility
//! - Define the role enum that gates every page and mutation.
//! - Carry the authenticated identity handed in by the auth collaborator.
//! - Map roles to their landing pages.
//!
//! # Invariants
//! - A profile always has exactly one role.
//! - Role strings are stable: `teacher|student|admin`.
//! - Profile e-mails are stored lowercase.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Stable identifier of an account (shared by auth identity and profile).
pub type UserId = Uuid;

/// Role attached to every profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Builds catalogs and schedules, publishes weekly plans.
    Teacher,
    /// Receives weekly plans and logs completion.
    Student,
    /// Manages account roles.
    Admin,
}

impl Role {
    /// Stable storage/wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }
}

/// Parses one role from its stable string form.
pub fn parse_role(value: &str) -> Option<Role> {
    match value.trim() {
        "teacher" => Some(Role::Teacher),
        "student" => Some(Role::Student),
        "admin" => Some(Role::Admin),
        _ => None,
    }
}

/// Persisted account profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    /// Lowercase e-mail; `None` when the identity provider had none.
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Profile {
    /// Human-readable label: full name, then e-mail, then a placeholder.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or("Unnamed")
    }
}

/// Authenticated identity supplied by the auth collaborator.
///
/// Credentials and tokens never reach core; only the verified identity and
/// its sign-up metadata do.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// Role previously mirrored into identity metadata.
    pub metadata_role: Option<Role>,
    /// Role chosen on the sign-up form.
    pub requested_role: Option<Role>,
}

impl AuthUser {
    /// Creates an identity without metadata.
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: Some(email.into()),
            ..Self::default()
        }
    }

    /// Metadata role preference: mirrored role first, then requested role.
    pub fn preferred_role(&self) -> Option<Role> {
        self.metadata_role.or(self.requested_role)
    }
}

/// Application page a session lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Login,
    TeacherHome,
    StudentHome,
    AdminHome,
}

impl Page {
    /// Landing page for one role.
    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Teacher => Self::TeacherHome,
            Role::Student => Self::StudentHome,
            Role::Admin => Self::AdminHome,
        }
    }

    /// Landing page after login; a missing profile lands on the student page.
    pub fn landing_for(profile: Option<&Profile>) -> Self {
        profile.map_or(Self::StudentHome, |profile| Self::home_for(profile.role))
    }

    /// Stable route path.
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "login.html",
            Self::TeacherHome => "index.html",
            Self::StudentHome => "student.html",
            Self::AdminHome => "admin.html",
        }
    }
}

/// Trims and lowercases an e-mail address.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Loose shape check: one `@`, no whitespace, a dotted domain.
pub fn is_plausible_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::{is_plausible_email, normalize_email, parse_role, Page, Profile, Role};
    use uuid::Uuid;

    #[test]
    fn role_strings_are_stable() {
        for role in [Role::Teacher, Role::Student, Role::Admin] {
            assert_eq!(parse_role(role.as_str()), Some(role));
        }
        assert_eq!(parse_role("Teacher"), None);
        assert_eq!(parse_role(""), None);
    }

    #[test]
    fn pages_route_by_role() {
        assert_eq!(Page::home_for(Role::Teacher).path(), "index.html");
        assert_eq!(Page::home_for(Role::Student).path(), "student.html");
        assert_eq!(Page::home_for(Role::Admin).path(), "admin.html");
        assert_eq!(Page::landing_for(None), Page::StudentHome);
    }

    #[test]
    fn email_helpers_normalize_and_check_shape() {
        assert_eq!(normalize_email("  Coach@Example.COM "), "coach@example.com");
        assert!(is_plausible_email("coach@example.com"));
        assert!(!is_plausible_email("coach@example"));
        assert!(!is_plausible_email("co ach@example.com"));
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let mut profile = Profile {
            id: Uuid::new_v4(),
            email: Some("a@b.io".to_string()),
            full_name: Some("  ".to_string()),
            role: Role::Student,
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(profile.display_name(), "a@b.io");
        profile.full_name = Some("Ann".to_string());
        assert_eq!(profile.display_name(), "Ann");
        profile.full_name = None;
        profile.email = None;
        assert_eq!(profile.display_name(), "Unnamed");
    }
}
