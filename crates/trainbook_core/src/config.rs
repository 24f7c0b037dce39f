//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Resolve database path, log level and admin e-mail from `TRAINBOOK_*`
//!   variables with defaults.
//!
//! # Invariants
//! - Resolution never fails; unusable values fall back to defaults.
//! - An empty admin e-mail disables automatic admin promotion.

use crate::logging::{default_log_level, normalize_level};
use crate::model::profile::normalize_email;
use log::warn;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "TRAINBOOK_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "TRAINBOOK_LOG_LEVEL";
pub const ADMIN_EMAIL_VAR: &str = "TRAINBOOK_ADMIN_EMAIL";

const DEFAULT_DB_FILE_NAME: &str = "trainbook.sqlite3";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// Normalized; empty when unset.
    pub admin_email: String,
}

impl CoreConfig {
    /// Reads the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_level = match read(LOG_LEVEL_VAR) {
            Some(raw) => normalize_level(&raw).unwrap_or_else(|err| {
                warn!(
                    "event=config_load module=config status=fallback key={} error={}",
                    LOG_LEVEL_VAR, err
                );
                default_log_level()
            }),
            None => default_log_level(),
        };

        let admin_email = read(ADMIN_EMAIL_VAR)
            .map(|raw| normalize_email(&raw))
            .unwrap_or_default();

        Self {
            db_path,
            log_level,
            admin_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ADMIN_EMAIL_VAR, DB_PATH_VAR, LOG_LEVEL_VAR};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn resolve(pairs: &[(&str, &str)]) -> CoreConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        CoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = resolve(&[(DB_PATH_VAR, "  ")]);
        assert_eq!(
            config.db_path,
            std::env::temp_dir().join("trainbook.sqlite3")
        );
        assert_eq!(config.log_level, default_log_level());
        assert!(config.admin_email.is_empty());
    }

    #[test]
    fn explicit_values_are_normalized() {
        let config = resolve(&[
            (DB_PATH_VAR, " /var/lib/trainbook/app.db "),
            (LOG_LEVEL_VAR, "WARNING"),
            (ADMIN_EMAIL_VAR, " Coach@Example.COM "),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/trainbook/app.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.admin_email, "coach@example.com");
    }

    #[test]
    fn unknown_log_level_falls_back_to_default() {
        let config = resolve(&[(LOG_LEVEL_VAR, "chatty")]);
        assert_eq!(config.log_level, default_log_level());
    }
}
