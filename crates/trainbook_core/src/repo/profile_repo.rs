//! Profile repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist one profile row per authenticated account.
//! - Serve role-filtered account listings for administration.
//!
//! # Invariants
//! - `upsert_profile` is keyed by id; the newest write wins.
//! - E-mails are unique across profiles when present.

use super::{conflict_on_constraint, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::profile::{parse_role, Profile, Role, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    email,
    full_name,
    role,
    created_at,
    updated_at
FROM profiles";

/// Repository interface for account profiles.
pub trait ProfileRepository {
    fn get_profile(&self, id: UserId) -> RepoResult<Option<Profile>>;
    /// Looks up by normalized (lowercase) e-mail.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Profile>>;
    /// Inserts or replaces by id; `created_at` of an existing row is kept.
    fn upsert_profile(&self, profile: &Profile) -> RepoResult<()>;
    fn set_role(&self, id: UserId, role: Role, updated_at: i64) -> RepoResult<()>;
    /// Profiles with one role, newest first.
    fn list_by_role(&self, role: Role) -> RepoResult<Vec<Profile>>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["profiles"])?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn get_profile(&self, id: UserId) -> RepoResult<Option<Profile>> {
        self.conn
            .query_row(
                &format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                read_profile_row,
            )
            .optional()?
            .map(ProfileRow::into_profile)
            .transpose()
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Profile>> {
        self.conn
            .query_row(
                &format!("{PROFILE_SELECT_SQL} WHERE email = ?1;"),
                [email],
                read_profile_row,
            )
            .optional()?
            .map(ProfileRow::into_profile)
            .transpose()
    }

    fn upsert_profile(&self, profile: &Profile) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO profiles (id, email, full_name, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    email = excluded.email,
                    full_name = excluded.full_name,
                    role = excluded.role,
                    updated_at = excluded.updated_at;",
                params![
                    profile.id.to_string(),
                    profile.email.as_deref(),
                    profile.full_name.as_deref(),
                    profile.role.as_str(),
                    profile.created_at,
                    profile.updated_at,
                ],
            )
            .map_err(|err| {
                conflict_on_constraint(err, "e-mail already belongs to another profile")
            })?;
        Ok(())
    }

    fn set_role(&self, id: UserId, role: Role, updated_at: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE profiles SET role = ?2, updated_at = ?3 WHERE id = ?1;",
            params![id.to_string(), role.as_str(), updated_at],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("profile", id));
        }
        Ok(())
    }

    fn list_by_role(&self, role: Role) -> RepoResult<Vec<Profile>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROFILE_SELECT_SQL}
             WHERE role = ?1
             ORDER BY created_at DESC, id ASC;"
        ))?;
        let rows = stmt.query_map([role.as_str()], read_profile_row)?;
        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?.into_profile()?);
        }
        Ok(profiles)
    }
}

/// Raw column values before id/role parsing.
struct ProfileRow {
    id: String,
    email: Option<String>,
    full_name: Option<String>,
    role: String,
    created_at: i64,
    updated_at: i64,
}

impl ProfileRow {
    fn into_profile(self) -> RepoResult<Profile> {
        let role = parse_role(&self.role).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid role `{}` in profiles.role", self.role))
        })?;
        Ok(Profile {
            id: parse_uuid(&self.id, "profiles.id")?,
            email: self.email,
            full_name: self.full_name,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn read_profile_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get("id")?,
        email: row.get("email")?,
        full_name: row.get("full_name")?,
        role: row.get("role")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
