//! Training catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist teacher-owned training types and their ordered actions.
//! - Scope every read and write to the owning teacher.
//!
//! # Invariants
//! - Names are normalized before SQL mutations.
//! - Type names are unique per owner; action names are not.
//! - Deleting a type removes its actions.
//! - Action listing order is `sort_order ASC, rowid ASC`.

use super::{conflict_on_constraint, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::catalog::{
    normalize_action_name, normalize_type_name, TrainingAction, TrainingActionId, TrainingType,
    TrainingTypeId,
};
use crate::model::profile::UserId;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::HashMap;
use uuid::Uuid;

/// Repository interface for the training catalog.
pub trait CatalogRepository {
    fn create_type(
        &self,
        owner_id: UserId,
        name: &str,
        created_at: i64,
    ) -> RepoResult<TrainingType>;
    fn rename_type(
        &self,
        owner_id: UserId,
        type_id: TrainingTypeId,
        name: &str,
    ) -> RepoResult<()>;
    fn delete_type(&self, owner_id: UserId, type_id: TrainingTypeId) -> RepoResult<()>;
    /// Types with actions, oldest type first.
    fn list_types(&self, owner_id: UserId) -> RepoResult<Vec<TrainingType>>;
    /// Appends one action at the end of the type's action list.
    fn add_action(
        &self,
        owner_id: UserId,
        type_id: TrainingTypeId,
        name: &str,
    ) -> RepoResult<TrainingAction>;
    fn rename_action(
        &self,
        owner_id: UserId,
        action_id: TrainingActionId,
        name: &str,
    ) -> RepoResult<()>;
    fn delete_action(&self, owner_id: UserId, action_id: TrainingActionId) -> RepoResult<()>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["training_types", "training_actions"])?;
        Ok(Self { conn })
    }

    fn load_actions(
        &self,
        type_ids: &[TrainingTypeId],
    ) -> RepoResult<HashMap<TrainingTypeId, Vec<TrainingAction>>> {
        let mut grouped: HashMap<TrainingTypeId, Vec<TrainingAction>> = HashMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT id, type_id, name, sort_order
             FROM training_actions
             WHERE type_id = ?1
             ORDER BY sort_order ASC, rowid ASC;",
        )?;
        for type_id in type_ids {
            let mut rows = stmt.query([type_id.to_string()])?;
            while let Some(row) = rows.next()? {
                let id: String = row.get(0)?;
                grouped.entry(*type_id).or_default().push(TrainingAction {
                    id: parse_uuid(&id, "training_actions.id")?,
                    type_id: *type_id,
                    name: row.get(2)?,
                    sort_order: row.get(3)?,
                });
            }
        }
        Ok(grouped)
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_type(
        &self,
        owner_id: UserId,
        name: &str,
        created_at: i64,
    ) -> RepoResult<TrainingType> {
        let name = normalize_type_name(name)?;
        let kind = TrainingType {
            id: Uuid::new_v4(),
            owner_id,
            name,
            actions: Vec::new(),
            created_at,
        };
        self.conn
            .execute(
                "INSERT INTO training_types (id, owner_id, name, created_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    kind.id.to_string(),
                    owner_id.to_string(),
                    kind.name.as_str(),
                    created_at,
                ],
            )
            .map_err(|err| {
                conflict_on_constraint(err, format!("training type `{}` already exists", kind.name))
            })?;
        Ok(kind)
    }

    fn rename_type(
        &self,
        owner_id: UserId,
        type_id: TrainingTypeId,
        name: &str,
    ) -> RepoResult<()> {
        let name = normalize_type_name(name)?;
        let changed = self
            .conn
            .execute(
                "UPDATE training_types SET name = ?3 WHERE id = ?1 AND owner_id = ?2;",
                params![type_id.to_string(), owner_id.to_string(), name.as_str()],
            )
            .map_err(|err| {
                conflict_on_constraint(err, format!("training type `{name}` already exists"))
            })?;
        if changed == 0 {
            return Err(RepoError::not_found("training type", type_id));
        }
        Ok(())
    }

    fn delete_type(&self, owner_id: UserId, type_id: TrainingTypeId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM training_actions
             WHERE type_id IN (
                SELECT id FROM training_types WHERE id = ?1 AND owner_id = ?2
             );",
            params![type_id.to_string(), owner_id.to_string()],
        )?;
        let changed = tx.execute(
            "DELETE FROM training_types WHERE id = ?1 AND owner_id = ?2;",
            params![type_id.to_string(), owner_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("training type", type_id));
        }
        tx.commit()?;
        Ok(())
    }

    fn list_types(&self, owner_id: UserId) -> RepoResult<Vec<TrainingType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, created_at
             FROM training_types
             WHERE owner_id = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([owner_id.to_string()])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            types.push(TrainingType {
                id: parse_uuid(&id, "training_types.id")?,
                owner_id,
                name: row.get(1)?,
                actions: Vec::new(),
                created_at: row.get(2)?,
            });
        }

        let ids = types.iter().map(|kind| kind.id).collect::<Vec<_>>();
        let mut actions = self.load_actions(&ids)?;
        for kind in &mut types {
            kind.actions = actions.remove(&kind.id).unwrap_or_default();
        }
        Ok(types)
    }

    fn add_action(
        &self,
        owner_id: UserId,
        type_id: TrainingTypeId,
        name: &str,
    ) -> RepoResult<TrainingAction> {
        let name = normalize_action_name(name)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let owned: i64 = tx.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM training_types WHERE id = ?1 AND owner_id = ?2
            );",
            params![type_id.to_string(), owner_id.to_string()],
            |row| row.get(0),
        )?;
        if owned != 1 {
            return Err(RepoError::not_found("training type", type_id));
        }
        let sort_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0)
             FROM training_actions
             WHERE type_id = ?1;",
            [type_id.to_string()],
            |row| row.get(0),
        )?;
        let action = TrainingAction {
            id: Uuid::new_v4(),
            type_id,
            name,
            sort_order,
        };
        tx.execute(
            "INSERT INTO training_actions (id, type_id, name, sort_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                action.id.to_string(),
                type_id.to_string(),
                action.name.as_str(),
                sort_order,
            ],
        )?;
        tx.commit()?;
        Ok(action)
    }

    fn rename_action(
        &self,
        owner_id: UserId,
        action_id: TrainingActionId,
        name: &str,
    ) -> RepoResult<()> {
        let name = normalize_action_name(name)?;
        let changed = self.conn.execute(
            "UPDATE training_actions
             SET name = ?3
             WHERE id = ?1
               AND type_id IN (SELECT id FROM training_types WHERE owner_id = ?2);",
            params![action_id.to_string(), owner_id.to_string(), name.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("training action", action_id));
        }
        Ok(())
    }

    fn delete_action(&self, owner_id: UserId, action_id: TrainingActionId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM training_actions
             WHERE id = ?1
               AND type_id IN (SELECT id FROM training_types WHERE owner_id = ?2);",
            params![action_id.to_string(), owner_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("training action", action_id));
        }
        Ok(())
    }
}
