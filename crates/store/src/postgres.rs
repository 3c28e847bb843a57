//! Postgres-backed role/permission store.
//!
//! ## Expected Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id           uuid PRIMARY KEY,
//!     account_type text NOT NULL,
//!     is_verified  boolean NOT NULL DEFAULT false
//! );
//!
//! CREATE TABLE roles (
//!     id          uuid PRIMARY KEY,
//!     name        text NOT NULL UNIQUE,
//!     description text,
//!     created_at  timestamptz NOT NULL
//! );
//!
//! CREATE TABLE permissions (
//!     id          uuid PRIMARY KEY,
//!     name        text NOT NULL UNIQUE,
//!     description text
//! );
//!
//! CREATE TABLE role_permissions (
//!     role_id       uuid NOT NULL REFERENCES roles (id),
//!     permission_id uuid NOT NULL REFERENCES permissions (id),
//!     PRIMARY KEY (role_id, permission_id)
//! );
//!
//! CREATE TABLE user_roles (
//!     user_id uuid NOT NULL REFERENCES users (id),
//!     role_id uuid NOT NULL REFERENCES roles (id),
//!     PRIMARY KEY (user_id, role_id)
//! );
//! ```
//!
//! User rows are written by the registration flow elsewhere; this store only
//! reads them.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `RoleExists` / `PermissionExists` | Duplicate name on create (checked at the call site) |
//! | Database (other) | Any other | `Unavailable` | Other database errors |
//! | PoolClosed / Io / Timeout | N/A | `Unavailable` | Connection trouble |
//!
//! Foreign-key violations (`23503`) are not expected: every association write
//! checks both sides inside its transaction first and fails with
//! `UnknownUser` / `UnknownRole` / `UnknownPermission` before touching the
//! join tables.
//!
//! ## Atomicity
//!
//! `assign_permissions` runs resolve + delete + insert inside a single
//! transaction, so a replacement either fully applies or rolls back to the
//! previous set. `delete_role` removes the role and both kinds of
//! associations the same way.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use concours_auth::{PermissionName, Principal, PrincipalDirectory, RoleGrant, RoleName, StoreUnavailable};
use concours_core::{PermissionId, RoleId, UserId};

use crate::error::StoreError;
use crate::records::{PermissionRecord, RoleDetail, RoleRecord};
use crate::store::RolePermissionStore;

/// Postgres-backed store.
///
/// Uses the SQLx connection pool, which is thread-safe and can be shared
/// across handlers.
#[derive(Debug, Clone)]
pub struct PostgresAuthStore {
    pool: Arc<PgPool>,
}

impl PostgresAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────────────────────────

/// One row of the roles / role_permissions / permissions join.
#[derive(Debug)]
struct RoleJoinRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    permission_name: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for RoleJoinRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(RoleJoinRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            permission_name: row.try_get("permission_name")?,
        })
    }
}

#[derive(Debug)]
struct PermissionRow {
    id: Uuid,
    name: String,
    description: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for PermissionRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(PermissionRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }
}

impl From<PermissionRow> for PermissionRecord {
    fn from(row: PermissionRow) -> Self {
        Self {
            id: PermissionId::from_uuid(row.id),
            name: PermissionName::new(row.name),
            description: row.description,
        }
    }
}

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    account_type: String,
    is_verified: bool,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for UserRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            account_type: row.try_get("account_type")?,
            is_verified: row.try_get("is_verified")?,
        })
    }
}

#[derive(Debug)]
struct GrantRow {
    role_name: String,
    permission_name: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for GrantRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(GrantRow {
            role_name: row.try_get("role_name")?,
            permission_name: row.try_get("permission_name")?,
        })
    }
}

/// Fold join rows (ordered by role name, then permission name) into details.
fn fold_role_rows(rows: Vec<RoleJoinRow>) -> Vec<RoleDetail> {
    let mut details: Vec<RoleDetail> = Vec::new();
    for row in rows {
        let same_role = details.last().is_some_and(|d| *d.id.as_uuid() == row.id);
        if !same_role {
            details.push(RoleDetail {
                id: RoleId::from_uuid(row.id),
                name: RoleName::new(row.name),
                description: row.description,
                created_at: row.created_at,
                permissions: Vec::new(),
            });
        }
        if let (Some(detail), Some(permission)) = (details.last_mut(), row.permission_name) {
            detail.permissions.push(PermissionName::new(permission));
        }
    }
    details
}

/// Fold grant rows (ordered by role name, then permission name) into grants.
fn fold_grant_rows(rows: Vec<GrantRow>) -> Vec<RoleGrant> {
    let mut grants: Vec<RoleGrant> = Vec::new();
    for row in rows {
        let same_role = grants.last().is_some_and(|g| g.role.as_str() == row.role_name);
        if !same_role {
            grants.push(RoleGrant::new(RoleName::new(row.role_name), Vec::new()));
        }
        if let (Some(grant), Some(permission)) = (grants.last_mut(), row.permission_name) {
            grant.permissions.push(PermissionName::new(permission));
        }
    }
    grants
}

// ─────────────────────────────────────────────────────────────────────────────
// Store implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RolePermissionStore for PostgresAuthStore {
    #[instrument(skip(self), fields(role_name = %name), err)]
    async fn create_role(
        &self,
        name: RoleName,
        description: Option<String>,
    ) -> Result<RoleRecord, StoreError> {
        let record = RoleRecord {
            id: RoleId::new(),
            name,
            description,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO roles (id, name, description, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.name.as_str())
        .bind(record.description.as_deref())
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::RoleExists(record.name.as_str().to_string())
            } else {
                map_sqlx_error("create_role", e)
            }
        })?;

        Ok(record)
    }

    #[instrument(skip(self), fields(role_id = %role_id.as_uuid()), err)]
    async fn delete_role(&self, role_id: RoleId) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_role", e))?;

        sqlx::query("DELETE FROM user_roles WHERE role_id = $1")
            .bind(role_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_role", e))?;

        let deleted = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_role", e))?;

        if deleted.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::UnknownRole(role_id));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_roles(&self) -> Result<Vec<RoleDetail>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.description, r.created_at, p.name AS permission_name
            FROM roles r
            LEFT JOIN role_permissions rp ON rp.role_id = r.id
            LEFT JOIN permissions p ON p.id = rp.permission_id
            ORDER BY r.name ASC, p.name ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_roles", e))?;

        let mut join_rows = Vec::with_capacity(rows.len());
        for row in rows {
            join_rows.push(
                RoleJoinRow::from_row(&row).map_err(|e| map_sqlx_error("list_roles", e))?,
            );
        }

        Ok(fold_role_rows(join_rows))
    }

    #[instrument(skip(self), fields(role_id = %role_id.as_uuid()), err)]
    async fn get_role(&self, role_id: RoleId) -> Result<RoleDetail, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.description, r.created_at, p.name AS permission_name
            FROM roles r
            LEFT JOIN role_permissions rp ON rp.role_id = r.id
            LEFT JOIN permissions p ON p.id = rp.permission_id
            WHERE r.id = $1
            ORDER BY p.name ASC
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_role", e))?;

        let mut join_rows = Vec::with_capacity(rows.len());
        for row in rows {
            join_rows.push(RoleJoinRow::from_row(&row).map_err(|e| map_sqlx_error("get_role", e))?);
        }

        fold_role_rows(join_rows)
            .into_iter()
            .next()
            .ok_or(StoreError::UnknownRole(role_id))
    }

    #[instrument(skip(self), fields(permission_name = %name), err)]
    async fn create_permission(
        &self,
        name: PermissionName,
        description: Option<String>,
    ) -> Result<PermissionRecord, StoreError> {
        let record = PermissionRecord {
            id: PermissionId::new(),
            name,
            description,
        };

        sqlx::query(
            r#"
            INSERT INTO permissions (id, name, description)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.name.as_str())
        .bind(record.description.as_deref())
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::PermissionExists(record.name.as_str().to_string())
            } else {
                map_sqlx_error("create_permission", e)
            }
        })?;

        Ok(record)
    }

    #[instrument(skip(self), err)]
    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, StoreError> {
        let rows = sqlx::query("SELECT id, name, description FROM permissions ORDER BY name ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_permissions", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let permission =
                PermissionRow::from_row(&row).map_err(|e| map_sqlx_error("list_permissions", e))?;
            records.push(PermissionRecord::from(permission));
        }

        Ok(records)
    }

    #[instrument(
        skip(self, permissions),
        fields(role_id = %role_id.as_uuid(), permission_count = permissions.len()),
        err
    )]
    async fn assign_permissions(
        &self,
        role_id: RoleId,
        permissions: &[PermissionName],
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let role_exists = sqlx::query("SELECT 1 FROM roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("assign_permissions", e))?;
        if role_exists.is_none() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::UnknownRole(role_id));
        }

        // Resolve all names to ids before touching the join table. BTreeMap
        // keeps the missing-name check deterministic.
        let requested: Vec<String> = {
            let mut names: Vec<String> =
                permissions.iter().map(|p| p.as_str().to_string()).collect();
            names.sort();
            names.dedup();
            names
        };

        let resolved_rows =
            sqlx::query("SELECT id, name FROM permissions WHERE name = ANY($1)")
                .bind(&requested)
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("assign_permissions", e))?;

        let mut resolved: BTreeMap<String, Uuid> = BTreeMap::new();
        for row in resolved_rows {
            let name: String = row
                .try_get("name")
                .map_err(|e| map_sqlx_error("assign_permissions", e))?;
            let id: Uuid = row
                .try_get("id")
                .map_err(|e| map_sqlx_error("assign_permissions", e))?;
            resolved.insert(name, id);
        }

        for name in &requested {
            if !resolved.contains_key(name) {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::UnknownPermission(name.clone()));
            }
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("assign_permissions", e))?;

        for permission_id in resolved.values() {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(role_id.as_uuid())
            .bind(permission_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("assign_permissions", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }

    #[instrument(
        skip(self),
        fields(user_id = %user_id.as_uuid(), role_id = %role_id.as_uuid()),
        err
    )]
    async fn grant_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let user_exists = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("grant_role", e))?;
        if user_exists.is_none() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::UnknownUser(user_id));
        }

        let role_exists = sqlx::query("SELECT 1 FROM roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("grant_role", e))?;
        if role_exists.is_none() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::UnknownRole(role_id));
        }

        // ON CONFLICT makes a repeated grant a no-op.
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("grant_role", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }

    #[instrument(
        skip(self),
        fields(user_id = %user_id.as_uuid(), role_id = %role_id.as_uuid()),
        err
    )]
    async fn revoke_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), StoreError> {
        // Deleting zero rows is the unheld-role no-op.
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id.as_uuid())
            .bind(role_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("revoke_role", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id.as_uuid()), err)]
    async fn list_effective_permissions(
        &self,
        user_id: UserId,
    ) -> Result<HashSet<PermissionName>, StoreError> {
        let user_exists = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_effective_permissions", e))?;
        if user_exists.is_none() {
            return Err(StoreError::UnknownUser(user_id));
        }

        let rows = sqlx::query(
            r#"
            SELECT DISTINCT p.name
            FROM user_roles ur
            JOIN role_permissions rp ON rp.role_id = ur.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_effective_permissions", e))?;

        let mut names = HashSet::with_capacity(rows.len());
        for row in rows {
            let name: String = row
                .try_get("name")
                .map_err(|e| map_sqlx_error("list_effective_permissions", e))?;
            names.insert(PermissionName::new(name));
        }

        Ok(names)
    }
}

#[async_trait]
impl PrincipalDirectory for PostgresAuthStore {
    async fn lookup_principal(
        &self,
        user_id: UserId,
    ) -> Result<Option<Principal>, StoreUnavailable> {
        let row = sqlx::query("SELECT id, account_type, is_verified FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| StoreUnavailable(format!("lookup_principal: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user = UserRow::from_row(&row)
            .map_err(|e| StoreUnavailable(format!("lookup_principal: {e}")))?;

        let account_type = user
            .account_type
            .parse()
            .map_err(|_| StoreUnavailable(format!("corrupt account_type for user {}", user.id)))?;

        let rows = sqlx::query(
            r#"
            SELECT r.name AS role_name, p.name AS permission_name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            LEFT JOIN role_permissions rp ON rp.role_id = r.id
            LEFT JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = $1
            ORDER BY r.name ASC, p.name ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| StoreUnavailable(format!("lookup_principal: {e}")))?;

        let mut grant_rows = Vec::with_capacity(rows.len());
        for row in rows {
            grant_rows.push(
                GrantRow::from_row(&row)
                    .map_err(|e| StoreUnavailable(format!("lookup_principal: {e}")))?,
            );
        }

        Ok(Some(Principal {
            user_id: UserId::from_uuid(user.id),
            account_type,
            verified: user.is_verified,
            grants: fold_grant_rows(grant_rows),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error mapping
// ─────────────────────────────────────────────────────────────────────────────

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Unavailable(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join_row(
        id: Uuid,
        name: &str,
        permission: Option<&str>,
    ) -> RoleJoinRow {
        RoleJoinRow {
            id,
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
            permission_name: permission.map(str::to_string),
        }
    }

    #[test]
    fn fold_role_rows_groups_by_role() {
        let editor = Uuid::now_v7();
        let viewer = Uuid::now_v7();
        let details = fold_role_rows(vec![
            join_row(editor, "EDITOR", Some("lister_roles")),
            join_row(editor, "EDITOR", Some("modifier_departement")),
            join_row(viewer, "VIEWER", None),
        ]);

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].name, RoleName::new("EDITOR"));
        assert_eq!(
            details[0].permissions,
            vec![
                PermissionName::new("lister_roles"),
                PermissionName::new("modifier_departement"),
            ]
        );
        assert!(details[1].permissions.is_empty());
    }

    #[test]
    fn fold_grant_rows_keeps_permissionless_roles() {
        let grants = fold_grant_rows(vec![
            GrantRow {
                role_name: "EDITOR".to_string(),
                permission_name: Some("modifier_departement".to_string()),
            },
            GrantRow {
                role_name: "VIEWER".to_string(),
                permission_name: None,
            },
        ]);

        assert_eq!(grants.len(), 2);
        assert_eq!(grants[0].permissions.len(), 1);
        assert!(grants[1].permissions.is_empty());
    }
}
