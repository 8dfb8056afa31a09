//! Postgres-backed implementation of the grant store.
//!
//! # What this module is
//! Implements [`GrantStore`] using Postgres (via `sqlx`) as the durable,
//! shared backing store for grants and groups.
//!
//! # Key invariants
//! - Grant uniqueness per (user, type, scope) is enforced by unique indexes,
//!   not by application-level read-then-insert. `insert_grant_if_absent` is a
//!   single `INSERT ... ON CONFLICT DO NOTHING`, so racing grants for the
//!   same tuple cannot both land.
//! - The NULL-scope (global) tuple has its own partial unique index because
//!   Postgres treats NULLs as distinct in ordinary unique indexes.
//! - Grant rows are never deleted; status transitions are in-place updates.
//!
//! # Concurrency model
//! The store is shared across async handlers; `sqlx::PgPool` manages
//! concurrency. Pool acquire timeouts are explicit because hanging forever on
//! DB failures is unacceptable for an authorization service.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")` so
//!   handlers can assume the schema exists.
//! - Database URLs may contain credentials; they are never logged.
use super::{GrantStore, StoreConfig, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{Group, GroupFilter, GrantFilter, Page, Pagination, PermissionGrant};
use crate::model::{ApprovalPolicy, GroupVisibility};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quorum_authz::{GrantStatus, PermissionType, ScopeId, UserId};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

pub struct PostgresStore {
    pool: PgPool,
    config: StoreConfig,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".into()),
            other => StoreError::Unexpected(other.into()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

/// Row shape for the `permission_grants` table.
///
/// DB-facing structs are kept separate from domain types so schema details
/// (column names, status codes) stay localized to this module.
#[derive(Debug, Clone, FromRow)]
struct DbGrant {
    user_id: Uuid,
    permission_type: String,
    scope: Option<Uuid>,
    status: i16,
    created_at: DateTime<Utc>,
    created_by: Uuid,
    updated_at: Option<DateTime<Utc>>,
    approved_by: Option<Uuid>,
}

/// Row shape for the `groups` table.
#[derive(Debug, Clone, FromRow)]
struct DbGroup {
    group_id: Uuid,
    parent_scope: Option<Uuid>,
    name: String,
    visibility: String,
    approval: String,
    metadata: serde_json::Value,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

fn grant_from_db(row: DbGrant) -> StoreResult<PermissionGrant> {
    Ok(PermissionGrant {
        user_id: UserId::new(row.user_id),
        permission_type: PermissionType::from_str(&row.permission_type)
            .map_err(|err| StoreError::Unexpected(anyhow!(err)))?,
        scope: row.scope.map(ScopeId::new),
        status: GrantStatus::from_code(row.status)
            .map_err(|err| StoreError::Unexpected(anyhow!(err)))?,
        created_at: row.created_at,
        created_by: UserId::new(row.created_by),
        updated_at: row.updated_at,
        approved_by: row.approved_by.map(UserId::new),
    })
}

fn visibility_from_db(value: &str) -> StoreResult<GroupVisibility> {
    match value {
        "public" => Ok(GroupVisibility::Public),
        "private" => Ok(GroupVisibility::Private),
        "closed" => Ok(GroupVisibility::Closed),
        other => Err(StoreError::Unexpected(anyhow!(
            "unknown group visibility: {other}"
        ))),
    }
}

fn visibility_to_db(value: GroupVisibility) -> &'static str {
    match value {
        GroupVisibility::Public => "public",
        GroupVisibility::Private => "private",
        GroupVisibility::Closed => "closed",
    }
}

fn approval_from_db(value: &str) -> StoreResult<ApprovalPolicy> {
    match value {
        "auto" => Ok(ApprovalPolicy::Auto),
        "manual" => Ok(ApprovalPolicy::Manual),
        "never" => Ok(ApprovalPolicy::Never),
        other => Err(StoreError::Unexpected(anyhow!(
            "unknown approval policy: {other}"
        ))),
    }
}

fn approval_to_db(value: ApprovalPolicy) -> &'static str {
    match value {
        ApprovalPolicy::Auto => "auto",
        ApprovalPolicy::Manual => "manual",
        ApprovalPolicy::Never => "never",
    }
}

fn group_from_db(row: DbGroup) -> StoreResult<Group> {
    Ok(Group {
        group_id: ScopeId::new(row.group_id),
        parent_scope: row.parent_scope.map(ScopeId::new),
        name: row.name,
        visibility: visibility_from_db(&row.visibility)?,
        approval: approval_from_db(&row.approval)?,
        metadata: row.metadata,
        created_by: UserId::new(row.created_by),
        created_at: row.created_at,
    })
}

impl PostgresStore {
    /// Connect to Postgres and run migrations before serving requests.
    ///
    /// Pool tuning matters here: `acquire_timeout` bounds how long a request
    /// waits for a connection before failing fast, which keeps authorization
    /// checks from hanging when the database is unhealthy.
    pub async fn connect(pg: &PostgresConfig, config: StoreConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let connect = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options);
        let pool = tokio::time::timeout(Duration::from_millis(pg.connect_timeout_ms), connect)
            .await
            .map_err(|_| StoreError::Unexpected(anyhow!("postgres connect timed out")))??;

        // Fail startup rather than serving against a partial schema.
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool, config })
    }
}

#[async_trait]
impl GrantStore for PostgresStore {
    async fn find_grant(
        &self,
        user_id: UserId,
        permission_type: PermissionType,
        scope: Option<ScopeId>,
        statuses: &[GrantStatus],
    ) -> StoreResult<Option<PermissionGrant>> {
        let codes: Vec<i16> = statuses.iter().map(|status| status.code()).collect();
        let row = sqlx::query_as::<_, DbGrant>(
            r#"SELECT user_id, permission_type, scope, status,
                      created_at, created_by, updated_at, approved_by
               FROM permission_grants
               WHERE user_id = $1
                 AND permission_type = $2
                 AND scope IS NOT DISTINCT FROM $3
                 AND (cardinality($4::smallint[]) = 0 OR status = ANY($4))"#,
        )
        .bind(user_id.as_uuid())
        .bind(permission_type.as_str())
        .bind(scope.map(|s| s.as_uuid()))
        .bind(&codes)
        .fetch_optional(&self.pool)
        .await?;
        row.map(grant_from_db).transpose()
    }

    async fn insert_grant_if_absent(&self, grant: PermissionGrant) -> StoreResult<bool> {
        // The partial unique indexes make this a true atomic insert-if-absent
        // for both scoped and global tuples.
        let result = sqlx::query(
            r#"INSERT INTO permission_grants
                   (user_id, permission_type, scope, status,
                    created_at, created_by, updated_at, approved_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               ON CONFLICT DO NOTHING"#,
        )
        .bind(grant.user_id.as_uuid())
        .bind(grant.permission_type.as_str())
        .bind(grant.scope.map(|s| s.as_uuid()))
        .bind(grant.status.code())
        .bind(grant.created_at)
        .bind(grant.created_by.as_uuid())
        .bind(grant.updated_at)
        .bind(grant.approved_by.map(|u| u.as_uuid()))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_grant_status(
        &self,
        user_id: UserId,
        permission_type: PermissionType,
        scope: Option<ScopeId>,
        status: GrantStatus,
        approved_by: UserId,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"UPDATE permission_grants
               SET status = $4, updated_at = now(), approved_by = $5
               WHERE user_id = $1
                 AND permission_type = $2
                 AND scope IS NOT DISTINCT FROM $3"#,
        )
        .bind(user_id.as_uuid())
        .bind(permission_type.as_str())
        .bind(scope.map(|s| s.as_uuid()))
        .bind(status.code())
        .bind(approved_by.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_grants(
        &self,
        filter: GrantFilter,
        page: Pagination,
    ) -> StoreResult<Page<PermissionGrant>> {
        let page = page.clamped(self.config.max_page_limit);
        let user = filter.user_id.map(|u| u.as_uuid());
        let scope = filter.scope.map(|s| s.as_uuid());
        let status = filter.status.map(|s| s.code());

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM permission_grants
               WHERE ($1::uuid IS NULL OR user_id = $1)
                 AND ($2::uuid IS NULL OR scope = $2)
                 AND ($3::smallint IS NULL OR status = $3)"#,
        )
        .bind(user)
        .bind(scope)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, DbGrant>(
            r#"SELECT user_id, permission_type, scope, status,
                      created_at, created_by, updated_at, approved_by
               FROM permission_grants
               WHERE ($1::uuid IS NULL OR user_id = $1)
                 AND ($2::uuid IS NULL OR scope = $2)
                 AND ($3::smallint IS NULL OR status = $3)
               ORDER BY created_at DESC, id DESC
               LIMIT $4 OFFSET $5"#,
        )
        .bind(user)
        .bind(scope)
        .bind(status)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(grant_from_db)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page {
            items,
            total: total as u64,
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn grants_for_scope(
        &self,
        user_id: UserId,
        scope: ScopeId,
    ) -> StoreResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, DbGrant>(
            r#"SELECT user_id, permission_type, scope, status,
                      created_at, created_by, updated_at, approved_by
               FROM permission_grants
               WHERE user_id = $1 AND scope = $2 AND status = $3"#,
        )
        .bind(user_id.as_uuid())
        .bind(scope.as_uuid())
        .bind(GrantStatus::Active.code())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(grant_from_db).collect()
    }

    async fn insert_group(&self, group: Group) -> StoreResult<Group> {
        let insert = sqlx::query(
            r#"INSERT INTO groups
                   (group_id, parent_scope, name, visibility, approval,
                    metadata, created_by, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(group.group_id.as_uuid())
        .bind(group.parent_scope.map(|s| s.as_uuid()))
        .bind(&group.name)
        .bind(visibility_to_db(group.visibility))
        .bind(approval_to_db(group.approval))
        .bind(&group.metadata)
        .bind(group.created_by.as_uuid())
        .bind(group.created_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict("group exists".into()));
            }
            return Err(err.into());
        }
        Ok(group)
    }

    async fn find_group(&self, group_id: ScopeId) -> StoreResult<Option<Group>> {
        let row = sqlx::query_as::<_, DbGroup>(
            r#"SELECT group_id, parent_scope, name, visibility, approval,
                      metadata, created_by, created_at
               FROM groups WHERE group_id = $1"#,
        )
        .bind(group_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(group_from_db).transpose()
    }

    async fn find_child_groups(&self, parent: ScopeId) -> StoreResult<Vec<Group>> {
        let rows = sqlx::query_as::<_, DbGroup>(
            r#"SELECT group_id, parent_scope, name, visibility, approval,
                      metadata, created_by, created_at
               FROM groups WHERE parent_scope = $1 ORDER BY name"#,
        )
        .bind(parent.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(group_from_db).collect()
    }

    async fn list_groups(
        &self,
        filter: GroupFilter,
        page: Pagination,
    ) -> StoreResult<Page<Group>> {
        let page = page.clamped(self.config.max_page_limit);
        let name = filter.name.as_ref().map(|n| format!("%{}%", n.to_lowercase()));
        let parent = filter.parent_scope.map(|s| s.as_uuid());
        let visibility = filter.visibility.map(visibility_to_db);
        let created_by = filter.created_by.map(|u| u.as_uuid());

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM groups
               WHERE ($1::text IS NULL OR lower(name) LIKE $1)
                 AND ($2::uuid IS NULL OR parent_scope = $2)
                 AND ($3::text IS NULL OR visibility = $3)
                 AND ($4::uuid IS NULL OR created_by = $4)"#,
        )
        .bind(&name)
        .bind(parent)
        .bind(visibility)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, DbGroup>(
            r#"SELECT group_id, parent_scope, name, visibility, approval,
                      metadata, created_by, created_at
               FROM groups
               WHERE ($1::text IS NULL OR lower(name) LIKE $1)
                 AND ($2::uuid IS NULL OR parent_scope = $2)
                 AND ($3::text IS NULL OR visibility = $3)
                 AND ($4::uuid IS NULL OR created_by = $4)
               ORDER BY created_at DESC, name
               LIMIT $5 OFFSET $6"#,
        )
        .bind(&name)
        .bind(parent)
        .bind(visibility)
        .bind(created_by)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(group_from_db)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page {
            items,
            total: total as u64,
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn merge_group_metadata(
        &self,
        group_id: ScopeId,
        patch: serde_json::Value,
    ) -> StoreResult<Group> {
        // `||` on jsonb is a shallow merge, matching the in-memory backend.
        let row = sqlx::query_as::<_, DbGroup>(
            r#"UPDATE groups SET metadata = metadata || $2::jsonb
               WHERE group_id = $1
               RETURNING group_id, parent_scope, name, visibility, approval,
                         metadata, created_by, created_at"#,
        )
        .bind(group_id.as_uuid())
        .bind(&patch)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => group_from_db(row),
            None => Err(StoreError::NotFound("group".into())),
        }
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}
