use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use portcullis_application::{AuthorizationRepository, EffectivePermission, RoleSummary};
use portcullis_core::{AppError, AppResult};
use portcullis_domain::{Permission, PermissionId, PermissionName, Role, RoleId, UserId};

/// PostgreSQL-backed repository for permission and role lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EffectivePermissionRow {
    name: String,
    description: Option<String>,
    module: String,
}

#[derive(Debug, FromRow)]
struct RoleSummaryRow {
    name: String,
    description: Option<String>,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: uuid::Uuid,
    name: String,
    description: Option<String>,
    module: String,
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: uuid::Uuid,
    name: String,
    description: Option<String>,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_effective_permissions(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<EffectivePermission>> {
        let rows = sqlx::query_as::<_, EffectivePermissionRow>(
            r#"
            SELECT permissions.name, permissions.description, permissions.module
            FROM permissions
            INNER JOIN user_permissions
                ON user_permissions.permission_id = permissions.id
            WHERE user_permissions.user_id = $1
            UNION
            SELECT permissions.name, permissions.description, permissions.module
            FROM permissions
            INNER JOIN role_permissions
                ON role_permissions.permission_id = permissions.id
            INNER JOIN user_roles
                ON user_roles.role_id = role_permissions.role_id
            WHERE user_roles.user_id = $1
            ORDER BY module, name
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load effective permissions: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(EffectivePermission {
                    name: decode_permission_name(row.name.as_str())?,
                    description: row.description,
                    module: row.module,
                })
            })
            .collect()
    }

    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleSummary>> {
        let rows = sqlx::query_as::<_, RoleSummaryRow>(
            r#"
            SELECT roles.name, roles.description
            FROM roles
            INNER JOIN user_roles
                ON user_roles.role_id = roles.id
            WHERE user_roles.user_id = $1
            ORDER BY roles.name
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user roles: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| RoleSummary {
                name: row.name,
                description: row.description,
            })
            .collect())
    }

    async fn list_all_permissions(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, description, module
            FROM permissions
            ORDER BY module, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission catalog: {error}"))
        })?;

        rows.into_iter().map(decode_permission).collect()
    }

    async fn list_all_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description
            FROM roles
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role catalog: {error}")))?;

        rows.into_iter().map(decode_role).collect()
    }

    async fn find_permission_by_name(
        &self,
        name: &PermissionName,
    ) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, description, module
            FROM permissions
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find permission: {error}")))?;

        row.map(decode_permission).transpose()
    }
}

fn decode_permission_name(value: &str) -> AppResult<PermissionName> {
    PermissionName::new(value).map_err(|error| {
        AppError::Internal(format!("invalid stored permission name '{value}': {error}"))
    })
}

fn decode_permission(row: PermissionRow) -> AppResult<Permission> {
    Permission::new(
        PermissionId::from_uuid(row.id),
        row.name.as_str(),
        row.description.clone(),
        row.module.as_str(),
    )
    .map_err(|error| {
        AppError::Internal(format!("invalid stored permission '{}': {error}", row.name))
    })
}

fn decode_role(row: RoleRow) -> AppResult<Role> {
    Role::new(
        RoleId::from_uuid(row.id),
        row.name.as_str(),
        row.description.clone(),
    )
    .map_err(|error| AppError::Internal(format!("invalid stored role '{}': {error}", row.name)))
}
