use async_trait::async_trait;
use sqlx::PgPool;

use portcullis_application::GrantRepository;
use portcullis_core::{AppError, AppResult};
use portcullis_domain::{PermissionId, RoleId, UserId};

/// PostgreSQL-backed repository for grant mutation.
///
/// All inserts are single-statement `ON CONFLICT DO NOTHING` writes, so a
/// replayed or racing grant collapses onto the existing row and keeps its
/// original timestamp and attribution.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn insert_user_permission(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
        granted_by: Option<UserId>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, permission_id, granted_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, permission_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(permission_id.as_uuid())
        .bind(granted_by.map(|granter| granter.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| map_grant_write_error(error, "permission"))?;

        Ok(())
    }

    async fn delete_user_permission(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM user_permissions
            WHERE user_id = $1 AND permission_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to remove permission grant: {error}"))
        })?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn insert_user_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        assigned_by: Option<UserId>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id, assigned_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(assigned_by.map(|assigner| assigner.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| map_grant_write_error(error, "role"))?;

        Ok(())
    }

    async fn delete_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE user_id = $1 AND role_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to remove role assignment: {error}"))
        })?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

fn map_grant_write_error(error: sqlx::Error, relation: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound(format!(
            "{relation} grant references a user or catalog entry that does not exist"
        ));
    }

    AppError::Internal(format!("failed to write {relation} grant: {error}"))
}

#[cfg(test)]
mod tests;
