use sqlx::PgPool;
use tracing::info;

use portcullis_core::{AppError, AppResult};
use portcullis_domain::UserId;

/// Built-in permission catalog as `(name, description, module)` rows.
pub const DEFAULT_PERMISSIONS: [(&str, &str, &str); 18] = [
    ("user_view", "View users", "users"),
    ("user_create", "Create users", "users"),
    ("user_edit", "Edit users", "users"),
    ("user_delete", "Delete users", "users"),
    ("tour_view", "View tours", "tours"),
    ("tour_create", "Create tours", "tours"),
    ("tour_edit", "Edit tours", "tours"),
    ("tour_delete", "Delete tours", "tours"),
    ("cost_view", "View costs", "costs"),
    ("cost_create", "Create costs", "costs"),
    ("cost_edit", "Edit costs", "costs"),
    ("cost_delete", "Delete costs", "costs"),
    ("report_view", "View reports", "reports"),
    ("report_export", "Export reports", "reports"),
    ("settings_view", "View settings", "settings"),
    ("settings_edit", "Edit settings", "settings"),
    ("system_logs", "View system logs", "system"),
    ("system_backup", "Run system backups", "system"),
];

/// Built-in role catalog as `(name, description)` rows.
pub const DEFAULT_ROLES: [(&str, &str); 4] = [
    ("admin", "System administrator with every permission"),
    ("manager", "Management access to users, tours, costs and reports"),
    ("operator", "Operational access to tours, costs and reports"),
    ("user", "Read-only access to the main modules"),
];

/// Role granted to bootstrap administrators.
pub const ADMIN_ROLE_NAME: &str = "admin";

fn granted_names(role_name: &str) -> Vec<&'static str> {
    DEFAULT_PERMISSIONS
        .iter()
        .filter(|(name, _, module)| match role_name {
            "admin" => true,
            "manager" => matches!(*module, "users" | "tours" | "costs" | "reports"),
            "operator" => matches!(*module, "tours" | "costs" | "reports"),
            "user" => matches!(*name, "user_view" | "tour_view" | "cost_view" | "report_view"),
            _ => false,
        })
        .map(|(name, _, _)| *name)
        .collect()
}

/// Inserts the built-in permissions, roles and role grants in one
/// transaction, skipping rows that already exist. Safe to run on every
/// startup.
pub async fn seed_catalogs(pool: &PgPool) -> AppResult<()> {
    let mut transaction = pool.begin().await.map_err(|error| {
        AppError::Internal(format!("failed to start catalog seed transaction: {error}"))
    })?;

    for (name, description, module) in DEFAULT_PERMISSIONS {
        sqlx::query(
            r#"
            INSERT INTO permissions (name, description, module)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(module)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to seed permission '{name}': {error}"))
        })?;
    }

    for (name, description) in DEFAULT_ROLES {
        sqlx::query(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(description)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to seed role '{name}': {error}")))?;
    }

    for (role_name, _) in DEFAULT_ROLES {
        for permission_name in granted_names(role_name) {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                SELECT roles.id, permissions.id
                FROM roles, permissions
                WHERE roles.name = $1 AND permissions.name = $2
                ON CONFLICT (role_id, permission_id) DO NOTHING
                "#,
            )
            .bind(role_name)
            .bind(permission_name)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to seed role grant '{role_name}' on '{permission_name}': {error}"
                ))
            })?;
        }
    }

    transaction.commit().await.map_err(|error| {
        AppError::Internal(format!("failed to commit catalog seed transaction: {error}"))
    })?;

    info!(
        permissions = DEFAULT_PERMISSIONS.len(),
        roles = DEFAULT_ROLES.len(),
        "seeded authorization catalogs"
    );

    Ok(())
}

/// Finds or creates a user by username and returns its identifier.
pub async fn ensure_user(pool: &PgPool, username: &str) -> AppResult<UserId> {
    let user_id = sqlx::query_scalar::<_, uuid::Uuid>(
        r#"
        INSERT INTO users (username)
        VALUES ($1)
        ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
        RETURNING id
        "#,
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to ensure user '{username}': {error}")))?;

    info!(username = username, "ensured bootstrap user");
    Ok(UserId::from_uuid(user_id))
}

/// Assigns the administrator role to a user, skipping when the
/// assignment already exists.
pub async fn assign_admin_role(pool: &PgPool, user_id: UserId) -> AppResult<()> {
    let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
        r#"
        SELECT id
        FROM roles
        WHERE name = $1
        "#,
    )
    .bind(ADMIN_ROLE_NAME)
    .fetch_optional(pool)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to look up role '{ADMIN_ROLE_NAME}': {error}"))
    })?
    .ok_or_else(|| AppError::NotFound(format!("role '{ADMIN_ROLE_NAME}' does not exist")))?;

    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, role_id) DO NOTHING
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(role_id)
    .execute(pool)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to assign role '{ADMIN_ROLE_NAME}' to user '{user_id}': {error}"
        ))
    })?;

    info!(user_id = %user_id, role = ADMIN_ROLE_NAME, "assigned bootstrap role");
    Ok(())
}
