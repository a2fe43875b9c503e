use portcullis_application::{AuthorizationRepository, GrantRepository};
use portcullis_core::AppError;
use portcullis_domain::{PermissionId, RoleId, UserId};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::PostgresAuthorizationRepository;

use super::PostgresGrantRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres grant tests: {error}");
    }

    Some(pool)
}

async fn create_user(pool: &PgPool) -> UserId {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
            INSERT INTO users (username)
            VALUES ($1)
            RETURNING id
            "#,
    )
    .bind(format!("grant-user-{}", Uuid::new_v4()))
    .fetch_one(pool)
    .await;

    match id {
        Ok(id) => UserId::from_uuid(id),
        Err(error) => panic!("failed to create test user: {error}"),
    }
}

async fn create_permission(pool: &PgPool) -> PermissionId {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
            INSERT INTO permissions (name, description, module)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
    )
    .bind(format!("grant{}_write", Uuid::new_v4().simple()))
    .bind("test permission")
    .bind("grants")
    .fetch_one(pool)
    .await;

    match id {
        Ok(id) => PermissionId::from_uuid(id),
        Err(error) => panic!("failed to create test permission: {error}"),
    }
}

async fn create_role(pool: &PgPool) -> RoleId {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING id
            "#,
    )
    .bind(format!("grant-role-{}", Uuid::new_v4()))
    .bind("test role")
    .fetch_one(pool)
    .await;

    match id {
        Ok(id) => RoleId::from_uuid(id),
        Err(error) => panic!("failed to create test role: {error}"),
    }
}

async fn count_direct_grants(pool: &PgPool, user_id: UserId) -> i64 {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
            SELECT COUNT(*)
            FROM user_permissions
            WHERE user_id = $1
            "#,
    )
    .bind(user_id.as_uuid())
    .fetch_one(pool)
    .await;

    match count {
        Ok(count) => count,
        Err(error) => panic!("failed to count direct grants: {error}"),
    }
}

async fn stored_granted_by(
    pool: &PgPool,
    user_id: UserId,
    permission_id: PermissionId,
) -> Option<Uuid> {
    let granted_by = sqlx::query_scalar::<_, Option<Uuid>>(
        r#"
            SELECT granted_by
            FROM user_permissions
            WHERE user_id = $1 AND permission_id = $2
            "#,
    )
    .bind(user_id.as_uuid())
    .bind(permission_id.as_uuid())
    .fetch_one(pool)
    .await;

    match granted_by {
        Ok(granted_by) => granted_by,
        Err(error) => panic!("failed to read grant attribution: {error}"),
    }
}

#[tokio::test]
async fn replayed_permission_grant_keeps_single_row_and_attribution() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool.clone());
    let user_id = create_user(&pool).await;
    let first_actor = create_user(&pool).await;
    let second_actor = create_user(&pool).await;
    let permission_id = create_permission(&pool).await;

    let first = repository
        .insert_user_permission(user_id, permission_id, Some(first_actor))
        .await;
    let second = repository
        .insert_user_permission(user_id, permission_id, Some(second_actor))
        .await;
    assert!(first.is_ok());
    assert!(second.is_ok());

    assert_eq!(count_direct_grants(&pool, user_id).await, 1);
    assert_eq!(
        stored_granted_by(&pool, user_id, permission_id).await,
        Some(first_actor.as_uuid())
    );
}

#[tokio::test]
async fn delete_user_permission_reports_whether_a_row_was_removed() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool.clone());
    let user_id = create_user(&pool).await;
    let permission_id = create_permission(&pool).await;

    let inserted = repository
        .insert_user_permission(user_id, permission_id, None)
        .await;
    assert!(inserted.is_ok());

    let removed = repository
        .delete_user_permission(user_id, permission_id)
        .await;
    assert_eq!(removed.ok(), Some(true));

    let removed_again = repository
        .delete_user_permission(user_id, permission_id)
        .await;
    assert_eq!(removed_again.ok(), Some(false));
}

#[tokio::test]
async fn grant_for_unknown_permission_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool.clone());
    let user_id = create_user(&pool).await;

    let result = repository
        .insert_user_permission(user_id, PermissionId::new(), None)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn deleting_role_cascades_to_assignments_and_effective_set() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let grants = PostgresGrantRepository::new(pool.clone());
    let lookups = PostgresAuthorizationRepository::new(pool.clone());
    let user_id = create_user(&pool).await;
    let role_id = create_role(&pool).await;
    let role_permission = create_permission(&pool).await;
    let direct_permission = create_permission(&pool).await;

    let role_grant = sqlx::query(
        r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            "#,
    )
    .bind(role_id.as_uuid())
    .bind(role_permission.as_uuid())
    .execute(&pool)
    .await;
    assert!(role_grant.is_ok());

    let assigned = grants.insert_user_role(user_id, role_id, None).await;
    assert!(assigned.is_ok());
    let direct = grants
        .insert_user_permission(user_id, direct_permission, None)
        .await;
    assert!(direct.is_ok());

    let before = lookups.list_effective_permissions(user_id).await;
    assert_eq!(before.map(|set| set.len()).unwrap_or_default(), 2);

    let deleted_role = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(role_id.as_uuid())
        .execute(&pool)
        .await;
    assert!(deleted_role.is_ok());

    let after = lookups.list_effective_permissions(user_id).await;
    assert_eq!(after.map(|set| set.len()).unwrap_or_default(), 1);

    let assignments = sqlx::query_scalar::<_, i64>(
        r#"
            SELECT COUNT(*)
            FROM user_roles
            WHERE user_id = $1
            "#,
    )
    .bind(user_id.as_uuid())
    .fetch_one(&pool)
    .await;
    assert_eq!(assignments.ok(), Some(0));
}

#[tokio::test]
async fn deleting_granting_user_nulls_attribution_but_keeps_grant() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool.clone());
    let user_id = create_user(&pool).await;
    let granter_id = create_user(&pool).await;
    let permission_id = create_permission(&pool).await;

    let granted = repository
        .insert_user_permission(user_id, permission_id, Some(granter_id))
        .await;
    assert!(granted.is_ok());

    let deleted_granter = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(granter_id.as_uuid())
        .execute(&pool)
        .await;
    assert!(deleted_granter.is_ok());

    assert_eq!(count_direct_grants(&pool, user_id).await, 1);
    assert_eq!(stored_granted_by(&pool, user_id, permission_id).await, None);
}

#[tokio::test]
async fn role_assignment_round_trip_is_idempotent() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool.clone());
    let user_id = create_user(&pool).await;
    let role_id = create_role(&pool).await;

    let first = repository.insert_user_role(user_id, role_id, None).await;
    let second = repository.insert_user_role(user_id, role_id, None).await;
    assert!(first.is_ok());
    assert!(second.is_ok());

    let removed = repository.delete_user_role(user_id, role_id).await;
    assert_eq!(removed.ok(), Some(true));
    let removed_again = repository.delete_user_role(user_id, role_id).await;
    assert_eq!(removed_again.ok(), Some(false));
}
