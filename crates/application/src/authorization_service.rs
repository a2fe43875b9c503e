use std::sync::Arc;

use async_trait::async_trait;
use portcullis_core::{AppError, AppResult};
use portcullis_domain::{Permission, PermissionName, Role, UserId};

/// Effective permission row resolved for one user.
///
/// The effective set is the union of direct grants and role-mediated
/// grants; rows are deduplicated by permission identity, so a permission
/// reachable through both paths appears once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermission {
    /// Globally unique permission name.
    pub name: PermissionName,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// Presentation grouping label.
    pub module: String,
}

/// Role assignment row resolved for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSummary {
    /// Globally unique role name.
    pub name: String,
    /// Optional human-readable description.
    pub description: Option<String>,
}

/// Repository port for permission and role lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists the effective permission set for a user, ordered by
    /// `(module, name)`. Unknown users yield an empty list.
    async fn list_effective_permissions(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<EffectivePermission>>;

    /// Lists the roles directly assigned to a user, ordered by name.
    /// Roles are never expanded into their permissions here.
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleSummary>>;

    /// Lists the full permission catalog, ordered by `(module, name)`.
    async fn list_all_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Lists the full role catalog, ordered by name.
    async fn list_all_roles(&self) -> AppResult<Vec<Role>>;

    /// Finds a catalog permission by its unique name.
    async fn find_permission_by_name(
        &self,
        name: &PermissionName,
    ) -> AppResult<Option<Permission>>;
}

/// Application service answering permission questions for users.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Returns whether the user currently holds the named permission
    /// through either grant path.
    ///
    /// Unknown users and unknown or malformed permission names answer
    /// `false`; only a failing store produces an error.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        permission_name: &str,
    ) -> AppResult<bool> {
        let permissions = self.repository.list_effective_permissions(user_id).await?;
        Ok(permissions
            .iter()
            .any(|permission| permission.name.as_str() == permission_name))
    }

    /// Ensures the user holds the named permission, failing closed.
    pub async fn require_permission(
        &self,
        user_id: UserId,
        permission_name: &str,
    ) -> AppResult<()> {
        if self.has_permission(user_id, permission_name).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{user_id}' is missing permission '{permission_name}'"
        )))
    }

    /// Returns the user's effective permission set, ordered by
    /// `(module, name)`.
    pub async fn effective_permissions(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<EffectivePermission>> {
        self.repository.list_effective_permissions(user_id).await
    }

    /// Returns the roles directly assigned to the user, ordered by name.
    pub async fn roles(&self, user_id: UserId) -> AppResult<Vec<RoleSummary>> {
        self.repository.list_roles_for_user(user_id).await
    }

    /// Returns the full permission catalog, ordered by `(module, name)`.
    pub async fn all_permissions(&self) -> AppResult<Vec<Permission>> {
        self.repository.list_all_permissions().await
    }

    /// Returns the full role catalog, ordered by name.
    pub async fn all_roles(&self) -> AppResult<Vec<Role>> {
        self.repository.list_all_roles().await
    }
}
