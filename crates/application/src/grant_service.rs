use std::sync::Arc;

use async_trait::async_trait;
use portcullis_core::AppResult;
use portcullis_domain::{PermissionId, PermissionName, RoleId, UserId};

use crate::AuthorizationRepository;

/// Direction of a single requested grant change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantAction {
    /// Grant the permission directly to the user.
    Assign,
    /// Remove the user's direct grant of the permission.
    Revoke,
}

/// Single requested change of a user's direct permission grants,
/// addressed by permission name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionChange {
    /// Permission name as submitted by the caller; resolved against the
    /// catalog before anything is written.
    pub name: String,
    /// Requested direction.
    pub action: GrantAction,
}

/// Outcome counters for a batch of permission changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Changes applied to the store, including already-satisfied ones.
    pub success_count: usize,
    /// Changes skipped because their name did not resolve to a catalog
    /// permission.
    pub error_count: usize,
}

/// Repository port for grant mutation.
///
/// Implementations must make inserts single-statement upsert-or-ignore
/// (never read-check-then-insert) so concurrent duplicate grants collapse
/// to one row, and deletes must treat removing nothing as success.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Grants a permission directly to a user. Replaying an existing
    /// grant is a no-op that keeps the original grant row.
    async fn insert_user_permission(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
        granted_by: Option<UserId>,
    ) -> AppResult<()>;

    /// Removes a user's direct permission grant, reporting whether a row
    /// was removed.
    async fn delete_user_permission(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
    ) -> AppResult<bool>;

    /// Assigns a role to a user. Replaying an existing assignment is a
    /// no-op that keeps the original assignment row.
    async fn insert_user_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        assigned_by: Option<UserId>,
    ) -> AppResult<()>;

    /// Removes a user's role assignment, reporting whether a row was
    /// removed.
    async fn delete_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<bool>;
}

/// Application service mutating grant relations.
///
/// Every mutation threads the acting user explicitly; there is no ambient
/// session state. All operations are idempotent: the postcondition is a
/// state, not an event.
#[derive(Clone)]
pub struct GrantService {
    grants: Arc<dyn GrantRepository>,
    catalog: Arc<dyn AuthorizationRepository>,
}

impl GrantService {
    /// Creates a new grant service from repository implementations.
    #[must_use]
    pub fn new(
        grants: Arc<dyn GrantRepository>,
        catalog: Arc<dyn AuthorizationRepository>,
    ) -> Self {
        Self { grants, catalog }
    }

    /// Grants a permission directly to a user, recording the acting user
    /// as attribution.
    pub async fn assign_permission(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
        acting_user_id: UserId,
    ) -> AppResult<()> {
        self.grants
            .insert_user_permission(user_id, permission_id, Some(acting_user_id))
            .await
    }

    /// Removes a user's direct permission grant. An absent grant is an
    /// already-satisfied postcondition, not an error.
    pub async fn revoke_permission(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.grants
            .delete_user_permission(user_id, permission_id)
            .await?;
        Ok(())
    }

    /// Assigns a role to a user, recording the acting user as attribution.
    pub async fn assign_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        acting_user_id: UserId,
    ) -> AppResult<()> {
        self.grants
            .insert_user_role(user_id, role_id, Some(acting_user_id))
            .await
    }

    /// Removes a user's role assignment. An absent assignment is an
    /// already-satisfied postcondition, not an error.
    pub async fn revoke_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.grants.delete_user_role(user_id, role_id).await?;
        Ok(())
    }

    /// Applies a list of permission changes for one user strictly in list
    /// order.
    ///
    /// Each name is resolved against the catalog first; malformed or
    /// unknown names increment `error_count` and never abort the batch.
    /// A failing store aborts the whole call, leaving already-applied
    /// items in place. Replaying the same batch converges on the same
    /// final state.
    pub async fn batch_apply_permissions(
        &self,
        user_id: UserId,
        changes: Vec<PermissionChange>,
        acting_user_id: UserId,
    ) -> AppResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();

        for change in changes {
            let Ok(name) = PermissionName::new(change.name.as_str()) else {
                outcome.error_count += 1;
                continue;
            };

            let Some(permission) = self.catalog.find_permission_by_name(&name).await? else {
                outcome.error_count += 1;
                continue;
            };

            match change.action {
                GrantAction::Assign => {
                    self.grants
                        .insert_user_permission(user_id, permission.id(), Some(acting_user_id))
                        .await?;
                }
                GrantAction::Revoke => {
                    self.grants
                        .delete_user_permission(user_id, permission.id())
                        .await?;
                }
            }

            outcome.success_count += 1;
        }

        Ok(outcome)
    }
}
