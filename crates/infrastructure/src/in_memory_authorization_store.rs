use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use portcullis_application::{
    AuthorizationRepository, EffectivePermission, GrantRepository, RoleSummary,
};
use portcullis_core::{AppError, AppResult};
use portcullis_domain::{Permission, PermissionId, PermissionName, Role, RoleId, UserId};

/// In-memory authorization store implementation.
///
/// Implements the lookup and mutation ports over shared state with the
/// same contract as the Postgres adapters: unique catalog names, grant
/// rows keyed by their composite identity, replayed inserts keeping the
/// original attribution, and removals cascading the way the schema's
/// foreign keys do.
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationStore {
    users: RwLock<HashSet<UserId>>,
    permissions: RwLock<HashMap<PermissionId, Permission>>,
    roles: RwLock<HashMap<RoleId, Role>>,
    user_permissions: RwLock<HashMap<(UserId, PermissionId), Option<UserId>>>,
    role_permissions: RwLock<HashSet<(RoleId, PermissionId)>>,
    user_roles: RwLock<HashMap<(UserId, RoleId), Option<UserId>>>,
}

impl InMemoryAuthorizationStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new principal and returns its identifier.
    pub async fn insert_user(&self) -> UserId {
        let user_id = UserId::new();
        self.users.write().await.insert(user_id);
        user_id
    }

    /// Adds a permission to the catalog.
    pub async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        let mut permissions = self.permissions.write().await;

        if permissions.contains_key(&permission.id())
            || permissions
                .values()
                .any(|existing| existing.name() == permission.name())
        {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists",
                permission.name()
            )));
        }

        permissions.insert(permission.id(), permission);
        Ok(())
    }

    /// Adds a role to the catalog.
    pub async fn insert_role(&self, role: Role) -> AppResult<()> {
        let mut roles = self.roles.write().await;

        if roles.contains_key(&role.id())
            || roles.values().any(|existing| existing.name() == role.name())
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name()
            )));
        }

        roles.insert(role.id(), role);
        Ok(())
    }

    /// Grants a permission to a role. Replays are no-ops.
    pub async fn insert_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        if !self.roles.read().await.contains_key(&role_id) {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found in the catalog"
            )));
        }

        if !self.permissions.read().await.contains_key(&permission_id) {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found in the catalog"
            )));
        }

        self.role_permissions
            .write()
            .await
            .insert((role_id, permission_id));
        Ok(())
    }

    /// Removes a principal, cascading its grant rows and nulling any
    /// attribution that pointed at it.
    pub async fn remove_user(&self, user_id: UserId) -> bool {
        if !self.users.write().await.remove(&user_id) {
            return false;
        }

        let mut user_permissions = self.user_permissions.write().await;
        user_permissions.retain(|(grant_user, _), _| grant_user != &user_id);
        for granted_by in user_permissions.values_mut() {
            if *granted_by == Some(user_id) {
                *granted_by = None;
            }
        }
        drop(user_permissions);

        let mut user_roles = self.user_roles.write().await;
        user_roles.retain(|(grant_user, _), _| grant_user != &user_id);
        for assigned_by in user_roles.values_mut() {
            if *assigned_by == Some(user_id) {
                *assigned_by = None;
            }
        }

        true
    }

    /// Removes a permission from the catalog, cascading its grant rows.
    pub async fn remove_permission(&self, permission_id: PermissionId) -> bool {
        if self.permissions.write().await.remove(&permission_id).is_none() {
            return false;
        }

        self.user_permissions
            .write()
            .await
            .retain(|(_, grant_permission), _| grant_permission != &permission_id);
        self.role_permissions
            .write()
            .await
            .retain(|(_, grant_permission)| grant_permission != &permission_id);

        true
    }

    /// Removes a role from the catalog, cascading its grant rows and
    /// assignments.
    pub async fn remove_role(&self, role_id: RoleId) -> bool {
        if self.roles.write().await.remove(&role_id).is_none() {
            return false;
        }

        self.role_permissions
            .write()
            .await
            .retain(|(grant_role, _)| grant_role != &role_id);
        self.user_roles
            .write()
            .await
            .retain(|(_, grant_role), _| grant_role != &role_id);

        true
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryAuthorizationStore {
    async fn list_effective_permissions(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<EffectivePermission>> {
        let mut granted: HashSet<PermissionId> = self
            .user_permissions
            .read()
            .await
            .keys()
            .filter_map(|(grant_user, permission)| {
                (grant_user == &user_id).then_some(*permission)
            })
            .collect();

        let assigned_roles: HashSet<RoleId> = self
            .user_roles
            .read()
            .await
            .keys()
            .filter_map(|(grant_user, role)| (grant_user == &user_id).then_some(*role))
            .collect();

        for (role_id, permission_id) in self.role_permissions.read().await.iter() {
            if assigned_roles.contains(role_id) {
                granted.insert(*permission_id);
            }
        }

        let permissions = self.permissions.read().await;
        let mut rows: Vec<EffectivePermission> = granted
            .into_iter()
            .filter_map(|permission_id| permissions.get(&permission_id))
            .map(|permission| EffectivePermission {
                name: permission.name().clone(),
                description: permission.description().map(ToOwned::to_owned),
                module: permission.module().as_str().to_owned(),
            })
            .collect();

        rows.sort_by(|left, right| {
            (left.module.as_str(), left.name.as_str())
                .cmp(&(right.module.as_str(), right.name.as_str()))
        });

        Ok(rows)
    }

    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleSummary>> {
        let assigned_roles: HashSet<RoleId> = self
            .user_roles
            .read()
            .await
            .keys()
            .filter_map(|(grant_user, role)| (grant_user == &user_id).then_some(*role))
            .collect();

        let roles = self.roles.read().await;
        let mut rows: Vec<RoleSummary> = assigned_roles
            .into_iter()
            .filter_map(|role_id| roles.get(&role_id))
            .map(|role| RoleSummary {
                name: role.name().as_str().to_owned(),
                description: role.description().map(ToOwned::to_owned),
            })
            .collect();

        rows.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(rows)
    }

    async fn list_all_permissions(&self) -> AppResult<Vec<Permission>> {
        let mut values: Vec<Permission> = self.permissions.read().await.values().cloned().collect();
        values.sort_by(|left, right| {
            (left.module().as_str(), left.name().as_str())
                .cmp(&(right.module().as_str(), right.name().as_str()))
        });
        Ok(values)
    }

    async fn list_all_roles(&self) -> AppResult<Vec<Role>> {
        let mut values: Vec<Role> = self.roles.read().await.values().cloned().collect();
        values.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(values)
    }

    async fn find_permission_by_name(
        &self,
        name: &PermissionName,
    ) -> AppResult<Option<Permission>> {
        Ok(self
            .permissions
            .read()
            .await
            .values()
            .find(|permission| permission.name() == name)
            .cloned())
    }
}

#[async_trait]
impl GrantRepository for InMemoryAuthorizationStore {
    async fn insert_user_permission(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
        granted_by: Option<UserId>,
    ) -> AppResult<()> {
        if !self.users.read().await.contains(&user_id)
            || !self.permissions.read().await.contains_key(&permission_id)
        {
            return Err(AppError::NotFound(
                "permission grant references a user or catalog entry that does not exist"
                    .to_owned(),
            ));
        }

        self.user_permissions
            .write()
            .await
            .entry((user_id, permission_id))
            .or_insert(granted_by);
        Ok(())
    }

    async fn delete_user_permission(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        Ok(self
            .user_permissions
            .write()
            .await
            .remove(&(user_id, permission_id))
            .is_some())
    }

    async fn insert_user_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        assigned_by: Option<UserId>,
    ) -> AppResult<()> {
        if !self.users.read().await.contains(&user_id)
            || !self.roles.read().await.contains_key(&role_id)
        {
            return Err(AppError::NotFound(
                "role grant references a user or catalog entry that does not exist".to_owned(),
            ));
        }

        self.user_roles
            .write()
            .await
            .entry((user_id, role_id))
            .or_insert(assigned_by);
        Ok(())
    }

    async fn delete_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<bool> {
        Ok(self
            .user_roles
            .write()
            .await
            .remove(&(user_id, role_id))
            .is_some())
    }
}
