use std::collections::HashSet;

use portcullis_core::AppResult;
use portcullis_domain::{MenuCatalog, MenuVisibility, UserId};

use crate::AuthorizationService;

/// Navigation item visible to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Stable entry key.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Icon class name.
    pub icon: String,
    /// Navigation target.
    pub target: String,
    /// Whether the entry is visible regardless of grants.
    pub always_visible: bool,
}

/// Application service deriving the visible navigation menu from the
/// effective permission set.
#[derive(Clone)]
pub struct MenuService {
    authorization: AuthorizationService,
    catalog: MenuCatalog,
}

impl MenuService {
    /// Creates a new menu service over an authorization service and a
    /// fixed menu catalog.
    #[must_use]
    pub fn new(authorization: AuthorizationService, catalog: MenuCatalog) -> Self {
        Self {
            authorization,
            catalog,
        }
    }

    /// Builds the menu visible to the user, preserving catalog order.
    ///
    /// The effective permission set is fetched once; an entry is included
    /// when it is always visible or its required permission is in the set.
    /// Pure derivation, no side effects.
    pub async fn build_menu(&self, user_id: UserId) -> AppResult<Vec<MenuItem>> {
        let permissions = self.authorization.effective_permissions(user_id).await?;
        let held: HashSet<&str> = permissions
            .iter()
            .map(|permission| permission.name.as_str())
            .collect();

        Ok(self
            .catalog
            .entries()
            .iter()
            .filter_map(|entry| {
                let always_visible = match entry.visibility() {
                    MenuVisibility::Always => true,
                    MenuVisibility::RequiresPermission(name) => {
                        if !held.contains(name.as_str()) {
                            return None;
                        }
                        false
                    }
                };

                Some(MenuItem {
                    key: entry.key().as_str().to_owned(),
                    title: entry.title().as_str().to_owned(),
                    icon: entry.icon().as_str().to_owned(),
                    target: entry.target().as_str().to_owned(),
                    always_visible,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use portcullis_core::AppResult;
    use portcullis_domain::{
        MenuCatalog, Permission, PermissionName, Role, UserId,
    };

    use crate::{
        AuthorizationRepository, AuthorizationService, EffectivePermission, RoleSummary,
    };

    use super::{MenuItem, MenuService};

    struct FakeAuthorizationRepository {
        grants: HashMap<UserId, Vec<&'static str>>,
    }

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_effective_permissions(
            &self,
            user_id: UserId,
        ) -> AppResult<Vec<EffectivePermission>> {
            let mut rows = Vec::new();
            for name in self.grants.get(&user_id).cloned().unwrap_or_default() {
                rows.push(EffectivePermission {
                    name: PermissionName::new(name)?,
                    description: None,
                    module: "tests".to_owned(),
                });
            }
            Ok(rows)
        }

        async fn list_roles_for_user(&self, _user_id: UserId) -> AppResult<Vec<RoleSummary>> {
            Ok(Vec::new())
        }

        async fn list_all_permissions(&self) -> AppResult<Vec<Permission>> {
            Ok(Vec::new())
        }

        async fn list_all_roles(&self) -> AppResult<Vec<Role>> {
            Ok(Vec::new())
        }

        async fn find_permission_by_name(
            &self,
            _name: &PermissionName,
        ) -> AppResult<Option<Permission>> {
            Ok(None)
        }
    }

    async fn build_menu_for(
        user_id: UserId,
        grants: Vec<&'static str>,
    ) -> AppResult<Vec<MenuItem>> {
        let authorization = AuthorizationService::new(Arc::new(FakeAuthorizationRepository {
            grants: HashMap::from([(user_id, grants)]),
        }));
        let service = MenuService::new(authorization, MenuCatalog::standard()?);
        service.build_menu(user_id).await
    }

    fn keys_of(menu: AppResult<Vec<MenuItem>>) -> Vec<String> {
        menu.map(|items| items.into_iter().map(|item| item.key).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn ungranted_user_sees_only_always_visible_entries() {
        let keys = keys_of(build_menu_for(UserId::new(), Vec::new()).await);
        assert_eq!(keys, ["dashboard", "support"]);
    }

    #[tokio::test]
    async fn report_viewer_sees_reports_between_fixed_entries() {
        let keys = keys_of(build_menu_for(UserId::new(), vec!["report_view"]).await);
        assert_eq!(keys, ["dashboard", "reports", "support"]);
    }

    #[tokio::test]
    async fn menu_preserves_catalog_order_over_grant_order() {
        let keys = keys_of(
            build_menu_for(UserId::new(), vec!["settings_view", "user_view"]).await,
        );
        assert_eq!(keys, ["dashboard", "users", "settings", "support"]);
    }

    #[tokio::test]
    async fn gated_entries_are_not_marked_always_visible() {
        let menu = build_menu_for(UserId::new(), vec!["tour_view"]).await;
        let flags: Vec<(String, bool)> = menu
            .map(|items| {
                items
                    .into_iter()
                    .map(|item| (item.key, item.always_visible))
                    .collect()
            })
            .unwrap_or_default();
        assert_eq!(
            flags,
            [
                ("dashboard".to_owned(), true),
                ("tours".to_owned(), false),
                ("support".to_owned(), true),
            ]
        );
    }

    #[tokio::test]
    async fn unrelated_grants_do_not_unlock_entries() {
        let keys = keys_of(build_menu_for(UserId::new(), vec!["system_logs"]).await);
        assert_eq!(keys, ["dashboard", "support"]);
    }
}
