//! In-memory store implementation.
//!
//! Intended for tests/dev wiring. Mutations validate everything up front and
//! only then touch state, so the atomicity contract holds without a real
//! transaction log.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use concours_auth::{PermissionName, Principal, PrincipalDirectory, RoleGrant, RoleName, StoreUnavailable};
use concours_core::{PermissionId, RoleId, UserId};

use crate::error::StoreError;
use crate::records::{PermissionRecord, RoleDetail, RoleRecord, UserAccount};
use crate::store::RolePermissionStore;

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserAccount>,
    roles: HashMap<RoleId, RoleRecord>,
    permissions: HashMap<PermissionId, PermissionRecord>,
    role_permissions: HashSet<(RoleId, PermissionId)>,
    user_roles: HashSet<(UserId, RoleId)>,
}

impl State {
    fn permission_id_by_name(&self, name: &PermissionName) -> Option<PermissionId> {
        // Linear scan; the catalog stays small.
        self.permissions
            .values()
            .find(|p| p.name == *name)
            .map(|p| p.id)
    }

    fn role_permission_names(&self, role_id: RoleId) -> Vec<PermissionName> {
        let mut names: Vec<PermissionName> = self
            .role_permissions
            .iter()
            .filter(|(r, _)| *r == role_id)
            .filter_map(|(_, p)| self.permissions.get(p).map(|rec| rec.name.clone()))
            .collect();
        names.sort();
        names
    }

    fn role_detail(&self, record: &RoleRecord) -> RoleDetail {
        RoleDetail {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            created_at: record.created_at,
            permissions: self.role_permission_names(record.id),
        }
    }
}

/// In-memory role/permission store.
#[derive(Debug, Default)]
pub struct InMemoryAuthStore {
    state: RwLock<State>,
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user row.
    ///
    /// Account provisioning lives outside the authorization layer; this is
    /// the seam tests and dev wiring use to stand in for it.
    pub fn put_user(&self, user: UserAccount) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        state.users.insert(user.id, user);
        Ok(())
    }
}

#[async_trait]
impl RolePermissionStore for InMemoryAuthStore {
    async fn create_role(
        &self,
        name: RoleName,
        description: Option<String>,
    ) -> Result<RoleRecord, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if state.roles.values().any(|r| r.name == name) {
            return Err(StoreError::RoleExists(name.as_str().to_string()));
        }

        let record = RoleRecord {
            id: RoleId::new(),
            name,
            description,
            created_at: chrono::Utc::now(),
        };
        state.roles.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete_role(&self, role_id: RoleId) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if state.roles.remove(&role_id).is_none() {
            return Err(StoreError::UnknownRole(role_id));
        }
        state.role_permissions.retain(|(r, _)| *r != role_id);
        state.user_roles.retain(|(_, r)| *r != role_id);
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<RoleDetail>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let mut details: Vec<RoleDetail> =
            state.roles.values().map(|r| state.role_detail(r)).collect();
        details.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(details)
    }

    async fn get_role(&self, role_id: RoleId) -> Result<RoleDetail, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let record = state
            .roles
            .get(&role_id)
            .ok_or(StoreError::UnknownRole(role_id))?;
        Ok(state.role_detail(record))
    }

    async fn create_permission(
        &self,
        name: PermissionName,
        description: Option<String>,
    ) -> Result<PermissionRecord, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if state.permissions.values().any(|p| p.name == name) {
            return Err(StoreError::PermissionExists(name.as_str().to_string()));
        }

        let record = PermissionRecord {
            id: PermissionId::new(),
            name,
            description,
        };
        state.permissions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let mut records: Vec<PermissionRecord> = state.permissions.values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    async fn assign_permissions(
        &self,
        role_id: RoleId,
        permissions: &[PermissionName],
    ) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if !state.roles.contains_key(&role_id) {
            return Err(StoreError::UnknownRole(role_id));
        }

        // Resolve every name before mutating anything; one unknown name
        // aborts the whole replacement.
        let mut resolved: HashSet<PermissionId> = HashSet::with_capacity(permissions.len());
        for name in permissions {
            let id = state
                .permission_id_by_name(name)
                .ok_or_else(|| StoreError::UnknownPermission(name.as_str().to_string()))?;
            resolved.insert(id);
        }

        state.role_permissions.retain(|(r, _)| *r != role_id);
        for permission_id in resolved {
            state.role_permissions.insert((role_id, permission_id));
        }
        Ok(())
    }

    async fn grant_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if !state.users.contains_key(&user_id) {
            return Err(StoreError::UnknownUser(user_id));
        }
        if !state.roles.contains_key(&role_id) {
            return Err(StoreError::UnknownRole(role_id));
        }

        // HashSet insert makes a repeated grant a no-op.
        state.user_roles.insert((user_id, role_id));
        Ok(())
    }

    async fn revoke_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        state.user_roles.remove(&(user_id, role_id));
        Ok(())
    }

    async fn list_effective_permissions(
        &self,
        user_id: UserId,
    ) -> Result<HashSet<PermissionName>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if !state.users.contains_key(&user_id) {
            return Err(StoreError::UnknownUser(user_id));
        }

        let held: HashSet<RoleId> = state
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, r)| *r)
            .collect();

        Ok(state
            .role_permissions
            .iter()
            .filter(|(r, _)| held.contains(r))
            .filter_map(|(_, p)| state.permissions.get(p).map(|rec| rec.name.clone()))
            .collect())
    }
}

#[async_trait]
impl PrincipalDirectory for InMemoryAuthStore {
    async fn lookup_principal(
        &self,
        user_id: UserId,
    ) -> Result<Option<Principal>, StoreUnavailable> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreUnavailable("lock poisoned".to_string()))?;

        let Some(user) = state.users.get(&user_id) else {
            return Ok(None);
        };

        let mut grants: Vec<RoleGrant> = state
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, role_id)| {
                state.roles.get(role_id).map(|role| {
                    RoleGrant::new(role.name.clone(), state.role_permission_names(*role_id))
                })
            })
            .collect();
        // Sorted so identical stored data always yields an identical principal.
        grants.sort_by(|a, b| a.role.cmp(&b.role));

        Ok(Some(Principal {
            user_id: user.id,
            account_type: user.account_type,
            verified: user.verified,
            grants,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concours_core::AccountType;

    fn name(s: &'static str) -> PermissionName {
        PermissionName::new(s)
    }

    async fn store_with_catalog(names: &[&'static str]) -> InMemoryAuthStore {
        let store = InMemoryAuthStore::new();
        for n in names {
            store.create_permission(name(n), None).await.unwrap();
        }
        store
    }

    fn user(account_type: AccountType, verified: bool) -> UserAccount {
        UserAccount {
            id: UserId::new(),
            account_type,
            verified,
        }
    }

    #[tokio::test]
    async fn create_role_rejects_duplicate_names() {
        let store = InMemoryAuthStore::new();
        store
            .create_role(RoleName::new("EDITOR"), None)
            .await
            .unwrap();
        let err = store
            .create_role(RoleName::new("EDITOR"), Some("again".into()))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::RoleExists("EDITOR".to_string()));
    }

    #[tokio::test]
    async fn create_permission_rejects_duplicate_names() {
        let store = store_with_catalog(&["creer_role"]).await;
        let err = store
            .create_permission(name("creer_role"), None)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::PermissionExists("creer_role".to_string()));
    }

    #[tokio::test]
    async fn assign_permissions_replaces_the_whole_set() {
        let store = store_with_catalog(&["a", "b", "c"]).await;
        let role = store
            .create_role(RoleName::new("EDITOR"), None)
            .await
            .unwrap();

        store
            .assign_permissions(role.id, &[name("a"), name("b")])
            .await
            .unwrap();
        store
            .assign_permissions(role.id, &[name("b"), name("c")])
            .await
            .unwrap();

        let detail = store.get_role(role.id).await.unwrap();
        assert_eq!(detail.permissions, vec![name("b"), name("c")]);
    }

    #[tokio::test]
    async fn assign_permissions_with_empty_set_clears_the_role() {
        let store = store_with_catalog(&["a"]).await;
        let role = store
            .create_role(RoleName::new("EDITOR"), None)
            .await
            .unwrap();

        store.assign_permissions(role.id, &[name("a")]).await.unwrap();
        store.assign_permissions(role.id, &[]).await.unwrap();

        let detail = store.get_role(role.id).await.unwrap();
        assert!(detail.permissions.is_empty());
    }

    #[tokio::test]
    async fn assign_permissions_collapses_duplicate_input() {
        let store = store_with_catalog(&["a"]).await;
        let role = store
            .create_role(RoleName::new("EDITOR"), None)
            .await
            .unwrap();

        store
            .assign_permissions(role.id, &[name("a"), name("a"), name("a")])
            .await
            .unwrap();

        let detail = store.get_role(role.id).await.unwrap();
        assert_eq!(detail.permissions, vec![name("a")]);
    }

    #[tokio::test]
    async fn assign_permissions_rejects_unknown_names_atomically() {
        let store = store_with_catalog(&["a", "b"]).await;
        let role = store
            .create_role(RoleName::new("EDITOR"), None)
            .await
            .unwrap();
        store.assign_permissions(role.id, &[name("a")]).await.unwrap();

        let err = store
            .assign_permissions(role.id, &[name("b"), name("fantome")])
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownPermission("fantome".to_string()));

        // The failed replacement must not have touched the previous set.
        let detail = store.get_role(role.id).await.unwrap();
        assert_eq!(detail.permissions, vec![name("a")]);
    }

    #[tokio::test]
    async fn assign_permissions_requires_an_existing_role() {
        let store = store_with_catalog(&["a"]).await;
        let missing = RoleId::new();
        let err = store
            .assign_permissions(missing, &[name("a")])
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownRole(missing));
    }

    #[tokio::test]
    async fn grant_role_is_idempotent() {
        let store = store_with_catalog(&["a"]).await;
        let u = user(AccountType::Admin, true);
        store.put_user(u.clone()).unwrap();
        let role = store
            .create_role(RoleName::new("EDITOR"), None)
            .await
            .unwrap();
        store.assign_permissions(role.id, &[name("a")]).await.unwrap();

        store.grant_role(u.id, role.id).await.unwrap();
        store.grant_role(u.id, role.id).await.unwrap();

        let effective = store.list_effective_permissions(u.id).await.unwrap();
        assert_eq!(effective, HashSet::from([name("a")]));

        let principal = store.lookup_principal(u.id).await.unwrap().unwrap();
        assert_eq!(principal.grants.len(), 1);
    }

    #[tokio::test]
    async fn grant_role_checks_both_sides_of_the_association() {
        let store = InMemoryAuthStore::new();
        let u = user(AccountType::Admin, true);
        store.put_user(u.clone()).unwrap();
        let role = store
            .create_role(RoleName::new("EDITOR"), None)
            .await
            .unwrap();

        let ghost_user = UserId::new();
        assert_eq!(
            store.grant_role(ghost_user, role.id).await.unwrap_err(),
            StoreError::UnknownUser(ghost_user)
        );

        let ghost_role = RoleId::new();
        assert_eq!(
            store.grant_role(u.id, ghost_role).await.unwrap_err(),
            StoreError::UnknownRole(ghost_role)
        );
    }

    #[tokio::test]
    async fn revoke_of_an_unheld_role_is_a_noop() {
        let store = InMemoryAuthStore::new();
        let u = user(AccountType::Admin, true);
        store.put_user(u.clone()).unwrap();
        let role = store
            .create_role(RoleName::new("EDITOR"), None)
            .await
            .unwrap();

        store.revoke_role(u.id, role.id).await.unwrap();
        store.revoke_role(u.id, RoleId::new()).await.unwrap();
    }

    #[tokio::test]
    async fn revoked_role_stops_contributing_permissions() {
        let store = store_with_catalog(&["a", "b"]).await;
        let u = user(AccountType::Admin, true);
        store.put_user(u.clone()).unwrap();

        let editor = store
            .create_role(RoleName::new("EDITOR"), None)
            .await
            .unwrap();
        let viewer = store
            .create_role(RoleName::new("VIEWER"), None)
            .await
            .unwrap();
        store.assign_permissions(editor.id, &[name("a")]).await.unwrap();
        store.assign_permissions(viewer.id, &[name("b")]).await.unwrap();
        store.grant_role(u.id, editor.id).await.unwrap();
        store.grant_role(u.id, viewer.id).await.unwrap();

        store.revoke_role(u.id, editor.id).await.unwrap();

        let effective = store.list_effective_permissions(u.id).await.unwrap();
        assert_eq!(effective, HashSet::from([name("b")]));
    }

    #[tokio::test]
    async fn effective_permissions_union_across_roles() {
        let store = store_with_catalog(&["a", "b", "c"]).await;
        let u = user(AccountType::Admin, true);
        store.put_user(u.clone()).unwrap();

        let first = store
            .create_role(RoleName::new("FIRST"), None)
            .await
            .unwrap();
        let second = store
            .create_role(RoleName::new("SECOND"), None)
            .await
            .unwrap();
        store
            .assign_permissions(first.id, &[name("a"), name("b")])
            .await
            .unwrap();
        store
            .assign_permissions(second.id, &[name("b"), name("c")])
            .await
            .unwrap();
        store.grant_role(u.id, first.id).await.unwrap();
        store.grant_role(u.id, second.id).await.unwrap();

        let effective = store.list_effective_permissions(u.id).await.unwrap();
        assert_eq!(effective, HashSet::from([name("a"), name("b"), name("c")]));
    }

    #[tokio::test]
    async fn roleless_user_has_empty_effective_permissions() {
        let store = InMemoryAuthStore::new();
        let u = user(AccountType::Candidate, true);
        store.put_user(u.clone()).unwrap();

        let effective = store.list_effective_permissions(u.id).await.unwrap();
        assert!(effective.is_empty());
    }

    #[tokio::test]
    async fn effective_permissions_require_a_known_user() {
        let store = InMemoryAuthStore::new();
        let ghost = UserId::new();
        assert_eq!(
            store.list_effective_permissions(ghost).await.unwrap_err(),
            StoreError::UnknownUser(ghost)
        );
    }

    #[tokio::test]
    async fn delete_role_cascades_to_assignments_and_grants() {
        let store = store_with_catalog(&["a"]).await;
        let u = user(AccountType::Admin, true);
        store.put_user(u.clone()).unwrap();
        let role = store
            .create_role(RoleName::new("EDITOR"), None)
            .await
            .unwrap();
        store.assign_permissions(role.id, &[name("a")]).await.unwrap();
        store.grant_role(u.id, role.id).await.unwrap();

        store.delete_role(role.id).await.unwrap();

        assert!(store.list_roles().await.unwrap().is_empty());
        assert!(store
            .list_effective_permissions(u.id)
            .await
            .unwrap()
            .is_empty());
        let principal = store.lookup_principal(u.id).await.unwrap().unwrap();
        assert!(principal.grants.is_empty());
    }

    #[tokio::test]
    async fn delete_role_requires_an_existing_role() {
        let store = InMemoryAuthStore::new();
        let ghost = RoleId::new();
        assert_eq!(
            store.delete_role(ghost).await.unwrap_err(),
            StoreError::UnknownRole(ghost)
        );
    }

    #[tokio::test]
    async fn lookup_principal_returns_none_for_unknown_users() {
        let store = InMemoryAuthStore::new();
        assert_eq!(store.lookup_principal(UserId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn lookup_principal_is_deterministic() {
        let store = store_with_catalog(&["x", "y"]).await;
        let u = user(AccountType::Admin, true);
        store.put_user(u.clone()).unwrap();

        // Insert in non-alphabetical order; the principal must come back
        // sorted either way.
        let zulu = store.create_role(RoleName::new("ZULU"), None).await.unwrap();
        let alpha = store
            .create_role(RoleName::new("ALPHA"), None)
            .await
            .unwrap();
        store.assign_permissions(zulu.id, &[name("y"), name("x")]).await.unwrap();
        store.grant_role(u.id, zulu.id).await.unwrap();
        store.grant_role(u.id, alpha.id).await.unwrap();

        let first = store.lookup_principal(u.id).await.unwrap().unwrap();
        let second = store.lookup_principal(u.id).await.unwrap().unwrap();
        assert_eq!(first, second);

        let roles: Vec<&str> = first.role_names().map(|r| r.as_str()).collect();
        assert_eq!(roles, vec!["ALPHA", "ZULU"]);
        assert_eq!(first.grants[1].permissions, vec![name("x"), name("y")]);
    }

    #[tokio::test]
    async fn lookup_principal_carries_the_verified_flag_untouched() {
        let store = InMemoryAuthStore::new();
        let u = user(AccountType::Candidate, false);
        store.put_user(u.clone()).unwrap();

        let principal = store.lookup_principal(u.id).await.unwrap().unwrap();
        assert!(!principal.verified);
    }
}
