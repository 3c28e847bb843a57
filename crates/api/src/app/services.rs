//! Service wiring (store, resolver, operation registry).

use std::sync::Arc;

use sqlx::PgPool;

use concours_auth::{Hs256JwtValidator, IdentityResolver, PrincipalDirectory};
use concours_core::{AccountType, UserId};
use concours_store::{
    InMemoryAuthStore, PostgresAuthStore, RolePermissionStore, StoreError, UserAccount,
};

use crate::registry::OperationRegistry;

/// Long-lived services shared by every handler.
pub struct AppServices {
    pub registry: OperationRegistry,
    pub store: Arc<dyn RolePermissionStore>,
    pub resolver: Arc<IdentityResolver>,
}

impl AppServices {
    /// Wire services around any store that can also act as the resolver's
    /// principal directory. Both ports are served by the same instance so
    /// grants read by the resolver and grants mutated by the admin surface
    /// can never diverge.
    pub fn new<S>(jwt_secret: &str, store: Arc<S>) -> Self
    where
        S: RolePermissionStore + PrincipalDirectory + 'static,
    {
        let validator = Arc::new(Hs256JwtValidator::new(jwt_secret.as_bytes().to_vec()));
        let directory: Arc<dyn PrincipalDirectory> = store.clone();
        let resolver = Arc::new(IdentityResolver::new(validator, directory));

        Self {
            registry: OperationRegistry::with_default_policy(),
            store,
            resolver,
        }
    }
}

/// Production wiring: Postgres-backed store.
pub async fn build_postgres_services(
    jwt_secret: &str,
    database_url: &str,
) -> anyhow::Result<Arc<AppServices>> {
    let pool = PgPool::connect(database_url).await?;
    let store = Arc::new(PostgresAuthStore::new(pool));
    Ok(Arc::new(AppServices::new(jwt_secret, store)))
}

/// Dev wiring: in-memory store seeded with the permission catalog and one
/// superadmin account (its id is logged so a token can be minted for it).
pub async fn build_dev_services(jwt_secret: &str) -> anyhow::Result<Arc<AppServices>> {
    let store = Arc::new(InMemoryAuthStore::new());

    let superadmin = UserId::new();
    store.put_user(UserAccount {
        id: superadmin,
        account_type: AccountType::Superadmin,
        verified: true,
    })?;
    tracing::info!(user_id = %superadmin, "seeded dev superadmin");

    let services = Arc::new(AppServices::new(jwt_secret, store));
    seed_permission_catalog(services.as_ref()).await?;
    Ok(services)
}

/// Create a catalog entry for every permission the default policy mentions.
///
/// Idempotent: already-existing names are skipped, so re-running the wiring
/// against a shared store is harmless.
pub async fn seed_permission_catalog(services: &AppServices) -> Result<(), StoreError> {
    for (_, required) in services.registry.entries() {
        for permission in required {
            match services
                .store
                .create_permission(permission.clone(), None)
                .await
            {
                Ok(_) | Err(StoreError::PermissionExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}
