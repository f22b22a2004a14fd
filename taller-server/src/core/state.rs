use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::auth::{JwtService, hash_password};
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::access as access_repo;
use crate::utils::AppError;
use shared::models::{Role, SyncPayload};

/// Per-resource monotonic version counters.
///
/// Clients compare versions to decide when a cached collection list is
/// stale, instead of holding live store subscriptions.
#[derive(Debug)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// Increment a resource's version and return the new value
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }

    /// Snapshot of all counters, for the sync polling endpoint
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.versions
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }
}

impl Default for ResourceVersions {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared server state: configuration, pool, auth, sync channel.
///
/// Cheap to clone (Arc-backed); passed to every handler via axum state.
/// No module-level singletons — caches and notifications hang off this
/// struct explicitly.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub resource_versions: Arc<ResourceVersions>,
    sync_tx: broadcast::Sender<SyncPayload>,
}

impl ServerState {
    /// Initialize state: work dir, database (with migrations), JWT, sync
    /// channel, and the one-time admin seed.
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_dir().join("taller.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;

        let state = Self {
            config: config.clone(),
            pool: db_service.pool,
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
            resource_versions: Arc::new(ResourceVersions::new()),
            sync_tx: broadcast::channel(256).0,
        };

        state.seed_admin_if_empty().await?;

        Ok(state)
    }

    /// Build state over an existing pool (tests)
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            config,
            pool,
            jwt_service,
            resource_versions: Arc::new(ResourceVersions::new()),
            sync_tx: broadcast::channel(256).0,
        }
    }

    /// Seed the first admin from ADMIN_EMAIL/ADMIN_PASSWORD when the
    /// access list is empty. Without it the API is a locked door.
    async fn seed_admin_if_empty(&self) -> Result<(), AppError> {
        if access_repo::count(&self.pool).await? > 0 {
            return Ok(());
        }
        match (&self.config.admin_email, &self.config.admin_password) {
            (Some(email), Some(password)) => {
                let hash = hash_password(password)?;
                access_repo::create(&self.pool, email, Role::Admin, Some("Administrador"), &hash)
                    .await?;
                tracing::info!(email = %email, "Seeded initial admin access entry");
            }
            _ => {
                tracing::warn!(
                    "Access list is empty and ADMIN_EMAIL/ADMIN_PASSWORD are not set; nobody can log in"
                );
            }
        }
        Ok(())
    }

    /// Publish a change notification and bump the resource version
    pub fn broadcast_sync(&self, resource: &str, action: &str, id: &str) {
        let version = self.resource_versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action: action.to_string(),
            id: id.to_string(),
        };
        // Lagging or absent receivers are fine; versions remain the
        // source of truth for cache invalidation
        let _ = self.sync_tx.send(payload);
    }

    /// Subscribe to change notifications
    pub fn subscribe_sync(&self) -> broadcast::Receiver<SyncPayload> {
        self.sync_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[test]
    fn test_resource_versions_increment() {
        let versions = ResourceVersions::new();
        assert_eq!(versions.get("orders"), 0);
        assert_eq!(versions.increment("orders"), 1);
        assert_eq!(versions.increment("orders"), 2);
        assert_eq!(versions.increment("client"), 1);
        assert_eq!(versions.get("orders"), 2);

        let snapshot = versions.snapshot();
        assert_eq!(snapshot.get("orders"), Some(&2));
        assert_eq!(snapshot.get("client"), Some(&1));
    }

    #[tokio::test]
    async fn test_broadcast_sync_reaches_subscribers() {
        let pool = DbService::new_in_memory().await.expect("db").pool;
        let state = ServerState::with_pool(Config::with_overrides("./data-test", 0), pool);

        let mut rx = state.subscribe_sync();
        state.broadcast_sync("orders", "updated", "42");

        let payload = rx.try_recv().expect("payload");
        assert_eq!(payload.resource, "orders");
        assert_eq!(payload.action, "updated");
        assert_eq!(payload.id, "42");
        assert_eq!(payload.version, 1);
        assert_eq!(state.resource_versions.get("orders"), 1);
    }
}
