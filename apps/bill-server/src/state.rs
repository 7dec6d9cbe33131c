//! Shared application state and its construction from configuration.

use std::sync::Arc;

use tracing::info;

use billsplit_db::{Database, DbConfig};
use billsplit_ledger::config::CacheSettings;
use billsplit_ledger::{
    CacheBackend, CacheStore, GroupIdCache, JsonFileCacheStore, LedgerConfig, LedgerResult,
    MemberResolver, ReconciliationOrchestrator, SplitwiseClient, SqliteCacheStore,
};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: ReconciliationOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: ReconciliationOrchestrator) -> Self {
        AppState { orchestrator }
    }

    /// Wires the Splitwise client, cache store and orchestrator.
    pub async fn from_config(config: &LedgerConfig) -> LedgerResult<Self> {
        let client = Arc::new(SplitwiseClient::from_settings(&config.ledger)?);
        info!(api_base = %client.base_url(), "Splitwise client ready");

        let store = open_cache_store(&config.cache).await?;
        let cache = GroupIdCache::load(store).await?;

        let orchestrator = ReconciliationOrchestrator::new(
            MemberResolver::new(client.clone(), cache),
            client,
            config.ledger.capabilities(),
            config.reconcile.member_policy(),
        );

        Ok(AppState::new(orchestrator))
    }
}

/// Opens the configured cache backend.
pub async fn open_cache_store(settings: &CacheSettings) -> LedgerResult<Arc<dyn CacheStore>> {
    let path = settings.resolved_path();
    info!(backend = %settings.backend, path = %path.display(), "Opening group cache");

    let store: Arc<dyn CacheStore> = match settings.backend {
        CacheBackend::Json => Arc::new(JsonFileCacheStore::new(path)),
        CacheBackend::Sqlite => {
            let db = Database::new(DbConfig::new(path).max_connections(2)).await?;
            Arc::new(SqliteCacheStore::new(db))
        }
    };
    Ok(store)
}
