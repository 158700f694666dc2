//! Shared state behind every tool call.

use std::sync::Arc;

use spritz_client::{Fetcher, OfflineWorker, Registration, ReloadPrompt, UpdateSource};
use spritz_core::{AppConfig, CacheDb, CacheStorage, MemoryStorage, RecordStore};

use crate::update::{AutoReload, ConfigUpdateSource};

pub struct ServerContext {
    pub config: AppConfig,
    pub storage: Arc<dyn CacheStorage>,
    pub registration: Arc<Registration>,
    pub records: RecordStore,
    pub updates: Arc<dyn UpdateSource>,
    pub prompt: Arc<dyn ReloadPrompt>,
}

impl ServerContext {
    /// Open the stores named by `config` and wire the update machinery.
    ///
    /// The bucket store and the record store share one SQLite file, or
    /// both live in memory when `db_path` is `:memory:`.
    pub async fn open(config: AppConfig, fetcher: Arc<dyn Fetcher>) -> anyhow::Result<Self> {
        let db = if config.in_memory() {
            CacheDb::open_in_memory().await?
        } else {
            CacheDb::open(&config.db_path).await?
        };
        let storage: Arc<dyn CacheStorage> =
            if config.in_memory() { Arc::new(MemoryStorage::new()) } else { Arc::new(db.clone()) };

        let updates = Arc::new(ConfigUpdateSource::new(storage.clone(), fetcher.clone()));
        let prompt = Arc::new(AutoReload::new(config.auto_reload));
        Ok(Self::new(config, storage, RecordStore::new(db), fetcher, updates, prompt))
    }

    pub fn new(
        config: AppConfig, storage: Arc<dyn CacheStorage>, records: RecordStore, fetcher: Arc<dyn Fetcher>,
        updates: Arc<dyn UpdateSource>, prompt: Arc<dyn ReloadPrompt>,
    ) -> Self {
        Self { config, storage, registration: Arc::new(Registration::new(fetcher)), records, updates, prompt }
    }

    /// Register the worker for the configured version.
    pub async fn register_worker(&self, fetcher: Arc<dyn Fetcher>) {
        let worker = OfflineWorker::new(&self.config, self.storage.clone(), fetcher);
        match self.registration.register(worker).await {
            Ok(outcome) => tracing::info!(?outcome, "worker registered"),
            Err(e) => tracing::error!(error = %e, "worker registration failed, requests pass through"),
        }
    }

    /// Start periodic update checks.
    pub fn spawn_updates(&self) -> tokio::task::JoinHandle<()> {
        self.registration
            .clone()
            .spawn_update_loop(self.config.update_interval(), self.updates.clone(), self.prompt.clone())
    }
}
