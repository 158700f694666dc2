//! Update polling for the stdio host.
//!
//! A new version is whatever `version_tag` the configuration names when it
//! is re-read. There is no user to ask, so the reload prompt is answered
//! from configuration.

use std::sync::Arc;

use async_trait::async_trait;
use spritz_client::{Fetcher, OfflineWorker, ReloadPrompt, UpdateSource};
use spritz_core::{AppConfig, CacheStorage, ConfigError, Error};

type Loader = Box<dyn Fn() -> Result<AppConfig, ConfigError> + Send + Sync>;

/// Builds a worker whenever the configured version tag changes.
pub struct ConfigUpdateSource {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    loader: Loader,
}

impl ConfigUpdateSource {
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_loader(storage, fetcher, AppConfig::load)
    }

    pub fn with_loader(
        storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>,
        loader: impl Fn() -> Result<AppConfig, ConfigError> + Send + Sync + 'static,
    ) -> Self {
        Self { storage, fetcher, loader: Box::new(loader) }
    }
}

#[async_trait]
impl UpdateSource for ConfigUpdateSource {
    async fn poll(&self, current_version: &str) -> Result<Option<OfflineWorker>, Error> {
        let config = (self.loader)()?;
        if config.version_tag == current_version {
            return Ok(None);
        }
        tracing::info!(current = current_version, next = %config.version_tag, "configuration names a new version");
        Ok(Some(OfflineWorker::new(&config, self.storage.clone(), self.fetcher.clone())))
    }
}

/// Answers every reload prompt with a fixed value.
pub struct AutoReload {
    answer: bool,
}

impl AutoReload {
    pub fn new(answer: bool) -> Self {
        Self { answer }
    }
}

#[async_trait]
impl ReloadPrompt for AutoReload {
    async fn confirm(&self, message: &str) -> bool {
        tracing::info!(answer = self.answer, "{message}");
        self.answer
    }
}
