//! The offline caching worker.
//!
//! An [`OfflineWorker`] is one deployed version of the interception
//! boundary. Hosts drive it through three entry points:
//!
//! - `on_install`: create this version's buckets and seed the static one
//! - `on_activate`: delete buckets left behind by earlier versions
//! - `on_request`: classify a request and answer it through a strategy
//!
//! `on_request` returning `None` means the request is not intercepted and
//! should go to the network untouched.

mod buckets;
mod classify;
mod lifecycle;
mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use buckets::{BucketCategory, BucketNames};
pub use classify::{AssetClass, Classifier};
pub use lifecycle::{ActivateOutcome, InstallOutcome};
pub use strategy::{CONTENT_OFFLINE_BODY, IMAGE_OFFLINE_BODY, OFFLINE_BODY, Strategy, StrategyEngine};

use crate::fetch::{Fetcher, Request, Response};
use spritz_core::{AppConfig, CacheStorage};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Where a worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Replaced by a newer version or unregistered.
    Redundant,
}

impl WorkerState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy and the bucket it runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route<'a> {
    pub class: AssetClass,
    pub strategy: Strategy,
    pub bucket: &'a str,
}

pub struct OfflineWorker {
    version: String,
    origin: String,
    seed_assets: Vec<String>,
    skip_waiting: bool,
    buckets: BucketNames,
    classifier: Classifier,
    engine: StrategyEngine,
    state: RwLock<WorkerState>,
}

impl fmt::Debug for OfflineWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfflineWorker")
            .field("version", &self.version)
            .field("origin", &self.origin)
            .field("buckets", &self.buckets)
            .finish_non_exhaustive()
    }
}

impl OfflineWorker {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            version: config.version_tag.clone(),
            origin: config.origin.clone(),
            seed_assets: config.seed_assets.clone(),
            skip_waiting: !config.wait_for_reload,
            buckets: BucketNames::new(&config.cache_prefix, &config.version_tag, config.dedicated_runtime_bucket),
            classifier: Classifier::from_config(config),
            engine: StrategyEngine::new(storage, fetcher),
            state: RwLock::new(WorkerState::Parsed),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn buckets(&self) -> &BucketNames {
        &self.buckets
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        self.engine.storage()
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Strategy and bucket for a request, or `None` to skip it.
    pub fn route(&self, request: &Request) -> Option<Route<'_>> {
        let class = self.classifier.classify(&request.method, &request.url)?;
        let (strategy, bucket) = match class {
            AssetClass::Static => (Strategy::CacheFirst, self.buckets.static_assets.as_str()),
            AssetClass::Image => (Strategy::StaleWhileRevalidate, self.buckets.images.as_str()),
            AssetClass::Font => (Strategy::CacheFirst, self.buckets.fonts.as_str()),
            AssetClass::Other => (Strategy::NetworkFirst, self.buckets.network_first()),
        };
        Some(Route { class, strategy, bucket })
    }

    /// Answer an intercepted request, or `None` when it is not intercepted.
    pub async fn on_request(&self, request: &Request) -> Option<Response> {
        let route = self.route(request)?;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            class = ?route.class,
            strategy = route.strategy.as_str(),
            bucket = route.bucket,
            "intercepted request"
        );
        Some(self.engine.run(route.strategy, request, route.bucket).await)
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
    }
}
