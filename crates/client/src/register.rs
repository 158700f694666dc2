//! Worker registration and update notification.
//!
//! A [`Registration`] owns the worker that currently controls requests.
//! A newly installed worker takes control at once unless its configuration
//! asks it to wait for the reload prompt, in which case it is kept as the
//! waiting worker until the user confirms. The first worker registered is
//! always activated since nothing is controlling requests yet.

use crate::fetch::{FetchError, Fetcher, Request, Response};
use crate::worker::OfflineWorker;
use async_trait::async_trait;
use serde::Serialize;
use spritz_core::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Question asked when a new version is ready.
pub const UPDATE_PROMPT: &str = "A new version of the app is available. Reload to update?";

/// Where newer worker versions come from.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Return a worker for a version newer than `current_version`, if any.
    async fn poll(&self, current_version: &str) -> Result<Option<OfflineWorker>, Error>;
}

/// Yes/no confirmation shown to the user.
#[async_trait]
pub trait ReloadPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// No new version.
    UpToDate,
    /// A new version is installed and waits for the user.
    Waiting { version: String },
    /// A new version took control. `pruned` lists deleted buckets and
    /// `reload` whether the host was told to reload.
    Activated { version: String, pruned: Vec<String>, reload: bool },
}

pub struct Registration {
    fetcher: Arc<dyn Fetcher>,
    controller: RwLock<Option<Arc<OfflineWorker>>>,
    waiting: RwLock<Option<Arc<OfflineWorker>>>,
}

impl Registration {
    /// `fetcher` serves requests that no worker intercepts.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher, controller: RwLock::new(None), waiting: RwLock::new(None) }
    }

    /// Install `worker` and activate it, unless it must wait for
    /// [`Registration::reload`] while another worker is in control.
    ///
    /// The controller lock is held from the decision until the swap, so
    /// concurrent registrations never both take control of an empty slot.
    pub async fn register(&self, worker: OfflineWorker) -> Result<UpdateOutcome, Error> {
        let worker = Arc::new(worker);
        let install = worker.on_install().await?;

        let mut controller = self.controller.write().await;
        if controller.is_none() || install.skip_waiting {
            let outcome = Self::promote(&mut controller, worker, false).await?;
            if let Some(stale) = self.waiting.write().await.take() {
                tracing::debug!(version = stale.version(), "discarding waiting worker of an older version");
                stale.retire().await;
            }
            return Ok(outcome);
        }

        let version = worker.version().to_string();
        if let Some(previous) = self.waiting.write().await.replace(worker) {
            tracing::debug!(version = previous.version(), "discarding superseded waiting worker");
            previous.retire().await;
        }
        tracing::info!(version, "new version waiting");
        Ok(UpdateOutcome::Waiting { version })
    }

    /// Answer a request through the controlling worker, or natively when
    /// there is none or the request is not intercepted.
    pub async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let controller = self.controller.read().await.clone();
        if let Some(worker) = controller
            && let Some(response) = worker.on_request(request).await
        {
            return Ok(response);
        }
        self.fetcher.fetch(request).await
    }

    /// Run one update check.
    ///
    /// A version that took control is announced through `prompt`; the
    /// answer only decides whether the host reloads. A worker left waiting
    /// by an earlier declined prompt is offered again.
    pub async fn update(&self, source: &dyn UpdateSource, prompt: &dyn ReloadPrompt) -> Result<UpdateOutcome, Error> {
        let active = self.active_version().await;
        let known = match self.waiting_version().await {
            Some(version) => Some(version),
            None => active.clone(),
        };

        if let Some(worker) = source.poll(known.as_deref().unwrap_or_default()).await?
            && let UpdateOutcome::Activated { version, pruned, .. } = self.register(worker).await?
        {
            let reload = active.is_some() && prompt.confirm(UPDATE_PROMPT).await;
            if !reload {
                tracing::info!(version, "new version active, host not reloaded");
            }
            return Ok(UpdateOutcome::Activated { version, pruned, reload });
        }

        let Some(version) = self.waiting_version().await else {
            return Ok(UpdateOutcome::UpToDate);
        };

        if prompt.confirm(UPDATE_PROMPT).await {
            self.reload().await
        } else {
            tracing::info!(version, "reload declined");
            Ok(UpdateOutcome::Waiting { version })
        }
    }

    /// Activate the waiting worker and make it the controller.
    pub async fn reload(&self) -> Result<UpdateOutcome, Error> {
        let mut controller = self.controller.write().await;
        let Some(worker) = self.waiting.write().await.take() else {
            return Ok(UpdateOutcome::UpToDate);
        };
        Self::promote(&mut controller, worker, true).await
    }

    /// Drop every worker. Requests then go to the network untouched.
    ///
    /// Returns false when nothing was registered. Buckets are kept.
    pub async fn unregister(&self) -> bool {
        let controller = self.controller.write().await.take();
        let waiting = self.waiting.write().await.take();
        let found = controller.is_some() || waiting.is_some();
        for worker in controller.into_iter().chain(waiting) {
            worker.retire().await;
        }
        found
    }

    pub async fn active(&self) -> Option<Arc<OfflineWorker>> {
        self.controller.read().await.clone()
    }

    pub async fn active_version(&self) -> Option<String> {
        self.controller.read().await.as_ref().map(|w| w.version().to_string())
    }

    pub async fn waiting_version(&self) -> Option<String> {
        self.waiting.read().await.as_ref().map(|w| w.version().to_string())
    }

    /// Check for updates every `period`, starting one period from now.
    pub fn spawn_update_loop(
        self: Arc<Self>, period: Duration, source: Arc<dyn UpdateSource>, prompt: Arc<dyn ReloadPrompt>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match self.update(source.as_ref(), prompt.as_ref()).await {
                    Ok(outcome) => tracing::debug!(?outcome, "update check complete"),
                    Err(e) => tracing::warn!(error = %e, "update check failed"),
                }
            }
        })
    }

    /// Activate `worker` and swap it into `controller`, which the caller
    /// holds locked.
    async fn promote(
        controller: &mut Option<Arc<OfflineWorker>>, worker: Arc<OfflineWorker>, reload: bool,
    ) -> Result<UpdateOutcome, Error> {
        let activated = worker.on_activate().await?;
        let version = worker.version().to_string();

        if activated.claim_clients
            && let Some(previous) = controller.replace(worker)
        {
            previous.retire().await;
        }

        tracing::info!(version, pruned = activated.deleted.len(), "worker controls requests");
        Ok(UpdateOutcome::Activated { version, pruned: activated.deleted, reload })
    }
}
