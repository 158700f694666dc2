//! Install and activate transitions.
//!
//! Install must finish before activate starts; the state lock enforces the
//! order for a single worker. Neither step is rolled back on failure.

use super::{OfflineWorker, WorkerState};
use crate::fetch::{Request, resolve};
use spritz_core::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Seed paths stored in the static bucket.
    pub seeded: Vec<String>,
    /// Seed paths that could not be fetched or stored.
    pub failed: Vec<String>,
    /// Activate right away instead of waiting for the reload prompt.
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateOutcome {
    /// Buckets of earlier versions that were deleted.
    pub deleted: Vec<String>,
    /// Route every open session through this worker immediately.
    pub claim_clients: bool,
}

impl OfflineWorker {
    /// Create this version's buckets and seed the static bucket.
    ///
    /// Seed failures are logged and reported in the outcome; only failing
    /// to create a bucket fails the install.
    pub async fn on_install(&self) -> Result<InstallOutcome, Error> {
        {
            let mut state = self.state.write().await;
            if *state != WorkerState::Parsed {
                return Err(Error::Lifecycle(format!("cannot install worker {} while {}", self.version, *state)));
            }
            *state = WorkerState::Installing;
        }

        let outcome = self.install().await;
        let next = if outcome.is_ok() { WorkerState::Installed } else { WorkerState::Redundant };
        self.set_state(next).await;
        outcome
    }

    async fn install(&self) -> Result<InstallOutcome, Error> {
        let storage = self.storage();
        let static_bucket = self.buckets.static_assets.as_str();
        storage.open(static_bucket).await?;

        let mut seeded = Vec::new();
        let mut failed = Vec::new();
        for seed in &self.seed_assets {
            let result = match resolve(&self.origin, seed) {
                Ok(url) => self.engine.add(&Request::get(url), static_bucket).await,
                Err(e) => Err(Error::InvalidUrl(e.to_string())),
            };
            match result {
                Ok(()) => seeded.push(seed.clone()),
                Err(e) => {
                    tracing::warn!(seed, version = %self.version, error = %e, "failed to seed static bucket");
                    failed.push(seed.clone());
                }
            }
        }

        storage.open(&self.buckets.images).await?;
        storage.open(&self.buckets.fonts).await?;
        if let Some(runtime) = &self.buckets.runtime {
            storage.open(runtime).await?;
        }

        tracing::info!(
            version = %self.version,
            seeded = seeded.len(),
            failed = failed.len(),
            "worker installed"
        );
        Ok(InstallOutcome { seeded, failed, skip_waiting: self.skip_waiting })
    }

    /// Delete every bucket of this application that the current version
    /// does not own.
    pub async fn on_activate(&self) -> Result<ActivateOutcome, Error> {
        {
            let mut state = self.state.write().await;
            if *state != WorkerState::Installed {
                return Err(Error::Lifecycle(format!("cannot activate worker {} while {}", self.version, *state)));
            }
            *state = WorkerState::Activating;
        }

        match self.prune().await {
            Ok(deleted) => {
                self.set_state(WorkerState::Activated).await;
                tracing::info!(version = %self.version, deleted = ?deleted, "worker activated");
                Ok(ActivateOutcome { deleted, claim_clients: true })
            }
            Err(e) => {
                // installed buckets are intact, so activation may be retried
                self.set_state(WorkerState::Installed).await;
                Err(e)
            }
        }
    }

    async fn prune(&self) -> Result<Vec<String>, Error> {
        let storage = self.storage();
        let mut deleted = Vec::new();
        for name in storage.keys().await? {
            if self.buckets.is_owned(&name) && !self.buckets.is_current(&name) {
                storage.delete(&name).await?;
                tracing::debug!(bucket = %name, "deleted stale bucket");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Mark this worker as replaced. It keeps answering requests already
    /// handed to it.
    pub(crate) async fn retire(&self) {
        self.set_state(WorkerState::Redundant).await;
    }
}
