//! The worker lifecycle: install, activate, then intercept requests.
//!
//! Each host signal maps to one async entry point that must settle before
//! the next one may run:
//!
//! ```text
//! Parsed --install--> Installing --ok--> Installed --activate--> Activating --> Activated
//!                          \--err--> Redundant
//! ```
//!
//! Strict ordering keeps the reaper from running alongside the installer.
//!
//! Completed installs are recorded in storage, so a host restarting on the
//! same version installs without fetching and can activate while offline.

use std::fmt;
use std::sync::Arc;

use offcache_client::{FetchConfig, HttpTransport, Transport};
use offcache_core::{AssetManifest, CacheStorage, Request, Response, VersionTag, WorkerConfig};
use tokio::sync::Mutex;

use crate::WorkerError;
use crate::install::InstallController;
use crate::reaper::{GenerationReaper, ReapReport};
use crate::router::Router;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this version never activates.
    Redundant,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
            LifecycleState::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// One deployed version of the offline layer.
pub struct Worker {
    version: VersionTag,
    store_name: String,
    manifest: AssetManifest,
    installer: InstallController,
    reaper: GenerationReaper,
    router: Router,
    state: Mutex<LifecycleState>,
}

impl Worker {
    /// Build a worker for `config.version` over the given storage and transport.
    pub fn new(
        config: &WorkerConfig, storage: CacheStorage, transport: Arc<dyn Transport>,
    ) -> Result<Self, WorkerError> {
        let store_name = config.store_name();
        let router = Router::new(
            storage.store(&store_name),
            transport.clone(),
            config.index_key()?,
            config.offline_html.as_str(),
        );

        Ok(Self {
            version: config.version_tag(),
            manifest: config.asset_manifest()?,
            installer: InstallController::new(storage.clone(), transport),
            reaper: GenerationReaper::new(storage, config.store_prefix.clone()),
            router,
            store_name,
            state: Mutex::new(LifecycleState::Parsed),
        })
    }

    /// Open the configured database and HTTP transport and build a worker.
    pub async fn from_config(config: &WorkerConfig) -> Result<Self, WorkerError> {
        let storage = CacheStorage::open(&config.db_path)
            .await?
            .with_quota(config.quota_bytes);
        let transport = HttpTransport::new(FetchConfig::from(config))?;
        Self::new(config, storage, Arc::new(transport))
    }

    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    /// Handle the host's install signal: seed this version's store, unless
    /// an earlier run already did.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the worker is freshly parsed; `InstallFailed`
    /// (and the worker turns redundant) if any manifest entry fails.
    pub async fn install(&self) -> Result<(), WorkerError> {
        self.transition(LifecycleState::Parsed, LifecycleState::Installing).await?;

        let result = match self.installer.is_installed(&self.store_name).await {
            Ok(true) => {
                tracing::info!(version = %self.version, store = %self.store_name, "already installed; reusing store");
                Ok(())
            }
            Ok(false) => {
                tracing::info!(version = %self.version, store = %self.store_name, "installing");
                self.installer.install(&self.store_name, &self.manifest).await.map(|_| ())
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.set_state(LifecycleState::Installed).await;
                tracing::info!(version = %self.version, assets = self.manifest.len(), "installed");
                Ok(())
            }
            Err(e) => {
                self.set_state(LifecycleState::Redundant).await;
                tracing::error!(version = %self.version, error = %e, "install failed");
                Err(e)
            }
        }
    }

    /// Handle the host's activate signal: reap stale stores, then start serving.
    ///
    /// Stale-store deletion failures are reported, not raised.
    pub async fn activate(&self) -> Result<ReapReport, WorkerError> {
        self.transition(LifecycleState::Installed, LifecycleState::Activating).await?;

        let report = self.reaper.reap(&self.store_name).await;

        self.set_state(LifecycleState::Activated).await;
        tracing::info!(
            version = %self.version,
            reaped = report.deleted.len(),
            failed = report.failed.len(),
            "activated"
        );
        Ok(report)
    }

    /// Install then activate without waiting for the host in between.
    pub async fn start(&self) -> Result<ReapReport, WorkerError> {
        self.install().await?;
        self.activate().await
    }

    /// Handle the host's fetch signal for an intercepted request.
    ///
    /// # Errors
    ///
    /// Only `InvalidState` before activation; once active every request
    /// yields a response.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Response, WorkerError> {
        let state = self.state().await;
        if state != LifecycleState::Activated {
            return Err(WorkerError::InvalidState { expected: LifecycleState::Activated, actual: state });
        }
        Ok(self.router.dispatch(request).await)
    }

    async fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<(), WorkerError> {
        let mut state = self.state.lock().await;
        if *state != from {
            return Err(WorkerError::InvalidState { expected: from, actual: *state });
        }
        *state = to;
        Ok(())
    }

    async fn set_state(&self, to: LifecycleState) {
        *self.state.lock().await = to;
    }
}
