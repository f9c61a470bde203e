//! Structured errors for the lifecycle entry points.
//!
//! Strategies never return these: a routed request always yields a response.

use offcache_core::Error;

use crate::lifecycle::LifecycleState;

/// Errors surfaced to the host by `install`, `activate` and `handle_fetch`.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// A manifest entry could not be fetched or stored; the version must not activate.
    #[error("INSTALL_FAILED: {url}: {source}")]
    InstallFailed {
        url: String,
        #[source]
        source: Error,
    },

    /// An entry point was called out of lifecycle order.
    #[error("INVALID_STATE: expected {expected}, worker is {actual}")]
    InvalidState { expected: LifecycleState, actual: LifecycleState },

    /// Logging could not be initialised.
    #[error("TELEMETRY_INIT_FAILED: {0}")]
    Telemetry(String),

    #[error(transparent)]
    Core(#[from] Error),
}
