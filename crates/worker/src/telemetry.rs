//! Logging initialisation for hosts embedding the worker.
//!
//! Logs go to stderr; verbosity comes from `RUST_LOG`.

use offcache_core::LogFormat;
use tracing_subscriber::EnvFilter;

use crate::WorkerError;

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns `WorkerError::Telemetry` if a global subscriber is already set.
pub fn init(format: LogFormat) -> Result<(), WorkerError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| WorkerError::Telemetry(e.to_string()))
}
