//! Offline-availability worker for offcache.
//!
//! Embeds in a host that delivers three lifecycle signals, each mapped to
//! an async entry point on [`Worker`]:
//!
//! - `install`: seed the version's store from the asset manifest
//! - `activate`: delete stores left by older versions
//! - `handle_fetch`: route an intercepted request to network-first
//!   (navigations) or cache-first with background revalidation (the rest)

pub mod error;
pub mod install;
pub mod lifecycle;
pub mod reaper;
pub mod router;
pub mod strategy;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use error::WorkerError;
pub use install::InstallController;
pub use lifecycle::{LifecycleState, Worker};
pub use reaper::{GenerationReaper, ReapReport};
pub use router::{Route, Router};
pub use strategy::{CacheFirst, NetworkFirst};
