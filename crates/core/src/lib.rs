//! Core types and shared functionality for offcache.
//!
//! This crate provides:
//! - Request, request key and response snapshot types
//! - Version tags and the asset manifest
//! - Named cache stores with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod manifest;
pub mod request;
pub mod response;

pub use cache::{CacheStorage, CacheStore};
pub use config::{ConfigError, LogFormat, WorkerConfig};
pub use error::Error;
pub use manifest::{AssetManifest, DEFAULT_ASSETS, VersionTag};
pub use request::{Request, RequestKey, RequestMode};
pub use response::{OFFLINE_FALLBACK_HEADER, Response, ResponseSource, Snapshot, UNAVAILABLE_STATUS};
