//! SQLite-backed named stores of request key → response snapshot.
//!
//! This module provides the persistent store substrate using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named stores, one per version tag
//! - SHA-256 hashed request keys
//! - Automatic schema migrations
//! - An optional byte quota across all stores

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheStorage;
pub use entries::CacheStore;
