//! Client code for offcache.
//!
//! This crate provides the network transport the caching strategies fetch
//! through: a `Transport` trait and its reqwest-backed implementation.

pub mod fetch;

pub use fetch::{FetchConfig, HttpTransport, Transport};
