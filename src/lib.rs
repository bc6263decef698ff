//! Benchmark-harness adapter for Redis-compatible stores.
//!
//! Translates the fixed five-operation benchmark contract (read, insert,
//! update, delete, scan) into commands against a single-node or cluster
//! deployment. Each record is a Redis hash keyed by the record key; a single
//! well-known sorted set (`_indices`) maps a hash of every inserted key back
//! to the key so that scans can resolve an approximate key range.
//!
//! All protocol handling, pooling, and cluster topology management is
//! delegated to the [`redis`] crate. The adapter holds exactly one connection
//! handle for its lifetime and no other shared state, so operations may be
//! issued concurrently from multiple callers.

pub mod adapter;
pub mod config;
pub mod connection;
pub mod datalog;
pub mod error;
mod ops;
pub mod test_utils;

pub use adapter::StoreAdapter;
pub use config::AdapterConfig;
pub use connection::StoreConnection;
pub use datalog::DataLogger;
pub use error::{AdapterError, Result};
pub use ops::{key_score, FieldMap, INDEX_KEY};
