use thiserror::Error;

/// Errors surfaced by the adapter.
///
/// Only two kinds matter to callers: `Connection` is fatal and can only occur
/// during [`StoreAdapter::connect`](crate::StoreAdapter::connect); everything
/// else is a per-operation failure reported to the caller and never escalated.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The store was unreachable or authentication failed at startup.
    #[error("store connection failed: {0}")]
    Connection(#[source] redis::RedisError),

    /// A store-level error during read/insert/update/delete/scan.
    #[error("store operation failed: {0}")]
    Operation(#[source] redis::RedisError),

    /// A read resolved no fields at all for the key.
    #[error("no fields returned for key {key:?}")]
    EmptyRecord { key: String },

    /// Both the record removal and the index removal reported zero effect.
    #[error("delete of {key:?} removed nothing")]
    DeleteMiss { key: String },

    /// A malformed property value or config file.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Writing the binary operation log failed.
    #[error("operation log I/O failed: {0}")]
    DataLog(#[from] std::io::Error),

    /// Encoding a record for the operation log failed.
    #[error("operation log encoding failed: {0}")]
    DataLogEncode(#[from] bincode::Error),
}

pub type Result<T, E = AdapterError> = std::result::Result<T, E>;
