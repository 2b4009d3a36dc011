use common::{OrderId, Version};
use thiserror::Error;

/// Errors that can occur when talking to a store, cache, catalog or
/// publisher.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A conditional write found the record at a different version.
    #[error("Version conflict for order {order_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// A stored record could not be turned back into a domain value.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// The backend could not be reached or refused the call.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
