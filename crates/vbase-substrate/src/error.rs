/// Errors from substrate operations.
#[derive(Debug, thiserror::Error)]
pub enum SubstrateError {
    /// The named table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// A table with this name already exists.
    #[error("table already exists: {0}")]
    TableExists(String),

    /// A write or read named a column family the table does not have.
    #[error("no such column family {family} in table {table}")]
    NoSuchFamily { table: String, family: String },

    /// A counter cell holds something other than an 8-byte integer.
    #[error("invalid counter at row {row}: {reason}")]
    InvalidCounter { row: String, reason: String },

    /// An internal lock was poisoned by a panicking writer.
    #[error("substrate lock poisoned")]
    LockPoisoned,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for substrate operations.
pub type SubstrateResult<T> = Result<T, SubstrateError>;
