use vbase_codec::CodecError;
use vbase_registry::RegistryError;
use vbase_substrate::SubstrateError;
use vbase_types::{SchemaHash, TypeError};

/// Errors from object store operations.
///
/// A missing row is not an error: reads return `Ok(None)`. A failed version
/// guard is not an error either: `put_versioned` returns `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A row references a schema that is not registered anywhere.
    #[error("schema not found: {0}")]
    SchemaNotFound(SchemaHash),

    /// Any other schema registry failure.
    #[error("schema registry error: {0}")]
    Registry(RegistryError),

    /// The substrate failed to serve a read, write, or admin call.
    #[error("substrate error: {0}")]
    Substrate(#[from] SubstrateError),

    /// The payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A key or schema could not be parsed.
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// A stored row is missing cells or holds malformed ones.
    #[error("corrupt row {key}: {reason}")]
    CorruptRow { key: String, reason: String },

    /// A row was written with a format this build cannot read.
    #[error("unknown format tag: {0}")]
    UnknownFormat(u32),

    /// An optimistic retry loop used up its configured attempts.
    #[error("{operation} gave up after {attempts} attempts")]
    RetryBudgetExhausted {
        operation: &'static str,
        attempts: u32,
    },

    /// The store committed the write but the index update failed. The
    /// object is stored but may not be searchable until it is re-indexed.
    #[error("stored {key} but indexing failed: {reason}")]
    PartialIndexFailure { key: String, reason: String },

    /// The store configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<RegistryError> for StoreError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::SchemaNotFound(hash) => Self::SchemaNotFound(hash),
            RegistryError::Substrate(e) => Self::Substrate(e),
            other => Self::Registry(other),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
