use vbase_substrate::SubstrateError;
use vbase_types::{SchemaHash, TypeError};

/// Errors from schema registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No schema is registered under this hash, locally or remotely.
    #[error("schema not found: {0}")]
    SchemaNotFound(SchemaHash),

    /// The stored definition does not hash to the key it is stored under.
    #[error("schema hash mismatch: stored under {expected}, computed {computed}")]
    HashMismatch {
        expected: SchemaHash,
        computed: SchemaHash,
    },

    /// A stored definition or key could not be parsed.
    #[error("invalid schema entry: {0}")]
    Type(#[from] TypeError),

    /// The schema table could not be read or written.
    #[error("substrate error: {0}")]
    Substrate(#[from] SubstrateError),

    /// The in-memory cache lock was poisoned.
    #[error("schema cache lock poisoned")]
    LockPoisoned,
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
