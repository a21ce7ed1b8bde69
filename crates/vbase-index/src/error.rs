//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The index backend rejected an operation.
    #[error("index backend error: {0}")]
    Backend(String),

    /// Store operation failed while resolving search hits.
    #[error("store error: {0}")]
    Store(#[from] vbase_store::StoreError),

    /// An index lock was poisoned by a panicking thread.
    #[error("index lock poisoned")]
    LockPoisoned,
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
