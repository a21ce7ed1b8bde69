//! Search indexing for VBase.
//!
//! [`IndexedStore`] wraps any [`ObjectStore`](vbase_store::ObjectStore) and
//! keeps a [`SearchIndex`] in sync with it. The store is always written
//! first; the index is only touched once the store confirms the write. A
//! failed index update after a committed write surfaces as
//! [`StoreError::PartialIndexFailure`](vbase_store::StoreError::PartialIndexFailure).
//!
//! Searches re-fetch every hit from the store, so index entries left behind
//! by an interrupted delete never show up in results.
//!
//! # Key Types
//!
//! - [`SearchIndex`] -- The index collaborator contract
//! - [`IndexedStore`] -- The indexing decorator
//! - [`InMemoryIndex`] -- A term index kept in memory
//! - [`TermQuery`] -- Exact-match query on one extracted field

pub mod error;
pub mod indexed;
pub mod memory;
pub mod traits;

pub use error::{IndexError, IndexResult};
pub use indexed::IndexedStore;
pub use memory::{InMemoryIndex, TermQuery};
pub use traits::SearchIndex;
