//! Versioned object store for VBase.
//!
//! Objects are typed records stored one per row in a column-family table.
//! Each row keeps four cells that are always written together in one atomic
//! put: a version counter, the hash of the writer schema, the encoded
//! payload, and the payload's format tag.
//!
//! # Concurrency
//!
//! Every mutation funnels through one guarded write: "store these four cells
//! if the version cell still holds the version I read". Exactly one of any
//! set of writers presenting the same version wins. Higher-level operations
//! (`put`, `mutate`, `create`) loop on that primitive under a
//! [`RetryPolicy`], which is unbounded unless configured otherwise.
//!
//! # Keys
//!
//! New keys come from a [`KeyStrategy`]: random 64-bit keys retried on
//! collision, or sequential keys drawn from an atomic counter with their
//! decimal digits reversed so consecutive keys land far apart.
//!
//! # Modules
//!
//! - [`traits`] -- The [`ObjectStore`] capability trait
//! - [`versioned`] -- [`VersionedStore`], the substrate-backed implementation
//! - [`mutation`] -- [`Mutation`] / [`Mutated`] results of read-modify-write
//! - [`config`] -- [`StoreConfig`] and [`KeyStrategy`]
//! - [`retry`] -- [`RetryPolicy`] for optimistic retry loops
//! - [`keygen`] -- Key derivation for both strategies
//! - [`layout`] -- Column names and cell encodings

pub mod config;
pub mod error;
pub mod keygen;
pub mod layout;
pub mod mutation;
pub mod retry;
pub mod traits;
pub mod versioned;

pub use config::{KeyStrategy, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use mutation::{Mutated, Mutation};
pub use retry::{Retry, RetryPolicy};
pub use traits::{ObjectStore, RowIter};
pub use versioned::VersionedStore;
