//! Hashing primitives for VBase.
//!
//! Provides the domain-separated BLAKE3 hasher that derives a [`SchemaHash`]
//! from a canonical schema definition. Hashers are `const` values: there is
//! no shared mutable digest state, so they are safe to use from any thread.
//!
//! [`SchemaHash`]: vbase_types::SchemaHash

pub mod hasher;

pub use hasher::SchemaHasher;
