//! Foundation types for VBase.
//!
//! This crate provides the value types shared by every other VBase crate:
//! decoded rows, schema references, serialization format tags, and the key
//! abstraction used to address rows in the column-family substrate.
//!
//! # Key Types
//!
//! - [`Row`] -- Decoded object: payload, key, write timestamp, version
//! - [`SchemaHash`] -- Content digest referencing a registered schema
//! - [`Schema`] -- Canonicalized schema definition
//! - [`Format`] -- Per-row serialization format tag
//! - [`RowKey`] -- Conversion between typed keys and substrate row bytes
//! - [`Record`] -- Types that can be stored, bound to their writer schema

pub mod error;
pub mod format;
pub mod hash;
pub mod key;
pub mod record;
pub mod row;
pub mod schema;

pub use error::TypeError;
pub use format::Format;
pub use hash::SchemaHash;
pub use key::RowKey;
pub use record::Record;
pub use row::Row;
pub use schema::Schema;
