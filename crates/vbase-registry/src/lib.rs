//! Schema registry for VBase.
//!
//! Every stored row carries the [`SchemaHash`] of the schema it was written
//! with instead of the schema itself. The registry maps hashes back to
//! definitions (and definitions to hashes), keeping a process-local cache in
//! front of a schema table in the substrate.
//!
//! # Design Rules
//!
//! 1. One definition has exactly one hash; the table never holds two
//!    definitions under the same hash.
//! 2. Registering the same schema concurrently writes it to the table at
//!    most once; registering different schemas never waits on each other.
//! 3. Locks guard only the in-memory maps, never a substrate round-trip,
//!    except the per-hash registration gate.
//! 4. Bytes fetched from the table are re-hashed before they are trusted.
//!
//! [`SchemaHash`]: vbase_types::SchemaHash

pub mod error;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use registry::{SchemaRegistry, DEFINITION_COLUMN, SCHEMA_FAMILY};
