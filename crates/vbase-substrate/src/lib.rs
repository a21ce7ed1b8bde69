//! Column-family substrate for VBase.
//!
//! VBase persists objects in a sparse, sorted, column-family table store in
//! the style of Bigtable. This crate defines the narrow contract the object
//! store relies on and nothing more:
//!
//! - point get / put / delete addressed by row, family, and qualifier, with a
//!   timestamp dimension on every cell
//! - half-open range scans over row keys
//! - atomic increment of a single counter cell
//! - atomic compare-and-swap put guarded by one cell's current value
//! - table administration: create a table, add a column family
//!
//! # Backends
//!
//! - [`InMemoryColumnStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Handles
//!
//! Table handles are checked out of a [`TablePool`] and returned when the
//! [`PooledTable`] guard drops, so every exit path releases the handle.

pub mod cell;
pub mod descriptor;
pub mod error;
pub mod memory;
pub mod pool;
pub mod traits;

pub use cell::{CasOutcome, Cell, Put, RowResult, Scan};
pub use descriptor::{FamilyDescriptor, TableDescriptor};
pub use error::{SubstrateError, SubstrateResult};
pub use memory::{InMemoryColumnStore, InMemoryTable};
pub use pool::{PooledScanner, PooledTable, TablePool};
pub use traits::{ColumnAdmin, ColumnTable, Scanner};
