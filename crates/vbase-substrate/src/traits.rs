use std::sync::Arc;

use crate::cell::{CasOutcome, Put, RowResult, Scan};
use crate::descriptor::{FamilyDescriptor, TableDescriptor};
use crate::error::SubstrateResult;

/// A single-pass iterator over scanned rows.
pub type Scanner = Box<dyn Iterator<Item = SubstrateResult<RowResult>> + Send>;

/// Handle to one table of a column-family store.
///
/// All implementations must satisfy these invariants:
/// - A `put` applies all of its cells atomically; a concurrent `get` of the
///   same row observes either none or all of them.
/// - `check_and_put` evaluates its guard and applies the put as one atomic
///   step. Of two guarded writes racing on the same expected value, at most
///   one is applied.
/// - Every applied write is stamped with a timestamp strictly greater than
///   any earlier write to the same table.
/// - All I/O errors are propagated, never silently ignored.
pub trait ColumnTable: Send + Sync {
    /// The table name.
    fn name(&self) -> &str;

    /// The column families currently defined on the table.
    fn families(&self) -> SubstrateResult<Vec<FamilyDescriptor>>;

    /// Read the named qualifiers of `family` for `row`.
    ///
    /// An empty `qualifiers` slice reads every column of the family. A
    /// missing row yields an empty [`RowResult`], not an error.
    fn get(&self, row: &[u8], family: &str, qualifiers: &[&str]) -> SubstrateResult<RowResult>;

    /// Apply every cell of `put` atomically. Returns the write timestamp.
    fn put(&self, put: &Put) -> SubstrateResult<i64>;

    /// Apply `put` only if the cell `(family, qualifier)` of the put's row
    /// currently equals `expected`. `expected = None` means "the cell must
    /// be absent".
    fn check_and_put(
        &self,
        family: &str,
        qualifier: &str,
        expected: Option<&[u8]>,
        put: &Put,
    ) -> SubstrateResult<CasOutcome>;

    /// Remove every cell of `family` from `row`.
    fn delete_family(&self, row: &[u8], family: &str) -> SubstrateResult<()>;

    /// Atomically add `amount` to an 8-byte big-endian counter cell and
    /// return the new value. A missing cell counts from zero.
    fn increment(
        &self,
        row: &[u8],
        family: &str,
        qualifier: &str,
        amount: i64,
    ) -> SubstrateResult<i64>;

    /// Open a range scan. Rows with no cells in the scanned family are
    /// skipped.
    fn scan(&self, scan: &Scan) -> SubstrateResult<Scanner>;

    /// Returns `true` if the table defines `family`.
    fn has_family(&self, family: &str) -> SubstrateResult<bool> {
        Ok(self.families()?.iter().any(|f| f.name == family))
    }
}

/// Table administration for a column-family store.
pub trait ColumnAdmin: Send + Sync {
    /// Returns `true` if the table exists.
    fn table_exists(&self, name: &str) -> SubstrateResult<bool>;

    /// Create a table. Fails with `TableExists` if it is already there.
    fn create_table(&self, descriptor: &TableDescriptor) -> SubstrateResult<()>;

    /// Add a column family to an existing table. Adding a family that is
    /// already present is a no-op.
    fn add_family(&self, table: &str, family: &FamilyDescriptor) -> SubstrateResult<()>;

    /// Open a new handle on an existing table.
    fn open_table(&self, name: &str) -> SubstrateResult<Arc<dyn ColumnTable>>;

    /// Create the table if it is missing and add any missing families.
    ///
    /// Returns `true` if the table was created.
    fn ensure_table(&self, descriptor: &TableDescriptor) -> SubstrateResult<bool> {
        if !self.table_exists(&descriptor.name)? {
            self.create_table(descriptor)?;
            return Ok(true);
        }
        let table = self.open_table(&descriptor.name)?;
        for family in &descriptor.families {
            if !table.has_family(&family.name)? {
                tracing::info!(table = %descriptor.name, family = %family.name, "adding column family");
                self.add_family(&descriptor.name, family)?;
            }
        }
        Ok(false)
    }
}
