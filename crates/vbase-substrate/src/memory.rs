use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::cell::{CasOutcome, Cell, Put, RowResult, Scan};
use crate::descriptor::{FamilyDescriptor, TableDescriptor};
use crate::error::{SubstrateError, SubstrateResult};
use crate::traits::{ColumnAdmin, ColumnTable, Scanner};

type Columns = BTreeMap<(String, String), Vec<Cell>>;

/// In-memory column-family store.
///
/// Intended for tests and embedding. Each table keeps its rows in a
/// `BTreeMap` behind a `RwLock`, so scans come out in row-key byte order and
/// every mutation is atomic with respect to every read.
pub struct InMemoryColumnStore {
    tables: RwLock<HashMap<String, Arc<InMemoryTable>>>,
}

impl InMemoryColumnStore {
    /// Create a new store with no tables.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// The concrete handle for a table, if it exists.
    pub fn table(&self, name: &str) -> Option<Arc<InMemoryTable>> {
        self.tables.read().ok()?.get(name).cloned()
    }

    /// Names of all tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.tables.read() {
            Ok(tables) => tables.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

impl Default for InMemoryColumnStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryColumnStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryColumnStore")
            .field("tables", &self.table_names())
            .finish()
    }
}

impl ColumnAdmin for InMemoryColumnStore {
    fn table_exists(&self, name: &str) -> SubstrateResult<bool> {
        let tables = self.tables.read().map_err(|_| SubstrateError::LockPoisoned)?;
        Ok(tables.contains_key(name))
    }

    fn create_table(&self, descriptor: &TableDescriptor) -> SubstrateResult<()> {
        let mut tables = self.tables.write().map_err(|_| SubstrateError::LockPoisoned)?;
        if tables.contains_key(&descriptor.name) {
            return Err(SubstrateError::TableExists(descriptor.name.clone()));
        }
        tables.insert(
            descriptor.name.clone(),
            Arc::new(InMemoryTable::new(descriptor)),
        );
        info!(table = %descriptor.name, families = descriptor.families.len(), "created table");
        Ok(())
    }

    fn add_family(&self, table: &str, family: &FamilyDescriptor) -> SubstrateResult<()> {
        let handle = self
            .table(table)
            .ok_or_else(|| SubstrateError::TableNotFound(table.to_string()))?;
        let mut state = handle.state.write().map_err(|_| SubstrateError::LockPoisoned)?;
        state
            .families
            .entry(family.name.clone())
            .or_insert_with(|| family.clone());
        Ok(())
    }

    fn open_table(&self, name: &str) -> SubstrateResult<Arc<dyn ColumnTable>> {
        let handle = self
            .table(name)
            .ok_or_else(|| SubstrateError::TableNotFound(name.to_string()))?;
        Ok(handle as Arc<dyn ColumnTable>)
    }
}

struct TableState {
    families: BTreeMap<String, FamilyDescriptor>,
    rows: BTreeMap<Vec<u8>, Columns>,
    last_timestamp: i64,
}

impl TableState {
    /// Next write timestamp: wall clock, bumped past the previous stamp.
    fn stamp(&mut self) -> i64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        self.last_timestamp = wall.max(self.last_timestamp + 1);
        self.last_timestamp
    }

    fn check_family(&self, table: &str, family: &str) -> SubstrateResult<u32> {
        self.families
            .get(family)
            .map(|f| f.max_versions)
            .ok_or_else(|| SubstrateError::NoSuchFamily {
                table: table.to_string(),
                family: family.to_string(),
            })
    }

    fn apply(&mut self, table: &str, put: &Put) -> SubstrateResult<i64> {
        // Validate everything before touching the row so a bad family leaves
        // no partial write behind.
        let mut limits = Vec::new();
        for (family, _, _) in put.cells() {
            limits.push(self.check_family(table, family)?);
        }
        let timestamp = self.stamp();
        let columns = self.rows.entry(put.row().to_vec()).or_default();
        for ((family, qualifier, value), max_versions) in put.cells().zip(limits) {
            let cells = columns
                .entry((family.to_string(), qualifier.to_string()))
                .or_default();
            cells.insert(0, Cell::new(timestamp, value.to_vec()));
            cells.truncate(max_versions as usize);
        }
        Ok(timestamp)
    }

    fn current(&self, row: &[u8], family: &str, qualifier: &str) -> Option<&Cell> {
        self.rows
            .get(row)?
            .get(&(family.to_string(), qualifier.to_string()))?
            .first()
    }

    fn project(row: &[u8], columns: &Columns, family: &str, qualifiers: &[&str]) -> RowResult {
        columns
            .iter()
            .filter(|((f, q), _)| {
                f == family && (qualifiers.is_empty() || qualifiers.contains(&q.as_str()))
            })
            .fold(RowResult::new(row.to_vec()), |result, ((f, q), cells)| {
                result.with_cells(f.clone(), q.clone(), cells.clone())
            })
    }
}

/// One table of an [`InMemoryColumnStore`].
pub struct InMemoryTable {
    name: String,
    state: RwLock<TableState>,
    writes: AtomicU64,
}

impl InMemoryTable {
    fn new(descriptor: &TableDescriptor) -> Self {
        let families = descriptor
            .families
            .iter()
            .map(|f| (f.name.clone(), f.clone()))
            .collect();
        Self {
            name: descriptor.name.clone(),
            state: RwLock::new(TableState {
                families,
                rows: BTreeMap::new(),
                last_timestamp: 0,
            }),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of mutations applied to this table (puts, applied guarded
    /// puts, deletes, increments).
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of rows holding at least one cell.
    pub fn row_count(&self) -> usize {
        self.state.read().map(|s| s.rows.len()).unwrap_or(0)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for InMemoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTable")
            .field("name", &self.name)
            .field("row_count", &self.row_count())
            .field("write_count", &self.write_count())
            .finish()
    }
}

impl ColumnTable for InMemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn families(&self) -> SubstrateResult<Vec<FamilyDescriptor>> {
        let state = self.state.read().map_err(|_| SubstrateError::LockPoisoned)?;
        Ok(state.families.values().cloned().collect())
    }

    fn get(&self, row: &[u8], family: &str, qualifiers: &[&str]) -> SubstrateResult<RowResult> {
        let state = self.state.read().map_err(|_| SubstrateError::LockPoisoned)?;
        state.check_family(&self.name, family)?;
        Ok(match state.rows.get(row) {
            Some(columns) => TableState::project(row, columns, family, qualifiers),
            None => RowResult::new(row.to_vec()),
        })
    }

    fn put(&self, put: &Put) -> SubstrateResult<i64> {
        let mut state = self.state.write().map_err(|_| SubstrateError::LockPoisoned)?;
        let timestamp = state.apply(&self.name, put)?;
        self.record_write();
        Ok(timestamp)
    }

    fn check_and_put(
        &self,
        family: &str,
        qualifier: &str,
        expected: Option<&[u8]>,
        put: &Put,
    ) -> SubstrateResult<CasOutcome> {
        let mut state = self.state.write().map_err(|_| SubstrateError::LockPoisoned)?;
        state.check_family(&self.name, family)?;
        let current = state
            .current(put.row(), family, qualifier)
            .map(|c| c.value.as_slice());
        if current != expected {
            debug!(table = %self.name, qualifier, "guarded put rejected");
            return Ok(CasOutcome::Rejected);
        }
        let timestamp = state.apply(&self.name, put)?;
        self.record_write();
        Ok(CasOutcome::Applied { timestamp })
    }

    fn delete_family(&self, row: &[u8], family: &str) -> SubstrateResult<()> {
        let mut state = self.state.write().map_err(|_| SubstrateError::LockPoisoned)?;
        state.check_family(&self.name, family)?;
        if let Some(columns) = state.rows.get_mut(row) {
            columns.retain(|(f, _), _| f != family);
            if columns.is_empty() {
                state.rows.remove(row);
            }
        }
        self.record_write();
        Ok(())
    }

    fn increment(
        &self,
        row: &[u8],
        family: &str,
        qualifier: &str,
        amount: i64,
    ) -> SubstrateResult<i64> {
        let mut state = self.state.write().map_err(|_| SubstrateError::LockPoisoned)?;
        state.check_family(&self.name, family)?;
        let current = match state.current(row, family, qualifier) {
            None => 0,
            Some(cell) => {
                let bytes: [u8; 8] = cell.value.as_slice().try_into().map_err(|_| {
                    SubstrateError::InvalidCounter {
                        row: String::from_utf8_lossy(row).into_owned(),
                        reason: format!("expected 8 bytes, found {}", cell.value.len()),
                    }
                })?;
                i64::from_be_bytes(bytes)
            }
        };
        let next = current.wrapping_add(amount);
        let put = Put::new(row.to_vec()).add(family, qualifier, next.to_be_bytes().to_vec());
        state.apply(&self.name, &put)?;
        self.record_write();
        Ok(next)
    }

    fn scan(&self, scan: &Scan) -> SubstrateResult<Scanner> {
        let state = self.state.read().map_err(|_| SubstrateError::LockPoisoned)?;
        state.check_family(&self.name, &scan.family)?;
        let lower = match &scan.start {
            Some(start) => Bound::Included(start.clone()),
            None => Bound::Unbounded,
        };
        let upper = match &scan.stop {
            Some(stop) => Bound::Excluded(stop.clone()),
            None => Bound::Unbounded,
        };
        if let (Bound::Included(start), Bound::Excluded(stop)) = (&lower, &upper) {
            // BTreeMap::range panics on an inverted range.
            if start >= stop {
                return Ok(Box::new(std::iter::empty()));
            }
        }
        let results: Vec<RowResult> = state
            .rows
            .range((lower, upper))
            .map(|(row, columns)| TableState::project(row, columns, &scan.family, &[]))
            .filter(|result| !result.is_empty())
            .collect();
        Ok(Box::new(results.into_iter().map(Ok)))
    }
}
