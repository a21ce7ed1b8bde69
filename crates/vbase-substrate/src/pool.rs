use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use crate::cell::{RowResult, Scan};
use crate::error::SubstrateResult;
use crate::traits::{ColumnAdmin, ColumnTable, Scanner};

/// A pool of reusable table handles.
///
/// Handles are checked out with [`TablePool::checkout`] and come back when
/// the returned [`PooledTable`] drops. Cloning the pool is cheap and every
/// clone shares the same idle handles.
#[derive(Clone)]
pub struct TablePool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    admin: Arc<dyn ColumnAdmin>,
    idle: Mutex<HashMap<String, Vec<Arc<dyn ColumnTable>>>>,
    max_idle: usize,
}

impl TablePool {
    /// Create a pool keeping at most `max_idle` idle handles per table.
    pub fn new(admin: Arc<dyn ColumnAdmin>, max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                admin,
                idle: Mutex::new(HashMap::new()),
                max_idle,
            }),
        }
    }

    /// The administration handle the pool opens tables through.
    pub fn admin(&self) -> &Arc<dyn ColumnAdmin> {
        &self.inner.admin
    }

    /// Check out a handle on `table`, reusing an idle one when available.
    pub fn checkout(&self, table: &str) -> SubstrateResult<PooledTable> {
        let reused = self
            .inner
            .idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.get_mut(table).and_then(Vec::pop));
        let handle = match reused {
            Some(handle) => handle,
            None => self.inner.admin.open_table(table)?,
        };
        Ok(PooledTable {
            table: handle,
            pool: self.clone(),
        })
    }

    /// Number of idle handles held for `table`.
    pub fn idle_count(&self, table: &str) -> usize {
        self.inner
            .idle
            .lock()
            .map(|idle| idle.get(table).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn checkin(&self, handle: Arc<dyn ColumnTable>) {
        // A poisoned pool just stops caching; the handle is dropped.
        if let Ok(mut idle) = self.inner.idle.lock() {
            let slot = idle.entry(handle.name().to_string()).or_default();
            if slot.len() < self.inner.max_idle {
                slot.push(handle);
            }
        }
    }
}

impl std::fmt::Debug for TablePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TablePool")
            .field("max_idle", &self.inner.max_idle)
            .finish()
    }
}

/// A checked-out table handle. Returns itself to the pool on drop.
pub struct PooledTable {
    table: Arc<dyn ColumnTable>,
    pool: TablePool,
}

impl PooledTable {
    /// Open a scan that keeps this handle checked out until the scanner is
    /// dropped.
    pub fn into_scanner(self, scan: &Scan) -> SubstrateResult<PooledScanner> {
        let rows = self.table.scan(scan)?;
        Ok(PooledScanner { rows, _table: self })
    }
}

impl Deref for PooledTable {
    type Target = dyn ColumnTable;

    fn deref(&self) -> &Self::Target {
        self.table.as_ref()
    }
}

impl Drop for PooledTable {
    fn drop(&mut self) {
        self.pool.checkin(Arc::clone(&self.table));
    }
}

/// A scanner bound to the pooled handle it was opened on.
pub struct PooledScanner {
    rows: Scanner,
    _table: PooledTable,
}

impl Iterator for PooledScanner {
    type Item = SubstrateResult<RowResult>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}
