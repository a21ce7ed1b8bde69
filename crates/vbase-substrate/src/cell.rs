use std::collections::BTreeMap;

/// One timestamped value of a column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Substrate write timestamp (milliseconds).
    pub timestamp: i64,
    /// Raw cell bytes.
    pub value: Vec<u8>,
}

impl Cell {
    pub fn new(timestamp: i64, value: Vec<u8>) -> Self {
        Self { timestamp, value }
    }
}

/// The cells returned for one row by a get or a scan step.
///
/// Cells are grouped by `(family, qualifier)`. Within a column they are
/// ordered newest first, matching the order the substrate retains them in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowResult {
    row: Vec<u8>,
    columns: BTreeMap<(String, String), Vec<Cell>>,
}

impl RowResult {
    /// An empty result for `row`.
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Attach the cells of one column. Cells must be newest first.
    pub fn with_cells(
        mut self,
        family: impl Into<String>,
        qualifier: impl Into<String>,
        cells: Vec<Cell>,
    ) -> Self {
        if !cells.is_empty() {
            self.columns.insert((family.into(), qualifier.into()), cells);
        }
        self
    }

    /// The row key this result belongs to.
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// Returns `true` if no cells were found.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All retained cells of a column, newest first.
    pub fn cells(&self, family: &str, qualifier: &str) -> &[Cell] {
        self.columns
            .get(&(family.to_string(), qualifier.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The newest cell of a column.
    pub fn latest(&self, family: &str, qualifier: &str) -> Option<&Cell> {
        self.cells(family, qualifier).first()
    }

    /// The newest value of a column.
    pub fn value(&self, family: &str, qualifier: &str) -> Option<&[u8]> {
        self.latest(family, qualifier).map(|c| c.value.as_slice())
    }
}

/// A set of cells written to one row in a single atomic operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Put {
    row: Vec<u8>,
    cells: Vec<(String, String, Vec<u8>)>,
}

impl Put {
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            cells: Vec::new(),
        }
    }

    /// Add a cell to the mutation.
    pub fn add(
        mut self,
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.cells
            .push((family.into(), qualifier.into(), value.into()));
        self
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// Iterate `(family, qualifier, value)` triples in insertion order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, &[u8])> {
        self.cells
            .iter()
            .map(|(f, q, v)| (f.as_str(), q.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A half-open `[start, stop)` range scan over one column family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scan {
    pub family: String,
    pub start: Option<Vec<u8>>,
    pub stop: Option<Vec<u8>>,
}

impl Scan {
    /// Scan every row of `family`.
    pub fn family(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            start: None,
            stop: None,
        }
    }

    /// First row key included in the scan.
    pub fn start(mut self, start: impl Into<Vec<u8>>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// First row key excluded from the scan.
    pub fn stop(mut self, stop: impl Into<Vec<u8>>) -> Self {
        self.stop = Some(stop.into());
        self
    }
}

/// Outcome of a guarded write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CasOutcome {
    /// The guard held and every cell was written at `timestamp`.
    Applied { timestamp: i64 },
    /// The guard did not hold; nothing was written.
    Rejected,
}

impl CasOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
