use vbase_types::Row;

/// What a mutator decided to do with the current value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation<T> {
    /// Replace the value.
    Changed(T),
    /// Keep the value; nothing is written.
    Unchanged,
}

impl<T> Mutation<T> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

impl<T> From<Option<T>> for Mutation<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Changed(value),
            None => Self::Unchanged,
        }
    }
}

/// Result of a read-modify-write.
///
/// `Changed` carries the row as committed, with the new version and the
/// commit timestamp. `Unchanged` carries the row as it was read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutated<T, K> {
    Changed(Row<T, K>),
    Unchanged(Row<T, K>),
}

impl<T, K> Mutated<T, K> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    pub fn row(&self) -> &Row<T, K> {
        match self {
            Self::Changed(row) | Self::Unchanged(row) => row,
        }
    }

    pub fn into_row(self) -> Row<T, K> {
        match self {
            Self::Changed(row) | Self::Unchanged(row) => row,
        }
    }
}
