/// A decoded object read from the store.
///
/// A `Row` is only ever built from a substrate read that found a payload
/// cell; absence is expressed as `None` by the store, never as a `Row` with
/// an empty value. Rows are immutable: accessors hand out shared references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row<T, K> {
    value: T,
    key: K,
    timestamp: i64,
    version: u64,
}

impl<T, K> Row<T, K> {
    /// Assemble a row from its decoded parts.
    pub fn new(value: T, key: K, timestamp: i64, version: u64) -> Self {
        Self {
            value,
            key,
            timestamp,
            version,
        }
    }

    /// The decoded payload.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// The primary key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Substrate write timestamp of the payload cell (milliseconds).
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Number of successful writes to this key so far. Never 0 for a
    /// stored row.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Take the payload, dropping the metadata.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Split into `(value, key)`.
    pub fn into_parts(self) -> (T, K) {
        (self.value, self.key)
    }
}
