use crate::error::IndexResult;

/// A secondary index mapping queries to primary keys.
///
/// The index only stores keys. Callers resolve hits against the store, so
/// an implementation may return keys whose rows are gone.
pub trait SearchIndex<T, K>: Send + Sync {
    /// Query type understood by this index.
    type Query;

    /// Index `value` under `key`, replacing whatever was indexed for it.
    fn index(&self, key: &K, value: &T) -> IndexResult<()>;

    /// Remove every entry for `key`. Unknown keys are ignored.
    fn unindex(&self, key: &K) -> IndexResult<()>;

    /// Keys matching `query`, in a stable order.
    fn search(&self, query: &Self::Query) -> IndexResult<Vec<K>>;
}
