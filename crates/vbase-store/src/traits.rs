use vbase_types::Row;

use crate::error::StoreResult;
use crate::mutation::{Mutated, Mutation};

/// A lazy sequence of rows from a scan.
pub type RowIter<'a, T, K> = Box<dyn Iterator<Item = StoreResult<Row<T, K>>> + Send + 'a>;

/// A keyed, versioned store of typed objects.
///
/// Implementations must satisfy these invariants:
/// - Every successful write bumps the row's version by exactly one, and
///   writes its value, schema hash, version and format in one atomic step.
/// - Of any writers that present the same expected version, at most one
///   succeeds.
/// - A missing row reads as `None`, never as an error.
///
/// Decorators (such as a search index) implement this trait by wrapping
/// another implementation.
pub trait ObjectStore<T, K>: Send + Sync {
    /// Read the current row under `key`.
    fn get(&self, key: &K) -> StoreResult<Option<Row<T, K>>>;

    /// Store `value` under a freshly generated key and return the key.
    fn create(&self, value: &T) -> StoreResult<K>;

    /// Store `value` under `key` regardless of the current version,
    /// retrying until a guarded write lands.
    fn put(&self, key: &K, value: &T) -> StoreResult<()>;

    /// Store `value` only if the row's version is `expected_version`.
    ///
    /// `expected_version = 0` means the row must not exist. Returns `false`,
    /// with nothing written, if the guard failed.
    fn put_versioned(&self, key: &K, value: &T, expected_version: u64) -> StoreResult<bool>;

    /// Read-modify-write `key` until the write lands or the mutator returns
    /// [`Mutation::Unchanged`]. Returns `None` if the row does not exist.
    fn mutate(
        &self,
        key: &K,
        mutator: &mut dyn FnMut(&T) -> Mutation<T>,
    ) -> StoreResult<Option<Mutated<T, K>>>;

    /// Like [`mutate`](Self::mutate), but inserts `creator()` as version 1
    /// if the row does not exist.
    fn mutate_or_create(
        &self,
        key: &K,
        mutator: &mut dyn FnMut(&T) -> Mutation<T>,
        creator: &mut dyn FnMut() -> T,
    ) -> StoreResult<Mutated<T, K>>;

    /// Remove the row under `key`. Deleting a missing row is not an error.
    fn delete(&self, key: &K) -> StoreResult<()>;

    /// Iterate rows in key order over `[start, stop)`. `None` bounds are
    /// open.
    fn scan<'a>(&'a self, start: Option<&K>, stop: Option<&K>) -> StoreResult<RowIter<'a, T, K>>;
}
