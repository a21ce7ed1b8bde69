use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};
use vbase_store::{Mutated, Mutation, ObjectStore, RowIter, StoreError, StoreResult};
use vbase_types::Row;

use crate::error::IndexResult;
use crate::traits::SearchIndex;

/// An [`ObjectStore`] decorator that keeps a [`SearchIndex`] in sync.
///
/// Every write goes to the wrapped store first. The index is updated only
/// after the store confirms the write, and only when something changed.
pub struct IndexedStore<T, K, S, I> {
    store: Arc<S>,
    index: Arc<I>,
    _marker: PhantomData<fn() -> (T, K)>,
}

impl<T, K, S, I> IndexedStore<T, K, S, I>
where
    K: std::fmt::Debug,
    S: ObjectStore<T, K>,
    I: SearchIndex<T, K>,
{
    pub fn new(store: Arc<S>, index: Arc<I>) -> Self {
        Self {
            store,
            index,
            _marker: PhantomData,
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &Arc<S> {
        &self.store
    }

    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    /// Rows matching `query`, fetched lazily from the store.
    ///
    /// Hits whose rows no longer exist are skipped.
    pub fn search(&self, query: &I::Query) -> IndexResult<RowIter<'_, T, K>>
    where
        T: Send,
        K: Send,
    {
        let keys = self.index.search(query)?;
        debug!(hits = keys.len(), "index search");
        let rows = keys.into_iter().filter_map(move |key| match self.store.get(&key) {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                warn!(key = ?key, "dropping stale index hit");
                None
            }
            Err(e) => Some(Err(e)),
        });
        Ok(Box::new(rows))
    }

    /// The first row matching `query`.
    pub fn lookup(&self, query: &I::Query) -> IndexResult<Option<Row<T, K>>>
    where
        T: Send,
        K: Send,
    {
        Ok(self.search(query)?.next().transpose()?)
    }

    /// Bring the index entry for `key` back in line with the store. Returns
    /// `true` if the row exists and was indexed.
    pub fn reindex(&self, key: &K) -> StoreResult<bool> {
        match self.store.get(key)? {
            Some(row) => {
                self.index_row(key, row.value())?;
                Ok(true)
            }
            None => {
                self.index
                    .unindex(key)
                    .map_err(|e| partial_failure(key, e))?;
                Ok(false)
            }
        }
    }

    fn index_row(&self, key: &K, value: &T) -> StoreResult<()> {
        self.index.index(key, value).map_err(|e| partial_failure(key, e))
    }

    fn index_mutated(&self, mutated: &Mutated<T, K>) -> StoreResult<()> {
        match mutated {
            Mutated::Changed(row) => self.index_row(row.key(), row.value()),
            Mutated::Unchanged(_) => Ok(()),
        }
    }
}

impl<T, K, S, I> ObjectStore<T, K> for IndexedStore<T, K, S, I>
where
    K: std::fmt::Debug,
    S: ObjectStore<T, K>,
    I: SearchIndex<T, K>,
{
    fn get(&self, key: &K) -> StoreResult<Option<Row<T, K>>> {
        self.store.get(key)
    }

    fn create(&self, value: &T) -> StoreResult<K> {
        let key = self.store.create(value)?;
        self.index_row(&key, value)?;
        Ok(key)
    }

    fn put(&self, key: &K, value: &T) -> StoreResult<()> {
        self.store.put(key, value)?;
        self.index_row(key, value)
    }

    fn put_versioned(&self, key: &K, value: &T, expected_version: u64) -> StoreResult<bool> {
        if !self.store.put_versioned(key, value, expected_version)? {
            return Ok(false);
        }
        self.index_row(key, value)?;
        Ok(true)
    }

    fn mutate(
        &self,
        key: &K,
        mutator: &mut dyn FnMut(&T) -> Mutation<T>,
    ) -> StoreResult<Option<Mutated<T, K>>> {
        let mutated = self.store.mutate(key, mutator)?;
        if let Some(mutated) = &mutated {
            self.index_mutated(mutated)?;
        }
        Ok(mutated)
    }

    fn mutate_or_create(
        &self,
        key: &K,
        mutator: &mut dyn FnMut(&T) -> Mutation<T>,
        creator: &mut dyn FnMut() -> T,
    ) -> StoreResult<Mutated<T, K>> {
        let mutated = self.store.mutate_or_create(key, mutator, creator)?;
        self.index_mutated(&mutated)?;
        Ok(mutated)
    }

    fn delete(&self, key: &K) -> StoreResult<()> {
        self.store.delete(key)?;
        self.index.unindex(key).map_err(|e| partial_failure(key, e))
    }

    fn scan<'a>(&'a self, start: Option<&K>, stop: Option<&K>) -> StoreResult<RowIter<'a, T, K>> {
        self.store.scan(start, stop)
    }
}

impl<T, K, S: std::fmt::Debug, I: std::fmt::Debug> std::fmt::Debug for IndexedStore<T, K, S, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedStore")
            .field("store", &self.store)
            .field("index", &self.index)
            .finish()
    }
}

fn partial_failure(key: &impl std::fmt::Debug, err: impl std::fmt::Display) -> StoreError {
    warn!(key = ?key, error = %err, "store write committed but index update failed");
    StoreError::PartialIndexFailure {
        key: format!("{key:?}"),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::memory::{InMemoryIndex, TermQuery};
    use serde::{Deserialize, Serialize};
    use vbase_codec::SerdeCodec;
    use vbase_store::{StoreConfig, VersionedStore};
    use vbase_substrate::InMemoryColumnStore;
    use vbase_types::Record;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct Contact {
        name: String,
        city: String,
    }

    impl Record for Contact {
        const SCHEMA: &'static str = r#"{"type":"record","name":"Contact","fields":[{"name":"name","type":"string"},{"name":"city","type":"string"}]}"#;
    }

    fn contact(name: &str, city: &str) -> Contact {
        Contact {
            name: name.into(),
            city: city.into(),
        }
    }

    type Base = VersionedStore<Contact, String>;
    type Terms = InMemoryIndex<Contact, String>;

    fn base() -> Arc<Base> {
        let substrate = Arc::new(InMemoryColumnStore::new());
        Arc::new(VersionedStore::open(substrate, StoreConfig::default(), Arc::new(SerdeCodec)).unwrap())
    }

    fn terms() -> Arc<Terms> {
        Arc::new(InMemoryIndex::new(|c: &Contact| {
            vec![("city".to_string(), c.city.clone())]
        }))
    }

    fn setup() -> IndexedStore<Contact, String, Base, Terms> {
        IndexedStore::new(base(), terms())
    }

    fn city(name: &str) -> TermQuery {
        TermQuery::new("city", name)
    }

    fn names(store: &IndexedStore<Contact, String, Base, Terms>, query: &TermQuery) -> Vec<String> {
        store
            .search(query)
            .unwrap()
            .map(|row| row.unwrap().value().name.clone())
            .collect()
    }

    /// An index whose writes always fail.
    struct BrokenIndex;

    impl SearchIndex<Contact, String> for BrokenIndex {
        type Query = TermQuery;

        fn index(&self, _key: &String, _value: &Contact) -> IndexResult<()> {
            Err(IndexError::Backend("disk full".into()))
        }

        fn unindex(&self, _key: &String) -> IndexResult<()> {
            Err(IndexError::Backend("disk full".into()))
        }

        fn search(&self, _query: &TermQuery) -> IndexResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn create_indexes_new_row() {
        let store = setup();
        let key = store.create(&contact("ada", "london")).unwrap();
        assert_eq!(names(&store, &city("london")), vec!["ada"]);
        let row = store.lookup(&city("london")).unwrap().unwrap();
        assert_eq!(row.key(), &key);
        assert!(store.lookup(&city("paris")).unwrap().is_none());
    }

    #[test]
    fn put_moves_row_between_terms() {
        let store = setup();
        let key = "k".to_string();
        store.put(&key, &contact("ada", "london")).unwrap();
        store.put(&key, &contact("ada", "paris")).unwrap();
        assert!(names(&store, &city("london")).is_empty());
        assert_eq!(names(&store, &city("paris")), vec!["ada"]);
    }

    #[test]
    fn failed_version_guard_leaves_index_alone() {
        let store = setup();
        let key = "k".to_string();
        assert!(store.put_versioned(&key, &contact("ada", "london"), 0).unwrap());
        assert!(!store.put_versioned(&key, &contact("bob", "paris"), 0).unwrap());
        assert!(names(&store, &city("paris")).is_empty());
        assert_eq!(names(&store, &city("london")), vec!["ada"]);
    }

    #[test]
    fn unchanged_mutation_does_not_touch_index() {
        let store = setup();
        let key = "k".to_string();
        store.put(&key, &contact("ada", "london")).unwrap();
        // Drop the entry behind the decorator's back; a no-op mutate must
        // not put it back.
        store.index().unindex(&key).unwrap();

        let result = store
            .mutate(&key, &mut |_| Mutation::Unchanged)
            .unwrap()
            .unwrap();
        assert!(!result.is_changed());
        assert!(names(&store, &city("london")).is_empty());
    }

    #[test]
    fn changed_mutation_reindexes() {
        let store = setup();
        let key = "k".to_string();
        store.put(&key, &contact("ada", "london")).unwrap();
        store
            .mutate(&key, &mut |c| Mutation::Changed(contact(&c.name, "paris")))
            .unwrap();
        assert_eq!(names(&store, &city("paris")), vec!["ada"]);
        assert!(names(&store, &city("london")).is_empty());
    }

    #[test]
    fn mutate_or_create_indexes_created_row() {
        let store = setup();
        let key = "k".to_string();
        let created = store
            .mutate_or_create(&key, &mut |_| Mutation::Unchanged, &mut || contact("new", "oslo"))
            .unwrap();
        assert!(created.is_changed());
        assert_eq!(names(&store, &city("oslo")), vec!["new"]);
    }

    #[test]
    fn delete_removes_search_hits() {
        let store = setup();
        let key = store.create(&contact("ada", "london")).unwrap();
        store.delete(&key).unwrap();
        assert!(names(&store, &city("london")).is_empty());
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn stale_hits_are_dropped() {
        let base = base();
        let index = terms();
        let store: IndexedStore<Contact, String, Base, Terms> =
            IndexedStore::new(Arc::clone(&base), Arc::clone(&index));
        let key = store.create(&contact("ada", "london")).unwrap();
        store.create(&contact("bob", "london")).unwrap();

        // Delete underneath the decorator, leaving a dangling index entry.
        base.delete(&key).unwrap();
        assert_eq!(index.search(&city("london")).unwrap().len(), 2);
        assert_eq!(names(&store, &city("london")), vec!["bob"]);
    }

    #[test]
    fn index_failure_after_commit_is_partial() {
        let store: IndexedStore<Contact, String, Base, BrokenIndex> =
            IndexedStore::new(base(), Arc::new(BrokenIndex));
        let err = store.create(&contact("ada", "london")).unwrap_err();
        assert!(matches!(err, StoreError::PartialIndexFailure { .. }));

        // The write itself committed.
        let key = "k".to_string();
        let err = store.put(&key, &contact("bob", "paris")).unwrap_err();
        assert!(matches!(err, StoreError::PartialIndexFailure { .. }));
        assert_eq!(store.get(&key).unwrap().unwrap().value().name, "bob");

        let err = store.delete(&key).unwrap_err();
        assert!(matches!(err, StoreError::PartialIndexFailure { .. }));
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn reindex_repairs_missing_entry() {
        let store = setup();
        let key = "k".to_string();
        store.put(&key, &contact("ada", "london")).unwrap();
        store.index().unindex(&key).unwrap();
        assert!(names(&store, &city("london")).is_empty());

        assert!(store.reindex(&key).unwrap());
        assert_eq!(names(&store, &city("london")), vec!["ada"]);

        store.inner().delete(&key).unwrap();
        assert!(!store.reindex(&key).unwrap());
        assert!(store.index().search(&city("london")).unwrap().is_empty());
    }

    #[test]
    fn scan_passes_through() {
        let store = setup();
        store.put(&"a".to_string(), &contact("ada", "london")).unwrap();
        store.put(&"b".to_string(), &contact("bob", "paris")).unwrap();
        let scanned: Vec<String> = store
            .scan(None, None)
            .unwrap()
            .map(|row| row.unwrap().key().clone())
            .collect();
        assert_eq!(scanned, vec!["a", "b"]);
    }
}
