use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::marker::PhantomData;
use std::sync::RwLock;

use tracing::{debug, warn};
use vbase_types::RowKey;

use crate::error::{IndexError, IndexResult};
use crate::traits::SearchIndex;

/// Exact match of `term` on the extracted field `field`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TermQuery {
    pub field: String,
    pub term: String,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
        }
    }
}

type Extractor<T> = Box<dyn Fn(&T) -> Vec<(String, String)> + Send + Sync>;

#[derive(Default)]
struct Postings {
    /// (field, term) -> row keys.
    terms: BTreeMap<(String, String), BTreeSet<Vec<u8>>>,
    /// row key -> (field, term) pairs it is posted under.
    by_key: HashMap<Vec<u8>, Vec<(String, String)>>,
}

impl Postings {
    fn remove(&mut self, row: &[u8]) {
        let Some(pairs) = self.by_key.remove(row) else {
            return;
        };
        for pair in pairs {
            if let Some(keys) = self.terms.get_mut(&pair) {
                keys.remove(row);
                if keys.is_empty() {
                    self.terms.remove(&pair);
                }
            }
        }
    }
}

/// An in-memory term index.
///
/// An extractor turns each value into `(field, term)` pairs. Hits come back
/// in row-key byte order, the same order a store scan uses.
pub struct InMemoryIndex<T, K> {
    extractor: Extractor<T>,
    postings: RwLock<Postings>,
    _key: PhantomData<fn() -> K>,
}

impl<T, K> InMemoryIndex<T, K> {
    pub fn new<F>(extractor: F) -> Self
    where
        F: Fn(&T) -> Vec<(String, String)> + Send + Sync + 'static,
    {
        Self {
            extractor: Box::new(extractor),
            postings: RwLock::new(Postings::default()),
            _key: PhantomData,
        }
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.postings.read().map(|p| p.by_key.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, K> SearchIndex<T, K> for InMemoryIndex<T, K>
where
    T: Send + Sync,
    K: RowKey,
{
    type Query = TermQuery;

    fn index(&self, key: &K, value: &T) -> IndexResult<()> {
        let row = key.to_row_key();
        let mut pairs = (self.extractor)(value);
        pairs.sort();
        pairs.dedup();

        let mut postings = self.postings.write().map_err(|_| IndexError::LockPoisoned)?;
        postings.remove(&row);
        for pair in &pairs {
            postings
                .terms
                .entry(pair.clone())
                .or_default()
                .insert(row.clone());
        }
        debug!(key = ?key, terms = pairs.len(), "indexed");
        postings.by_key.insert(row, pairs);
        Ok(())
    }

    fn unindex(&self, key: &K) -> IndexResult<()> {
        let mut postings = self.postings.write().map_err(|_| IndexError::LockPoisoned)?;
        postings.remove(&key.to_row_key());
        debug!(key = ?key, "unindexed");
        Ok(())
    }

    fn search(&self, query: &TermQuery) -> IndexResult<Vec<K>> {
        let postings = self.postings.read().map_err(|_| IndexError::LockPoisoned)?;
        let Some(rows) = postings
            .terms
            .get(&(query.field.clone(), query.term.clone()))
        else {
            return Ok(Vec::new());
        };
        let mut keys = Vec::with_capacity(rows.len());
        for row in rows {
            match K::from_row_key(row) {
                Ok(key) => keys.push(key),
                Err(e) => warn!(error = %e, "skipping undecodable index entry"),
            }
        }
        Ok(keys)
    }
}

impl<T, K> std::fmt::Debug for InMemoryIndex<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex")
            .field("keys", &self.len())
            .finish()
    }
}
