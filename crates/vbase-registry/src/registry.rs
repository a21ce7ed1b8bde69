use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info, warn};
use vbase_crypto::SchemaHasher;
use vbase_substrate::{FamilyDescriptor, Put, Scan, TableDescriptor, TablePool};
use vbase_types::{Schema, SchemaHash};

use crate::error::{RegistryError, RegistryResult};

/// Column family holding schema definitions.
pub const SCHEMA_FAMILY: &str = "schema";
/// Qualifier of the definition cell.
pub const DEFINITION_COLUMN: &str = "d";

#[derive(Default)]
struct SchemaCache {
    by_hash: HashMap<SchemaHash, Schema>,
    by_definition: HashMap<String, SchemaHash>,
}

/// Content-addressed schema cache backed by a schema table.
pub struct SchemaRegistry {
    pool: TablePool,
    table: String,
    hasher: SchemaHasher,
    cache: RwLock<SchemaCache>,
    /// Per-hash gates serializing registration of one schema.
    registering: Mutex<HashMap<SchemaHash, Arc<Mutex<()>>>>,
}

impl SchemaRegistry {
    /// Descriptor of the schema table: one memory-resident family keeping a
    /// single version.
    pub fn table_descriptor(table: &str) -> TableDescriptor {
        TableDescriptor::new(table).with_family(FamilyDescriptor::new(SCHEMA_FAMILY).in_memory())
    }

    /// Create a registry over an existing schema table without touching it.
    pub fn new(pool: TablePool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            hasher: SchemaHasher::SCHEMA,
            cache: RwLock::new(SchemaCache::default()),
            registering: Mutex::new(HashMap::new()),
        }
    }

    /// Open the registry: create the schema table if it is missing, then
    /// preload every registered schema into the cache.
    pub fn open(pool: TablePool, table: impl Into<String>) -> RegistryResult<Self> {
        let registry = Self::new(pool, table);
        registry
            .pool
            .admin()
            .ensure_table(&Self::table_descriptor(&registry.table))?;
        registry.preload()?;
        Ok(registry)
    }

    /// Ensure `schema` is stored and return its hash.
    pub fn register(&self, schema: &Schema) -> RegistryResult<SchemaHash> {
        if let Some(hash) = self.cached_hash(schema)? {
            return Ok(hash);
        }

        let hash = self.hasher.hash_schema(schema);
        let gate = self.gate(hash)?;
        let _registering = gate.lock().map_err(|_| RegistryError::LockPoisoned)?;

        // Another caller may have finished while we waited on the gate.
        if let Some(hash) = self.cached_hash(schema)? {
            return Ok(hash);
        }

        {
            let table = self.pool.checkout(&self.table)?;
            table.put(
                &Put::new(hash.to_hex()).add(
                    SCHEMA_FAMILY,
                    DEFINITION_COLUMN,
                    schema.as_bytes().to_vec(),
                ),
            )?;
        }
        self.insert(hash, schema.clone())?;
        self.registering
            .lock()
            .map_err(|_| RegistryError::LockPoisoned)?
            .remove(&hash);

        debug!(hash = %hash.short_hex(), schema = schema.name(), "registered schema");
        Ok(hash)
    }

    /// Look up the schema stored under `hash`, reading the schema table on a
    /// cache miss.
    pub fn resolve(&self, hash: &SchemaHash) -> RegistryResult<Schema> {
        {
            let cache = self.cache.read().map_err(|_| RegistryError::LockPoisoned)?;
            if let Some(schema) = cache.by_hash.get(hash) {
                return Ok(schema.clone());
            }
        }

        debug!(hash = %hash.short_hex(), "schema cache miss");
        let result = {
            let table = self.pool.checkout(&self.table)?;
            table.get(hash.to_hex().as_bytes(), SCHEMA_FAMILY, &[DEFINITION_COLUMN])?
        };
        let bytes = result
            .value(SCHEMA_FAMILY, DEFINITION_COLUMN)
            .ok_or(RegistryError::SchemaNotFound(*hash))?;
        let schema = self.verify(hash, bytes)?;
        self.insert(*hash, schema.clone())?;
        Ok(schema)
    }

    /// Scan the whole schema table once and cache every entry. Returns the
    /// number of schemas loaded.
    pub fn preload(&self) -> RegistryResult<usize> {
        let scanner = self
            .pool
            .checkout(&self.table)?
            .into_scanner(&Scan::family(SCHEMA_FAMILY))?;
        let mut loaded = 0;
        for result in scanner {
            let result = result?;
            let Some(bytes) = result.value(SCHEMA_FAMILY, DEFINITION_COLUMN) else {
                continue;
            };
            let hash = match SchemaHash::from_hex_bytes(result.row()) {
                Ok(hash) => hash,
                Err(e) => {
                    warn!(row = %String::from_utf8_lossy(result.row()), error = %e, "skipping schema entry with malformed key");
                    continue;
                }
            };
            match self.verify(&hash, bytes) {
                Ok(schema) => {
                    self.insert(hash, schema)?;
                    loaded += 1;
                }
                Err(e) => warn!(hash = %hash.short_hex(), error = %e, "skipping schema entry"),
            }
        }
        info!(table = %self.table, loaded, "preloaded schema cache");
        Ok(loaded)
    }

    /// Number of schemas currently cached.
    pub fn cached_len(&self) -> usize {
        self.cache.read().map(|c| c.by_hash.len()).unwrap_or(0)
    }

    fn cached_hash(&self, schema: &Schema) -> RegistryResult<Option<SchemaHash>> {
        let cache = self.cache.read().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(cache.by_definition.get(schema.definition()).copied())
    }

    fn gate(&self, hash: SchemaHash) -> RegistryResult<Arc<Mutex<()>>> {
        let mut registering = self
            .registering
            .lock()
            .map_err(|_| RegistryError::LockPoisoned)?;
        Ok(Arc::clone(registering.entry(hash).or_default()))
    }

    fn verify(&self, hash: &SchemaHash, bytes: &[u8]) -> RegistryResult<Schema> {
        let schema = Schema::from_bytes(bytes)?;
        if !self.hasher.verify(schema.as_bytes(), hash) {
            return Err(RegistryError::HashMismatch {
                expected: *hash,
                computed: self.hasher.hash_schema(&schema),
            });
        }
        Ok(schema)
    }

    fn insert(&self, hash: SchemaHash, schema: Schema) -> RegistryResult<()> {
        let mut cache = self.cache.write().map_err(|_| RegistryError::LockPoisoned)?;
        cache
            .by_definition
            .insert(schema.definition().to_string(), hash);
        cache.by_hash.insert(hash, schema);
        Ok(())
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("table", &self.table)
            .field("cached", &self.cached_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vbase_substrate::{ColumnAdmin, InMemoryColumnStore};

    const TABLE: &str = "schemas";

    fn user_schema() -> Schema {
        Schema::parse(r#"{"type":"record","name":"User","fields":[{"name":"id","type":"long"}]}"#)
            .unwrap()
    }

    fn order_schema() -> Schema {
        Schema::parse(r#"{"type":"record","name":"Order","fields":[]}"#).unwrap()
    }

    fn setup() -> (Arc<InMemoryColumnStore>, TablePool) {
        let store = Arc::new(InMemoryColumnStore::new());
        let pool = TablePool::new(store.clone(), 4);
        (store, pool)
    }

    fn writes(store: &InMemoryColumnStore) -> u64 {
        store.table(TABLE).unwrap().write_count()
    }

    #[test]
    fn open_creates_schema_table() {
        let (store, pool) = setup();
        let registry = SchemaRegistry::open(pool, TABLE).unwrap();
        assert!(store.table_exists(TABLE).unwrap());
        assert_eq!(registry.cached_len(), 0);
    }

    #[test]
    fn register_is_idempotent_with_one_remote_write() {
        let (store, pool) = setup();
        let registry = SchemaRegistry::open(pool, TABLE).unwrap();
        let first = registry.register(&user_schema()).unwrap();
        let second = registry.register(&user_schema()).unwrap();
        assert_eq!(first, second);
        assert_eq!(writes(&store), 1);
    }

    #[test]
    fn equivalent_spellings_register_once() {
        let (store, pool) = setup();
        let registry = SchemaRegistry::open(pool, TABLE).unwrap();
        let a = registry.register(&user_schema()).unwrap();
        let respelled = Schema::parse(
            r#"{ "fields": [ { "type": "long", "name": "id" } ], "name": "User", "type": "record" }"#,
        )
        .unwrap();
        let b = registry.register(&respelled).unwrap();
        assert_eq!(a, b);
        assert_eq!(writes(&store), 1);
    }

    #[test]
    fn resolve_reads_through_on_cache_miss() {
        let (_store, pool) = setup();
        let writer = SchemaRegistry::open(pool.clone(), TABLE).unwrap();
        let hash = writer.register(&user_schema()).unwrap();

        // A registry created without preload starts cold.
        let reader = SchemaRegistry::new(pool, TABLE);
        assert_eq!(reader.cached_len(), 0);
        assert_eq!(reader.resolve(&hash).unwrap(), user_schema());
        assert_eq!(reader.cached_len(), 1);
    }

    #[test]
    fn resolve_unknown_hash_fails() {
        let (_store, pool) = setup();
        let registry = SchemaRegistry::open(pool, TABLE).unwrap();
        let missing = SchemaHasher::SCHEMA.hash(b"never registered");
        assert!(matches!(
            registry.resolve(&missing),
            Err(RegistryError::SchemaNotFound(h)) if h == missing
        ));
    }

    #[test]
    fn open_preloads_existing_entries() {
        let (_store, pool) = setup();
        let writer = SchemaRegistry::open(pool.clone(), TABLE).unwrap();
        writer.register(&user_schema()).unwrap();
        writer.register(&order_schema()).unwrap();

        let reopened = SchemaRegistry::open(pool, TABLE).unwrap();
        assert_eq!(reopened.cached_len(), 2);
    }

    #[test]
    fn corrupted_entry_is_rejected() {
        let (store, pool) = setup();
        let registry = SchemaRegistry::open(pool.clone(), TABLE).unwrap();
        let hash = SchemaHasher::SCHEMA.hash_schema(&user_schema());
        // Store a different definition under the user schema's hash.
        store
            .open_table(TABLE)
            .unwrap()
            .put(&Put::new(hash.to_hex()).add(
                SCHEMA_FAMILY,
                DEFINITION_COLUMN,
                order_schema().as_bytes().to_vec(),
            ))
            .unwrap();

        assert!(matches!(
            registry.resolve(&hash),
            Err(RegistryError::HashMismatch { .. })
        ));

        let reopened = SchemaRegistry::open(pool, TABLE).unwrap();
        assert_eq!(reopened.cached_len(), 0);
    }

    #[test]
    fn preload_skips_malformed_row_keys() {
        let (store, pool) = setup();
        let writer = SchemaRegistry::open(pool.clone(), TABLE).unwrap();
        writer.register(&user_schema()).unwrap();
        store
            .open_table(TABLE)
            .unwrap()
            .put(&Put::new(b"not-a-hash".to_vec()).add(
                SCHEMA_FAMILY,
                DEFINITION_COLUMN,
                order_schema().as_bytes().to_vec(),
            ))
            .unwrap();

        let reopened = SchemaRegistry::open(pool, TABLE).unwrap();
        assert_eq!(reopened.cached_len(), 1);
        assert_eq!(reopened.preload().unwrap(), 1);
    }

    #[test]
    fn concurrent_registration_writes_once() {
        use std::thread;

        let (store, pool) = setup();
        let registry = Arc::new(SchemaRegistry::open(pool, TABLE).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.register(&user_schema()).unwrap())
            })
            .collect();
        let hashes: Vec<SchemaHash> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(writes(&store), 1);
    }

    #[test]
    fn distinct_schemas_get_distinct_hashes() {
        let (store, pool) = setup();
        let registry = SchemaRegistry::open(pool, TABLE).unwrap();
        let a = registry.register(&user_schema()).unwrap();
        let b = registry.register(&order_schema()).unwrap();
        assert_ne!(a, b);
        assert_eq!(writes(&store), 2);
        assert_eq!(registry.resolve(&b).unwrap().name(), "Order");
    }
}
