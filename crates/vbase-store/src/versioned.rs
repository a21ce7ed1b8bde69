use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, info, warn};
use vbase_codec::Codec;
use vbase_registry::SchemaRegistry;
use vbase_substrate::{
    CasOutcome, ColumnAdmin, FamilyDescriptor, Put, RowResult, Scan, SubstrateResult,
    TableDescriptor, TablePool,
};
use vbase_types::{Record, Row, RowKey, Schema, SchemaHash};

use crate::config::{KeyStrategy, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::keygen;
use crate::layout::{
    self, DATA_COLUMN, FIRST_DATA_ROW, FORMAT_COLUMN, ROW_COLUMNS, SCHEMA_COLUMN, SEQUENCE_COLUMN,
    SEQUENCE_ROW, VERSION_COLUMN,
};
use crate::mutation::{Mutated, Mutation};
use crate::traits::{ObjectStore, RowIter};

/// Object store over a column-family table with optimistic versioning.
///
/// Writes encode the value with the store's codec under the record's
/// current schema, register that schema, and commit the row with a guarded
/// write on the version cell. Reads resolve the schema each row was written
/// with, so rows survive schema and format changes.
pub struct VersionedStore<T, K> {
    pool: TablePool,
    registry: Arc<SchemaRegistry>,
    codec: Arc<dyn Codec<T>>,
    schema: Schema,
    config: StoreConfig,
    _key: PhantomData<fn() -> K>,
}

impl<T: Record, K: RowKey> VersionedStore<T, K> {
    /// Descriptor of a data table with one single-version family.
    pub fn table_descriptor(config: &StoreConfig) -> TableDescriptor {
        TableDescriptor::new(&config.table).with_family(FamilyDescriptor::new(&config.family))
    }

    /// Open a store, creating the data and schema tables if needed.
    pub fn open(
        admin: Arc<dyn ColumnAdmin>,
        config: StoreConfig,
        codec: Arc<dyn Codec<T>>,
    ) -> StoreResult<Self> {
        config.validate()?;
        let pool = TablePool::new(admin, config.max_idle_tables);
        let registry = Arc::new(SchemaRegistry::open(pool.clone(), &config.schema_table)?);
        Self::with_registry(pool, registry, config, codec)
    }

    /// Open a store that shares a pool and schema registry with others.
    pub fn with_registry(
        pool: TablePool,
        registry: Arc<SchemaRegistry>,
        config: StoreConfig,
        codec: Arc<dyn Codec<T>>,
    ) -> StoreResult<Self> {
        config.validate()?;
        let schema = Schema::parse(T::SCHEMA)?;
        let created = pool.admin().ensure_table(&Self::table_descriptor(&config))?;
        if created {
            info!(table = %config.table, family = %config.family, "created data table");
        }
        Ok(Self {
            pool,
            registry,
            codec,
            schema,
            config,
            _key: PhantomData,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// The schema new writes are tagged with.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Commit `value` under `key` if the row's version is `expected`.
    /// Returns the commit timestamp, or `None` if the guard failed.
    fn write(&self, key: &K, value: &T, expected: u64) -> StoreResult<Option<i64>> {
        let hash = self.registry.register(&self.schema)?;
        let format = self.config.format;
        let payload = self.codec.encode(value, &self.schema, format)?;
        let family = &self.config.family;

        let put = Put::new(key.to_row_key())
            .add(family, SCHEMA_COLUMN, hash.to_hex())
            .add(family, DATA_COLUMN, payload)
            .add(family, VERSION_COLUMN, layout::encode_version(expected + 1))
            .add(family, FORMAT_COLUMN, layout::encode_format(format));
        // Version zero means the version cell must be absent.
        let guard = (expected != 0).then(|| layout::encode_version(expected));

        let outcome = self.pool.checkout(&self.config.table)?.check_and_put(
            family,
            VERSION_COLUMN,
            guard.as_deref(),
            &put,
        )?;
        match outcome {
            CasOutcome::Applied { timestamp } => {
                debug!(key = ?key, version = expected + 1, timestamp, "committed row");
                Ok(Some(timestamp))
            }
            CasOutcome::Rejected => {
                debug!(key = ?key, expected, "version guard failed");
                Ok(None)
            }
        }
    }

    /// Current version of `key`, zero if the row does not exist.
    fn current_version(&self, key: &K) -> StoreResult<u64> {
        let result = self.pool.checkout(&self.config.table)?.get(
            &key.to_row_key(),
            &self.config.family,
            &[VERSION_COLUMN],
        )?;
        match result.value(&self.config.family, VERSION_COLUMN) {
            None => Ok(0),
            Some(bytes) => layout::decode_version(bytes).ok_or_else(|| corrupt(key, "malformed version cell")),
        }
    }

    fn next_key(&self) -> StoreResult<K> {
        let bytes = match self.config.key_strategy {
            KeyStrategy::Random => keygen::random_key(),
            KeyStrategy::Sequential => {
                let n = self.pool.checkout(&self.config.table)?.increment(
                    &SEQUENCE_ROW,
                    &self.config.family,
                    SEQUENCE_COLUMN,
                    1,
                )?;
                keygen::sequential_key(n)
            }
        };
        Ok(K::from_row_key(&bytes)?)
    }

    /// Reconstruct a row from its cells. `None` if there is no payload.
    fn decode_row(&self, key: K, result: &RowResult) -> StoreResult<Option<Row<T, K>>> {
        let family = &self.config.family;
        // With several retained payload cells the earliest one is used.
        let Some(payload) = result
            .cells(family, DATA_COLUMN)
            .iter()
            .min_by_key(|cell| cell.timestamp)
        else {
            return Ok(None);
        };

        let version = result
            .value(family, VERSION_COLUMN)
            .ok_or_else(|| corrupt(&key, "missing version cell"))?;
        let version =
            layout::decode_version(version).ok_or_else(|| corrupt(&key, "malformed version cell"))?;
        let hash = result
            .value(family, SCHEMA_COLUMN)
            .ok_or_else(|| corrupt(&key, "missing schema cell"))?;
        let hash = SchemaHash::from_hex_bytes(hash).map_err(|e| corrupt(&key, e))?;
        let format = layout::decode_format(result.value(family, FORMAT_COLUMN)).map_err(|e| match e {
            StoreError::CorruptRow { reason, .. } => corrupt(&key, reason),
            other => other,
        })?;

        let schema = self.registry.resolve(&hash)?;
        let value = self.codec.decode(&payload.value, &schema, format)?;
        Ok(Some(Row::new(value, key, payload.timestamp, version)))
    }

    fn decode_scanned(&self, result: SubstrateResult<RowResult>) -> StoreResult<Option<Row<T, K>>> {
        let result = result?;
        if result.row() == SEQUENCE_ROW {
            return Ok(None);
        }
        let key = K::from_row_key(result.row())?;
        self.decode_row(key, &result)
    }

    fn mutate_loop(
        &self,
        key: &K,
        mutator: &mut dyn FnMut(&T) -> Mutation<T>,
        mut creator: Option<&mut dyn FnMut() -> T>,
    ) -> StoreResult<Option<Mutated<T, K>>> {
        let mut retry = self.config.retry.start("mutate");
        loop {
            match self.get(key)? {
                None => {
                    let Some(create) = creator.as_deref_mut() else {
                        return Ok(None);
                    };
                    let value = create();
                    if let Some(timestamp) = self.write(key, &value, 0)? {
                        let row = Row::new(value, key.clone(), timestamp, 1);
                        return Ok(Some(Mutated::Changed(row)));
                    }
                }
                Some(current) => match mutator(current.value()) {
                    Mutation::Unchanged => return Ok(Some(Mutated::Unchanged(current))),
                    Mutation::Changed(value) => {
                        let version = current.version();
                        if let Some(timestamp) = self.write(key, &value, version)? {
                            let row = Row::new(value, key.clone(), timestamp, version + 1);
                            return Ok(Some(Mutated::Changed(row)));
                        }
                    }
                },
            }
            warn!(key = ?key, attempt = retry.attempts() + 1, "concurrent update, retrying mutate");
            retry.next_attempt()?;
        }
    }
}

impl<T: Record, K: RowKey> ObjectStore<T, K> for VersionedStore<T, K> {
    fn get(&self, key: &K) -> StoreResult<Option<Row<T, K>>> {
        let result = self.pool.checkout(&self.config.table)?.get(
            &key.to_row_key(),
            &self.config.family,
            &ROW_COLUMNS,
        )?;
        self.decode_row(key.clone(), &result)
    }

    fn create(&self, value: &T) -> StoreResult<K> {
        let mut retry = self.config.retry.start("create");
        loop {
            let key = self.next_key()?;
            if self.write(&key, value, 0)?.is_some() {
                debug!(key = ?key, strategy = ?self.config.key_strategy, "allocated key");
                return Ok(key);
            }
            warn!(key = ?key, strategy = ?self.config.key_strategy, "generated key is taken, drawing another");
            retry.next_attempt()?;
        }
    }

    fn put(&self, key: &K, value: &T) -> StoreResult<()> {
        let mut retry = self.config.retry.start("put");
        loop {
            let version = self.current_version(key)?;
            if self.write(key, value, version)?.is_some() {
                return Ok(());
            }
            warn!(key = ?key, attempt = retry.attempts() + 1, "concurrent update, retrying put");
            retry.next_attempt()?;
        }
    }

    fn put_versioned(&self, key: &K, value: &T, expected_version: u64) -> StoreResult<bool> {
        Ok(self.write(key, value, expected_version)?.is_some())
    }

    fn mutate(
        &self,
        key: &K,
        mutator: &mut dyn FnMut(&T) -> Mutation<T>,
    ) -> StoreResult<Option<Mutated<T, K>>> {
        self.mutate_loop(key, mutator, None)
    }

    fn mutate_or_create(
        &self,
        key: &K,
        mutator: &mut dyn FnMut(&T) -> Mutation<T>,
        creator: &mut dyn FnMut() -> T,
    ) -> StoreResult<Mutated<T, K>> {
        self.mutate_loop(key, mutator, Some(creator))?
            .ok_or_else(|| corrupt(key, "row vanished while creating"))
    }

    fn delete(&self, key: &K) -> StoreResult<()> {
        self.pool
            .checkout(&self.config.table)?
            .delete_family(&key.to_row_key(), &self.config.family)?;
        debug!(key = ?key, "deleted row");
        Ok(())
    }

    fn scan<'a>(&'a self, start: Option<&K>, stop: Option<&K>) -> StoreResult<RowIter<'a, T, K>> {
        let start = match start {
            Some(key) => key.to_row_key(),
            None => FIRST_DATA_ROW.to_vec(),
        };
        let mut scan = Scan::family(&self.config.family).start(start);
        if let Some(stop) = stop {
            scan = scan.stop(stop.to_row_key());
        }
        let rows = self
            .pool
            .checkout(&self.config.table)?
            .into_scanner(&scan)?
            .filter_map(move |result| self.decode_scanned(result).transpose());
        Ok(Box::new(rows))
    }
}

impl<T, K> std::fmt::Debug for VersionedStore<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedStore")
            .field("table", &self.config.table)
            .field("schema", &self.schema.name())
            .field("format", &self.config.format)
            .finish()
    }
}

fn corrupt(key: &impl std::fmt::Debug, reason: impl ToString) -> StoreError {
    StoreError::CorruptRow {
        key: format!("{key:?}"),
        reason: reason.to_string(),
    }
}
