use serde::{Deserialize, Serialize};
use vbase_types::Format;

use crate::error::{StoreError, StoreResult};
use crate::retry::RetryPolicy;

/// How [`create`](crate::ObjectStore::create) picks a key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// 16 hex characters of a random 64-bit integer.
    #[default]
    Random,
    /// An atomic counter with its decimal digits reversed.
    Sequential,
}

/// Configuration of a [`VersionedStore`](crate::VersionedStore).
///
/// Every field has a default, so a TOML document only needs the keys it
/// overrides:
///
/// ```toml
/// table = "users"
/// format = "json"
/// key_strategy = "sequential"
///
/// [retry]
/// max_attempts = 16
/// base_delay_ms = 2
/// max_delay_ms = 50
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Data table name.
    pub table: String,
    /// Column family holding object cells.
    pub family: String,
    /// Table holding schema definitions. May be shared between stores.
    pub schema_table: String,
    /// Format new writes are encoded with.
    pub format: Format,
    pub key_strategy: KeyStrategy,
    pub retry: RetryPolicy,
    /// Idle handles kept per table by the handle pool.
    pub max_idle_tables: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: "objects".into(),
            family: "d".into(),
            schema_table: "schemas".into(),
            format: Format::Binary,
            key_strategy: KeyStrategy::Random,
            retry: RetryPolicy::default(),
            max_idle_tables: 8,
        }
    }
}

impl StoreConfig {
    /// Default configuration over `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document and validate it.
    pub fn from_toml(text: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn with_schema_table(mut self, schema_table: impl Into<String>) -> Self {
        self.schema_table = schema_table.into();
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_key_strategy(mut self, key_strategy: KeyStrategy) -> Self {
        self.key_strategy = key_strategy;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Reject configurations no store can open.
    pub fn validate(&self) -> StoreResult<()> {
        if self.table.is_empty() {
            return Err(StoreError::Config("table name is empty".into()));
        }
        if self.family.is_empty() {
            return Err(StoreError::Config("column family is empty".into()));
        }
        if self.schema_table.is_empty() {
            return Err(StoreError::Config("schema table name is empty".into()));
        }
        if self.schema_table == self.table {
            return Err(StoreError::Config(format!(
                "schema table and data table are both {:?}",
                self.table
            )));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(StoreError::Config("retry.max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.table, "objects");
        assert_eq!(config.family, "d");
        assert_eq!(config.schema_table, "schemas");
        assert_eq!(config.format, Format::Binary);
        assert_eq!(config.key_strategy, KeyStrategy::Random);
        assert_eq!(config.retry.max_attempts, None);
        config.validate().unwrap();
    }

    #[test]
    fn parse_partial_toml() {
        let config = StoreConfig::from_toml(
            r#"
            table = "users"
            format = "json"
            key_strategy = "sequential"

            [retry]
            max_attempts = 16
            base_delay_ms = 2
            max_delay_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.table, "users");
        assert_eq!(config.family, "d");
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.key_strategy, KeyStrategy::Sequential);
        assert_eq!(config.retry.max_attempts, Some(16));
        assert_eq!(config.retry.max_delay_ms, 50);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(StoreConfig::from_toml("").unwrap(), StoreConfig::default());
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(matches!(
            StoreConfig::from_toml(r#"format = "xml""#),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn rejects_shared_table() {
        let config = StoreConfig::new("schemas");
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn rejects_zero_attempts() {
        let config = StoreConfig::default().with_retry(RetryPolicy::bounded(0));
        assert!(config.validate().is_err());
    }
}
