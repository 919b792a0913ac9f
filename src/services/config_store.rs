//! The configuration store seam: where the data bucket name comes from.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::config_record::ConfigRecord;

#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("configuration table `{0}` not found")]
    TableNotFound(String),
    #[error("configuration table name `{0}` is invalid")]
    InvalidTableName(String),
    #[error("configuration backend error: {0}")]
    Backend(String),
}

pub type ConfigStoreResult<T> = Result<T, ConfigStoreError>;

/// A table holding the configuration record(s).
///
/// Both calls hit the backing store every time; nothing is cached.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Succeeds when the table exists; `TableNotFound` when it does not.
    async fn ensure_exists(&self) -> ConfigStoreResult<()>;

    /// Every record currently in the table.
    async fn scan(&self) -> ConfigStoreResult<Vec<ConfigRecord>>;
}

/// A store holding exactly one record built from an injected bucket name.
#[derive(Debug, Clone)]
pub struct StaticConfigStore {
    bucket: String,
}

impl StaticConfigStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ConfigStore for StaticConfigStore {
    async fn ensure_exists(&self) -> ConfigStoreResult<()> {
        Ok(())
    }

    async fn scan(&self) -> ConfigStoreResult<Vec<ConfigRecord>> {
        Ok(vec![ConfigRecord::with_bucket(self.bucket.clone())])
    }
}

/// Table names accepted by both backends: 3–255 chars of ASCII
/// alphanumerics, `_`, `-` and `.`.
pub fn is_valid_table_name(name: &str) -> bool {
    (3..=255).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}
