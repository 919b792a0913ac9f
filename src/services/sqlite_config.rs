//! SQLite-backed configuration store.
//!
//! The table has one row per configuration record with a text
//! `"data-bucket"` column. Queries run against a shared `SqlitePool`.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

use crate::{
    models::config_record::ConfigRecord,
    services::config_store::{ConfigStore, ConfigStoreError, ConfigStoreResult, is_valid_table_name},
};

#[derive(Clone)]
pub struct SqliteConfigStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
    table: String,
}

impl SqliteConfigStore {
    /// The table name is interpolated into SQL, so it is validated here.
    pub fn new(db: Arc<SqlitePool>, table: impl Into<String>) -> ConfigStoreResult<Self> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(ConfigStoreError::InvalidTableName(table));
        }
        Ok(Self { db, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the configuration table if it does not exist yet.
    pub async fn migrate(&self) -> ConfigStoreResult<()> {
        let sql = format!(
            r#"CREATE TABLE IF NOT EXISTS "{}" (
                id TEXT PRIMARY KEY NOT NULL,
                "data-bucket" TEXT
            )"#,
            self.table
        );
        debug!("Executing migration SQL: {}", sql);
        sqlx::query(&sql)
            .execute(&*self.db)
            .await
            .map_err(|err| ConfigStoreError::Backend(err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn ensure_exists(&self) -> ConfigStoreResult<()> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
        )
        .bind(&self.table)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| ConfigStoreError::Backend(err.to_string()))?;

        if count == 0 {
            return Err(ConfigStoreError::TableNotFound(self.table.clone()));
        }
        Ok(())
    }

    async fn scan(&self) -> ConfigStoreResult<Vec<ConfigRecord>> {
        let sql = format!(r#"SELECT "data-bucket" FROM "{}""#, self.table);
        let buckets = sqlx::query_scalar::<_, Option<String>>(&sql)
            .fetch_all(&*self.db)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(db_err) if db_err.message().contains("no such table") => {
                    ConfigStoreError::TableNotFound(self.table.clone())
                }
                other => ConfigStoreError::Backend(other.to_string()),
            })?;

        Ok(buckets
            .into_iter()
            .map(|data_bucket| ConfigRecord { data_bucket })
            .collect())
    }
}
