#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use download_lister::{
    models::{config_record::ConfigRecord, object::ObjectEntry},
    services::{
        config_store::{ConfigStore, ConfigStoreError, ConfigStoreResult},
        object_lister::{Listing, ListingError, ObjectLister},
    },
};
use std::sync::Mutex;

/// Configuration table held in memory; `None` means the table does not exist.
pub struct MemoryConfigStore {
    pub records: Option<Vec<ConfigRecord>>,
}

impl MemoryConfigStore {
    pub fn with_buckets(buckets: &[&str]) -> Self {
        Self {
            records: Some(buckets.iter().map(|b| ConfigRecord::with_bucket(*b)).collect()),
        }
    }

    pub fn missing() -> Self {
        Self { records: None }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn ensure_exists(&self) -> ConfigStoreResult<()> {
        match self.records {
            Some(_) => Ok(()),
            None => Err(ConfigStoreError::TableNotFound("BDDMainTable".into())),
        }
    }

    async fn scan(&self) -> ConfigStoreResult<Vec<ConfigRecord>> {
        self.records
            .clone()
            .ok_or_else(|| ConfigStoreError::TableNotFound("BDDMainTable".into()))
    }
}

/// Bucket contents held in memory, filtered by prefix like a real listing.
#[derive(Default)]
pub struct MemoryObjectLister {
    pub bucket: String,
    pub objects: Vec<ObjectEntry>,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl MemoryObjectLister {
    pub fn new(bucket: &str, objects: Vec<ObjectEntry>) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ObjectLister for MemoryObjectLister {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Listing, ListingError> {
        self.requests
            .lock()
            .unwrap()
            .push((bucket.to_string(), prefix.to_string()));
        if bucket != self.bucket {
            return Err(ListingError::BucketNotFound(bucket.to_string()));
        }
        Ok(Listing {
            objects: self
                .objects
                .iter()
                .filter(|o| o.key.starts_with(prefix))
                .cloned()
                .collect(),
            truncated: false,
        })
    }
}

pub fn object(key: &str, size: u64) -> ObjectEntry {
    ObjectEntry {
        key: key.to_string(),
        size,
        last_modified: Utc.with_ymd_and_hms(2023, 1, 10, 12, 0, 0).unwrap(),
    }
}
