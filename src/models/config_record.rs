//! The configuration record naming the data bucket.

/// Attribute (or column) holding the bucket name.
pub const DATA_BUCKET_FIELD: &str = "data-bucket";

/// One row of the configuration table.
///
/// `data_bucket` is `None` when the row lacks a string `data-bucket` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRecord {
    pub data_bucket: Option<String>,
}

impl ConfigRecord {
    pub fn with_bucket(bucket: impl Into<String>) -> Self {
        Self {
            data_bucket: Some(bucket.into()),
        }
    }
}
