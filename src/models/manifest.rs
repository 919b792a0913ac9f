//! Represents one file in the manifest returned to the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A downloadable file, described the way the client renders it.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ManifestItem {
    /// Display name (fourth key segment).
    #[serde(rename = "FileName")]
    pub file_name: String,

    /// Full object key.
    #[serde(rename = "FileKey")]
    pub file_key: String,

    /// Size in whole kibibytes, rounded down.
    #[serde(rename = "KBytes")]
    pub kbytes: u64,

    #[serde(rename = "Bytes")]
    pub bytes: u64,

    /// Upload start in milliseconds since the Unix epoch.
    #[serde(rename = "Epoch")]
    pub epoch: i64,

    /// Upload start, formatted in the display zone.
    #[serde(rename = "Start")]
    pub start: String,

    /// Last modification, formatted in the display zone.
    #[serde(rename = "End")]
    pub end: String,

    /// Upload start as an instant; drives ordering.
    #[serde(skip)]
    pub started_at: DateTime<Utc>,
}
