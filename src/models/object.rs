//! Represents an object returned by a bucket listing.

use chrono::{DateTime, Utc};

/// A single object under the listed prefix.
///
/// Only the listing metadata is kept; contents are never fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    /// Object key (slash-delimited path within the bucket).
    pub key: String,

    /// Size in bytes.
    pub size: u64,

    /// Timestamp when the object was last written.
    pub last_modified: DateTime<Utc>,
}

/// The semantic parts of a `downloads/<uid>/<epoch>/<file>` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadKey<'a> {
    pub uid: &'a str,
    /// Upload start as raw millisecond-epoch text; parsed by the caller.
    pub epoch: &'a str,
    pub file_name: &'a str,
}

impl<'a> DownloadKey<'a> {
    /// Split a key into its parts. Keys with three or fewer segments do not
    /// reach the file level and yield `None`.
    pub fn parse(key: &'a str) -> Option<Self> {
        let segments: Vec<&str> = key.split('/').collect();
        if segments.len() <= 3 {
            return None;
        }
        Some(Self {
            uid: segments[1],
            epoch: segments[2],
            file_name: segments[3],
        })
    }
}
