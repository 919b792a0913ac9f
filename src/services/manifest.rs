//! Turns a raw listing into the sorted file manifest.
//!
//! Filtering rules, in order:
//! - keys that do not reach `downloads/<uid>/<epoch>/<file>` are skipped
//! - keys belonging to another uid (prefix matches like `u` vs `u2`) are skipped
//! - zero-byte objects are skipped
//! - `part-*` files are skipped when temporary artifacts are filtered
//! - keys whose epoch segment is not a millisecond timestamp are skipped

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::models::{
    manifest::ManifestItem,
    object::{DownloadKey, ObjectEntry},
};

/// Filename prefix of in-progress multipart uploads.
pub const TEMP_ARTIFACT_PREFIX: &str = "part-";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ZONED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z%z";

/// Zone used when rendering `Start` and `End`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeDisplay {
    /// Host-local wall clock, no zone suffix.
    Local,
    /// Named zone, rendered with abbreviation and offset (`EST-0500`).
    Zone(Tz),
}

impl Default for TimeDisplay {
    fn default() -> Self {
        TimeDisplay::Zone(chrono_tz::America::New_York)
    }
}

impl TimeDisplay {
    /// `local` (any case) or an IANA zone name.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("local") {
            return Some(TimeDisplay::Local);
        }
        name.parse::<Tz>().ok().map(TimeDisplay::Zone)
    }

    pub fn format(&self, instant: DateTime<Utc>) -> String {
        match self {
            TimeDisplay::Local => instant.with_timezone(&Local).format(TIME_FORMAT).to_string(),
            TimeDisplay::Zone(tz) => instant
                .with_timezone(tz)
                .format(ZONED_TIME_FORMAT)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifestOptions {
    pub skip_temp_artifacts: bool,
    pub display: TimeDisplay,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            skip_temp_artifacts: true,
            display: TimeDisplay::default(),
        }
    }
}

impl ManifestOptions {
    /// Keeps `part-*` files and renders host-local time.
    pub fn basic() -> Self {
        Self {
            skip_temp_artifacts: false,
            display: TimeDisplay::Local,
        }
    }
}

pub fn is_temp_artifact(file_name: &str) -> bool {
    file_name
        .get(..TEMP_ARTIFACT_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(TEMP_ARTIFACT_PREFIX))
}

/// Build the manifest for `uid`, newest upload first.
pub fn build_manifest(
    uid: &str,
    objects: Vec<ObjectEntry>,
    options: &ManifestOptions,
) -> Vec<ManifestItem> {
    let mut items: Vec<ManifestItem> = objects
        .into_iter()
        .filter_map(|obj| manifest_item(uid, obj, options))
        .collect();

    items.sort_by(|a, b| {
        b.started_at
            .cmp(&a.started_at)
            .then_with(|| a.file_key.cmp(&b.file_key))
    });
    items
}

fn manifest_item(uid: &str, obj: ObjectEntry, options: &ManifestOptions) -> Option<ManifestItem> {
    let Some(parts) = DownloadKey::parse(&obj.key) else {
        debug!("skipping {}: not a file-level key", obj.key);
        return None;
    };
    if parts.uid != uid {
        debug!("skipping {}: belongs to uid {}", obj.key, parts.uid);
        return None;
    }
    if obj.size == 0 {
        debug!("skipping {}: empty object", obj.key);
        return None;
    }
    if options.skip_temp_artifacts && is_temp_artifact(parts.file_name) {
        info!("skipping temporary artifact {}", obj.key);
        return None;
    }

    let Some((epoch, started_at)) = parts
        .epoch
        .parse::<i64>()
        .ok()
        .and_then(|ms| DateTime::from_timestamp_millis(ms).map(|at| (ms, at)))
    else {
        warn!("skipping {}: `{}` is not a millisecond epoch", obj.key, parts.epoch);
        return None;
    };

    Some(ManifestItem {
        file_name: parts.file_name.to_string(),
        kbytes: obj.size / 1024,
        bytes: obj.size,
        epoch,
        start: options.display.format(started_at),
        end: options.display.format(obj.last_modified),
        started_at,
        file_key: obj.key,
    })
}
