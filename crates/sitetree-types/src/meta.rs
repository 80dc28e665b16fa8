//! Precomputed metadata table format (`_meta.json`).
//!
//! ```json
//! {
//!   "generatedAt": "2026-01-01T00:00:00Z",
//!   "timezone": "UTC",
//!   "timeSource": "git",
//!   "entries": {
//!     "": { "type": "dir", "size": null, "mtimeMs": 1700000000000 },
//!     "docs/a.txt": { "type": "file", "size": 100, "mtimeMs": 1700000000000 }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entry::EntryKind;

/// Timezone marker written into every metadata file.
pub const UTC_MARKER: &str = "UTC";

/// Metadata for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRecord {
    /// Entry type at generation time.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Byte count for files, `null` for directories.
    pub size: Option<u64>,
    /// Milliseconds since the Unix epoch, UTC.
    #[serde(deserialize_with = "millis_from_number")]
    pub mtime_ms: i64,
}

impl MetaRecord {
    /// Record for a directory.
    pub fn dir(mtime_ms: i64) -> Self {
        Self {
            kind: EntryKind::Dir,
            size: None,
            mtime_ms,
        }
    }

    /// Record for a file.
    pub fn file(size: u64, mtime_ms: i64) -> Self {
        Self {
            kind: EntryKind::File,
            size: Some(size),
            mtime_ms,
        }
    }

    /// True when `size` is present exactly for files.
    pub fn is_consistent(&self) -> bool {
        self.kind.is_file() == self.size.is_some()
    }
}

/// Where file timestamps in a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSource {
    /// Version-control history, with filesystem time for untracked paths.
    Git,
    /// Filesystem modification times only.
    #[default]
    Filesystem,
}

/// The serialized metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaFile {
    /// When the generator ran.
    pub generated_at: DateTime<Utc>,
    /// Timezone of every `mtimeMs` value.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Which timestamp source produced file times.
    #[serde(default)]
    pub time_source: TimeSource,
    /// Normalized relative path → record. The root is keyed by `""`.
    pub entries: BTreeMap<String, MetaRecord>,
}

impl MetaFile {
    /// Wrap a finished table, stamping it with the current time.
    pub fn new(time_source: TimeSource, entries: BTreeMap<String, MetaRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            timezone: UTC_MARKER.to_string(),
            time_source,
            entries,
        }
    }

    /// First path whose record breaks the size/type pairing, if any.
    pub fn first_inconsistent(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, record)| !record.is_consistent())
            .map(|(path, _)| path.as_str())
    }
}

fn default_timezone() -> String {
    UTC_MARKER.to_string()
}

// Older tables carry fractional stat times; truncate them to whole ms.
fn millis_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(ms) = number.as_i64() {
        return Ok(ms);
    }
    match number.as_f64() {
        Some(ms) if ms.is_finite() => Ok(ms.floor() as i64),
        _ => Err(serde::de::Error::custom(format!("invalid mtimeMs: {number}"))),
    }
}
