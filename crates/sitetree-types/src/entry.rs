//! Listing entries and the listing result envelope.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::collate::locale_cmp;

/// Normalized relative path of the tree root.
pub const ROOT_PATH: &str = "";

/// Node classification. Fixed once an entry is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Directory.
    Dir,
    /// Anything that is not a directory (regular files, symlinks).
    File,
}

impl EntryKind {
    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Dir)
    }

    /// Returns true if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }

    /// Wire name (`"dir"` / `"file"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Dir => "dir",
            EntryKind::File => "file",
        }
    }
}

/// One immediate child of a listed directory.
///
/// `size` is `None` for directories and `Some` for files. [`Entry::dir`] and
/// [`Entry::file`] keep that pairing; the fields stay public for the wire
/// format, so code building an `Entry` by hand must keep it too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Final path segment.
    pub name: String,
    /// Full normalized relative path from the root.
    pub path: String,
    /// Entry type.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Byte count for files, `null` for directories.
    pub size: Option<u64>,
    /// Milliseconds since the Unix epoch, UTC.
    pub mtime_ms: i64,
}

impl Entry {
    /// Create a directory entry.
    pub fn dir(name: impl Into<String>, path: impl Into<String>, mtime_ms: i64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::Dir,
            size: None,
            mtime_ms,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>, path: impl Into<String>, size: u64, mtime_ms: i64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::File,
            size: Some(size),
            mtime_ms,
        }
    }

    /// Listing order: directories before files, then locale order by name.
    pub fn listing_order(a: &Entry, b: &Entry) -> Ordering {
        match (a.kind, b.kind) {
            (EntryKind::Dir, EntryKind::File) => Ordering::Less,
            (EntryKind::File, EntryKind::Dir) => Ordering::Greater,
            _ => locale_cmp(&a.name, &b.name),
        }
    }
}

/// Listing of one directory: `{ baseUrl, path, items }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResult {
    /// Root marker the client prefixes onto `path` to fetch assets.
    pub base_url: String,
    /// Normalized relative path of the listed directory (`""` for the root).
    pub path: String,
    /// Immediate children in listing order.
    pub items: Vec<Entry>,
}

impl ListingResult {
    /// Build a result, putting `items` into listing order.
    pub fn new(base_url: impl Into<String>, path: impl Into<String>, mut items: Vec<Entry>) -> Self {
        items.sort_by(Entry::listing_order);
        Self {
            base_url: base_url.into(),
            path: path.into(),
            items,
        }
    }

    /// True when the directory has no visible children.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Join a child name onto a normalized relative parent path.
pub fn join_rel(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
