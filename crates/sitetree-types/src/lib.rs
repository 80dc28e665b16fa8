//! Wire types shared by the sitetree kernel and its front ends.
//!
//! This is a leaf crate with no I/O: everything here is plain data that
//! serializes to the JSON shapes consumed by the browser client and written
//! by the metadata generator.
//!
//! # Key Types
//!
//! |-------------------|----------------------------------------------------|
//! | Type              | Purpose                                            |
//! |-------------------|----------------------------------------------------|
//! | [`EntryKind`]     | `dir` or `file`, classified once                    |
//! | [`Entry`]         | One child in a listing (name, path, kind, size, mtime) |
//! | [`ListingResult`] | `{ baseUrl, path, items }` for one directory        |
//! | [`MetaRecord`]    | Precomputed `{ type, size, mtimeMs }`               |
//! | [`MetaFile`]      | The serialized metadata table (`_meta.json`)        |
//! |-------------------|----------------------------------------------------|

pub mod collate;
pub mod entry;
pub mod meta;

pub use collate::locale_cmp;
pub use entry::{Entry, EntryKind, ListingResult, ROOT_PATH, join_rel};
pub use meta::{MetaFile, MetaRecord, TimeSource, UTC_MARKER};
