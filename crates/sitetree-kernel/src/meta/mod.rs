//! Precomputed metadata.
//!
//! - [`MetadataTable`] - One parsed `_meta.json`, indexed by relative path
//! - [`MetadataStore`] - Load-once cache owned by the listing service

mod store;
mod table;

pub use store::MetadataStore;
pub use table::MetadataTable;
pub(crate) use table::TEMP_PREFIX;
