//! Sitetree kernel: sandboxed directory listings over a static file tree.
//!
//! Two halves share one configuration:
//!
//! - **Listing** ([`ListingService`] / [`ListingEngine`]): resolve a
//!   requested path inside the root, enumerate one level, hide reserved
//!   names, attach size and mtime from the precomputed metadata table
//!   ([`MetadataStore`]) or a live stat, and return a sorted
//!   [`ListingResult`](sitetree_types::ListingResult).
//! - **Generation** ([`MetadataGenerator`]): walk the whole tree offline,
//!   take file times from a [`TimestampOracle`] (git history) or the
//!   filesystem, roll directory times up from their descendants, and persist
//!   the table atomically.
//!
//! Everything is async on tokio; git2 calls run on the blocking pool.

pub mod config;
pub mod error;
pub mod generator;
pub mod git_ops;
pub mod listing;
pub mod meta;
pub mod oracle;
pub mod sandbox;
pub mod service;
pub mod stat;

pub use config::{CONFIG_FILE, META_FILE, MetadataPolicy, SiteConfig};
pub use error::{ErrorClass, TreeError, TreeResult};
pub use generator::MetadataGenerator;
pub use git_ops::{GitError, GitRepo};
pub use listing::ListingEngine;
pub use meta::{MetadataStore, MetadataTable};
pub use oracle::{GitOracle, NoHistory, TimestampOracle};
pub use sandbox::{PathSandbox, Resolved};
pub use service::{ErrorPayload, ListingResponse, ListingService, ResponseBody};
