//! Listing engine.
//!
//! Enumerates one directory level, hides housekeeping entries (everywhere)
//! and reserved names (root only), then fills in size/mtime from the
//! metadata table or from a live stat.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::try_join_all;
use sitetree_types::{Entry, EntryKind, ListingResult, MetaRecord, join_rel};
use tokio::fs;

use crate::config::{MetadataPolicy, SiteConfig};
use crate::error::{TreeError, TreeResult};
use crate::meta::{MetadataStore, MetadataTable};
use crate::sandbox::PathSandbox;
use crate::stat::{live_stat, mtime_ms};

/// A visible child before metadata is attached.
#[derive(Debug)]
struct Child {
    name: String,
    rel: String,
    abs: PathBuf,
    kind: EntryKind,
}

/// Produces directory listings under one root.
#[derive(Debug, Clone)]
pub struct ListingEngine {
    config: Arc<SiteConfig>,
    sandbox: PathSandbox,
}

impl ListingEngine {
    /// Create an engine for `config.root`.
    pub fn new(config: Arc<SiteConfig>) -> Self {
        let sandbox = PathSandbox::new(&config.root);
        Self { config, sandbox }
    }

    /// The sandbox requests are resolved through.
    pub fn sandbox(&self) -> &PathSandbox {
        &self.sandbox
    }

    /// List the immediate children of `requested`.
    ///
    /// The metadata store is only consulted when there is at least one
    /// visible child, so an empty directory always lists.
    pub async fn list(&self, store: &MetadataStore, requested: &str) -> TreeResult<ListingResult> {
        let resolved = self.sandbox.resolve(requested)?;

        // resolve() is lexical; a symlinked directory can still point outside
        let real = fs::canonicalize(&resolved.abs)
            .await
            .map_err(|e| TreeError::from_lookup(&resolved.rel, e))?;
        if !dunce::simplified(&real).starts_with(self.sandbox.root()) {
            tracing::warn!(path = %resolved.rel, "symlink leads outside the root");
            return Err(TreeError::path_escape(&resolved.rel));
        }

        let meta = fs::metadata(&resolved.abs)
            .await
            .map_err(|e| TreeError::from_lookup(&resolved.rel, e))?;
        if !meta.is_dir() {
            return Err(TreeError::not_a_directory(&resolved.rel));
        }

        let mut dir = fs::read_dir(&resolved.abs)
            .await
            .map_err(|e| TreeError::from_lookup(&resolved.rel, e))?;

        let mut children = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.config.is_housekeeping(&name) {
                continue;
            }
            if resolved.is_root() && self.config.is_reserved_root_name(&name) {
                continue;
            }

            let kind = if entry.file_type().await?.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };

            children.push(Child {
                rel: join_rel(&resolved.rel, &name),
                abs: entry.path(),
                name,
                kind,
            });
        }

        let table = if children.is_empty() {
            None
        } else {
            store.table().await?
        };
        let policy = store.policy();

        let items = try_join_all(
            children
                .into_iter()
                .map(|child| attach_metadata(child, table.as_deref(), policy)),
        )
        .await?;

        Ok(ListingResult::new(&self.config.base_url, resolved.rel, items))
    }
}

async fn attach_metadata(
    child: Child,
    table: Option<&MetadataTable>,
    policy: MetadataPolicy,
) -> TreeResult<Entry> {
    if let Some(table) = table {
        match table.get(&child.rel) {
            Some(record) if record.kind == child.kind => {
                return Ok(from_record(child, record));
            }
            found => {
                if policy == MetadataPolicy::Strict {
                    return Err(TreeError::missing_entry(child.rel));
                }
                tracing::debug!(
                    path = %child.rel,
                    recorded = found.map(|r| r.kind.as_str()),
                    live = child.kind.as_str(),
                    "stale metadata entry, using live stat"
                );
            }
        }
    }

    let meta = live_stat(&child.abs).await?;
    let mtime = mtime_ms(&meta);
    Ok(match child.kind {
        EntryKind::Dir => Entry::dir(child.name, child.rel, mtime),
        EntryKind::File => Entry::file(child.name, child.rel, meta.len(), mtime),
    })
}

fn from_record(child: Child, record: &MetaRecord) -> Entry {
    match child.kind {
        EntryKind::Dir => Entry::dir(child.name, child.rel, record.mtime_ms),
        EntryKind::File => Entry::file(
            child.name,
            child.rel,
            record.size.unwrap_or_default(),
            record.mtime_ms,
        ),
    }
}
