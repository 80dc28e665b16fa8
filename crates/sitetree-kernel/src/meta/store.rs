//! Load-once metadata store.
//!
//! The first listing that needs metadata reads the table; every later call
//! shares the cached result for the life of the process. Failed loads are not
//! cached, so a broken deployment keeps reporting the failure instead of
//! silently serving live stats.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::config::MetadataPolicy;
use crate::error::{TreeError, TreeResult};
use crate::meta::MetadataTable;

/// Lazily loaded, process-lifetime metadata table.
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    policy: MetadataPolicy,
    cell: OnceCell<Option<Arc<MetadataTable>>>,
}

impl MetadataStore {
    /// Create a store that will load `path` on first use.
    pub fn new(path: impl Into<PathBuf>, policy: MetadataPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            cell: OnceCell::new(),
        }
    }

    /// Create a store around an already-loaded table.
    pub fn preloaded(table: MetadataTable, policy: MetadataPolicy) -> Self {
        let path = table.source().to_path_buf();
        Self {
            path,
            policy,
            cell: OnceCell::new_with(Some(Some(Arc::new(table)))),
        }
    }

    /// Policy this store was built with.
    pub fn policy(&self) -> MetadataPolicy {
        self.policy
    }

    /// Metadata file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once a load has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Get the table, loading it on first call.
    ///
    /// `Ok(None)` means "no table" and only happens under
    /// [`MetadataPolicy::Fallback`]; under [`MetadataPolicy::Strict`] a
    /// missing file is `MetadataUnavailable`.
    pub async fn table(&self) -> TreeResult<Option<Arc<MetadataTable>>> {
        let table = self
            .cell
            .get_or_try_init(|| async {
                match MetadataTable::load(&self.path).await? {
                    Some(table) => {
                        tracing::debug!(
                            path = %self.path.display(),
                            entries = table.len(),
                            "loaded metadata table"
                        );
                        Ok(Some(Arc::new(table)))
                    }
                    None if self.policy == MetadataPolicy::Strict => Err(
                        TreeError::metadata_unavailable(&self.path, "metadata file is missing"),
                    ),
                    None => {
                        tracing::info!(
                            path = %self.path.display(),
                            "no metadata table, listings use live filesystem stats"
                        );
                        Ok(None)
                    }
                }
            })
            .await?;
        Ok(table.clone())
    }
}
