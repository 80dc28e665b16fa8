//! Offline metadata generator.
//!
//! Walks the whole tree once, post-order. Files take their time from the
//! oracle when it knows one and from the filesystem otherwise; directories
//! take the newest time of anything beneath them, or their own stat time
//! when empty. Any unreadable entry aborts the run before anything is
//! written.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use sitetree_types::{MetaFile, MetaRecord, join_rel};
use tokio::fs;

use crate::config::SiteConfig;
use crate::error::{TreeError, TreeResult};
use crate::meta::{MetadataTable, TEMP_PREFIX};
use crate::oracle::{GitOracle, NoHistory, TimestampOracle};
use crate::sandbox::PathSandbox;
use crate::stat::{live_stat, mtime_ms};

/// Sibling entries walked concurrently per directory.
const WALK_CONCURRENCY: usize = 16;

/// Records for one subtree plus its aggregate timestamp.
struct Subtree {
    mtime_ms: i64,
    records: Vec<(String, MetaRecord)>,
}

/// Builds the metadata table for a tree root.
pub struct MetadataGenerator {
    config: Arc<SiteConfig>,
    oracle: Arc<dyn TimestampOracle>,
}

impl std::fmt::Debug for MetadataGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataGenerator")
            .field("root", &self.config.root)
            .field("source", &self.oracle.source())
            .finish()
    }
}

impl MetadataGenerator {
    /// Create a generator with an explicit oracle.
    pub fn new(config: Arc<SiteConfig>, oracle: Arc<dyn TimestampOracle>) -> Self {
        Self { config, oracle }
    }

    /// Create a generator using git history when configured and available.
    pub fn from_config(config: Arc<SiteConfig>) -> Self {
        let oracle: Arc<dyn TimestampOracle> = if config.use_git_history {
            match GitOracle::discover(&config.root) {
                Ok(oracle) => Arc::new(oracle),
                Err(e) => {
                    tracing::warn!(
                        root = %config.root.display(),
                        error = %e,
                        "no usable git history, using filesystem times"
                    );
                    Arc::new(NoHistory)
                }
            }
        } else {
            Arc::new(NoHistory)
        };
        Self::new(config, oracle)
    }

    /// Walk the tree and build the table. Nothing is written.
    #[tracing::instrument(skip(self), fields(root = %self.config.root.display()), name = "generator.generate")]
    pub async fn generate(&self) -> TreeResult<MetadataTable> {
        let started = Instant::now();
        let root = PathSandbox::new(&self.config.root).root().to_path_buf();

        let meta = fs::metadata(&root)
            .await
            .map_err(|e| TreeError::stat_failure(&root, e))?;
        if !meta.is_dir() {
            return Err(TreeError::not_a_directory(root.display().to_string()));
        }

        let subtree = self.walk(root.clone(), String::new()).await?;
        let entries: BTreeMap<String, MetaRecord> = subtree.records.into_iter().collect();

        tracing::info!(
            entries = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            source = ?self.oracle.source(),
            "generated metadata table"
        );

        let file = MetaFile::new(self.oracle.source(), entries);
        Ok(MetadataTable::new(root.join(&self.config.meta_file), file))
    }

    /// Generate and write the table to `<root>/<meta_file>`.
    pub async fn generate_and_persist(&self) -> TreeResult<MetadataTable> {
        let table = self.generate().await?;
        persist(table).await
    }

    fn walk(&self, abs: PathBuf, rel: String) -> BoxFuture<'_, TreeResult<Subtree>> {
        Box::pin(async move {
            let link_meta = fs::symlink_metadata(&abs)
                .await
                .map_err(|e| TreeError::stat_failure(&abs, e))?;

            if !link_meta.is_dir() {
                return self.file(abs, rel).await;
            }

            let mut dir = fs::read_dir(&abs)
                .await
                .map_err(|e| TreeError::stat_failure(&abs, e))?;

            let mut children = Vec::new();
            while let Some(entry) = dir
                .next_entry()
                .await
                .map_err(|e| TreeError::stat_failure(&abs, e))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                if self.config.is_housekeeping(&name) {
                    continue;
                }
                if rel.is_empty()
                    && (name == self.config.meta_file || name.starts_with(TEMP_PREFIX))
                {
                    continue;
                }
                children.push(self.walk(entry.path(), join_rel(&rel, &name)));
            }
            drop(dir);

            let subtrees: Vec<Subtree> = stream::iter(children)
                .buffer_unordered(WALK_CONCURRENCY)
                .try_collect()
                .await?;

            let mtime = subtrees
                .iter()
                .map(|s| s.mtime_ms)
                .max()
                .unwrap_or_else(|| mtime_ms(&link_meta));

            let mut records = vec![(rel, MetaRecord::dir(mtime))];
            for subtree in subtrees {
                records.extend(subtree.records);
            }

            Ok(Subtree {
                mtime_ms: mtime,
                records,
            })
        })
    }

    async fn file(&self, abs: PathBuf, rel: String) -> TreeResult<Subtree> {
        let meta = live_stat(&abs)
            .await
            .map_err(|e| TreeError::stat_failure(&abs, e))?;

        let mtime = match self.oracle.last_change_ms(&rel).await {
            Some(ms) if ms > 0 => ms,
            _ => mtime_ms(&meta),
        };

        Ok(Subtree {
            mtime_ms: mtime,
            records: vec![(rel, MetaRecord::file(meta.len(), mtime))],
        })
    }
}

/// Write `table` to its source path off the async runtime.
pub async fn persist(table: MetadataTable) -> TreeResult<MetadataTable> {
    tokio::task::spawn_blocking(move || {
        table.persist()?;
        tracing::info!(path = %table.source().display(), "wrote metadata table");
        Ok::<_, TreeError>(table)
    })
    .await
    .map_err(|e| TreeError::Io(std::io::Error::other(e)))?
}
