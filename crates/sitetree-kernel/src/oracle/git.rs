//! Git-backed timestamp oracle.
//!
//! Lookups go through `tokio::task::spawn_blocking`; libgit2 is synchronous.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sitetree_types::TimeSource;

use crate::git_ops::{GitError, GitRepo};
use crate::oracle::TimestampOracle;

/// Oracle answering from the commit history of the repository that
/// contains the tree root.
#[derive(Debug, Clone)]
pub struct GitOracle {
    repo: Arc<GitRepo>,
    /// Tree root relative to the repository working tree.
    prefix: PathBuf,
}

impl GitOracle {
    /// Find the repository containing `root`.
    pub fn discover(root: &Path) -> Result<Self, GitError> {
        let repo = GitRepo::discover(root)?;
        let root = dunce::canonicalize(root).map_err(|e| GitError::Other(e.to_string()))?;
        let prefix = root
            .strip_prefix(repo.workdir())
            .map_err(|_| {
                GitError::Other(format!(
                    "{} is outside working tree {}",
                    root.display(),
                    repo.workdir().display()
                ))
            })?
            .to_path_buf();

        Ok(Self {
            repo: Arc::new(repo),
            prefix,
        })
    }

    /// Repository-relative path for a tree-relative one.
    fn repo_path(&self, rel: &str) -> PathBuf {
        let mut path = self.prefix.clone();
        for segment in rel.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }
}

#[async_trait]
impl TimestampOracle for GitOracle {
    fn source(&self) -> TimeSource {
        TimeSource::Git
    }

    async fn last_change_ms(&self, rel: &str) -> Option<i64> {
        let repo = self.repo.clone();
        let path = self.repo_path(rel);

        let result = tokio::task::spawn_blocking(move || repo.last_change_time(&path))
            .await
            .map_err(|e| GitError::Other(format!("spawn_blocking: {e}")))
            .and_then(|r| r);

        match result {
            Ok(Some(seconds)) if seconds > 0 => seconds.checked_mul(1000),
            Ok(Some(seconds)) => {
                tracing::debug!(path = %rel, seconds, "ignoring non-positive commit time");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(path = %rel, error = %e, "git history lookup failed");
                None
            }
        }
    }
}
