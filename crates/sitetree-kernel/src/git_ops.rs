//! Git history lookups via libgit2.
//!
//! Only what the timestamp oracle needs: find the repository containing a
//! tree root and ask when a path last changed.

use git2::{Oid, Repository, Sort, Status, Tree};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Thin wrapper around a git2 `Repository`.
pub struct GitRepo {
    repo: Mutex<Repository>,
    workdir: PathBuf,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo").field("workdir", &self.workdir).finish()
    }
}

/// Errors from git operations.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git2: {0}")]
    Git2(#[from] git2::Error),
    #[error("{0}")]
    Other(String),
}

impl GitRepo {
    /// Open the repository at `path` exactly.
    #[cfg(test)]
    pub(crate) fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        Self::wrap(Repository::open(path)?)
    }

    /// Find the repository containing `path`, searching upwards.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        Self::wrap(Repository::discover(path)?)
    }

    fn wrap(repo: Repository) -> Result<Self, GitError> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::Other("bare repository has no working tree".into()))?;
        let workdir = dunce::canonicalize(workdir).map_err(|e| GitError::Other(e.to_string()))?;
        Ok(Self {
            repo: Mutex::new(repo),
            workdir,
        })
    }

    /// Canonical working tree root.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Commit time (Unix seconds) of the newest commit that changed `path`.
    ///
    /// `path` is relative to the working tree. Returns `None` when the path
    /// is not in `HEAD`, when it has uncommitted changes (history would be
    /// stale), or when the repository has no commits.
    // TODO: one history pass for every path instead of a revwalk per file
    pub fn last_change_time(&self, path: &Path) -> Result<Option<i64>, GitError> {
        let repo = self.lock()?;

        let Ok(head) = repo.head() else {
            return Ok(None);
        };
        let head_commit = head.peel_to_commit()?;
        if entry_id(&head_commit.tree()?, path).is_none() {
            return Ok(None);
        }

        if let Ok(status) = repo.status_file(path) {
            if status != Status::CURRENT {
                return Ok(None);
            }
        }

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push(head_commit.id())?;

        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            let Some(current) = entry_id(&commit.tree()?, path) else {
                continue;
            };
            let previous = match commit.parent(0) {
                Ok(parent) => entry_id(&parent.tree()?, path),
                Err(_) => None,
            };
            if previous != Some(current) {
                return Ok(Some(commit.time().seconds()));
            }
        }

        Ok(None)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Repository>, GitError> {
        self.repo
            .lock()
            .map_err(|_| GitError::Other("failed to acquire repository lock".into()))
    }
}

/// Blob or tree id at `path`, if present.
fn entry_id(tree: &Tree<'_>, path: &Path) -> Option<Oid> {
    tree.get_path(path).ok().map(|entry| entry.id())
}

// ============================================================================
// Tests
// ============================================================================
