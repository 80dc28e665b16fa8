//! Timestamp oracles.
//!
//! An oracle answers one question for the metadata generator: the best-known
//! time a file last changed, or `None` to fall back to filesystem time.
//!
//! - [`GitOracle`] - Commit history of the repository containing the root
//! - [`NoHistory`] - Always `None`; filesystem times only

mod git;

use async_trait::async_trait;
use sitetree_types::TimeSource;

pub use git::GitOracle;

/// Source of authoritative last-change times.
#[async_trait]
pub trait TimestampOracle: Send + Sync {
    /// Which source the table should record.
    fn source(&self) -> TimeSource;

    /// Last change of `rel` (normalized, relative to the tree root) in epoch
    /// milliseconds, or `None` if unknown.
    ///
    /// Must not fail: errors are the oracle's to log and swallow.
    async fn last_change_ms(&self, rel: &str) -> Option<i64>;
}

/// Oracle with no history; every file uses its filesystem time.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

#[async_trait]
impl TimestampOracle for NoHistory {
    fn source(&self) -> TimeSource {
        TimeSource::Filesystem
    }

    async fn last_change_ms(&self, _rel: &str) -> Option<i64> {
        None
    }
}
