//! Live filesystem stats shared by the listing engine and the generator.

use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Stat `path`, following symlinks; a dangling link reports the link itself.
pub async fn live_stat(path: &Path) -> io::Result<Metadata> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta),
        Err(e) if e.kind() == io::ErrorKind::NotFound => tokio::fs::symlink_metadata(path).await,
        Err(e) => Err(e),
    }
}

/// Modification time as whole milliseconds since the Unix epoch, UTC.
pub fn mtime_ms(meta: &Metadata) -> i64 {
    meta.modified().map(system_time_ms).unwrap_or(0)
}

/// Convert a `SystemTime` to epoch milliseconds (negative before 1970).
pub fn system_time_ms(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_system_time_ms() {
        assert_eq!(system_time_ms(UNIX_EPOCH), 0);
        assert_eq!(system_time_ms(UNIX_EPOCH + Duration::from_micros(1_500_999)), 1_500);
        assert_eq!(system_time_ms(UNIX_EPOCH - Duration::from_millis(20)), -20);
    }

    #[tokio::test]
    async fn test_dangling_symlink_stats_link() {
        let dir = tempfile::TempDir::new().unwrap();
        let link = dir.path().join("dangling");
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();
            let meta = live_stat(&link).await.unwrap();
            assert!(meta.file_type().is_symlink());
        }
        #[cfg(not(unix))]
        {
            assert!(live_stat(&link).await.is_err());
        }
    }
}
