//! Metadata table: load, index, and atomic persist of `_meta.json`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use sitetree_types::{MetaFile, MetaRecord, TimeSource};

use crate::error::{TreeError, TreeResult};

/// Name prefix of the temp file `persist` renames into place.
pub(crate) const TEMP_PREFIX: &str = ".sitetree-meta";

/// A loaded, read-only metadata table.
#[derive(Debug, Clone)]
pub struct MetadataTable {
    source: PathBuf,
    file: MetaFile,
}

impl MetadataTable {
    /// Wrap an in-memory table (generator output, tests).
    pub fn new(source: impl Into<PathBuf>, file: MetaFile) -> Self {
        Self {
            source: source.into(),
            file,
        }
    }

    /// Read and validate the table at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist; any other read
    /// failure, a parse failure, or a record whose `size` disagrees with its
    /// `type` is `MetadataUnavailable`.
    pub async fn load(path: &Path) -> TreeResult<Option<Self>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TreeError::metadata_unavailable(path, e.to_string())),
        };

        let file = Self::parse(path, &bytes)?;
        Ok(Some(Self::new(path, file)))
    }

    /// Parse raw table bytes.
    pub fn parse(path: &Path, bytes: &[u8]) -> TreeResult<MetaFile> {
        let file: MetaFile = serde_json::from_slice(bytes)
            .map_err(|e| TreeError::metadata_unavailable(path, format!("unparsable: {e}")))?;

        if let Some(bad) = file.first_inconsistent() {
            return Err(TreeError::metadata_unavailable(
                path,
                format!("record {bad:?} has a size that does not match its type"),
            ));
        }
        Ok(file)
    }

    /// Record for a normalized relative path.
    pub fn get(&self, rel: &str) -> Option<&MetaRecord> {
        self.file.entries.get(rel)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.file.entries.len()
    }

    /// True when the table has no records.
    pub fn is_empty(&self) -> bool {
        self.file.entries.is_empty()
    }

    /// All records, in path order.
    pub fn entries(&self) -> &BTreeMap<String, MetaRecord> {
        &self.file.entries
    }

    /// Timestamp source recorded by the generator.
    pub fn time_source(&self) -> TimeSource {
        self.file.time_source
    }

    /// The underlying file contents.
    pub fn meta_file(&self) -> &MetaFile {
        &self.file
    }

    /// Where this table was loaded from or will be written to.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Write the table to its source path atomically.
    ///
    /// Serializes into a temp file in the same directory, then renames it
    /// over the target, so readers see either the old table or the new one.
    pub fn persist(&self) -> TreeResult<()> {
        let target = &self.source;
        let persist_err = |source: std::io::Error| TreeError::Persist {
            path: target.clone(),
            source,
        };

        let dir = target
            .parent()
            .ok_or_else(|| TreeError::config(format!("{} has no parent", target.display())))?;

        let json = serde_json::to_vec(&self.file).map_err(|e| persist_err(e.into()))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(persist_err)?;
        tmp.write_all(&json).map_err(persist_err)?;
        tmp.as_file().sync_all().map_err(persist_err)?;
        tmp.persist(target).map_err(|e| persist_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> MetaFile {
        let mut entries = BTreeMap::new();
        entries.insert(String::new(), MetaRecord::dir(20));
        entries.insert("a.txt".to_string(), MetaRecord::file(3, 20));
        MetaFile::new(TimeSource::Filesystem, entries)
    }

    #[tokio::test]
    async fn test_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let table = MetadataTable::load(&dir.path().join("_meta.json")).await.unwrap();
        assert!(table.is_none());
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("_meta.json");
        MetadataTable::new(&path, sample()).persist().unwrap();

        let table = MetadataTable::load(&path).await.unwrap().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a.txt"), Some(&MetaRecord::file(3, 20)));
        assert_eq!(table.get(""), Some(&MetaRecord::dir(20)));
        assert!(table.get("b.txt").is_none());

        // no temp files left behind
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("_meta.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = MetadataTable::load(&path).await.unwrap_err();
        assert!(matches!(err, TreeError::MetadataUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_inconsistent_record_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("_meta.json");
        std::fs::write(
            &path,
            r#"{"generatedAt":"2025-01-01T00:00:00Z","entries":{"d":{"type":"dir","size":10,"mtimeMs":1}}}"#,
        )
        .unwrap();

        let err = MetadataTable::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("\"d\""));
    }
}
