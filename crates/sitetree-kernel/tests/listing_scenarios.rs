//! End-to-end scenarios: generate a table, then list through the service.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use sitetree_kernel::{
    MetadataGenerator, MetadataPolicy, NoHistory, PathSandbox, ResponseBody, SiteConfig, TimestampOracle,
    TreeError,
};
use sitetree_types::{Entry, EntryKind, TimeSource, join_rel};
use tempfile::TempDir;

/// Oracle with a fixed answer per path.
struct FakeOracle(HashMap<&'static str, i64>);

#[async_trait]
impl TimestampOracle for FakeOracle {
    fn source(&self) -> TimeSource {
        TimeSource::Git
    }

    async fn last_change_ms(&self, rel: &str) -> Option<i64> {
        self.0.get(rel).copied()
    }
}

fn write(root: &Path, rel: &str, bytes: usize) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, vec![b'x'; bytes]).unwrap();
}

fn config(dir: &TempDir, policy: MetadataPolicy) -> SiteConfig {
    let mut config = SiteConfig::with_root(dir.path());
    config.metadata_policy = policy;
    config
}

fn docs_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "docs/a.txt", 100);
    write(dir.path(), "b.txt", 50);
    dir
}

async fn generate(dir: &TempDir, oracle: Arc<dyn TimestampOracle>) {
    let config = Arc::new(config(dir, MetadataPolicy::Fallback));
    MetadataGenerator::new(config, oracle)
        .generate_and_persist()
        .await
        .unwrap();
}

#[tokio::test]
async fn docs_and_file_listing() {
    let dir = docs_tree();
    let service = sitetree_kernel::ListingService::new(config(&dir, MetadataPolicy::Fallback));

    let root = service.list("").await.unwrap();
    assert_eq!(root.base_url, "/");
    assert_eq!(root.items.len(), 2);
    assert_eq!((root.items[0].name.as_str(), root.items[0].kind), ("docs", EntryKind::Dir));
    assert_eq!(root.items[0].size, None);
    assert_eq!((root.items[1].name.as_str(), root.items[1].kind), ("b.txt", EntryKind::File));
    assert_eq!(root.items[1].size, Some(50));

    let docs = service.list("docs").await.unwrap();
    assert_eq!(docs.path, "docs");
    assert_eq!(docs.items.len(), 1);
    assert_eq!(docs.items[0].name, "a.txt");
    assert_eq!(docs.items[0].path, "docs/a.txt");
    assert_eq!(docs.items[0].size, Some(100));
}

#[tokio::test]
async fn generated_table_drives_listing() {
    let dir = docs_tree();
    let oracle = FakeOracle(HashMap::from([("docs/a.txt", 5_000), ("b.txt", 3_000)]));
    generate(&dir, Arc::new(oracle)).await;

    let service = sitetree_kernel::ListingService::new(config(&dir, MetadataPolicy::Strict));
    let root = service.list("").await.unwrap();
    assert_eq!(
        root.items,
        vec![Entry::dir("docs", "docs", 5_000), Entry::file("b.txt", "b.txt", 50, 3_000)]
    );
    assert!(service.store().is_loaded());

    let docs = service.list("docs").await.unwrap();
    assert_eq!(docs.items, vec![Entry::file("a.txt", "docs/a.txt", 100, 5_000)]);
}

#[tokio::test]
async fn stale_table_strict_vs_fallback() {
    let dir = docs_tree();
    let oracle = FakeOracle(HashMap::from([("docs/a.txt", 5_000), ("b.txt", 3_000)]));
    generate(&dir, Arc::new(oracle)).await;
    write(dir.path(), "c.txt", 7);

    let strict = sitetree_kernel::ListingService::new(config(&dir, MetadataPolicy::Strict));
    let err = strict.list("").await.unwrap_err();
    assert!(matches!(err, TreeError::MissingMetadataEntry(ref p) if p == "c.txt"));

    let response = strict.respond("").await;
    assert_eq!(response.status, 500);

    let fallback = sitetree_kernel::ListingService::new(config(&dir, MetadataPolicy::Fallback));
    let root = fallback.list("").await.unwrap();
    let names: Vec<_> = root.items.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["docs", "b.txt", "c.txt"]);
    assert_eq!(root.items[1].mtime_ms, 3_000);
    assert_eq!(root.items[2].size, Some(7));
    assert_ne!(root.items[2].mtime_ms, 3_000);
}

#[tokio::test]
async fn directory_times_roll_up() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/one.txt", 1);
    write(dir.path(), "a/b/two.txt", 2);
    write(dir.path(), "a/b/c/three.txt", 3);
    write(dir.path(), "d/four.txt", 4);
    std::fs::create_dir_all(dir.path().join("a/empty")).unwrap();

    let config = Arc::new(config(&dir, MetadataPolicy::Fallback));
    let table = MetadataGenerator::new(config, Arc::new(NoHistory))
        .generate()
        .await
        .unwrap();

    for (path, record) in table.entries() {
        if record.kind != EntryKind::Dir {
            assert!(record.size.is_some(), "{path} has no size");
            continue;
        }
        assert_eq!(record.size, None);

        let prefix = join_rel(path, "");
        let children: Vec<i64> = table
            .entries()
            .iter()
            .filter(|(child, _)| {
                child.len() > prefix.len()
                    && child.starts_with(&prefix)
                    && !child[prefix.len()..].contains('/')
                    && !child.is_empty()
            })
            .map(|(_, r)| r.mtime_ms)
            .collect();

        match children.iter().max() {
            Some(max) => assert_eq!(record.mtime_ms, *max, "{path:?}"),
            None => {
                let own = std::fs::metadata(dir.path().join(path)).unwrap().modified().unwrap();
                let own = own.duration_since(std::time::UNIX_EPOCH).unwrap().as_millis() as i64;
                assert_eq!(record.mtime_ms, own, "{path:?}");
            }
        }
    }
}

#[tokio::test]
async fn regeneration_is_stable() {
    let dir = docs_tree();
    write(dir.path(), "docs/deep/x.bin", 10);

    let config = Arc::new(config(&dir, MetadataPolicy::Fallback));
    let generator = MetadataGenerator::new(config, Arc::new(NoHistory));
    let first = generator.generate_and_persist().await.unwrap();
    let second = generator.generate_and_persist().await.unwrap();

    assert_eq!(
        serde_json::to_string(&first.meta_file().entries).unwrap(),
        serde_json::to_string(&second.meta_file().entries).unwrap()
    );
}

#[tokio::test]
async fn reserved_names_only_at_root() {
    let dir = TempDir::new().unwrap();
    for name in ["index.html", "404.html", "vendor/x.js", "netlify.toml", "_redirects", "styles.css"] {
        write(dir.path(), name, 1);
        write(dir.path(), &format!("site/{name}"), 1);
    }

    let service = sitetree_kernel::ListingService::new(config(&dir, MetadataPolicy::Fallback));
    let root = service.list("").await.unwrap();
    let names: Vec<_> = root.items.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["site"]);

    let site = service.list("site").await.unwrap();
    assert_eq!(site.items.len(), 6);
}

#[tokio::test]
async fn escape_attempts_stay_inside_root() {
    let dir = docs_tree();
    let service = sitetree_kernel::ListingService::new(config(&dir, MetadataPolicy::Fallback));

    let response = service.respond("../../etc").await;
    assert_eq!(response.status, 404);

    let root = service.list("../../..").await.unwrap();
    assert_eq!(root.path, "");
    assert_eq!(root.items.len(), 2);

    let docs = service.list("/../docs/").await.unwrap();
    assert_eq!(docs.path, "docs");

    match service.respond("docs\0").await.body {
        ResponseBody::Error(payload) => assert_eq!(payload.kind, "invalid_path"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn sandbox_containment_grid() {
    let dir = TempDir::new().unwrap();
    let sandbox = PathSandbox::new(dir.path());
    let root = sandbox.root().to_path_buf();

    let prefixes = ["", "/", "//", "\\", "./", "C:/", "~/"];
    let climbs = ["", "..", "../..", "..\\..\\..", "a/../..", "./../", "a/b/../../../.."];
    let targets = ["", "etc", "etc/passwd", "docs/", "docs\\a.txt", "..", "a//b", "%2e%2e"];

    for prefix in prefixes {
        for climb in climbs {
            for target in targets {
                let input = format!("{prefix}{climb}/{target}");
                let resolved = sandbox.resolve(&input).unwrap();
                assert!(resolved.abs.starts_with(&root), "{input:?} -> {}", resolved.abs.display());
                assert!(!resolved.rel.starts_with('/'), "{input:?}");
                assert!(!resolved.rel.split('/').any(|s| s == ".." || s == "."), "{input:?}");
            }
        }
    }
}
