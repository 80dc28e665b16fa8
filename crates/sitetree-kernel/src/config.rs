//! Site configuration (`sitetree.toml`).
//!
//! Every key is optional; a missing file yields [`SiteConfig::default`].
//!
//! ```toml
//! root = "public"
//! base_url = "/"
//! meta_file = "_meta.json"
//! metadata_policy = "strict"
//! reserved_root_names = ["index.html", "vendor"]
//! housekeeping_names = [".DS_Store"]
//! use_git_history = true
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};

/// Default config file name.
pub const CONFIG_FILE: &str = "sitetree.toml";

/// Default metadata file name, written directly under the root.
pub const META_FILE: &str = "_meta.json";

/// What to do when precomputed metadata is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataPolicy {
    /// A missing table means "no metadata"; a missing or stale record falls
    /// back to a live stat of that one child.
    #[default]
    Fallback,
    /// A missing table is `MetadataUnavailable`; a missing or stale record is
    /// `MissingMetadataEntry`.
    Strict,
}

/// Site configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Tree root. Relative roots resolve against the config file's directory.
    pub root: PathBuf,
    /// Root marker echoed as `baseUrl`.
    pub base_url: String,
    /// Metadata file name under the root.
    pub meta_file: String,
    /// Missing-metadata policy.
    pub metadata_policy: MetadataPolicy,
    /// Names hidden when listing the root only.
    pub reserved_root_names: BTreeSet<String>,
    /// Names hidden everywhere and skipped by the generator.
    pub housekeeping_names: BTreeSet<String>,
    /// Use git history for file timestamps when generating.
    pub use_git_history: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let reserved = [
            "vendor",
            "404.html",
            "index.html",
            "main.ts",
            "main.js",
            "main.d.ts",
            "styles.css",
            "netlify.toml",
            "_headers",
            "_redirects",
            CONFIG_FILE,
        ];
        Self {
            root: PathBuf::from("public"),
            base_url: "/".to_string(),
            meta_file: META_FILE.to_string(),
            metadata_policy: MetadataPolicy::default(),
            reserved_root_names: reserved.iter().map(|s| s.to_string()).collect(),
            housekeeping_names: [".DS_Store", "Thumbs.db"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            use_git_history: true,
        }
    }
}

impl SiteConfig {
    /// Config rooted at `root` with every other setting at its default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> TreeResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| TreeError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, or defaults when it does not exist.
    ///
    /// A relative `root` is anchored at the config file's directory.
    pub fn load(path: &Path) -> TreeResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(TreeError::config(format!("{}: {e}", path.display())));
            }
        };

        let mut config = Self::from_toml(&text)?;
        if config.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.root = dir.join(&config.root);
            }
        }
        Ok(config)
    }

    fn validate(&self) -> TreeResult<()> {
        let meta = Path::new(&self.meta_file);
        if self.meta_file.is_empty() || meta.components().count() != 1 || meta.file_name().is_none() {
            return Err(TreeError::config(format!(
                "meta_file must be a plain file name, got {:?}",
                self.meta_file
            )));
        }
        Ok(())
    }

    /// Whether `name` is hidden at the root (the metadata file always is).
    pub fn is_reserved_root_name(&self, name: &str) -> bool {
        name == self.meta_file || self.reserved_root_names.contains(name)
    }

    /// Whether `name` is OS housekeeping, hidden at every level.
    pub fn is_housekeeping(&self, name: &str) -> bool {
        self.housekeeping_names.contains(name)
    }

    /// Absolute location of the metadata file.
    pub fn meta_path(&self) -> PathBuf {
        self.root.join(&self.meta_file)
    }
}
