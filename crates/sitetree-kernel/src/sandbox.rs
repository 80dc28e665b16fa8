//! Path sandbox.
//!
//! Confines client-supplied relative paths to the tree root. Climbing above
//! the root is clamped rather than rejected: `../../etc` resolves to
//! `<root>/etc`, and pure `..` resolves to the root itself. The final
//! prefix check is the authoritative guard.

use std::path::{Path, PathBuf};

use crate::error::{TreeError, TreeResult};

/// A requested path after sandboxing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Normalized relative path (posix separators, `""` for the root).
    pub rel: String,
    /// Absolute path under the root.
    pub abs: PathBuf,
}

impl Resolved {
    /// True when this is the tree root.
    pub fn is_root(&self) -> bool {
        self.rel.is_empty()
    }
}

/// Resolves relative paths against a fixed root.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    root: PathBuf,
}

impl PathSandbox {
    /// Create a sandbox for `root`.
    ///
    /// The root is canonicalized when it exists so that the prefix check
    /// compares like with like (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = dunce::canonicalize(&root).unwrap_or(root);
        Self { root }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `requested` to an absolute path inside the root.
    ///
    /// Pure: no filesystem access.
    pub fn resolve(&self, requested: &str) -> TreeResult<Resolved> {
        let rel = normalize(requested)?;

        let mut abs = self.root.clone();
        for segment in rel.split('/').filter(|s| !s.is_empty()) {
            abs.push(segment);
        }

        if !abs.starts_with(&self.root) {
            return Err(TreeError::path_escape(format!(
                "{} is not under {}",
                abs.display(),
                self.root.display()
            )));
        }

        Ok(Resolved { rel, abs })
    }
}

/// Normalize a client path to posix form, clamping at the root.
///
/// Backslashes are treated as separators, `.` and empty segments are
/// dropped, and `..` pops a segment or is discarded when there is nothing
/// left to pop.
pub fn normalize(requested: &str) -> TreeResult<String> {
    if requested.contains('\0') {
        return Err(TreeError::invalid_path(requested.replace('\0', "\\0")));
    }

    let unified = requested.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    Ok(segments.join("/"))
}
