//! Directory census: count leaf files under a tree, bucketed by extension.
//!
//! Used as a before/after sanity check around a triage session.  The walk is
//! read-only and sorted, so two runs over an unchanged tree produce the same
//! [`Census`] value.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::rules::ExtensionAllowList;
use super::tree::extension_of;
use crate::error::PathError;

/// Result of a census walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Census {
    pub root: PathBuf,
    /// Every non-directory entry in the tree, filtered or not.
    pub total_files: usize,
    /// `(extension, count)` sorted by count descending; ties keep the order
    /// in which the extension was first met.  Files without an extension are
    /// counted under `""`.
    pub by_extension: Vec<(String, usize)>,
}

impl Census {
    pub fn count_for(&self, extension: &str) -> usize {
        self.by_extension
            .iter()
            .find(|(e, _)| e == extension)
            .map_or(0, |(_, n)| *n)
    }
}

/// Walk `root` recursively and tabulate its leaves.
///
/// When `only` is given, the extension table is restricted to that set (the
/// total still counts every leaf).  Symlinks are counted as leaves and never
/// followed.
pub fn census(root: &Path, only: Option<&ExtensionAllowList>) -> Result<Census, PathError> {
    super::fs::check_source_dir(root)?;

    let mut total_files = 0usize;
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!("census: skipping unreadable entry: {err}");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        total_files += 1;

        let ext = extension_of(entry.path()).unwrap_or_default();
        if let Some(filter) = only {
            if !filter.allows(Some(ext.as_str())) {
                continue;
            }
        }
        let slot = counts.entry(ext.clone()).or_insert_with(|| {
            order.push(ext);
            0
        });
        *slot += 1;
    }

    let mut by_extension: Vec<(String, usize)> = order
        .into_iter()
        .map(|ext| {
            let n = counts.get(&ext).copied().unwrap_or(0);
            (ext, n)
        })
        .collect();
    // Stable sort: equal counts keep first-encountered order.
    by_extension.sort_by(|a, b| b.1.cmp(&a.1));

    tracing::debug!(
        "census of {}: {} files, {} extensions",
        root.display(),
        total_files,
        by_extension.len()
    );

    Ok(Census {
        root: root.to_path_buf(),
        total_files,
        by_extension,
    })
}

impl fmt::Display for Census {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string());
        writeln!(f, "{name}")?;
        writeln!(f, "Total files: {}", self.total_files)?;
        writeln!(f, "Extensions:")?;
        for (ext, count) in &self.by_extension {
            let label = if ext.is_empty() { "(no extension)" } else { ext };
            writeln!(f, "  {label:<16} {count:>8}")?;
        }
        Ok(())
    }
}
