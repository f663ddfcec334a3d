//! Classification rules: which extensions are accepted and where each
//! disposition category sends its files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

// ───────────────────────────────────────── extensions ────────

/// Default accepted extensions.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg"];

/// Case-insensitive set of accepted file extensions.
///
/// Entries are normalised to lower-case with a leading dot, so `"PNG"`,
/// `".png"` and `".Png"` all name the same extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionAllowList {
    exts: BTreeSet<String>,
}

impl ExtensionAllowList {
    pub fn new<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exts: exts
                .into_iter()
                .filter_map(|e| normalize_extension(e.as_ref()))
                .collect(),
        }
    }

    pub fn allows(&self, extension: Option<&str>) -> bool {
        extension
            .and_then(normalize_extension)
            .is_some_and(|e| self.exts.contains(&e))
    }

    pub fn allows_path(&self, path: &Path) -> bool {
        self.allows(super::tree::extension_of(path).as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.exts.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.exts.is_empty()
    }
}

impl Default for ExtensionAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

/// `"JPG"` -> `".jpg"`.  Blank input yields `None`.
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

// ───────────────────────────────────────── categories ────────

/// A disposition bucket an image can be moved into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Good image, wrong class.
    Reclassify,
    /// Good image that needs manual annotation (e.g. several objects).
    Annotate,
}

impl Category {
    pub const ALL: &[Category] = &[Category::Reclassify, Category::Annotate];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Category::Reclassify => "wrong class",
            Category::Annotate => "needs annotation",
        }
    }

    /// Directory name used when no explicit destination is given.
    pub fn default_dir_name(self) -> &'static str {
        match self {
            Category::Reclassify => "mis_classified",
            Category::Annotate => "manual_annotation",
        }
    }
}

/// Destination directory per category.  Categories without an entry are
/// simply not offered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationTargets {
    dirs: BTreeMap<Category, PathBuf>,
}

impl ClassificationTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category, dir: impl Into<PathBuf>) -> Self {
        self.dirs.insert(category, dir.into());
        self
    }

    pub fn without(mut self, category: Category) -> Self {
        self.dirs.remove(&category);
        self
    }

    pub fn get(&self, category: Category) -> Option<&Path> {
        self.dirs.get(&category).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &Path)> {
        self.dirs.iter().map(|(c, p)| (*c, p.as_path()))
    }
}
