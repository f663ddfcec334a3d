//! Per-entry metadata for the source listing.
//!
//! [`EntryMeta`] is re-read from disk each time the engine reaches an entry,
//! so decisions are made on the file as it is now, not as it was listed.

use std::path::{Path, PathBuf};

/// Lightweight metadata we keep per filesystem entry.
#[derive(Debug, Clone)]
pub struct EntryMeta {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    /// File extension, lower-cased with a leading dot (e.g. `".png"`).
    /// `None` for dirs or extensionless files.
    pub extension: Option<String>,
}

impl EntryMeta {
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let is_dir = meta.is_dir();
        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            is_dir,
            extension: if is_dir { None } else { extension_of(path) },
        })
    }
}

/// Lower-cased extension with its leading dot, e.g. `Photo.JPG` -> `".jpg"`.
///
/// Dot-files such as `.hidden` have no extension.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
}
