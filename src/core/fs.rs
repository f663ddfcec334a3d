//! Filesystem operations the engine performs on the source directory.
//!
//! The listing goes through [`ignore::WalkBuilder`] capped at depth 1 with
//! every filter turned off: the source directory's contents *are* the session
//! state, so hidden files and ignored files are triaged like any other.

use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::PathError;

/// Check that `dir` exists, is a directory, and can be listed.
pub fn check_source_dir(dir: &Path) -> Result<(), PathError> {
    let meta = std::fs::metadata(dir).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => PathError::Missing {
            path: dir.to_path_buf(),
        },
        _ => PathError::Unreadable {
            path: dir.to_path_buf(),
            source,
        },
    })?;
    if !meta.is_dir() {
        return Err(PathError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    std::fs::read_dir(dir).map_err(|source| PathError::Unreadable {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Create `dir` (and parents) if absent.  Succeeds when it already exists.
pub fn ensure_dir(dir: &Path) -> Result<(), PathError> {
    std::fs::create_dir_all(dir).map_err(|source| PathError::CreateFailed {
        path: dir.to_path_buf(),
        source,
    })?;
    if !dir.is_dir() {
        return Err(PathError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

/// `true` when both paths resolve to the same existing directory.
pub fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Names of the immediate entries of `dir`, sorted by file name.
pub fn list_sorted(dir: &Path) -> Result<Vec<PathBuf>, PathError> {
    check_source_dir(dir)?;

    let walker = WalkBuilder::new(dir)
        .max_depth(Some(1)) // only immediate children
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut names = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!("skipping unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        // Skip the directory itself (WalkBuilder yields the root as first entry).
        if entry.depth() == 0 {
            continue;
        }
        if let Some(name) = entry.path().file_name() {
            names.push(PathBuf::from(name));
        }
    }
    Ok(names)
}

/// Move `src` into `dest_dir`, keeping its file name.
///
/// A plain rename is tried first; when that fails (typically because the
/// destination is on another filesystem) the file is copied and the source
/// removed.  Callers must check for a same-named file beforehand: this
/// function refuses to overwrite.
pub fn move_into(src: &Path, dest_dir: &Path) -> io::Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let dest = dest_dir.join(name);
    if dest.symlink_metadata().is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        ));
    }

    match std::fs::rename(src, &dest) {
        Ok(()) => Ok(dest),
        Err(rename_err) => {
            tracing::debug!(
                "rename {} -> {} failed ({rename_err}), falling back to copy",
                src.display(),
                dest.display()
            );
            std::fs::copy(src, &dest)?;
            if let Err(e) = std::fs::remove_file(src) {
                // Don't leave the file in both places.
                let _ = std::fs::remove_file(&dest);
                return Err(e);
            }
            Ok(dest)
        }
    }
}
