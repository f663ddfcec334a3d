//! Error types shared by the engine, the census and the viewer.
//!
//! Only [`PathError`] and terminal failures ever leave the engine; decode and
//! display errors are resolved per file by asking the operator.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A directory the session depends on is missing or unusable.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("'{}' does not exist", path.display())]
    Missing { path: PathBuf },

    #[error("'{}' is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("cannot read '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("destination '{}' is the source directory itself", path.display())]
    DestinationIsSource { path: PathBuf },

    #[error("cannot create destination directory '{}': {source}", path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The file looked like an image but could not be decoded.
#[derive(Debug, Error)]
#[error("failed to load '{}': {reason}", path.display())]
pub struct DecodeError {
    pub path: PathBuf,
    pub reason: String,
}

/// A decoded image could not be put on screen.
#[derive(Debug, Error)]
#[error("failed to show '{title}': {reason}")]
pub struct DisplayError {
    pub title: String,
    pub reason: String,
}

/// Errors that end a triage session early.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),
}
