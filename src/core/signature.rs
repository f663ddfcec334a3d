//! Content-based image detection.
//!
//! The extension says what a file claims to be; the signature says what it
//! is.  A file is only shown when both agree that it is an accepted image.

use std::io::Read;
use std::path::Path;

/// Outcome of a signature sniff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Image,
    NotImage,
    /// The file could not be read well enough to tell.
    Unknown,
}

impl Signature {
    pub fn is_image(self) -> bool {
        self == Signature::Image
    }
}

/// Number of header bytes handed to the magic-number fallback.
const HEADER_LEN: usize = 64;

/// Sniff `path` by its content, independent of its extension.
pub fn sniff(path: &Path) -> Signature {
    // shared-mime-info signatures first; they know far more formats.
    if let Some(mime) = detect_file_type(path) {
        if mime.starts_with("image/") {
            return Signature::Image;
        }
    }

    // Fall back to the decoder's own magic table: the mime database may be
    // absent, or report a generic type for formats it doesn't know.
    let mut header = Vec::with_capacity(HEADER_LEN);
    let read = std::fs::File::open(path)
        .and_then(|f| f.take(HEADER_LEN as u64).read_to_end(&mut header));
    match read {
        Ok(_) => sniff_bytes(&header),
        Err(e) => {
            tracing::debug!("sniff: cannot read {}: {e}", path.display());
            Signature::Unknown
        }
    }
}

/// Classify a header by magic number alone.
pub fn sniff_bytes(header: &[u8]) -> Signature {
    if header.is_empty() {
        return Signature::NotImage;
    }
    match image::guess_format(header) {
        Ok(_) => Signature::Image,
        Err(_) => Signature::NotImage,
    }
}

fn detect_file_type(path: &Path) -> Option<&'static str> {
    tree_magic_mini::from_filepath(path)
}
