//! The engine's view of the outside world.
//!
//! [`Viewer`] covers everything pixel- and keyboard-related, [`Prompt`]
//! covers talking to the operator.  The terminal front-end implements both;
//! tests implement both with a scripted double.

use std::io;
use std::path::Path;

use crossterm::event::KeyEvent;

use crate::config::DisplaySize;
use crate::core::signature::Signature;
use crate::error::{DecodeError, DisplayError};

/// Image display capability set.
pub trait Viewer {
    /// A decoded image ready to be shown.
    type Image;
    /// Handle to an open window; closing it releases its resources.
    type Window;

    /// Signature-based type sniff, independent of the extension.
    fn is_image_file(&mut self, path: &Path) -> Signature;

    fn load_image(&mut self, path: &Path) -> Result<Self::Image, DecodeError>;

    /// Show `image` fitted into `size`, in a window labelled `title`.
    fn show_image(
        &mut self,
        image: Self::Image,
        title: &str,
        size: DisplaySize,
    ) -> Result<Self::Window, DisplayError>;

    /// Block until the operator presses a key.  No timeout.
    fn wait_key(&mut self) -> io::Result<KeyEvent>;

    fn close_window(&mut self, window: Self::Window);

    fn close_all_windows(&mut self);
}

/// Answer to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Proceed,
    Abort,
}

/// Operator dialogue.
pub trait Prompt {
    /// Ask a yes/no question and block for the answer.
    fn confirm(&mut self, question: &str) -> Confirmation;

    /// Show a short, non-blocking notice (progress, "file moved", …).
    fn notify(&mut self, message: &str);
}
