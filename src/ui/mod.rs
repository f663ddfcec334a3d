//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer takes decoded images and engine notices and turns them into
//! cells on the terminal.  No source-directory mutation happens here.

pub mod image_window;
pub mod layout;
pub mod popup;
pub mod terminal;
pub mod theme;
