//! Skim through a directory of images and settle each one with a key press:
//! keep it, delete it, or move it into a review bucket.
//!
//! [`app::engine::TriageEngine`] is the loop; [`ui::terminal::TerminalViewer`]
//! is the stock front-end; [`core::census`] counts files before and after.

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod ui;

pub use app::engine::{EngineOptions, SessionEnd, SessionReport, TriageEngine};
pub use app::viewer::{Confirmation, Prompt, Viewer};
pub use error::{DecodeError, DisplayError, PathError, TriageError};
