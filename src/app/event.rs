//! Terminal event abstraction.
//!
//! Wraps crossterm events into a simpler enum.  The triage loop is strictly
//! synchronous, so reading blocks the calling thread until something arrives.

use std::io;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// High-level events consumed by the terminal viewer.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

/// Block until the next key press or resize.  Key releases and repeats
/// (reported on some platforms) and every other event kind are dropped.
pub fn next_event() -> io::Result<AppEvent> {
    loop {
        match event::read()? {
            CtEvent::Key(k) if k.kind == KeyEventKind::Press => return Ok(AppEvent::Key(k)),
            CtEvent::Resize(w, h) => return Ok(AppEvent::Resize(w, h)),
            _ => continue,
        }
    }
}
