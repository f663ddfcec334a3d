//! Terminal front-end: implements [`Viewer`] and [`Prompt`] on top of
//! crossterm + Ratatui.
//!
//! The terminal is put into raw mode on the alternate screen when the viewer
//! is created and restored when it is dropped, so every exit path (including
//! `?` early returns in `main`) leaves the user's shell intact.

use std::io::{self, Stdout};
use std::path::Path;

use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use image::{DynamicImage, RgbaImage};
use ratatui::{backend::CrosstermBackend, widgets::Paragraph, Terminal};

use super::{image_window::ImageWindow, layout::AppLayout, popup::ConfirmPopup, theme::Theme};
use crate::app::event::{next_event, AppEvent};
use crate::app::viewer::{Confirmation, Prompt, Viewer};
use crate::config::DisplaySize;
use crate::core::signature::{self, Signature};
use crate::error::{DecodeError, DisplayError};

/// Handle for the (single) image window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowId(u64);

struct OpenWindow {
    id: WindowId,
    title: String,
    image: RgbaImage,
}

pub struct TerminalViewer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    window: Option<OpenWindow>,
    next_window: u64,
    /// Latest operator notice, shown above the key hint.
    notice: Option<String>,
    hint: String,
}

impl TerminalViewer {
    /// Switch the terminal to raw mode + alternate screen.
    pub fn enter(hint: String) -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let terminal = match Terminal::new(CrosstermBackend::new(io::stdout())) {
            Ok(t) => t,
            Err(e) => {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                return Err(e);
            }
        };

        let mut viewer = Self {
            terminal,
            window: None,
            next_window: 0,
            notice: None,
            hint,
        };
        viewer.draw(None)?;
        Ok(viewer)
    }

    fn draw(&mut self, question: Option<&str>) -> io::Result<()> {
        let window = self.window.as_ref();
        let notice = self.notice.as_deref().unwrap_or("");
        let hint = self.hint.as_str();

        self.terminal.draw(|frame| {
            let layout = AppLayout::from_area(frame.area());

            frame.render_widget(
                ImageWindow {
                    title: window.map_or("image-triage", |w| w.title.as_str()),
                    image: window.map(|w| &w.image),
                },
                layout.window_area,
            );
            frame.render_widget(
                Paragraph::new(notice).style(Theme::notice_style()),
                layout.notice_area,
            );
            frame.render_widget(
                Paragraph::new(hint).style(Theme::status_bar_style()),
                layout.status_area,
            );

            if let Some(question) = question {
                frame.render_widget(ConfirmPopup { question }, frame.area());
            }
        })?;
        Ok(())
    }

    /// Redraw where a failure only costs a stale frame.
    fn redraw(&mut self) {
        if let Err(e) = self.draw(None) {
            tracing::debug!("redraw failed: {e}");
        }
    }
}

impl Drop for TerminalViewer {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

// ───────────────────────────────────────── viewer ────────────

impl Viewer for TerminalViewer {
    type Image = DynamicImage;
    type Window = WindowId;

    fn is_image_file(&mut self, path: &Path) -> Signature {
        signature::sniff(path)
    }

    fn load_image(&mut self, path: &Path) -> Result<DynamicImage, DecodeError> {
        let fail = |reason: String| DecodeError {
            path: path.to_path_buf(),
            reason,
        };
        image::ImageReader::open(path)
            .map_err(|e| fail(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| fail(e.to_string()))?
            .decode()
            .map_err(|e| fail(e.to_string()))
    }

    fn show_image(
        &mut self,
        image: DynamicImage,
        title: &str,
        size: DisplaySize,
    ) -> Result<WindowId, DisplayError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DisplayError {
                title: title.to_string(),
                reason: "image has no pixels".to_string(),
            });
        }

        let id = WindowId(self.next_window);
        self.next_window = self.next_window.wrapping_add(1);
        self.window = Some(OpenWindow {
            id,
            title: title.to_string(),
            image: image.thumbnail(size.width, size.height).to_rgba8(),
        });

        if let Err(e) = self.draw(None) {
            self.window = None;
            return Err(DisplayError {
                title: title.to_string(),
                reason: e.to_string(),
            });
        }
        Ok(id)
    }

    fn wait_key(&mut self) -> io::Result<crossterm::event::KeyEvent> {
        loop {
            match next_event()? {
                AppEvent::Key(k) => return Ok(k),
                AppEvent::Resize(_, _) => self.draw(None)?,
            }
        }
    }

    fn close_window(&mut self, window: WindowId) {
        if self.window.as_ref().is_some_and(|w| w.id == window) {
            self.window = None;
            self.redraw();
        }
    }

    fn close_all_windows(&mut self) {
        self.window = None;
        self.redraw();
    }
}

// ───────────────────────────────────────── prompt ────────────

impl Prompt for TerminalViewer {
    fn confirm(&mut self, question: &str) -> Confirmation {
        let answer = loop {
            if let Err(e) = self.draw(Some(question)) {
                tracing::warn!("cannot show confirmation, treating as 'no': {e}");
                break Confirmation::Abort;
            }
            let key = match next_event() {
                Ok(AppEvent::Key(k)) => k,
                Ok(AppEvent::Resize(_, _)) => continue,
                Err(e) => {
                    tracing::warn!("cannot read answer, treating as 'no': {e}");
                    break Confirmation::Abort;
                }
            };
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    break Confirmation::Proceed
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    break Confirmation::Abort
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    break Confirmation::Abort
                }
                _ => {}
            }
        };
        self.redraw();
        answer
    }

    fn notify(&mut self, message: &str) {
        tracing::debug!("notice: {message}");
        self.notice = Some(message.to_string());
        self.redraw();
    }
}
