//! Popup overlay widget for yes/no confirmations.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap},
};

use super::layout::centered_fixed;
use super::theme::Theme;

const POPUP_WIDTH: u16 = 60;

/// Centered question box drawn over the image window.
pub struct ConfirmPopup<'a> {
    pub question: &'a str,
}

impl<'a> ConfirmPopup<'a> {
    /// Blank line + question lines + blank line + hint + 2 borders.
    fn height(&self) -> u16 {
        let text_width = POPUP_WIDTH.saturating_sub(4).max(1) as usize;
        let question_rows: usize = self
            .question
            .lines()
            .map(|l| l.chars().count().div_ceil(text_width).max(1))
            .sum();
        (question_rows as u16).saturating_add(5)
    }
}

impl<'a> Widget for ConfirmPopup<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_fixed(POPUP_WIDTH, self.height(), area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(" Confirm ")
            .title_style(Theme::prompt_title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::prompt_border_style());

        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = vec![Line::raw("")];
        for l in self.question.lines() {
            lines.push(Line::raw(format!(" {l}")));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            " y/Enter: yes   n/Esc: no   other keys: ignored",
            Theme::hint_style(),
        )));

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
