//! The image "window": a bordered pane titled `<dir> - <file>` showing the
//! current image with Unicode half-blocks.

use image::RgbaImage;
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::Color,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use super::theme::Theme;

/// Image pane widget.  With no image it renders an empty frame.
pub struct ImageWindow<'a> {
    pub title: &'a str,
    pub image: Option<&'a RgbaImage>,
}

impl Widget for ImageWindow<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::window_border_style())
            .title(Span::styled(format!(" {} ", self.title), Theme::title_style()));
        let inner = block.inner(area);
        block.render(area, buf);

        match self.image {
            Some(img) => render_image_halfblocks(img, inner, buf),
            None => {
                let msg = "Waiting for the next image…";
                let w = (msg.chars().count() as u16).min(inner.width);
                let y = inner.y + inner.height / 2;
                let x = inner.x + inner.width.saturating_sub(w) / 2;
                Paragraph::new(Line::from(Span::styled(msg, Theme::placeholder_style())))
                    .render(Rect::new(x, y, w, 1u16.min(inner.height)), buf);
            }
        }
    }
}

/// Render an `RgbaImage` using Unicode `▀` half-blocks (2 pixels per cell).
///
/// Aspect ratio is preserved: the image is fitted inside `area` and centred.
/// Terminal cells are ~2× taller than wide, so each cell represents 1 pixel
/// wide × 2 pixels tall; the fit calculation accounts for this.
pub fn render_image_halfblocks(img: &RgbaImage, area: Rect, buf: &mut Buffer) {
    use image::imageops::FilterType;

    if area.width == 0 || area.height == 0 || img.width() == 0 || img.height() == 0 {
        return;
    }

    // Available pixel budget: each column = 1 px wide, each row = 2 px tall.
    let max_px_w = area.width as f64;
    let max_px_h = (area.height as f64) * 2.0;

    let src_w = img.width() as f64;
    let src_h = img.height() as f64;

    // Small images are scaled up too: the point is to look at them.
    let scale = (max_px_w / src_w).min(max_px_h / src_h);
    let fit_w = (src_w * scale).round().clamp(1.0, max_px_w) as u32;
    let fit_h = (src_h * scale).round().clamp(1.0, max_px_h) as u32;

    let rgba = image::imageops::resize(img, fit_w, fit_h, FilterType::Triangle);
    let (iw, ih) = (rgba.width(), rgba.height());

    let col_offset = (area.width.saturating_sub(iw as u16)) / 2;
    let rows_used = ih.div_ceil(2) as u16;
    let row_offset = area.height.saturating_sub(rows_used) / 2;

    for row in 0..area.height {
        let yt = (row as u32) * 2;
        let yb = yt + 1;
        if yt >= ih {
            break;
        }
        for col in 0..iw.min(area.width as u32) {
            let t = rgba.get_pixel(col, yt);
            let fg = Color::Rgb(t[0], t[1], t[2]);
            let bg = if yb < ih {
                let b = rgba.get_pixel(col, yb);
                Color::Rgb(b[0], b[1], b[2])
            } else {
                Color::Reset
            };
            let pos = Position::new(area.x + col_offset + col as u16, area.y + row_offset + row);
            if let Some(cell) = buf.cell_mut(pos) {
                cell.set_char('▀').set_fg(fg).set_bg(bg);
            }
        }
    }
}
