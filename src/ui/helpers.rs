use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::cover::{Cover, Rgb};
use crate::models::Status;

const FILLED_STAR: char = '★';
const HALF_STAR: char = '½';

/// Render a rating as stars: one filled star per whole point plus a half
/// marker for a trailing .5, so 3.5 shows as `★★★½` rather than being
/// truncated to three stars.
pub(crate) fn rating_stars(rating: Option<f64>) -> String {
    match rating {
        Some(rating) if rating > 0.0 => {
            let whole = rating.trunc() as usize;
            let mut stars: String = std::iter::repeat(FILLED_STAR).take(whole).collect();
            if rating.fract() >= 0.5 {
                stars.push(HALF_STAR);
            }
            stars
        }
        _ => "Not rated".to_string(),
    }
}

/// Badge colors per reading status.
pub(crate) fn status_style(status: Status) -> Style {
    let color = match status {
        Status::ToRead => Color::Blue,
        Status::Reading => Color::Yellow,
        Status::Completed => Color::Green,
        Status::Dnf => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub(crate) fn status_badge(status: Status) -> Span<'static> {
    Span::styled(format!("[{}]", status.label()), status_style(status))
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Pick black or white text for the given background.
fn contrast_color(rgb: Rgb) -> Color {
    let luma = 0.299 * rgb.0 as f32 + 0.587 * rgb.1 as f32 + 0.114 * rgb.2 as f32;
    if luma > 140.0 {
        Color::Black
    } else {
        Color::White
    }
}

/// Fit `text` into `width` columns, centered, truncating by characters.
fn center_text(text: &str, width: usize) -> String {
    let mut trimmed: String = text.chars().take(width).collect();
    let len = trimmed.chars().count();
    let padding = width.saturating_sub(len);
    let left = padding / 2;
    let right = padding - left;
    trimmed.insert_str(0, &" ".repeat(left));
    trimmed.push_str(&" ".repeat(right));
    trimmed
}

/// Paint a cover card: each row takes the next step of the gradient, with
/// the title, author and genre icon laid over it.
pub(crate) fn build_cover_lines(
    cover: &Cover,
    title: &str,
    author: &str,
    inner_width: u16,
    inner_height: u16,
) -> Vec<Line<'static>> {
    let width = inner_width as usize;
    let height = inner_height as usize;
    if width == 0 || height == 0 {
        return vec![Line::from("")];
    }

    let by_line = format!("by {author}");
    let mut lines = Vec::with_capacity(height);
    for row in 0..height {
        let t = if height > 1 {
            row as f32 / (height - 1) as f32
        } else {
            0.0
        };
        let background = cover.blend(t);
        let base = Style::default()
            .bg(to_color(background))
            .fg(contrast_color(background));

        let (content, style) = match row {
            1 => (center_text(title, width), base.add_modifier(Modifier::BOLD)),
            2 => (center_text(&by_line, width), base),
            r if r + 1 == height && height > 3 => (center_text(cover.icon, width.saturating_sub(1)), base),
            _ => (" ".repeat(width), base),
        };
        lines.push(Line::from(Span::styled(content, style)));
    }
    lines
}

/// One row of a text bar chart: label, a bar scaled against `max`, count.
pub(crate) fn bar_line(label: &str, count: i64, max: i64, bar_width: usize) -> Line<'static> {
    let filled = if max > 0 {
        ((count.max(0) as f64 / max as f64) * bar_width as f64).round() as usize
    } else {
        0
    };
    Line::from(vec![
        Span::raw(format!("{label:<18} ")),
        Span::styled("█".repeat(filled), Style::default().fg(Color::Cyan)),
        Span::raw(format!(" {count}")),
    ])
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
