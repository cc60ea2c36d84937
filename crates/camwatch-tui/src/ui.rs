//! Rendering — pure functions from a [`ViewState`] snapshot to widgets.

use chrono::Local;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use camwatch_core::{StreamState, ViewState};

use crate::theme;

pub fn draw(f: &mut Frame, state: &ViewState, polling: bool, banner: Option<&str>) {
    let banner_height = if banner.is_some() { 1 } else { 0 };
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(9),
        Constraint::Length(banner_height),
        Constraint::Length(1),
    ])
    .split(f.area());

    draw_header(f, chunks[0], state, polling);
    draw_stream(f, chunks[1], state);
    draw_gallery(f, chunks[2], state);
    if let Some(text) = banner {
        f.render_widget(
            Paragraph::new(Span::styled(text, theme::style_error())),
            chunks[3],
        );
    }
    draw_footer(f, chunks[4]);
}

// ── Header ────────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, state: &ViewState, polling: bool) {
    let mut spans: Vec<Span> = Vec::new();

    match (&state.status, &state.status_error) {
        (Some(status), None) => {
            let style = if status.is_healthy() {
                theme::style_healthy()
            } else {
                theme::style_pending()
            };
            spans.push(Span::styled(status.summary(), style));
        }
        // Stale, never empty: keep showing the last snapshot with the error.
        (Some(status), Some(err)) => {
            spans.push(Span::styled(status.summary(), theme::style_muted()));
            spans.push(Span::styled(
                format!("  [{}] stale: {err}", err.badge_label()),
                theme::style_error(),
            ));
        }
        (None, Some(err)) => {
            spans.push(Span::styled(
                format!("[{}] {err}", err.badge_label()),
                theme::style_error(),
            ));
        }
        (None, None) => {
            spans.push(Span::styled("waiting for status…", theme::style_secondary()));
        }
    }

    if !polling {
        spans.push(Span::styled("  [polling paused]", theme::style_pending()));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::style_border())
        .title(" Backend ");
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

// ── Stream panel ──────────────────────────────────────────────────────────────

fn draw_stream(f: &mut Frame, area: Rect, state: &ViewState) {
    let mut lines: Vec<Line> = Vec::new();

    match &state.stream {
        StreamState::Idle => {
            lines.push(Line::from(Span::styled(
                "stream detached",
                theme::style_muted(),
            )));
        }
        StreamState::Loading => {
            lines.push(Line::from(Span::styled(
                "loading stream…",
                theme::style_pending(),
            )));
        }
        StreamState::Live => {
            if let Some(frame) = &state.latest_frame {
                lines.push(Line::from(Span::styled(
                    format!("frame: {} KiB", frame.jpeg.len() / 1024),
                    theme::style_default(),
                )));
                lines.push(Line::from(Span::styled(
                    format!(
                        "received: {}",
                        frame.received_at.with_timezone(&Local).format("%H:%M:%S")
                    ),
                    theme::style_secondary(),
                )));
            }
        }
        StreamState::Failed(err) => {
            lines.push(Line::from(Span::styled(
                format!("stream failed: {err}"),
                theme::style_error_bold(),
            )));
            lines.push(Line::from(Span::styled(
                "press r to retry",
                theme::style_secondary(),
            )));
            // The last-known frame stays so the layout does not collapse.
            if let Some(frame) = &state.latest_frame {
                lines.push(Line::from(Span::styled(
                    format!(
                        "last frame: {} KiB at {}",
                        frame.jpeg.len() / 1024,
                        frame.received_at.with_timezone(&Local).format("%H:%M:%S")
                    ),
                    theme::style_muted(),
                )));
            }
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::style_border())
        .title(format!(" Live Stream [{}] ", state.stream.label()));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ── Gallery ───────────────────────────────────────────────────────────────────

fn draw_gallery(f: &mut Frame, area: Rect, state: &ViewState) {
    let items: Vec<ListItem> = state
        .gallery
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(entry.filename.clone(), theme::style_default()),
                Span::styled(format!("  {}", entry.url), theme::style_muted()),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::style_border())
        .title(format!(" Saved Detections ({}) ", state.gallery.len()));

    if items.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("no saved detections", theme::style_muted()))
                .block(block),
            area,
        );
    } else {
        f.render_widget(List::new(items).block(block), area);
    }
}

// ── Footer ────────────────────────────────────────────────────────────────────

fn draw_footer(f: &mut Frame, area: Rect) {
    f.render_widget(
        Paragraph::new(Span::styled(
            " q quit   r retry stream   g refresh gallery   s toggle polling",
            theme::style_secondary(),
        )),
        area,
    );
}
