//! Color palette and style constants for the camwatch TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_HEALTHY: Color = Color::Rgb(80, 200, 120);
pub const C_PENDING: Color = Color::Rgb(255, 184, 80);
pub const C_ERROR: Color = Color::Rgb(255, 80, 80);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_healthy() -> Style {
    Style::default().fg(C_HEALTHY)
}

pub fn style_pending() -> Style {
    Style::default().fg(C_PENDING)
}

pub fn style_error() -> Style {
    Style::default().fg(C_ERROR)
}

pub fn style_error_bold() -> Style {
    Style::default().fg(C_ERROR).add_modifier(Modifier::BOLD)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

pub fn style_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}
