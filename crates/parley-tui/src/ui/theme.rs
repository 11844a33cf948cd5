// Colors and styles shared by every view

use parley_core::store::ActivityLevel;
use ratatui::style::{Color, Modifier, Style};

// =============================================================================
// COLOR PALETTE
// =============================================================================

pub const BG_APP: Color = Color::Rgb(0, 0, 0);

/// Selected row background
pub const BG_SELECTED: Color = Color::Rgb(32, 32, 32);

pub const BG_SIDEBAR: Color = Color::Rgb(12, 12, 12);

pub const BG_INPUT: Color = Color::Rgb(18, 18, 18);

pub const BG_MODAL: Color = Color::Rgb(23, 23, 23);

pub const TEXT_PRIMARY: Color = Color::Rgb(220, 220, 220);

pub const TEXT_MUTED: Color = Color::Rgb(128, 128, 128);

/// Hints, placeholders, service messages
pub const TEXT_DIM: Color = Color::Rgb(90, 90, 90);

pub const ACCENT_PRIMARY: Color = Color::Rgb(86, 156, 214);

pub const ACCENT_SUCCESS: Color = Color::Rgb(106, 153, 85);

pub const ACCENT_WARNING: Color = Color::Rgb(206, 145, 120);

pub const ACCENT_ERROR: Color = Color::Rgb(244, 112, 112);

// -----------------------------------------------------------------------------
// Sender colors
// -----------------------------------------------------------------------------

pub const USER_PALETTE: [Color; 8] = [
    Color::Rgb(86, 156, 214),  // Muted blue
    Color::Rgb(106, 153, 85),  // Muted green
    Color::Rgb(169, 154, 203), // Muted purple
    Color::Rgb(206, 145, 120), // Muted orange
    Color::Rgb(78, 154, 154),  // Muted teal
    Color::Rgb(180, 180, 120), // Muted yellow
    Color::Rgb(180, 100, 100), // Muted red
    Color::Rgb(140, 140, 170), // Muted lavender
];

/// Deterministic color for a sender id
pub fn user_color(user_id: &str) -> Color {
    let hash: usize = user_id.bytes().map(|b| b as usize).sum();
    USER_PALETTE[hash % USER_PALETTE.len()]
}

// =============================================================================
// STYLE FUNCTIONS
// =============================================================================

pub fn text_primary() -> Style {
    Style::default().fg(TEXT_PRIMARY)
}

pub fn text_muted() -> Style {
    Style::default().fg(TEXT_MUTED)
}

pub fn text_dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub fn text_bold() -> Style {
    Style::default()
        .fg(TEXT_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ACCENT_PRIMARY)
}

pub fn tag_header() -> Style {
    Style::default()
        .fg(ACCENT_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn list_footer() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Room title style by how much the room wants attention.
pub fn room_title(level: ActivityLevel, selected: bool) -> Style {
    let style = match level {
        ActivityLevel::Highlight => Style::default()
            .fg(ACCENT_ERROR)
            .add_modifier(Modifier::BOLD),
        ActivityLevel::Unread => text_bold(),
        ActivityLevel::Traffic => text_primary(),
        ActivityLevel::None => text_muted(),
    };
    if selected {
        style.bg(BG_SELECTED).add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

pub fn service_message() -> Style {
    Style::default()
        .fg(ACCENT_WARNING)
        .add_modifier(Modifier::ITALIC)
}

pub fn search_match() -> Style {
    Style::default()
        .fg(ACCENT_SUCCESS)
        .add_modifier(Modifier::BOLD)
}
