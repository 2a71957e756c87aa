use ratatui::style::Color;

// Centralized theme colors, kept as small helpers so the view can be
// restyled in one place.

pub const ACCENT_RGB: (u8, u8, u8) = (200, 100, 0);

pub fn accent() -> Color {
    Color::Rgb(ACCENT_RGB.0, ACCENT_RGB.1, ACCENT_RGB.2)
}

// Tab strip
pub fn strip_bg() -> Color {
    Color::DarkGray
}
pub fn tab_fg() -> Color {
    Color::Gray
}
pub fn tab_active_bg() -> Color {
    Color::Gray
}
pub fn tab_active_fg() -> Color {
    Color::Black
}

// Gutters
pub fn gutter_fg() -> Color {
    Color::DarkGray
}
pub fn gutter_hover_fg() -> Color {
    Color::Gray
}

// Drag and drop
pub fn drop_zone_bg() -> Color {
    Color::Blue
}
pub fn preview_bg() -> Color {
    Color::Black
}
pub fn preview_fg() -> Color {
    Color::White
}

// Status line and overlays
pub fn status_bg() -> Color {
    Color::Blue
}
pub fn status_fg() -> Color {
    Color::White
}
pub fn overlay_bg() -> Color {
    Color::Black
}
pub fn overlay_fg() -> Color {
    Color::White
}
pub fn muted_fg() -> Color {
    Color::DarkGray
}
