use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

use crate::config::{self, ColourConfig};

/// Border style for a pane given its focus and the colour config.
pub fn get_border_style(is_focused: bool, colours: &ColourConfig) -> Style {
    let color_str = if is_focused {
        &colours.active_border
    } else {
        &colours.inactive_border
    };

    let color = config::parse_color(color_str).unwrap_or(if is_focused {
        Color::Cyan
    } else {
        Color::DarkGray
    });

    Style::new().fg(color)
}

/// Highlight style for the selected row.
pub fn get_highlight_style(colours: &ColourConfig) -> Style {
    let color = config::parse_color(&colours.highlight_bg).unwrap_or(Color::DarkGray);
    Style::new().bg(color).add_modifier(Modifier::BOLD)
}

/// Style of the marker on recently published cards and the "new" counter.
pub fn get_recent_indicator_style(colours: &ColourConfig) -> Style {
    let color = config::parse_color(&colours.recent_indicator).unwrap_or(Color::LightGreen);
    Style::new().fg(color).add_modifier(Modifier::BOLD)
}

pub fn get_border_type(colours: &ColourConfig) -> BorderType {
    config::parse_border_type(&colours.border_type).unwrap_or(BorderType::Plain)
}

/// Group headers and the fixed sidebar entries.
pub const HEADER_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);

pub const TITLE_STYLE: Style = Style::new().fg(Color::White).add_modifier(Modifier::BOLD);

/// Source, type, city and date under a card title.
pub const META_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const SUMMARY_STYLE: Style = Style::new().fg(Color::Gray);

pub const ERROR_STYLE: Style = Style::new().fg(Color::LightRed).add_modifier(Modifier::BOLD);

pub const COUNT_STYLE: Style = Style::new().fg(Color::Cyan);

/// Background style for the bottom status bar.
pub const STATUS_STYLE: Style = Style::new().fg(Color::White).bg(Color::DarkGray);
