pub mod cards_pane;
pub mod header;
pub mod popup;
pub mod sidebar;
pub mod status_bar;
pub mod theme;

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::App;
use crate::view::ViewSelector;

/// Top-level render function.
///
/// A 3-row stats header on top, a 1-row status bar at the bottom, and the
/// sidebar and card list side by side in between. Everything time-dependent
/// is evaluated against `now`.
pub fn render<Tz: TimeZone>(frame: &mut Frame, app: &mut App<Tz>, now: DateTime<Utc>)
where
    Tz::Offset: Display,
{
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let sidebar_width = app.config.display.sidebar_width.min(100);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(sidebar_width),
            Constraint::Percentage(100 - sidebar_width),
        ])
        .split(vertical[1]);

    header::render(frame, app, vertical[0], now);
    sidebar::render(frame, app, horizontal[0]);
    cards_pane::render(frame, app, horizontal[1], now);
    status_bar::render(frame, app, vertical[2]);

    if let Some(ref popup) = app.popup {
        popup::render_popup(frame, popup);
    }
}

/// Human name of `view`.
pub fn view_title<Tz: TimeZone>(app: &App<Tz>, view: &ViewSelector) -> String
where
    Tz::Offset: Display,
{
    match view {
        ViewSelector::All => "All articles".to_string(),
        ViewSelector::ByPortal => "By portal".to_string(),
        ViewSelector::SinglePortal(slug) => app
            .controller
            .portals()
            .find_by_slug(slug)
            .map(|portal| portal.label.clone())
            .unwrap_or_else(|| slug.clone()),
    }
}
