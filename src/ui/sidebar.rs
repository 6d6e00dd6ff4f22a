use std::fmt::Display;

use chrono::TimeZone;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};

use crate::app::{ActivePane, App, SidebarItem};
use crate::ui::theme;

/// Render the left-hand view list: All, By portal, then each portal.
/// The loaded view is marked.
pub fn render<Tz: TimeZone>(frame: &mut Frame, app: &mut App<Tz>, area: Rect)
where
    Tz::Offset: Display,
{
    let colours = &app.config.display.colours;
    let block = Block::default()
        .title(" Views ")
        .borders(Borders::ALL)
        .border_style(theme::get_border_style(app.active_pane == ActivePane::Sidebar, colours))
        .border_type(theme::get_border_type(colours));

    let loaded = app.controller.state().view();
    let items: Vec<ListItem> = app
        .sidebar_items
        .iter()
        .map(|item| {
            let marker = if &item.view() == loaded { "\u{25B8} " } else { "  " };
            let style = match item {
                SidebarItem::All | SidebarItem::ByPortal => theme::HEADER_STYLE,
                SidebarItem::Portal(_) => ratatui::style::Style::default(),
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, theme::COUNT_STYLE),
                Span::styled(item.label().to_string(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::get_highlight_style(colours));

    frame.render_stateful_widget(list, area, &mut app.sidebar_state);
}
