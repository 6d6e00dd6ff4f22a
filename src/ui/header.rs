use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::App;
use crate::filter::DATE_INPUT_FORMAT;
use crate::ui::{theme, view_title};

const SEPARATOR: &str = " \u{2502} ";

/// Render the stats header: view, new count, 24h count, last update and
/// active filters.
///
/// Title and stats both come from the last successful load, so they stay
/// consistent while a switch is loading or has failed.
pub fn render<Tz: TimeZone>(frame: &mut Frame, app: &App<Tz>, area: Rect, now: DateTime<Utc>)
where
    Tz::Offset: Display,
{
    let colours = &app.config.display.colours;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::get_border_style(false, colours))
        .border_type(theme::get_border_type(colours));

    let paragraph = Paragraph::new(header_line(app, now)).block(block);
    frame.render_widget(paragraph, area);
}

fn header_line<Tz: TimeZone>(app: &App<Tz>, now: DateTime<Utc>) -> Line<'static>
where
    Tz::Offset: Display,
{
    let feed = app.controller.feed_view(now);
    let criteria = app.controller.criteria();
    let recent_style = theme::get_recent_indicator_style(&app.config.display.colours);

    let source = criteria.active_source().unwrap_or("all").to_string();
    let date = criteria
        .date
        .map(|d| d.format(DATE_INPUT_FORMAT).to_string())
        .unwrap_or_else(|| "any".to_string());

    Line::from(vec![
        Span::styled(format!(" {}", view_title(app, &feed.view)), theme::HEADER_STYLE),
        Span::raw(SEPARATOR),
        Span::raw("New: "),
        Span::styled(feed.stats.new_count.to_string(), recent_style),
        Span::raw(SEPARATOR),
        Span::raw("Last 24h: "),
        Span::styled(feed.stats.last_24h_count.to_string(), theme::COUNT_STYLE),
        Span::raw(SEPARATOR),
        Span::raw("Updated: "),
        Span::styled(feed.last_update.unwrap_or_else(|| "-".to_string()), theme::META_STYLE),
        Span::raw(SEPARATOR),
        Span::raw(format!("Source: {source}  Date: {date}")),
    ])
}
