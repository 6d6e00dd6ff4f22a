use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use crate::app::{ActivePane, App};
use crate::ui::{theme, view_title};
use crate::view::{Card, CardLayout, EMPTY_MESSAGE, LOADING_MESSAGE, Screen};

/// Render the card list, or the placeholder for the current phase.
pub fn render<Tz: TimeZone>(frame: &mut Frame, app: &mut App<Tz>, area: Rect, now: DateTime<Utc>)
where
    Tz::Offset: Display,
{
    let colours = &app.config.display.colours;
    let block = Block::default()
        .title(format!(" {} ", view_title(app, app.controller.state().view())))
        .borders(Borders::ALL)
        .border_style(theme::get_border_style(app.active_pane == ActivePane::Cards, colours))
        .border_type(theme::get_border_type(colours));

    let placeholder = |text: String, style: Style| {
        Paragraph::new(text)
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
    };

    match app.controller.screen(now) {
        Screen::Idle => frame.render_widget(block, area),
        Screen::Loading => {
            frame.render_widget(placeholder(LOADING_MESSAGE.to_string(), theme::META_STYLE).block(block), area);
        }
        Screen::Error { message } => {
            frame.render_widget(placeholder(message, theme::ERROR_STYLE).block(block), area);
        }
        Screen::Feed(feed) if feed.layout.is_empty() => {
            frame.render_widget(placeholder(EMPTY_MESSAGE.to_string(), theme::META_STYLE).block(block), area);
        }
        Screen::Feed(feed) => {
            let inner_width = area.width.saturating_sub(2) as usize;
            let recent_style = theme::get_recent_indicator_style(colours);
            let highlight = theme::get_highlight_style(colours);
            let (items, row) = build_items(&feed.layout, app.selected_card, inner_width, recent_style);

            let list = List::new(items).block(block).highlight_style(highlight);
            app.cards_state.select(Some(row));
            frame.render_stateful_widget(list, area, &mut app.cards_state);
        }
    }
}

/// List rows for a layout, and the row holding card `selected`.
///
/// Group headers take a row each, so card and row indices differ in the
/// grouped layout.
fn build_items(
    layout: &CardLayout,
    selected: usize,
    width: usize,
    recent_style: Style,
) -> (Vec<ListItem<'static>>, usize) {
    let mut items = Vec::new();
    let mut selected_row = 0;
    let mut card_index = 0;

    let mut push_card = |items: &mut Vec<ListItem<'static>>, card: &Card| {
        if card_index == selected {
            selected_row = items.len();
        }
        items.push(card_item(card, width, recent_style));
        card_index += 1;
    };

    match layout {
        CardLayout::Flat(cards) => {
            for card in cards {
                push_card(&mut items, card);
            }
        }
        CardLayout::Grouped(groups) => {
            for group in groups {
                items.push(ListItem::new(Line::from(vec![
                    Span::styled(group.label.clone(), theme::HEADER_STYLE),
                    Span::styled(format!(" ({})", group.cards.len()), theme::COUNT_STYLE),
                ])));
                for card in &group.cards {
                    push_card(&mut items, card);
                }
            }
        }
    }

    (items, selected_row)
}

/// One card: title, metadata, optional summary and a separator.
fn card_item(card: &Card, width: usize, recent_style: Style) -> ListItem<'static> {
    let marker = if card.recent {
        Span::styled("\u{25CF} ", recent_style)
    } else {
        Span::raw("  ")
    };

    let mut meta = vec![card.source.clone(), card.kind.clone()];
    if let Some(city) = &card.city {
        meta.push(city.clone());
    }
    if !card.published_label.is_empty() {
        meta.push(card.published_label.clone());
    }

    let mut lines = vec![
        Line::from(vec![marker, Span::styled(card.title.clone(), theme::TITLE_STYLE)]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(meta.join(" \u{00B7} "), theme::META_STYLE),
        ]),
    ];
    if let Some(summary) = &card.summary {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(summary.clone(), theme::SUMMARY_STYLE),
        ]));
    }
    lines.push(Line::from(Span::styled(
        "\u{2500}".repeat(width.min(80)),
        theme::META_STYLE,
    )));

    ListItem::new(lines)
}
