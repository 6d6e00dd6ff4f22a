use std::fmt::Display;

use chrono::TimeZone;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::Paragraph;

use crate::action;
use crate::app::{ActivePane, App};
use crate::config::KeyBindings;
use crate::ui::theme;
use crate::view::LOADING_MESSAGE;

/// Render the single-row status bar.
///
/// Shows the status message if one is set, otherwise key hints for the
/// focused pane, prefixed with the loading message while a fetch is in
/// flight.
pub fn render<Tz: TimeZone>(frame: &mut Frame, app: &App<Tz>, area: Rect)
where
    Tz::Offset: Display,
{
    let content = match &app.status_message {
        Some(msg) => format!(" {msg}"),
        None => {
            let hints = build_hints(app.active_pane, &app.config.keybindings);
            if app.controller.is_loading() {
                format!(" {LOADING_MESSAGE} \u{2502}{hints}")
            } else {
                hints
            }
        }
    };

    frame.render_widget(Paragraph::new(content).style(theme::STATUS_STYLE), area);
}

fn build_hints(pane: ActivePane, kb: &KeyBindings) -> String {
    let g = &kb.global;
    let mut parts = match pane {
        ActivePane::Sidebar => vec![
            format!("[{}] Navigate", action::format_bindings(&kb.sidebar.move_down)),
            format!("[{}] Load view", kb.sidebar.select.display()),
        ],
        ActivePane::Cards => vec![
            format!("[{}] Navigate", action::format_bindings(&kb.cards.move_down)),
            format!("[{}] Page", action::format_bindings(&kb.cards.page_down)),
            format!("[{}] Open", action::format_bindings(&[kb.cards.select.clone(), g.open_browser.clone()])),
        ],
    };
    parts.extend([
        format!("[{}] Source", g.cycle_source.display()),
        format!("[{}] Date", g.date_filter.display()),
        format!("[{}] Clear", g.clear_filters.display()),
        format!("[{}] Refresh", g.refresh.display()),
        format!(
            "[{}]/[{}] Pane",
            action::format_bindings(&g.focus_prev),
            action::format_bindings(&g.focus_next)
        ),
        format!("[{}] Quit", action::format_bindings(&g.quit)),
    ]);
    parts.join(" \u{2502} ")
}
