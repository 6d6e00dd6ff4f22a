use crossterm::event::{KeyCode, KeyModifiers};

use crate::app::ActivePane;
use crate::config::{self, KeyBinding};
use crate::event::Event;

/// High-level actions the dashboard performs in response to user input.
/// Raw key events are mapped to these according to the focused pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    FocusNext,
    FocusPrev,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    JumpToTop,
    JumpToBottom,
    /// Sidebar: load the highlighted view. Cards: open the link.
    Select,
    Refresh,
    OpenInBrowser,
    CycleSource,
    PromptDate,
    ClearFilters,
}

/// Map a raw terminal [`Event`] to an [`Action`], considering which pane is
/// focused and the configured keybindings.
///
/// Returns `None` for events with no associated action (ticks, resizes,
/// unmapped keys).
pub fn handle_event(
    event: &Event,
    active_pane: ActivePane,
    keybindings: &config::KeyBindings,
) -> Option<Action> {
    let Event::Key(key) = event else {
        return None;
    };

    let code = key.code;
    let mods = key.modifiers;
    let global = &keybindings.global;

    if config::matches_any(&global.quit, code, mods) {
        return Some(Action::Quit);
    }
    if config::matches_any(&global.focus_next, code, mods) {
        return Some(Action::FocusNext);
    }
    if config::matches_any(&global.focus_prev, code, mods) {
        return Some(Action::FocusPrev);
    }
    if global.refresh.matches(code, mods) {
        return Some(Action::Refresh);
    }
    if global.open_browser.matches(code, mods) {
        return Some(Action::OpenInBrowser);
    }
    if global.cycle_source.matches(code, mods) {
        return Some(Action::CycleSource);
    }
    if global.date_filter.matches(code, mods) {
        return Some(Action::PromptDate);
    }
    if global.clear_filters.matches(code, mods) {
        return Some(Action::ClearFilters);
    }
    if global.jump_top.matches(code, mods) {
        return Some(Action::JumpToTop);
    }
    if global.jump_bottom.matches(code, mods) {
        return Some(Action::JumpToBottom);
    }

    let list = match active_pane {
        ActivePane::Sidebar => &keybindings.sidebar,
        ActivePane::Cards => &keybindings.cards,
    };
    handle_list_key(code, mods, list)
}

fn handle_list_key(code: KeyCode, mods: KeyModifiers, kb: &config::ListKeyBindings) -> Option<Action> {
    if config::matches_any(&kb.move_down, code, mods) {
        return Some(Action::MoveDown);
    }
    if config::matches_any(&kb.move_up, code, mods) {
        return Some(Action::MoveUp);
    }
    if kb.select.matches(code, mods) {
        return Some(Action::Select);
    }
    if config::matches_any(&kb.page_down, code, mods) {
        return Some(Action::PageDown);
    }
    if config::matches_any(&kb.page_up, code, mods) {
        return Some(Action::PageUp);
    }
    None
}

/// Build a display string for a list of keybindings, joined with "/".
pub fn format_bindings(bindings: &[KeyBinding]) -> String {
    bindings
        .iter()
        .map(|kb| kb.display())
        .collect::<Vec<_>>()
        .join("/")
}
