use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use ratatui::widgets::ListState;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::config::Config;
use crate::controller::{Controller, FetchOutcome, FetchRequest};
use crate::feed::{self, ApiClient, FetchResult};
use crate::filter::FilterCriteria;
use crate::portal::{Portal, PortalRegistry};
use crate::ui::popup::Popup;
use crate::view::{Screen, ViewSelector};

/// Rows moved by a page up / page down.
const PAGE: i64 = 10;

/// Which pane currently has focus in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Sidebar,
    Cards,
}

/// A row in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarItem {
    All,
    ByPortal,
    Portal(Portal),
}

impl SidebarItem {
    pub fn label(&self) -> &str {
        match self {
            SidebarItem::All => "All",
            SidebarItem::ByPortal => "By portal",
            SidebarItem::Portal(portal) => &portal.label,
        }
    }

    pub fn view(&self) -> ViewSelector {
        match self {
            SidebarItem::All => ViewSelector::All,
            SidebarItem::ByPortal => ViewSelector::ByPortal,
            SidebarItem::Portal(portal) => ViewSelector::SinglePortal(portal.slug.clone()),
        }
    }
}

fn sidebar_items(portals: &PortalRegistry) -> Vec<SidebarItem> {
    [SidebarItem::All, SidebarItem::ByPortal]
        .into_iter()
        .chain(portals.iter().cloned().map(SidebarItem::Portal))
        .collect()
}

/// `current` moved by `delta` with wrap-around in a list of `len` rows.
fn wrap_index(current: usize, delta: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as i64 + delta).rem_euclid(len as i64) as usize
}

/// Top-level application state.
///
/// Owns the feed [`Controller`] and the TUI-only state around it (focus,
/// selections, popup, status line). Fetches are spawned from here and their
/// results come back through the receiver returned by [`App::new`].
pub struct App<Tz: TimeZone = Local> {
    /// When `true` the main loop will exit.
    pub should_quit: bool,
    pub active_pane: ActivePane,
    pub config: Config,
    pub controller: Controller<Tz>,
    pub sidebar_items: Vec<SidebarItem>,
    pub sidebar_state: ListState,
    /// Index of the selected card in display order.
    pub selected_card: usize,
    /// Row state of the cards list; rows include group headers.
    pub cards_state: ListState,
    /// Transient message for the status bar, cleared on the next action.
    pub status_message: Option<String>,
    pub popup: Option<Popup>,

    client: ApiClient,
    fetch_tx: UnboundedSender<FetchResult>,
}

impl<Tz: TimeZone> App<Tz>
where
    Tz::Offset: Display,
{
    pub fn new(config: Config, client: ApiClient, tz: Tz) -> (Self, UnboundedReceiver<FetchResult>) {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let controller = Controller::new(tz, config.display_format());

        let mut sidebar_state = ListState::default();
        sidebar_state.select(Some(0));

        let app = Self {
            should_quit: false,
            active_pane: ActivePane::Cards,
            config,
            controller,
            sidebar_items: sidebar_items(&PortalRegistry::default()),
            sidebar_state,
            selected_card: 0,
            cards_state: ListState::default(),
            status_message: None,
            popup: None,
            client,
            fetch_tx,
        };

        (app, fetch_rx)
    }

    /// Install the startup portal list and load the `All` view.
    pub fn bootstrap(&mut self, portals: PortalRegistry) {
        self.sidebar_items = sidebar_items(&portals);
        self.sidebar_state.select(Some(0));
        let request = self.controller.bootstrap(portals);
        self.dispatch(request);
    }

    fn dispatch(&self, request: FetchRequest) {
        feed::spawn_fetch(&self.fetch_tx, &self.client, request);
    }

    /// Hand a completed fetch to the controller.
    pub fn handle_fetch_result(&mut self, result: FetchResult, now: DateTime<Utc>) {
        match self.controller.handle_response(result.generation, result.body, now) {
            FetchOutcome::Applied => self.clamp_card_selection(),
            FetchOutcome::Stale => {
                debug!(generation = result.generation, view = %result.view, "ignored stale result");
            }
            // The error screen takes over; nothing else to do.
            FetchOutcome::Failed(_) => {}
        }
    }

    /// Reload the active view. Used by the refresh key and the timer.
    pub fn refresh(&mut self) {
        match self.controller.refresh() {
            Some(request) => self.dispatch(request),
            None => debug!("refresh skipped, nothing loaded yet"),
        }
    }

    /// Apply a user action.
    pub fn update(&mut self, action: Action) {
        self.status_message = None;

        match action {
            Action::Quit => {
                self.should_quit = true;
            }

            Action::FocusNext | Action::FocusPrev => {
                self.active_pane = match self.active_pane {
                    ActivePane::Sidebar => ActivePane::Cards,
                    ActivePane::Cards => ActivePane::Sidebar,
                };
            }

            Action::MoveDown => self.move_selection(1),
            Action::MoveUp => self.move_selection(-1),
            Action::PageDown => self.move_selection(PAGE),
            Action::PageUp => self.move_selection(-PAGE),

            Action::JumpToTop => match self.active_pane {
                ActivePane::Sidebar => self.sidebar_state.select(Some(0)),
                ActivePane::Cards => self.selected_card = 0,
            },

            Action::JumpToBottom => match self.active_pane {
                ActivePane::Sidebar => {
                    let last = self.sidebar_items.len().saturating_sub(1);
                    self.sidebar_state.select(Some(last));
                }
                ActivePane::Cards => {
                    self.selected_card = self.card_count().saturating_sub(1);
                }
            },

            Action::Select => match self.active_pane {
                ActivePane::Sidebar => self.load_selected_view(),
                ActivePane::Cards => self.open_selected_link(),
            },

            Action::Refresh => self.refresh(),

            Action::OpenInBrowser => self.open_selected_link(),

            Action::CycleSource => self.cycle_source(),

            Action::PromptDate => {
                self.popup = Some(Popup::date_filter(self.controller.criteria()));
            }

            Action::ClearFilters => {
                self.controller.clear_filters();
                self.clamp_card_selection();
                self.status_message = Some("Filters cleared".to_string());
            }
        }
    }

    fn card_count(&self) -> usize {
        self.controller.state().filtered().len()
    }

    fn move_selection(&mut self, delta: i64) {
        match self.active_pane {
            ActivePane::Sidebar => {
                let current = self.sidebar_state.selected().unwrap_or(0);
                let next = wrap_index(current, delta, self.sidebar_items.len());
                self.sidebar_state.select(Some(next));
            }
            ActivePane::Cards => {
                self.selected_card = wrap_index(self.selected_card, delta, self.card_count());
            }
        }
    }

    fn clamp_card_selection(&mut self) {
        self.selected_card = self.selected_card.min(self.card_count().saturating_sub(1));
    }

    /// Load the view highlighted in the sidebar and move focus to the cards.
    fn load_selected_view(&mut self) {
        let view = match self.sidebar_state.selected().and_then(|i| self.sidebar_items.get(i)) {
            Some(item) => item.view(),
            None => return,
        };
        let request = self.controller.select_view(view);
        self.selected_card = 0;
        self.active_pane = ActivePane::Cards;
        self.dispatch(request);
    }

    /// Step the source filter: all, then each portal in sidebar order, then all again.
    fn cycle_source(&mut self) {
        let portals = self.controller.portals();
        let next = match self.controller.criteria().active_source() {
            None => portals.get(0),
            Some(label) => portals.position_of_label(label).and_then(|i| portals.get(i + 1)),
        }
        .map(|portal| portal.label.clone());

        self.status_message = Some(match &next {
            Some(label) => format!("Source: {label}"),
            None => "Source: all".to_string(),
        });

        let criteria = FilterCriteria {
            source: next,
            ..self.controller.criteria().clone()
        };
        self.controller.change_filter(criteria);
        self.clamp_card_selection();
    }

    /// Link of the selected card, in the order the cards are displayed.
    /// `None` unless the card list is on screen.
    pub fn selected_link(&self, now: DateTime<Utc>) -> Option<String> {
        match self.controller.screen(now) {
            Screen::Feed(feed) => feed
                .layout
                .cards()
                .nth(self.selected_card)
                .map(|card| card.link.clone()),
            _ => None,
        }
    }

    fn open_selected_link(&mut self) {
        let Some(link) = self.selected_link(Utc::now()) else {
            return;
        };
        info!(%link, "opening in browser");
        // Opening can block on some platforms.
        tokio::spawn(async move {
            if let Err(e) = open::that(&link) {
                warn!(%link, error = %e, "failed to open browser");
            }
        });
    }

    // ---------------------------------------------------------------------
    // Popup input
    // ---------------------------------------------------------------------

    pub fn handle_popup_char(&mut self, c: char) {
        if let Some(popup) = self.popup.as_mut() {
            popup.handle_char(c);
        }
    }

    pub fn handle_popup_backspace(&mut self) {
        if let Some(popup) = self.popup.as_mut() {
            popup.handle_backspace();
        }
    }

    pub fn handle_popup_escape(&mut self) {
        self.popup = None;
    }

    /// Apply the typed date. Empty input removes the date filter.
    pub fn handle_popup_enter(&mut self) {
        let Some(popup) = self.popup.take() else {
            return;
        };
        let input = popup.confirm();

        let date = if input.is_empty() {
            None
        } else {
            match FilterCriteria::parse_date(&input) {
                Ok(date) => Some(date),
                Err(e) => {
                    debug!(input = %input, error = %e, "rejected date filter");
                    self.status_message = Some(format!("Invalid date \"{input}\", expected YYYY-MM-DD"));
                    return;
                }
            }
        };

        let criteria = FilterCriteria {
            date,
            ..self.controller.criteria().clone()
        };
        self.controller.change_filter(criteria);
        self.clamp_card_selection();
    }
}
