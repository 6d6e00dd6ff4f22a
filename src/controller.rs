//! The feed state machine.
//!
//! [`Controller`] owns the [`FeedState`] and is the only thing that mutates
//! it. Commands (`select_view`, `refresh`, `change_filter`) come from the
//! event loop; network responses come back tagged with the generation of
//! the request that produced them, and anything but the latest generation
//! is discarded.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::article::Article;
use crate::error::FeedError;
use crate::filter::{self, FilterCriteria};
use crate::normalize::{self, Normalized};
use crate::portal::PortalRegistry;
use crate::stats;
use crate::view::{self, CardLayout, DisplayFormat, FeedView, Screen, ViewSelector};

/// Message shown when a load fails.
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load articles. Try again.";

/// Lifecycle of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Error(String),
}

/// The loaded data for the active view.
#[derive(Debug, Clone)]
pub struct FeedState {
    /// Canonical list, replaced wholesale on every successful load.
    articles: Vec<Article>,
    /// `articles` after local filters, newest first.
    filtered: Vec<Article>,
    /// The view last requested.
    view: ViewSelector,
    /// The view `articles` were loaded for. Lags `view` while a switch is
    /// loading or after it fails.
    loaded_view: ViewSelector,
    /// Server figure for the loaded view.
    last_24h_count: u64,
    last_update: Option<DateTime<Utc>>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            articles: Vec::new(),
            filtered: Vec::new(),
            view: ViewSelector::All,
            loaded_view: ViewSelector::All,
            last_24h_count: 0,
            last_update: None,
        }
    }
}

impl FeedState {
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn filtered(&self) -> &[Article] {
        &self.filtered
    }

    pub fn view(&self) -> &ViewSelector {
        &self.view
    }

    pub fn loaded_view(&self) -> &ViewSelector {
        &self.loaded_view
    }

    pub fn last_24h_count(&self) -> u64 {
        self.last_24h_count
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}

/// A fetch the event loop should issue on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub view: ViewSelector,
}

impl FetchRequest {
    pub fn resource(&self) -> String {
        self.view.resource()
    }
}

/// What happened to a response handed to [`Controller::handle_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the canonical list.
    Applied,
    /// A newer request superseded this one; nothing changed.
    Stale,
    /// The fetch or its payload failed; previous data is kept.
    Failed(FeedError),
}

/// Drives load, filter and refresh for one dashboard.
pub struct Controller<Tz: TimeZone = Local> {
    state: FeedState,
    phase: Phase,
    criteria: FilterCriteria,
    portals: PortalRegistry,
    tz: Tz,
    format: DisplayFormat,
    /// Generation of the most recently issued request.
    generation: u64,
    /// Generation still awaiting a response, if any.
    in_flight: Option<u64>,
}

impl<Tz: TimeZone> Controller<Tz>
where
    Tz::Offset: Display,
{
    pub fn new(tz: Tz, format: DisplayFormat) -> Self {
        Self {
            state: FeedState::default(),
            phase: Phase::Idle,
            criteria: FilterCriteria::default(),
            portals: PortalRegistry::default(),
            tz,
            format,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn portals(&self) -> &PortalRegistry {
        &self.portals
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Install the portal list fetched at startup and load the `All` view.
    pub fn bootstrap(&mut self, portals: PortalRegistry) -> FetchRequest {
        info!(portals = portals.len(), "portal registry loaded");
        self.portals = portals;
        self.select_view(ViewSelector::All)
    }

    /// Switch to `view` and request its resource.
    ///
    /// Any request still in flight is superseded.
    pub fn select_view(&mut self, view: ViewSelector) -> FetchRequest {
        if let Some(stale) = self.in_flight {
            debug!(generation = stale, "superseding in-flight request");
        }
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.phase = Phase::Loading;
        self.state.view = view.clone();
        info!(view = %view, generation = self.generation, "loading view");

        FetchRequest {
            generation: self.generation,
            view,
        }
    }

    /// Reload the active view. Does nothing before the first load.
    pub fn refresh(&mut self) -> Option<FetchRequest> {
        if self.phase == Phase::Idle {
            return None;
        }
        Some(self.select_view(self.state.view.clone()))
    }

    /// Apply the response for request `generation`.
    pub fn handle_response(
        &mut self,
        generation: u64,
        body: Result<Vec<u8>, FeedError>,
        now: DateTime<Utc>,
    ) -> FetchOutcome {
        if self.in_flight != Some(generation) {
            debug!(generation, current = self.generation, "discarding stale response");
            return FetchOutcome::Stale;
        }
        self.in_flight = None;

        let normalized = body.and_then(|body| {
            normalize::normalize(&self.state.view, &body).map_err(FeedError::from)
        });

        match normalized {
            Ok(normalized) => {
                self.apply(normalized, now);
                FetchOutcome::Applied
            }
            Err(err) => {
                warn!(view = %self.state.view, error = %err, "load failed");
                self.phase = Phase::Error(LOAD_ERROR_MESSAGE.to_string());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Replace the filters and re-run the local pipeline. No fetch is issued.
    pub fn change_filter(&mut self, criteria: FilterCriteria) {
        debug!(?criteria, "filters changed");
        self.criteria = criteria;
        self.recompute();
    }

    pub fn clear_filters(&mut self) {
        self.change_filter(FilterCriteria::default());
    }

    /// What the renderer should show at `now`.
    ///
    /// Recency is evaluated against `now` on every call.
    pub fn screen(&self, now: DateTime<Utc>) -> Screen {
        match &self.phase {
            Phase::Idle => Screen::Idle,
            Phase::Loading => Screen::Loading,
            Phase::Error(message) => Screen::Error {
                message: message.clone(),
            },
            Phase::Ready => Screen::Feed(self.feed_view(now)),
        }
    }

    /// The current filtered feed as a view-model, regardless of phase.
    ///
    /// Layout and title follow the view the articles were loaded for, not a
    /// pending or failed switch.
    pub fn feed_view(&self, now: DateTime<Utc>) -> FeedView {
        let loaded = &self.state.loaded_view;
        let layout = CardLayout::build(&self.state.filtered, loaded, now, &self.tz, &self.format);
        let stats = stats::derive(&layout, self.state.last_24h_count);
        let last_update = self
            .state
            .last_update
            .map(|at| at.with_timezone(&self.tz).format(&self.format.time).to_string());

        FeedView {
            view: loaded.clone(),
            layout,
            stats,
            last_update,
        }
    }

    fn apply(&mut self, normalized: Normalized, now: DateTime<Utc>) {
        let local = stats::local_last_24h_count(&normalized.articles, now);
        if local as u64 != normalized.last_24h_count {
            debug!(
                server = normalized.last_24h_count,
                local, "last-24h count differs from loaded articles; using server figure"
            );
        }

        self.state.articles = normalized.articles;
        self.state.loaded_view = self.state.view.clone();
        self.state.last_24h_count = normalized.last_24h_count;
        self.state.last_update = Some(now);
        self.recompute();
        self.phase = Phase::Ready;

        info!(
            view = %self.state.view,
            articles = self.state.articles.len(),
            shown = self.state.filtered.len(),
            "view loaded"
        );
    }

    fn recompute(&mut self) {
        let mut filtered = filter::filter_articles(&self.state.articles, &self.criteria, &self.tz);
        view::sort_newest_first(&mut filtered);
        self.state.filtered = filtered;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    const ALL_BODY: &str = r#"{"articles":[
        {"fonte":"A","titulo":"T2","link":"l2","data":"2024-01-01T09:00:00"},
        {"fonte":"B","titulo":"T1","link":"l1","data":"2024-01-01T10:00:00"}
    ],"last24hCount":2}"#;

    const PORTALS_BODY: &str = r#"{"portals":[
        {"portalLabel":"Globo","articles":[
            {"fonte":"Globo","titulo":"x-old","link":"x1","data":"2024-01-01T07:00:00"},
            {"fonte":"Globo","titulo":"x-new","link":"x2","data":"2024-01-01T11:00:00"}
        ]},
        {"portalLabel":"Abril","articles":[
            {"fonte":"Abril","titulo":"y","link":"y1","data":"2024-01-01T08:00:00"}
        ]}
    ],"last24hCount":3}"#;

    fn now() -> DateTime<Utc> {
        crate::article::parse_published("2024-01-01T12:00:00").unwrap()
    }

    fn controller() -> Controller<Utc> {
        Controller::new(Utc, DisplayFormat::default())
    }

    fn ok(body: &str) -> Result<Vec<u8>, FeedError> {
        Ok(body.as_bytes().to_vec())
    }

    fn filtered_titles<Tz: TimeZone>(c: &Controller<Tz>) -> Vec<String>
    where
        Tz::Offset: Display,
    {
        c.state().filtered().iter().map(|a| a.title.clone()).collect()
    }

    fn loaded(body: &str, view: ViewSelector) -> Controller<Utc> {
        let mut c = controller();
        let req = c.select_view(view);
        assert_eq!(c.handle_response(req.generation, ok(body), now()), FetchOutcome::Applied);
        c
    }

    #[test]
    fn starts_idle_and_bootstrap_loads_all() {
        let mut c = controller();
        assert_eq!(c.phase(), &Phase::Idle);
        assert_eq!(c.screen(now()), Screen::Idle);
        assert!(c.refresh().is_none());

        let req = c.bootstrap(PortalRegistry::from_labels(["G1", "Abril"]));
        assert_eq!(req.view, ViewSelector::All);
        assert_eq!(req.resource(), "/articles");
        assert_eq!(c.phase(), &Phase::Loading);
        assert_eq!(c.screen(now()), Screen::Loading);
        assert_eq!(c.portals().len(), 2);
    }

    #[test]
    fn flat_load_is_sorted_newest_first() {
        let c = loaded(ALL_BODY, ViewSelector::All);
        assert_eq!(c.phase(), &Phase::Ready);
        assert_eq!(filtered_titles(&c), vec!["T1", "T2"]);
        assert_eq!(c.state().last_update(), Some(now()));
        // Canonical order is left as received.
        assert_eq!(c.state().articles()[0].title, "T2");
    }

    #[test]
    fn portal_view_renders_sorted_groups() {
        let c = loaded(PORTALS_BODY, ViewSelector::ByPortal);
        let Screen::Feed(feed) = c.screen(now()) else {
            panic!("expected a feed screen");
        };
        let CardLayout::Grouped(groups) = feed.layout else {
            panic!("expected grouped layout");
        };
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Abril", "Globo"]);
        let globo: Vec<&str> = groups[1].cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(globo, vec!["x-new", "x-old"]);
        // The state keeps its flat, sorted list.
        assert_eq!(filtered_titles(&c), vec!["x-new", "y", "x-old"]);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut c = controller();
        let first = c.select_view(ViewSelector::All);
        let second = c.select_view(ViewSelector::ByPortal);

        assert_eq!(c.handle_response(first.generation, ok(ALL_BODY), now()), FetchOutcome::Stale);
        assert_eq!(c.phase(), &Phase::Loading);
        assert!(c.state().articles().is_empty());

        assert_eq!(c.handle_response(second.generation, ok(PORTALS_BODY), now()), FetchOutcome::Applied);
        assert_eq!(c.state().articles().len(), 3);
    }

    #[test]
    fn late_response_after_refresh_of_same_view_is_discarded() {
        let mut c = loaded(ALL_BODY, ViewSelector::All);
        let slow = c.refresh().unwrap();
        let fresh = c.refresh().unwrap();
        assert_eq!(slow.view, fresh.view);
        assert!(fresh.generation > slow.generation);

        let empty = r#"{"articles":[],"last24hCount":0}"#;
        assert_eq!(c.handle_response(fresh.generation, ok(empty), now()), FetchOutcome::Applied);
        assert_eq!(c.handle_response(slow.generation, ok(ALL_BODY), now()), FetchOutcome::Stale);
        assert!(c.state().articles().is_empty());
    }

    #[test]
    fn a_response_is_applied_at_most_once() {
        let mut c = controller();
        let req = c.select_view(ViewSelector::All);
        assert_eq!(c.handle_response(req.generation, ok(ALL_BODY), now()), FetchOutcome::Applied);
        assert_eq!(c.handle_response(req.generation, ok(ALL_BODY), now()), FetchOutcome::Stale);
    }

    #[test]
    fn network_failure_keeps_previous_data() {
        let mut c = loaded(ALL_BODY, ViewSelector::All);
        let req = c.refresh().unwrap();
        let err = FeedError::Status {
            resource: "/articles".to_string(),
            status: 500,
        };
        assert_eq!(
            c.handle_response(req.generation, Err(err.clone()), now()),
            FetchOutcome::Failed(err)
        );
        assert_eq!(c.phase(), &Phase::Error(LOAD_ERROR_MESSAGE.to_string()));
        assert_eq!(
            c.screen(now()),
            Screen::Error {
                message: LOAD_ERROR_MESSAGE.to_string()
            }
        );
        assert_eq!(c.state().articles().len(), 2);

        // Still filterable while in the error state.
        c.change_filter(FilterCriteria {
            source: Some("A".to_string()),
            date: None,
        });
        assert_eq!(filtered_titles(&c), vec!["T2"]);
    }

    #[test]
    fn malformed_payload_is_an_error_and_keeps_previous_data() {
        let mut c = loaded(ALL_BODY, ViewSelector::All);
        let req = c.select_view(ViewSelector::ByPortal);
        let outcome = c.handle_response(req.generation, ok(ALL_BODY), now());
        assert!(matches!(outcome, FetchOutcome::Failed(FeedError::Normalization(_))));
        assert_eq!(c.state().articles().len(), 2);
        assert!(matches!(c.phase(), Phase::Error(_)));

        // Recovery through refresh of the same view.
        let retry = c.refresh().unwrap();
        assert_eq!(retry.view, ViewSelector::ByPortal);
        assert_eq!(c.handle_response(retry.generation, ok(PORTALS_BODY), now()), FetchOutcome::Applied);
        assert_eq!(c.phase(), &Phase::Ready);
    }

    #[test]
    fn failed_switch_keeps_the_loaded_view_with_its_stats() {
        let body = r#"{"articles":[
            {"fonte":"A","titulo":"t","link":"l","data":"2024-01-01T11:00:00"}
        ],"last24hCount":77}"#;
        let mut c = loaded(body, ViewSelector::All);
        let req = c.select_view(ViewSelector::ByPortal);
        assert_eq!(c.state().view(), &ViewSelector::ByPortal);
        assert_eq!(c.state().loaded_view(), &ViewSelector::All);

        let err = FeedError::Status {
            resource: "/portals".to_string(),
            status: 503,
        };
        c.handle_response(req.generation, Err(err), now());

        let feed = c.feed_view(now());
        assert_eq!(feed.view, ViewSelector::All);
        assert_eq!(feed.stats.last_24h_count, 77);
        assert!(matches!(feed.layout, CardLayout::Flat(_)));

        // A successful retry moves the loaded view along.
        let retry = c.refresh().unwrap();
        c.handle_response(retry.generation, ok(PORTALS_BODY), now());
        let feed = c.feed_view(now());
        assert_eq!(feed.view, ViewSelector::ByPortal);
        assert_eq!(feed.stats.last_24h_count, 3);
    }

    #[test]
    fn changing_filters_is_idempotent() {
        let mut c = loaded(PORTALS_BODY, ViewSelector::ByPortal);
        let criteria = FilterCriteria {
            source: Some("Globo".to_string()),
            date: None,
        };
        c.change_filter(criteria.clone());
        let once = filtered_titles(&c);
        c.change_filter(criteria);
        assert_eq!(filtered_titles(&c), once);
        assert_eq!(once, vec!["x-new", "x-old"]);

        c.clear_filters();
        assert_eq!(c.state().filtered().len(), c.state().articles().len());
    }

    #[test]
    fn filters_survive_a_reload() {
        let mut c = controller();
        c.change_filter(FilterCriteria {
            source: Some("B".to_string()),
            date: None,
        });
        let req = c.select_view(ViewSelector::All);
        c.handle_response(req.generation, ok(ALL_BODY), now());
        assert_eq!(filtered_titles(&c), vec!["T1"]);
    }

    #[test]
    fn filtered_list_is_a_sorted_subset_of_the_canonical_list() {
        let mut c = loaded(PORTALS_BODY, ViewSelector::ByPortal);
        c.change_filter(FilterCriteria {
            source: None,
            date: FilterCriteria::parse_date("2024-01-01").ok(),
        });
        let filtered = c.state().filtered();
        assert!(filtered.iter().all(|a| c.state().articles().contains(a)));
        assert!(filtered.windows(2).all(|w| w[0].published >= w[1].published));
    }

    #[test]
    fn date_filter_follows_the_controller_time_zone() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let mut c = Controller::new(tz, DisplayFormat::default());
        let req = c.select_view(ViewSelector::All);
        let body = r#"{"articles":[{"fonte":"A","titulo":"late","link":"l","data":"2024-03-01T23:30:00"}],"last24hCount":1}"#;
        c.handle_response(req.generation, ok(body), now());
        c.change_filter(FilterCriteria {
            source: None,
            date: FilterCriteria::parse_date("2024-03-01").ok(),
        });
        assert_eq!(filtered_titles(&c), vec!["late"]);
    }

    #[test]
    fn zero_matches_is_a_ready_empty_feed() {
        let mut c = loaded(ALL_BODY, ViewSelector::All);
        c.change_filter(FilterCriteria {
            source: Some("nobody".to_string()),
            date: None,
        });
        let Screen::Feed(feed) = c.screen(now()) else {
            panic!("expected a feed screen");
        };
        assert!(feed.layout.is_empty());
        assert_eq!(c.phase(), &Phase::Ready);
    }

    // The server figure is shown even though only one loaded article is
    // from the last 24 hours.
    #[test]
    fn last_24h_is_the_server_figure_not_a_local_count() {
        let body = r#"{"articles":[
            {"fonte":"A","titulo":"t","link":"l","data":"2024-01-01T11:00:00"}
        ],"last24hCount":57}"#;
        let c = loaded(body, ViewSelector::All);
        assert_eq!(stats::local_last_24h_count(c.state().articles(), now()), 1);
        assert_eq!(c.feed_view(now()).stats.last_24h_count, 57);
    }

    #[test]
    fn new_count_is_recomputed_at_render_time() {
        let body = r#"{"articles":[
            {"fonte":"A","titulo":"fresh","link":"l","data":"2024-01-01T11:55:00"},
            {"fonte":"A","titulo":"old","link":"l2","data":"2024-01-01T08:00:00"}
        ],"last24hCount":2}"#;
        let c = loaded(body, ViewSelector::All);
        assert_eq!(c.feed_view(now()).stats.new_count, 1);
        assert_eq!(c.feed_view(now() + Duration::minutes(10)).stats.new_count, 0);
    }

    #[test]
    fn last_update_is_formatted_in_local_time() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let mut c = Controller::new(tz, DisplayFormat::default());
        let req = c.select_view(ViewSelector::All);
        c.handle_response(req.generation, ok(ALL_BODY), now());
        assert_eq!(c.feed_view(now()).last_update.as_deref(), Some("13:00:00"));
    }

    #[test]
    fn single_portal_view_requests_its_slug() {
        let mut c = controller();
        let req = c.select_view(ViewSelector::portal("Rádio CBN"));
        assert_eq!(req.resource(), "/radiocbn");
        let outcome = c.handle_response(req.generation, ok(r#"{"last24hCount":0}"#), now());
        assert_eq!(outcome, FetchOutcome::Applied);
        assert!(c.state().articles().is_empty());
    }
}
