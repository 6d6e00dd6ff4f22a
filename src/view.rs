//! View selection, ordering, grouping and the card view-model.
//!
//! Everything here is a pure function of already-filtered articles; the
//! renderer consumes the result without further logic.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use unicode_segmentation::UnicodeSegmentation;

use crate::article::Article;
use crate::portal;
use crate::stats::{self, Stats};

/// Maximum number of characters of content shown on a card.
pub const SUMMARY_LENGTH: usize = 120;

/// Marker appended to a card summary.
pub const ELLIPSIS: &str = "...";

/// Shown in place of the cards while a fetch is in flight.
pub const LOADING_MESSAGE: &str = "Fetching updates...";

/// Shown when the filters leave nothing to display.
pub const EMPTY_MESSAGE: &str = "No articles match the current filters.";

/// Which remote resource is loaded and how it is laid out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewSelector {
    /// Every article, one flat list.
    All,
    /// Top articles of every portal, shown in per-portal sections.
    ByPortal,
    /// One portal's feed, addressed by its slug.
    SinglePortal(String),
}

impl ViewSelector {
    /// The single-portal view for a display label.
    pub fn portal(label: &str) -> Self {
        ViewSelector::SinglePortal(portal::slug(label))
    }

    /// Path of the API resource backing this view.
    ///
    /// The slug goes through the codec again, which is a no-op for a
    /// well-formed slug and guarantees a routable path otherwise.
    pub fn resource(&self) -> String {
        match self {
            ViewSelector::All => "/articles".to_string(),
            ViewSelector::ByPortal => "/portals".to_string(),
            ViewSelector::SinglePortal(slug) => format!("/{}", portal::slug(slug)),
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, ViewSelector::ByPortal)
    }
}

impl fmt::Display for ViewSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewSelector::All => f.write_str("all"),
            ViewSelector::ByPortal => f.write_str("by-portal"),
            ViewSelector::SinglePortal(slug) => write!(f, "portal/{slug}"),
        }
    }
}

/// strftime layouts used on cards and for the last-update stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFormat {
    pub date: String,
    pub time: String,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self {
            date: "%d/%m, %H:%M".to_string(),
            time: "%H:%M:%S".to_string(),
        }
    }
}

/// Order newest first.
///
/// The sort is stable, so equal timestamps keep their input order.
/// Undated articles go last.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| match (&a.published, &b.published) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Partition sorted articles by source.
///
/// Groups are ordered by label (byte-wise, so case-sensitive); each group
/// keeps the order of the input.
pub fn group_by_source(sorted: &[Article]) -> Vec<(&str, Vec<&Article>)> {
    let mut groups: BTreeMap<&str, Vec<&Article>> = BTreeMap::new();
    for article in sorted {
        groups.entry(article.source.as_str()).or_default().push(article);
    }
    groups.into_iter().collect()
}

/// Cut `content` to [`SUMMARY_LENGTH`] grapheme clusters and mark it.
pub fn truncate_summary(content: &str) -> String {
    let mut summary: String = content.graphemes(true).take(SUMMARY_LENGTH).collect();
    summary.push_str(ELLIPSIS);
    summary
}

/// One article, ready to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub source: String,
    /// Local publication time, empty when unknown.
    pub published_label: String,
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
    pub kind: String,
    pub city: Option<String>,
    /// Published within the recent window at build time.
    pub recent: bool,
}

impl Card {
    pub fn build<Tz: TimeZone>(article: &Article, now: DateTime<Utc>, tz: &Tz, format: &DisplayFormat) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        let published_label = article
            .published
            .as_ref()
            .map(|p| p.with_timezone(tz).format(&format.date).to_string())
            .unwrap_or_default();

        Card {
            source: article.source.clone(),
            published_label,
            title: article.title.clone(),
            link: article.link.clone(),
            summary: article.content.as_deref().map(truncate_summary),
            kind: article.kind.clone(),
            city: article.city.clone(),
            recent: stats::is_recent(article.published.as_ref(), now),
        }
    }
}

/// A portal section in the grouped layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardGroup {
    pub label: String,
    pub cards: Vec<Card>,
}

/// Cards as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardLayout {
    Flat(Vec<Card>),
    Grouped(Vec<CardGroup>),
}

impl CardLayout {
    /// Build the layout for `view` from articles already sorted newest first.
    pub fn build<Tz: TimeZone>(
        sorted: &[Article],
        view: &ViewSelector,
        now: DateTime<Utc>,
        tz: &Tz,
        format: &DisplayFormat,
    ) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        if view.is_grouped() {
            let groups = group_by_source(sorted)
                .into_iter()
                .map(|(label, articles)| CardGroup {
                    label: label.to_string(),
                    cards: articles
                        .into_iter()
                        .map(|a| Card::build(a, now, tz, format))
                        .collect(),
                })
                .collect();
            CardLayout::Grouped(groups)
        } else {
            CardLayout::Flat(sorted.iter().map(|a| Card::build(a, now, tz, format)).collect())
        }
    }

    /// Every card in display order.
    pub fn cards(&self) -> Box<dyn Iterator<Item = &Card> + '_> {
        match self {
            CardLayout::Flat(cards) => Box::new(cards.iter()),
            CardLayout::Grouped(groups) => Box::new(groups.iter().flat_map(|g| g.cards.iter())),
        }
    }

    pub fn len(&self) -> usize {
        self.cards().count()
    }

    pub fn is_empty(&self) -> bool {
        self.cards().next().is_none()
    }
}

/// The loaded feed as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView {
    pub view: ViewSelector,
    pub layout: CardLayout,
    pub stats: Stats,
    /// Local time of the last successful load.
    pub last_update: Option<String>,
}

/// What the renderer should show in the main area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Nothing requested yet.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last fetch failed.
    Error { message: String },
    Feed(FeedView),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{DEFAULT_KIND, parse_published};
    use chrono::FixedOffset;

    fn article(source: &str, title: &str, data: &str) -> Article {
        Article {
            source: source.to_string(),
            title: title.to_string(),
            link: format!("https://example.com/{title}"),
            published: parse_published(data),
            kind: DEFAULT_KIND.to_string(),
            city: None,
            content: None,
        }
    }

    fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    fn now() -> DateTime<Utc> {
        parse_published("2024-01-01T12:00:00").unwrap()
    }

    #[test]
    fn resources_per_view() {
        assert_eq!(ViewSelector::All.resource(), "/articles");
        assert_eq!(ViewSelector::ByPortal.resource(), "/portals");
        assert_eq!(ViewSelector::portal("Rádio CBN").resource(), "/radiocbn");
        assert_eq!(ViewSelector::SinglePortal("radiocbn".to_string()).resource(), "/radiocbn");
    }

    #[test]
    fn sorts_newest_first() {
        let mut articles = vec![
            article("B", "T2", "2024-01-01T09:00:00"),
            article("A", "T1", "2024-01-01T10:00:00"),
        ];
        sort_newest_first(&mut articles);
        assert_eq!(titles(&articles), vec!["T1", "T2"]);
    }

    #[test]
    fn sort_is_stable_for_equal_timestamps() {
        let mut articles = vec![
            article("A", "first", "2024-01-01T10:00:00"),
            article("B", "older", "2024-01-01T08:00:00"),
            article("C", "second", "2024-01-01T10:00:00"),
            article("D", "third", "2024-01-01T10:00:00"),
        ];
        sort_newest_first(&mut articles);
        assert_eq!(titles(&articles), vec!["first", "second", "third", "older"]);
    }

    #[test]
    fn undated_articles_sort_last_in_input_order() {
        let mut articles = vec![
            article("A", "u1", ""),
            article("A", "dated", "2024-01-01T10:00:00"),
            article("A", "u2", "bogus"),
        ];
        sort_newest_first(&mut articles);
        assert_eq!(titles(&articles), vec!["dated", "u1", "u2"]);
    }

    #[test]
    fn groups_are_ordered_by_label_and_keep_sorted_order() {
        let mut articles = vec![
            article("Globo", "x-old", "2024-01-01T08:00:00"),
            article("Abril", "y", "2024-01-01T09:00:00"),
            article("Globo", "x-new", "2024-01-01T10:00:00"),
        ];
        sort_newest_first(&mut articles);
        let groups = group_by_source(&articles);
        let labels: Vec<&str> = groups.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["Abril", "Globo"]);
        let globo: Vec<&str> = groups[1].1.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(globo, vec!["x-new", "x-old"]);
    }

    #[test]
    fn group_order_is_case_sensitive() {
        let articles = vec![article("abril", "a", ""), article("Zero", "z", "")];
        let labels: Vec<&str> = group_by_source(&articles).iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["Zero", "abril"]);
    }

    #[test]
    fn layout_is_grouped_only_for_the_portal_view() {
        let articles = vec![article("Globo", "x", "2024-01-01T10:00:00"), article("Abril", "y", "2024-01-01T09:00:00")];
        let format = DisplayFormat::default();

        let flat = CardLayout::build(&articles, &ViewSelector::All, now(), &Utc, &format);
        assert!(matches!(flat, CardLayout::Flat(ref cards) if cards.len() == 2));

        let grouped = CardLayout::build(&articles, &ViewSelector::ByPortal, now(), &Utc, &format);
        let CardLayout::Grouped(groups) = grouped else {
            panic!("expected grouped layout");
        };
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Abril", "Globo"]);
        assert_eq!(groups.iter().map(|g| g.cards.len()).sum::<usize>(), 2);
    }

    #[test]
    fn grouping_does_not_touch_its_input() {
        let articles = vec![article("Globo", "x", "2024-01-01T10:00:00"), article("Abril", "y", "2024-01-01T09:00:00")];
        let before = articles.clone();
        let _ = CardLayout::build(&articles, &ViewSelector::ByPortal, now(), &Utc, &DisplayFormat::default());
        assert_eq!(articles, before);
    }

    #[test]
    fn card_formats_in_local_time() {
        let a = article("A", "t", "2024-03-01T23:30:00");
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let later = parse_published("2024-03-02T12:00:00").unwrap();
        let card = Card::build(&a, later, &tz, &DisplayFormat::default());
        assert_eq!(card.published_label, "01/03, 18:30");
        assert!(!card.recent);
    }

    #[test]
    fn card_dated_in_the_future_is_recent() {
        let a = article("A", "t", "2024-03-01T23:30:00");
        let card = Card::build(&a, now(), &Utc, &DisplayFormat::default());
        assert!(card.recent);
    }

    #[test]
    fn card_marks_recent_articles() {
        let a = article("A", "t", "2024-01-01T11:55:00");
        let card = Card::build(&a, now(), &Utc, &DisplayFormat::default());
        assert!(card.recent);
    }

    #[test]
    fn card_optionals() {
        let mut a = article("A", "t", "");
        a.city = Some("Recife".to_string());
        a.content = Some("short".to_string());
        let card = Card::build(&a, now(), &Utc, &DisplayFormat::default());
        assert_eq!(card.published_label, "");
        assert_eq!(card.city.as_deref(), Some("Recife"));
        assert_eq!(card.summary.as_deref(), Some("short..."));
        assert_eq!(card.kind, DEFAULT_KIND);
    }

    #[test]
    fn summary_truncates_on_grapheme_boundaries() {
        let long = "é".repeat(200);
        let summary = truncate_summary(&long);
        assert_eq!(summary.chars().filter(|c| *c == 'é').count(), SUMMARY_LENGTH);
        assert!(summary.ends_with(ELLIPSIS));

        // A decomposed "e" + combining acute stays whole.
        let decomposed = "e\u{0301}".repeat(130);
        let summary = truncate_summary(&decomposed);
        assert_eq!(summary.graphemes(true).count(), SUMMARY_LENGTH + ELLIPSIS.len());
        assert!(summary.trim_end_matches(ELLIPSIS).ends_with('\u{0301}'));
    }

    #[test]
    fn display_names() {
        assert_eq!(ViewSelector::All.to_string(), "all");
        assert_eq!(ViewSelector::ByPortal.to_string(), "by-portal");
        assert_eq!(ViewSelector::portal("G1").to_string(), "portal/g1");
    }
}
