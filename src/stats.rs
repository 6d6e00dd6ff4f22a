use chrono::{DateTime, Duration, Utc};

use crate::article::Article;
use crate::view::CardLayout;

/// How long after publication an article is highlighted as new.
pub fn recent_window() -> Duration {
    Duration::minutes(10)
}

/// Whether an article published at `published` is still new at `now`.
///
/// Undated articles are never new.
pub fn is_recent(published: Option<&DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    published.is_some_and(|published| now.signed_duration_since(*published) < recent_window())
}

/// Summary numbers shown above the cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Rendered cards currently flagged as recent.
    pub new_count: usize,
    /// Server-reported count for the loaded view.
    pub last_24h_count: u64,
}

/// Derive stats for a rendered layout.
///
/// `last_24h_count` is the server's figure and is passed through untouched.
pub fn derive(layout: &CardLayout, last_24h_count: u64) -> Stats {
    Stats {
        new_count: layout.cards().filter(|card| card.recent).count(),
        last_24h_count,
    }
}

/// Client-side count of loaded articles from the last 24 hours.
///
/// Only used to report when it disagrees with the server's figure.
pub fn local_last_24h_count(articles: &[Article], now: DateTime<Utc>) -> usize {
    let cutoff = now - Duration::hours(24);
    articles
        .iter()
        .filter(|a| a.published.is_some_and(|p| p > cutoff))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Card, CardGroup};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn card(recent: bool) -> Card {
        Card {
            source: "A".to_string(),
            published_label: String::new(),
            title: "t".to_string(),
            link: "l".to_string(),
            summary: None,
            kind: "General".to_string(),
            city: None,
            recent,
        }
    }

    #[test]
    fn recency_boundary() {
        let just_outside = now() - Duration::minutes(10) - Duration::seconds(1);
        let just_inside = now() - Duration::minutes(9) - Duration::seconds(59);
        let exactly = now() - Duration::minutes(10);
        assert!(!is_recent(Some(&just_outside), now()));
        assert!(is_recent(Some(&just_inside), now()));
        assert!(!is_recent(Some(&exactly), now()));
        assert!(!is_recent(None, now()));
    }

    #[test]
    fn future_dated_articles_count_as_recent() {
        let ahead = now() + Duration::hours(3);
        assert!(is_recent(Some(&ahead), now()));
    }

    #[test]
    fn new_count_counts_recent_cards_in_every_group() {
        let flat = CardLayout::Flat(vec![card(true), card(false), card(true)]);
        assert_eq!(derive(&flat, 0).new_count, 2);

        let grouped = CardLayout::Grouped(vec![
            CardGroup {
                label: "A".to_string(),
                cards: vec![card(true)],
            },
            CardGroup {
                label: "B".to_string(),
                cards: vec![card(false), card(true)],
            },
        ]);
        assert_eq!(derive(&grouped, 0).new_count, 2);
    }

    // The server figure wins even when the loaded list suggests otherwise.
    #[test]
    fn last_24h_count_is_server_authoritative() {
        let articles = vec![Article {
            source: "A".to_string(),
            title: "t".to_string(),
            link: "l".to_string(),
            published: Some(now() - Duration::hours(1)),
            kind: "General".to_string(),
            city: None,
            content: None,
        }];
        assert_eq!(local_last_24h_count(&articles, now()), 1);

        let stats = derive(&CardLayout::Flat(Vec::new()), 42);
        assert_eq!(stats.last_24h_count, 42);
    }

    #[test]
    fn local_count_uses_a_strict_24h_cutoff() {
        let make = |published| Article {
            source: "A".to_string(),
            title: "t".to_string(),
            link: "l".to_string(),
            published,
            kind: "General".to_string(),
            city: None,
            content: None,
        };
        let articles = vec![
            make(Some(now() - Duration::hours(24))),
            make(Some(now() - Duration::hours(23))),
            make(None),
        ];
        assert_eq!(local_last_24h_count(&articles, now()), 1);
    }
}
