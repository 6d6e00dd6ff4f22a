use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::article::Article;

/// Format of the date filter as typed by the user.
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

/// Local filters applied to the canonical article list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Exact source label to keep; `None` or empty keeps every source.
    pub source: Option<String>,
    /// Local calendar day to keep; `None` keeps every day.
    pub date: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.active_source().is_none() && self.date.is_none()
    }

    /// The source predicate, with an empty label treated as "all".
    pub fn active_source(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty())
    }

    /// Parse a `YYYY-MM-DD` date filter.
    pub fn parse_date(input: &str) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(input.trim(), DATE_INPUT_FORMAT)
    }
}

/// Calendar day of `published` in the viewer's time zone.
pub fn local_date<Tz: TimeZone>(published: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    published.with_timezone(tz).date_naive()
}

/// Whether a single article passes both predicates.
///
/// An article without a timestamp never matches an active date filter.
pub fn matches<Tz: TimeZone>(article: &Article, criteria: &FilterCriteria, tz: &Tz) -> bool {
    let source_ok = criteria
        .active_source()
        .is_none_or(|source| article.source == source);

    let date_ok = match criteria.date {
        None => true,
        Some(day) => article
            .published
            .as_ref()
            .is_some_and(|published| local_date(published, tz) == day),
    };

    source_ok && date_ok
}

/// Keep the articles matching `criteria`, preserving input order.
pub fn filter_articles<Tz: TimeZone>(
    articles: &[Article],
    criteria: &FilterCriteria,
    tz: &Tz,
) -> Vec<Article> {
    articles
        .iter()
        .filter(|article| matches(article, criteria, tz))
        .cloned()
        .collect()
}
