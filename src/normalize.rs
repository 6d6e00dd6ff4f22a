//! Turn raw API payloads into one canonical article sequence.
//!
//! Each view is served by a different resource with its own payload shape.
//! A payload that does not match the shape of its view is rejected as a
//! whole; a single malformed record inside an otherwise valid payload is
//! dropped and logged.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::article::{Article, RawArticle};
use crate::error::NormalizationError;
use crate::view::ViewSelector;

/// The canonical result of one load cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub articles: Vec<Article>,
    /// Server-reported count of articles from the last 24 hours.
    pub last_24h_count: u64,
}

/// `GET /articles`: a flat list.
#[derive(Debug, Deserialize)]
struct ArticlesPayload {
    #[serde(alias = "noticias")]
    articles: Vec<Value>,
    #[serde(rename = "last24hCount")]
    last_24h_count: u64,
}

/// `GET /portals`: articles grouped by portal.
#[derive(Debug, Deserialize)]
struct PortalsPayload {
    portals: Vec<PortalGroup>,
    #[serde(rename = "last24hCount")]
    last_24h_count: u64,
}

#[derive(Debug, Deserialize)]
struct PortalGroup {
    #[serde(rename = "portalLabel", alias = "portal")]
    label: String,
    #[serde(alias = "noticias")]
    articles: Vec<Value>,
}

/// `GET /{slug}`: one portal's articles, possibly absent.
#[derive(Debug, Deserialize)]
struct SinglePortalPayload {
    #[serde(default, alias = "noticias")]
    articles: Option<Vec<Value>>,
    #[serde(rename = "last24hCount")]
    last_24h_count: u64,
}

/// Normalise a response body fetched for `view`.
pub fn normalize(view: &ViewSelector, body: &[u8]) -> Result<Normalized, NormalizationError> {
    let mut articles = Vec::new();

    let last_24h_count = match view {
        ViewSelector::All => {
            let payload: ArticlesPayload = parse(view, body)?;
            collect_records(payload.articles, None, &mut articles);
            payload.last_24h_count
        }
        ViewSelector::ByPortal => {
            let payload: PortalsPayload = parse(view, body)?;
            for group in payload.portals {
                collect_records(group.articles, Some(&group.label), &mut articles);
            }
            payload.last_24h_count
        }
        ViewSelector::SinglePortal(_) => {
            let payload: SinglePortalPayload = parse(view, body)?;
            collect_records(payload.articles.unwrap_or_default(), None, &mut articles);
            payload.last_24h_count
        }
    };

    debug!(view = %view, articles = articles.len(), last_24h_count, "payload normalised");

    Ok(Normalized {
        articles,
        last_24h_count,
    })
}

/// Extract the portal labels from a `GET /portals` body, in received order.
///
/// Used once at startup to build the sidebar and source filter.
pub fn portal_labels(body: &[u8]) -> Result<Vec<String>, NormalizationError> {
    let payload: PortalsPayload = parse(&ViewSelector::ByPortal, body)?;
    Ok(payload.portals.into_iter().map(|g| g.label).collect())
}

fn parse<T: DeserializeOwned>(view: &ViewSelector, body: &[u8]) -> Result<T, NormalizationError> {
    serde_json::from_slice(body).map_err(|e| NormalizationError::Malformed {
        view: view.to_string(),
        message: e.to_string(),
    })
}

/// Convert raw records, appending the valid ones to `out`. Returns the number dropped.
fn collect_records(records: Vec<Value>, fallback_source: Option<&str>, out: &mut Vec<Article>) -> usize {
    let mut dropped = 0;
    for (index, value) in records.into_iter().enumerate() {
        let converted = serde_json::from_value::<RawArticle>(value)
            .map_err(|e| e.to_string())
            .and_then(|raw| raw.into_article(fallback_source).map_err(str::to_string));

        match converted {
            Ok(article) => out.push(article),
            Err(reason) => {
                dropped += 1;
                warn!(index, reason = %reason, "dropping malformed article record");
            }
        }
    }
    dropped
}
