use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// Label shown when an article carries no type.
pub const DEFAULT_KIND: &str = "General";

/// Timestamp layouts the API is known to emit without an offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// A normalised article, as handed to the filter and view stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Display label of the originating portal.
    pub source: String,
    pub title: String,
    pub link: String,
    /// Publication time in UTC; `None` when the server value was missing or unparseable.
    pub published: Option<DateTime<Utc>>,
    /// Article type, `DEFAULT_KIND` when absent.
    pub kind: String,
    pub city: Option<String>,
    pub content: Option<String>,
}

/// An article record exactly as it appears on the wire.
///
/// Every field is optional here so that one bad record can be rejected on
/// its own instead of failing the whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArticle {
    #[serde(default, alias = "source")]
    pub fonte: Option<String>,
    #[serde(default, alias = "title")]
    pub titulo: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, alias = "publishedAt")]
    pub data: Option<String>,
    #[serde(default, alias = "type")]
    pub tipo: Option<String>,
    #[serde(default, alias = "city")]
    pub cidade: Option<String>,
    #[serde(default, alias = "content")]
    pub conteudo: Option<String>,
}

impl RawArticle {
    /// Convert into a canonical [`Article`].
    ///
    /// `fallback_source` is used when the record has no `fonte` of its own
    /// (records nested under a portal group). Returns the reason on rejection.
    pub fn into_article(self, fallback_source: Option<&str>) -> Result<Article, &'static str> {
        let source = non_empty(self.fonte)
            .or_else(|| fallback_source.map(str::to_string))
            .filter(|s| !s.trim().is_empty())
            .ok_or("missing source")?;
        let title = non_empty(self.titulo).ok_or("missing title")?;
        let link = non_empty(self.link).ok_or("missing link")?;

        Ok(Article {
            source,
            title,
            link,
            published: self.data.as_deref().and_then(parse_published),
            kind: non_empty(self.tipo).unwrap_or_else(|| DEFAULT_KIND.to_string()),
            city: non_empty(self.cidade),
            content: non_empty(self.conteudo),
        })
    }
}

/// Parse a server timestamp.
///
/// Values without an offset are UTC. Values that already carry one
/// (RFC 3339) are accepted as-is.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
