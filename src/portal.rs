//! Portal names and their routing slugs.
//!
//! A portal is addressed on the API by a slug derived from its display
//! label. The label itself is kept alongside the slug in the registry so it
//! never has to be reconstructed.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Derive the routing slug for a portal label.
///
/// Lowercases, removes every whitespace character, then decomposes and drops
/// combining marks: `"Rádio CBN"` becomes `"radiocbn"`.
pub fn slug(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Case- and accent-folded form used only for ordering labels.
fn sort_key(label: &str) -> String {
    label
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// A news portal known to the sidebar and the source filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    pub label: String,
    pub slug: String,
}

impl Portal {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let slug = slug(&label);
        Self { label, slug }
    }
}

/// The set of portals discovered at startup, ordered for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortalRegistry {
    portals: Vec<Portal>,
}

impl PortalRegistry {
    /// Build a registry from display labels.
    ///
    /// Duplicate and blank labels are skipped. Portals are ordered by their
    /// folded label, ties broken by the raw label.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut portals: Vec<Portal> = Vec::new();
        for label in labels {
            let label = label.into();
            if label.trim().is_empty() || portals.iter().any(|p| p.label == label) {
                continue;
            }
            portals.push(Portal::new(label));
        }

        portals.sort_by(|a, b| {
            sort_key(&a.label)
                .cmp(&sort_key(&b.label))
                .then_with(|| a.label.cmp(&b.label))
        });

        Self { portals }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Portal> {
        self.portals.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Portal> {
        self.portals.get(index)
    }

    pub fn len(&self) -> usize {
        self.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    /// Find the portal routed to by `slug`.
    pub fn find_by_slug(&self, slug: &str) -> Option<&Portal> {
        self.portals.iter().find(|p| p.slug == slug)
    }

    /// Position of the portal with the given label, if known.
    pub fn position_of_label(&self, label: &str) -> Option<usize> {
        self.portals.iter().position(|p| p.label == label)
    }
}
