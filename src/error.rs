//! Error taxonomy for the fetch/normalise pipeline.
//!
//! An empty filter result is not an error: it is rendered as an empty state.

use thiserror::Error;

/// A request to the remote API failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The request could not be sent or the body could not be read.
    #[error("request to {resource} failed: {message}")]
    Network { resource: String, message: String },

    /// The server answered with a non-success status.
    #[error("request to {resource} returned HTTP {status}")]
    Status { resource: String, status: u16 },

    /// The body did not match the shape expected for the requested view.
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

/// A payload did not have the shape required by the view it was fetched for.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("malformed {view} payload: {message}")]
    Malformed { view: String, message: String },
}

impl FeedError {
    pub fn network(resource: &str, err: impl std::fmt::Display) -> Self {
        FeedError::Network {
            resource: resource.to_string(),
            message: err.to_string(),
        }
    }

    /// True for failures that happened before a payload was available.
    pub fn is_network(&self) -> bool {
        matches!(self, FeedError::Network { .. } | FeedError::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_resource_and_code() {
        let err = FeedError::Status {
            resource: "/articles".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "request to /articles returned HTTP 503");
        assert!(err.is_network());
    }

    #[test]
    fn normalization_error_is_transparent() {
        let err: FeedError = NormalizationError::Malformed {
            view: "all".to_string(),
            message: "missing field `articles`".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "malformed all payload: missing field `articles`");
        assert!(!err.is_network());
    }
}
