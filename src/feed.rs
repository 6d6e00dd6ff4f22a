use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::controller::FetchRequest;
use crate::error::FeedError;
use crate::normalize;
use crate::portal::PortalRegistry;
use crate::view::ViewSelector;

/// The result of one background fetch, tagged with the request that caused it.
///
/// Produced by the fetch tasks and sent back to the main loop via an
/// unbounded channel.
#[derive(Debug)]
pub struct FetchResult {
    pub generation: u64,
    pub view: ViewSelector,
    /// Raw response body, or why there is none.
    pub body: Result<Vec<u8>, FeedError>,
}

/// Startup failure text shown when the portal list cannot be loaded.
pub fn unreachable_message(base_url: &str) -> String {
    format!("Cannot reach the server. Check that the news API is running at {base_url}.")
}

/// Client for the news aggregation API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("newsdeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::network("client", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an API resource such as `/articles`.
    pub fn url_for(&self, resource: &str) -> String {
        format!("{}{}", self.base_url, resource)
    }

    /// GET a resource and return its body.
    ///
    /// Transport failures and non-success statuses are both network errors.
    pub async fn get(&self, resource: &str) -> Result<Vec<u8>, FeedError> {
        let url = self.url_for(resource);
        let start = Instant::now();
        debug!(%url, "fetching");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FeedError::network(resource, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FeedError::network(resource, e))?;

        info!(
            resource,
            bytes = bytes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "fetch completed"
        );

        Ok(bytes.to_vec())
    }

    /// One-shot startup fetch of the portal list.
    pub async fn fetch_portals(&self) -> Result<PortalRegistry, FeedError> {
        let resource = ViewSelector::ByPortal.resource();
        let body = self.get(&resource).await?;
        let labels = normalize::portal_labels(&body)?;
        Ok(PortalRegistry::from_labels(labels))
    }

    /// [`fetch_portals`](Self::fetch_portals) for startup: any failure becomes
    /// the user-facing unreachable-server message.
    pub async fn bootstrap_portals(&self) -> anyhow::Result<PortalRegistry> {
        self.fetch_portals().await.map_err(|e| {
            error!(error = %e, "startup portal fetch failed");
            anyhow::anyhow!(unreachable_message(&self.base_url))
        })
    }
}

/// Spawn a background task serving `request`.
///
/// The body is sent back through `tx` as-is; normalisation and the
/// staleness check happen on the main loop.
pub fn spawn_fetch(tx: &UnboundedSender<FetchResult>, client: &ApiClient, request: FetchRequest) {
    let tx = tx.clone();
    let client = client.clone();
    tokio::spawn(async move {
        let resource = request.resource();
        let body = client.get(&resource).await;
        if let Err(ref e) = body {
            warn!(resource = %resource, error = %e, "fetch failed");
        }
        let _ = tx.send(FetchResult {
            generation: request.generation,
            view: request.view,
            body,
        });
    });
}
