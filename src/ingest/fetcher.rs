//! HTTP resource fetcher for the upstream catalog API
//!
//! One call is exactly one GET: require 200, decode the body for the
//! requested kind, fail otherwise. Retry policy lives one layer up in
//! [`super::task`].

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, StatusCode,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use crate::config::UpstreamConfig;
use crate::models::{Collection, ResourceKind};
use crate::utils::error::FetchError;

/// Seam between the retry loop and the transport
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch and decode the collection for `kind`, giving up at `deadline`
    ///
    /// # Errors
    ///
    /// `Network`/`Timeout` on transport failure, `Status` for non-200
    /// answers, `Decode` when the body does not match the expected shape
    async fn fetch(&self, kind: ResourceKind, deadline: Instant) -> Result<Collection, FetchError>;
}

/// One absolute URL per resource kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    urls: HashMap<ResourceKind, Url>,
}

impl Endpoints {
    /// Build the default endpoint set below `base_url`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if the base is not an absolute http(s) URL
    pub fn from_base(base_url: &str) -> Result<Self, FetchError> {
        let base = base_url.trim_end_matches('/');
        let mut urls = HashMap::with_capacity(ResourceKind::ALL.len());

        for kind in ResourceKind::ALL {
            let raw = format!("{base}{}", kind.default_path());
            let url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(FetchError::InvalidUrl(format!(
                    "{raw}: unsupported scheme {}",
                    url.scheme()
                )));
            }
            urls.insert(kind, url);
        }

        Ok(Self { urls })
    }

    pub fn url(&self, kind: ResourceKind) -> &Url {
        // from_base fills every kind
        &self.urls[&kind]
    }
}

/// Fetcher backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP client with compression and a connect timeout
    client: Client,

    endpoints: Endpoints,
}

impl HttpFetcher {
    /// Create a fetcher from upstream configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for a malformed base URL and
    /// `FetchError::Client` if the HTTP client cannot be created
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let endpoints = Endpoints::from_base(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .gzip(true)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, endpoints })
    }

    /// Create a fetcher with default settings against a custom base URL
    ///
    /// # Errors
    ///
    /// Same as [`HttpFetcher::new`]
    pub fn with_base_url(base_url: &str) -> Result<Self, FetchError> {
        Self::new(&UpstreamConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn fetch_once(&self, kind: ResourceKind) -> Result<Collection, FetchError> {
        let url = self.endpoints.url(kind);

        tracing::debug!(kind = %kind, url = %url, "Fetching resource");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })?;

        Ok(Collection::decode(kind, &body)?)
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, kind: ResourceKind, deadline: Instant) -> Result<Collection, FetchError> {
        let budget = deadline.saturating_duration_since(Instant::now());

        tokio::time::timeout_at(deadline, self.fetch_once(kind))
            .await
            .map_err(|_| FetchError::Timeout(budget))?
    }
}
