//! Network boundary to the PageSpeed Insights API.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::CATEGORIES;
use crate::error_handling::TransportError;
use crate::models::Strategy;

/// Raw HTTP response from the API: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues one API request for a (URL, strategy) pair.
///
/// Implementations perform exactly one request per call; retries and rate
/// limiting belong to the [`Fetcher`](super::Fetcher).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, strategy: Strategy) -> Result<ApiResponse, TransportError>;
}

/// `Transport` backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: Arc<reqwest::Client>,
    endpoint: String,
    api_key: String,
}

impl ReqwestTransport {
    /// Creates a transport for `endpoint`.
    ///
    /// The request timeout is the client's; use `init_client` for the standard one.
    pub fn new(
        client: Arc<reqwest::Client>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    fn query<'a>(&'a self, url: &'a str, strategy: Strategy) -> Vec<(&'static str, &'a str)> {
        let mut query = vec![
            ("url", url),
            ("strategy", strategy.as_str()),
            ("key", self.api_key.as_str()),
        ];
        query.extend(CATEGORIES.iter().map(|category| ("category", *category)));
        query
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, strategy: Strategy) -> Result<ApiResponse, TransportError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(url, strategy))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}
