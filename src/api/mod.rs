//! HTTP resource clients.
//!
//! [`ApiClient`] owns the base URL and the `reqwest` client. Each resource
//! gets its own thin wrapper ([`BalanceApi`], [`MetricsApi`], [`ChatApi`])
//! implementing the matching service trait, which is what the stores depend
//! on. Every call is a single round trip: no retries, no caching.
//!
//! ```rust,no_run
//! use finance_client::api::{ApiClient, BalanceService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new("http://127.0.0.1:8000")?;
//! for balance in client.balances().list().await? {
//!     println!("{} {}", balance.date, balance.balance);
//! }
//! # Ok(())
//! # }
//! ```

mod balances;
mod chat;
mod metrics;

pub use balances::{BalanceApi, BalanceService};
pub use chat::{ChatApi, ChatService};
pub use metrics::{MetricsApi, MetricsService};

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Resource, Result, SetupError, TransportFailure};

/// Shared HTTP plumbing for every resource client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client with default transport settings.
    pub fn new(base_url: impl AsRef<str>) -> std::result::Result<Self, SetupError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        http: reqwest::Client,
    ) -> std::result::Result<Self, SetupError> {
        Ok(Self {
            base_url: parse_base_url(base_url.as_ref())?,
            http,
        })
    }

    /// Build a client from configuration (timeout and user agent applied).
    pub fn from_config(config: &ApiConfig) -> std::result::Result<Self, SetupError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("finance-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(&config.base_url, http)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Balances resource.
    pub fn balances(&self) -> BalanceApi {
        BalanceApi::new(self.clone())
    }

    /// Metrics resource.
    pub fn metrics(&self) -> MetricsApi {
        MetricsApi::new(self.clone())
    }

    /// Chat resource.
    pub fn chat(&self) -> ChatApi {
        ChatApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path.trim_start_matches('/'))
            .unwrap_or_else(|_| self.base_url.clone())
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        resource: Resource,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.url(path);
        let request = self.http.get(url.clone()).query(query);
        let (status, body) = self.dispatch(resource, Method::GET, &url, request).await?;
        decode(resource, &url, status, &body)
    }

    pub(crate) async fn post_json<B, T>(&self, resource: Resource, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self.http.post(url.clone()).json(body);
        let (status, bytes) = self.dispatch(resource, Method::POST, &url, request).await?;
        decode(resource, &url, status, &bytes)
    }

    pub(crate) async fn delete(&self, resource: Resource, path: &str) -> Result<()> {
        let url = self.url(path);
        let request = self.http.delete(url.clone());
        self.dispatch(resource, Method::DELETE, &url, request)
            .await
            .map(|_| ())
    }

    async fn dispatch(
        &self,
        resource: Resource,
        method: Method,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>)> {
        tracing::debug!(
            name: "api.request.sent",
            resource = %resource,
            method = %method,
            url = %url,
            "sending request"
        );

        let response = request
            .send()
            .await
            .map_err(|e| resource.normalize(&TransportFailure::network(&e)))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| resource.normalize(&TransportFailure::network(&e)))?;

        if !status.is_success() {
            return Err(resource.normalize(&TransportFailure::http(url.as_str(), status, &body)));
        }

        tracing::debug!(
            name: "api.response.received",
            resource = %resource,
            status = status.as_u16(),
            bytes = body.len(),
            "response received"
        );
        Ok((status, body.to_vec()))
    }
}

fn decode<T: DeserializeOwned>(
    resource: Resource,
    url: &Url,
    status: StatusCode,
    body: &[u8],
) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| resource.normalize(&TransportFailure::decode(url.as_str(), status, &e)))
}

/// Treat the base as a directory so relative joins keep its path.
fn parse_base_url(raw: &str) -> std::result::Result<Url, url::ParseError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join_keeps_base_path() {
        let client = ApiClient::new("http://localhost:4200/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:4200/api/");
        assert_eq!(
            client.url("/balance/").as_str(),
            "http://localhost:4200/api/balance/"
        );
        assert_eq!(
            client.url("metrics/current-month/").as_str(),
            "http://localhost:4200/api/metrics/current-month/"
        );
    }

    #[test]
    fn test_url_join_at_root() {
        let client = ApiClient::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(client.url("/balance/7").as_str(), "http://127.0.0.1:8000/balance/7");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(SetupError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = ApiConfig {
            base_url: "http://example.test/v1".to_string(),
            timeout_secs: 5,
        };
        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "http://example.test/v1/");
    }
}
