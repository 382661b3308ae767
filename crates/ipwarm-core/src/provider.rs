//! Mail provider API client shared by the IP provisioner and the mail transport

use ipwarm_common::config::ProviderConfig;
use ipwarm_common::{Error, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use std::time::Duration;
use tracing::warn;

/// Authenticated HTTP client for the provider's v3 API
#[derive(Clone)]
pub struct ProviderClient {
    base_url: Url,
    api_key: String,
    client: Client,
}

/// Non-success response from the provider
#[derive(Debug, Clone)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub body: String,
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status={} body={}", self.status, self.body)
    }
}

impl ProviderClient {
    /// Create a new provider client
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| Error::Config(format!("Invalid provider API URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Provider API URL '{}' cannot be used as a base",
                config.api_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            client,
        })
    }

    /// Build the URL for a list of path segments; each segment is percent-encoded
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Build an authenticated request
    pub fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client
            .request(method, self.url(segments))
            .bearer_auth(&self.api_key)
    }

    /// Pass through success responses, turn the rest into an [`ApiFailure`]
    pub async fn check(response: Response) -> std::result::Result<Response, ApiFailure> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_else(|e| {
            warn!("Failed to read provider error body: {}", e);
            String::new()
        });

        Err(ApiFailure { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> ProviderConfig {
        ProviderConfig {
            api_url: url.to_string(),
            api_key: "SG.test".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_url_building() {
        let client = ProviderClient::new(&config("https://api.example.com")).unwrap();
        assert_eq!(
            client.url(&["v3", "ips", "pools"]).as_str(),
            "https://api.example.com/v3/ips/pools"
        );
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let client = ProviderClient::new(&config("https://api.example.com/")).unwrap();
        assert_eq!(
            client.url(&["v3", "ips", "pools", "my pool/1"]).as_str(),
            "https://api.example.com/v3/ips/pools/my%20pool%2F1"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            ProviderClient::new(&config("not a url")),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ProviderClient::new(&config("mailto:ops@example.com")),
            Err(Error::Config(_))
        ));
    }
}
