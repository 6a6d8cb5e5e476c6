use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::SourceError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Thin JSON client bound to one service's base URL
#[derive(Clone)]
pub struct ServiceClient {
    service: &'static str,
    client: Client,
    base_url: String,
}

impl ServiceClient {
    /// Client that sends `X-Api-Key` on every request (Radarr, Sonarr, Overseerr)
    pub fn with_api_key_header(service: &'static str, base_url: &str, api_key: &str) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|_| SourceError::parse(service, "API key is not a valid header value"))?,
        );
        Self::build(service, base_url, headers)
    }

    /// Client without auth headers, the key travels in the query (Tautulli)
    pub fn plain(service: &'static str, base_url: &str) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self::build(service, base_url, headers)
    }

    fn build(service: &'static str, base_url: &str, headers: HeaderMap) -> Result<Self, SourceError> {
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| SourceError::Http { service, source })?;
        Ok(Self {
            service,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, SourceError> {
        let url = self.url(path);
        debug!(service = self.service, url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                service: self.service,
                source,
            })?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                service: self.service,
                status: response.status(),
                url,
            });
        }

        response.json().await.map_err(|source| SourceError::Http {
            service: self.service,
            source,
        })
    }

    /// Issue a DELETE and hand back the status; callers decide which codes are fine
    pub async fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<StatusCode, SourceError> {
        let url = self.url(path);
        debug!(service = self.service, url = %url, "DELETE");
        let response = self
            .client
            .delete(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                service: self.service,
                source,
            })?;
        Ok(response.status())
    }

    pub fn status_error(&self, path: &str, status: StatusCode) -> SourceError {
        SourceError::Status {
            service: self.service,
            status,
            url: self.url(path),
        }
    }
}
