use async_trait::async_trait;
use reqwest::Client;
use shared::domain::Country;
use tracing::{debug, info};

use crate::error::FetchError;

pub const DEFAULT_COUNTRIES_ENDPOINT: &str = "https://restcountries.com/v2/all";

#[async_trait]
pub trait CountrySource: Send + Sync {
    /// One attempt at fetching the whole catalog. No retry, no backoff.
    async fn fetch_all(&self) -> Result<Vec<Country>, FetchError>;
}

/// Source for hosts that run cache-only.
pub struct MissingCountrySource;

#[async_trait]
impl CountrySource for MissingCountrySource {
    async fn fetch_all(&self) -> Result<Vec<Country>, FetchError> {
        Err(FetchError::Transport(
            "no remote country source is configured".to_string(),
        ))
    }
}

/// Fetches the catalog with a single HTTP GET against a JSON-array endpoint.
pub struct HttpCountrySource {
    http: Client,
    endpoint: String,
}

impl HttpCountrySource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CountrySource for HttpCountrySource {
    async fn fetch_all(&self) -> Result<Vec<Country>, FetchError> {
        debug!(endpoint = %self.endpoint, "fetching country catalog");
        let res = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = res
            .bytes()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let countries = serde_json::from_slice::<Vec<Country>>(&body)
            .map_err(|err| FetchError::Decode(err.to_string()))?;

        info!(count = countries.len(), "fetched country catalog");
        Ok(countries)
    }
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
