//! Pure provider-registry REST client.
//!
//! Wraps two public lookups used while onboarding clients:
//!
//! - the NPPES NPI Registry (10-digit registry numbers, individual or
//!   organization records)
//! - a postal-code resolver returning city and state for a 5-digit ZIP
//!
//! # Example
//!
//! ```rust,ignore
//! use registry_client::RegistryClient;
//!
//! let client = RegistryClient::new();
//!
//! if let Some(record) = client.lookup_npi("1234567893").await? {
//!     println!("{:?}", record.basic.organization_name);
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{RegistryError, Result};
pub use types::{EnumerationType, NpiAddress, NpiBasic, NpiRecord, ZipPlace, ZipResponse};

use std::time::Duration;

use reqwest::StatusCode;
use types::NpiSearchResponse;

pub const DEFAULT_REGISTRY_URL: &str = "https://npiregistry.cms.hhs.gov/api";
pub const DEFAULT_POSTAL_URL: &str = "https://api.zippopotam.us";

const API_VERSION: &str = "2.1";

#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    registry_url: String,
    postal_url: String,
}

impl RegistryClient {
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_REGISTRY_URL, DEFAULT_POSTAL_URL)
    }

    pub fn with_base_urls(registry_url: impl Into<String>, postal_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            registry_url: registry_url.into().trim_end_matches('/').to_string(),
            postal_url: postal_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Build a client whose requests time out after `timeout`.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self.with_http_client(client))
    }

    /// Look up a registry record by its 10-digit number.
    ///
    /// Returns `Ok(None)` when the registry has no record for the number.
    pub async fn lookup_npi(&self, number: &str) -> Result<Option<NpiRecord>> {
        if number.len() != 10 || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(RegistryError::InvalidQuery(format!(
                "registry number must be 10 digits, got {:?}",
                number
            )));
        }

        let url = format!("{}/", self.registry_url);
        tracing::debug!(number, "Querying provider registry");

        let resp = self
            .client
            .get(&url)
            .query(&[("version", API_VERSION), ("number", number)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: NpiSearchResponse = resp.json().await?;
        if let Some(first) = body.errors.first() {
            return Err(RegistryError::Rejected(first.description.clone()));
        }

        tracing::debug!(number, result_count = body.result_count, "Registry answered");
        Ok(body.results.into_iter().next())
    }

    /// Resolve the first five digits of a postal code to a place.
    ///
    /// Returns `Ok(None)` when the resolver does not know the code.
    pub async fn resolve_zip(&self, postal_code: &str) -> Result<Option<ZipResponse>> {
        let zip5: String = postal_code
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(5)
            .collect();
        if zip5.len() < 5 {
            return Err(RegistryError::InvalidQuery(format!(
                "postal code needs at least 5 digits, got {:?}",
                postal_code
            )));
        }

        let url = format!("{}/us/{}", self.postal_url, zip5);
        tracing::debug!(zip = %zip5, "Resolving postal code");

        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: ZipResponse = resp.json().await?;
        if body.places.is_empty() {
            return Ok(None);
        }
        Ok(Some(body))
    }
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_short_registry_number_without_request() {
        let client = RegistryClient::with_base_urls("http://127.0.0.1:1", "http://127.0.0.1:1");

        let err = client.lookup_npi("12345").await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn rejects_short_postal_code_without_request() {
        let client = RegistryClient::with_base_urls("http://127.0.0.1:1", "http://127.0.0.1:1");

        let err = client.resolve_zip("123-4").await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidQuery(_)));
    }

    #[test]
    fn trims_trailing_slashes_from_base_urls() {
        let client = RegistryClient::with_base_urls("http://registry/api/", "http://zip/");
        assert_eq!(client.registry_url, "http://registry/api");
        assert_eq!(client.postal_url, "http://zip");
    }
}
