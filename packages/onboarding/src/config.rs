use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::domains::onboarding::effects::DebounceSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub registry_api_url: String,
    pub postal_api_url: String,
    pub onboarding_api_url: String,
    pub onboarding_api_token: Option<String>,
    pub registry_debounce_ms: u64,
    pub postal_debounce_ms: u64,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            registry_api_url: env::var("REGISTRY_API_URL")
                .unwrap_or_else(|_| registry_client::DEFAULT_REGISTRY_URL.to_string()),
            postal_api_url: env::var("POSTAL_API_URL")
                .unwrap_or_else(|_| registry_client::DEFAULT_POSTAL_URL.to_string()),
            onboarding_api_url: env::var("ONBOARDING_API_URL")
                .context("ONBOARDING_API_URL must be set")?,
            onboarding_api_token: env::var("ONBOARDING_API_TOKEN").ok(),
            registry_debounce_ms: env::var("REGISTRY_DEBOUNCE_MS")
                .unwrap_or_else(|_| "400".to_string())
                .parse()
                .context("REGISTRY_DEBOUNCE_MS must be a valid number")?,
            postal_debounce_ms: env::var("POSTAL_DEBOUNCE_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .context("POSTAL_DEBOUNCE_MS must be a valid number")?,
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("HTTP_TIMEOUT_SECS must be a valid number")?,
        })
    }

    pub fn debounce(&self) -> DebounceSettings {
        DebounceSettings {
            registry: Duration::from_millis(self.registry_debounce_ms),
            postal: Duration::from_millis(self.postal_debounce_ms),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
