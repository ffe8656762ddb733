// Kernel - infrastructure seams the onboarding wizard talks through
//
// Every external collaborator is a Base* trait object so tests can swap in
// the mocks from test_dependencies.

pub mod gateway;
pub mod registry;
pub mod test_dependencies;
pub mod traits;

pub use gateway::HttpClientGateway;
pub use registry::RegistryClientLookup;
pub use traits::*;

use std::sync::Arc;

use anyhow::{Context, Result};
use registry_client::RegistryClient;

use crate::config::Config;

/// Handles to every collaborator the wizard needs.
#[derive(Clone)]
pub struct OnboardingKernel {
    pub registry: Arc<dyn BaseRegistryLookup>,
    pub postal: Arc<dyn BasePostalResolver>,
    pub duplicates: Arc<dyn BaseDuplicateCheck>,
    pub clients: Arc<dyn BaseClientGateway>,
}

impl OnboardingKernel {
    pub fn new(
        registry: Arc<dyn BaseRegistryLookup>,
        postal: Arc<dyn BasePostalResolver>,
        duplicates: Arc<dyn BaseDuplicateCheck>,
        clients: Arc<dyn BaseClientGateway>,
    ) -> Self {
        Self {
            registry,
            postal,
            duplicates,
            clients,
        }
    }

    /// Production wiring: public registry + postal APIs and the onboarding API.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry_client =
            RegistryClient::with_base_urls(&config.registry_api_url, &config.postal_api_url)
                .with_timeout(config.http_timeout())
                .context("Failed to build registry client")?;
        let lookups = Arc::new(RegistryClientLookup::new(registry_client));

        let gateway = Arc::new(HttpClientGateway::new(
            &config.onboarding_api_url,
            config.onboarding_api_token.clone(),
            config.http_timeout(),
        )?);

        Ok(Self::new(lookups.clone(), lookups, gateway.clone(), gateway))
    }
}
