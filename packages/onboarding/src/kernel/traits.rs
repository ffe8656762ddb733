// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The wizard's decisions live in domains/onboarding and call through these.
//
// Naming convention: Base* for trait names (e.g., BaseRegistryLookup)

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domains::onboarding::models::ClientKind;
use crate::domains::onboarding::SubmissionPayload;

// =============================================================================
// Registry Lookup (external provider registry)
// =============================================================================

/// Address suggested by a registry record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCandidate {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state_code: String,
    pub postal_code: String,
    pub country: String,
    /// e.g. `LOCATION`, `MAILING`
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub number: String,
    pub kind: ClientKind,
    pub organization_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub addresses: Vec<AddressCandidate>,
}

impl RegistryRecord {
    /// Practice location if listed, otherwise the first candidate.
    pub fn preferred_address(&self) -> Option<&AddressCandidate> {
        self.addresses
            .iter()
            .find(|a| a.purpose.as_deref() == Some("LOCATION"))
            .or_else(|| self.addresses.first())
    }
}

#[async_trait]
pub trait BaseRegistryLookup: Send + Sync {
    /// Look up a 10-digit registry number. `Ok(None)` when nothing matches.
    async fn lookup(&self, registry_number: &str) -> Result<Option<RegistryRecord>>;
}

// =============================================================================
// Postal Resolver
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalPlace {
    pub city: String,
    pub state_name: String,
    pub state_code: String,
    pub country: String,
}

#[async_trait]
pub trait BasePostalResolver: Send + Sync {
    /// Resolve a 5-digit postal prefix. `Ok(None)` when nothing matches.
    async fn resolve(&self, postal_prefix: &str) -> Result<Option<PostalPlace>>;
}

// =============================================================================
// Duplicate Check (onboarding API)
// =============================================================================

#[async_trait]
pub trait BaseDuplicateCheck: Send + Sync {
    /// Return the subset of `registry_numbers` already on file.
    async fn check_existing(&self, registry_numbers: &[String]) -> Result<Vec<String>>;
}

// =============================================================================
// Client Gateway (onboarding API create/update)
// =============================================================================

/// Client record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedClient {
    pub id: String,
    #[serde(flatten)]
    pub record: serde_json::Map<String, serde_json::Value>,
}

/// Field-level complaint returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFieldError {
    /// `client`, `address` or `provider`
    pub entity: String,
    pub index: Option<usize>,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("submission rejected: {message}")]
    Rejected {
        message: String,
        field_errors: Vec<RemoteFieldError>,
    },

    #[error("onboarding API unavailable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait BaseClientGateway: Send + Sync {
    async fn create(&self, payload: &SubmissionPayload) -> Result<PersistedClient, GatewayError>;

    async fn update(
        &self,
        client_id: &str,
        payload: &SubmissionPayload,
    ) -> Result<PersistedClient, GatewayError>;
}
