//! Shape of an already-persisted client as returned by the onboarding API,
//! used to hydrate the wizard for editing.

use serde::{Deserialize, Serialize};

use super::client::Client;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingClient {
    pub id: String,
    pub client: Client,
    pub primary_address: ExistingAddress,
    #[serde(default)]
    pub addresses: Vec<ExistingAddress>,
    #[serde(default)]
    pub providers: Vec<ExistingProvider>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingAddress {
    pub id: String,
    #[serde(default)]
    pub line1: String,
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state_code: String,
    pub state_name: Option<String>,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingProvider {
    pub id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub registry_number: String,
    /// Durable id of the address the provider works at
    pub address_id: String,
    pub location_id: Option<String>,
}
