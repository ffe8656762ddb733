//! Turn the entity graph into the create/update payload.
//!
//! Assembly re-checks provider references and provider postal codes on its
//! own, independently of step validation, and fails before any network call
//! if either is broken.

use serde::Serialize;
use thiserror::Error;

use super::graph::EntityGraph;
use super::models::{Address, Client, ClientKind};
use super::validation::{ErrorScope, FieldErrors};
use crate::common::{is_valid_postal_code, TempId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    /// Durable client id when updating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub client: ClientPayload,
    pub addresses: Vec<AddressPayload>,
    pub primary_ref: TempId,
    /// Present only when the organization declares providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<ProviderPayload>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientPayload {
    Organization {
        business_name: String,
        registry_number: String,
        description: String,
    },
    Individual {
        first_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        middle_name: Option<String>,
        last_name: String,
        registry_number: String,
        description: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressPayload {
    #[serde(rename = "ref")]
    pub temp_ref: TempId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub registry_number: String,
    pub address_ref: TempId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("provider {index} is not linked to an address")]
    MissingAddressRef { index: usize },

    #[error("provider {index} is linked to address {address_ref}, which does not exist")]
    UnresolvedAddressRef { index: usize, address_ref: TempId },

    #[error("provider {index} address has malformed postal code {postal_code:?}")]
    InvalidPostalCode { index: usize, postal_code: String },
}

impl AssemblyError {
    /// Re-surface as a field error on the offending provider.
    pub fn to_field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        match self {
            AssemblyError::MissingAddressRef { index } => errors.push(
                ErrorScope::Provider(*index),
                "address_ref",
                "Select an address for this provider",
            ),
            AssemblyError::UnresolvedAddressRef { index, address_ref } => errors.push(
                ErrorScope::Provider(*index),
                "address_ref",
                format!("Linked address {} no longer exists", address_ref),
            ),
            AssemblyError::InvalidPostalCode { index, .. } => errors.push(
                ErrorScope::Provider(*index),
                "postal_code",
                "Postal code must look like 12345-6789",
            ),
        }
        errors
    }
}

/// Build the payload for `graph`.
pub fn assemble(graph: &EntityGraph) -> Result<SubmissionPayload, AssemblyError> {
    let addresses: Vec<&Address> = match graph.kind() {
        ClientKind::Organization => graph.addresses().iter().collect(),
        ClientKind::Individual => vec![graph.primary_address()],
    };

    let providers = if graph.has_providers() {
        let mut assembled = Vec::with_capacity(graph.providers().len());
        for (index, provider) in graph.providers().iter().enumerate() {
            let address_ref = provider
                .address_ref
                .clone()
                .filter(|r| !r.as_str().is_empty())
                .ok_or(AssemblyError::MissingAddressRef { index })?;
            let address = addresses
                .iter()
                .find(|a| a.temp_id == address_ref)
                .ok_or_else(|| AssemblyError::UnresolvedAddressRef {
                    index,
                    address_ref: address_ref.clone(),
                })?;
            if !is_valid_postal_code(&address.postal_code) {
                return Err(AssemblyError::InvalidPostalCode {
                    index,
                    postal_code: address.postal_code.clone(),
                });
            }

            assembled.push(ProviderPayload {
                id: provider.durable_id.clone(),
                first_name: provider.first_name.trim().to_string(),
                middle_name: provider.middle_name.clone(),
                last_name: provider.last_name.trim().to_string(),
                registry_number: provider.registry_number.clone(),
                address_ref,
                location_id: provider.durable_location_id.clone(),
            });
        }
        Some(assembled)
    } else {
        None
    };

    Ok(SubmissionPayload {
        id: graph.origin().map(|o| o.client_id.clone()),
        client: client_payload(graph.client()),
        addresses: addresses.into_iter().map(address_payload).collect(),
        primary_ref: graph.primary_address().temp_id.clone(),
        providers,
    })
}

/// Registry numbers to run through the duplicate check, with the entity each
/// belongs to. Numbers unchanged since an edit session was opened are
/// already on file under this client and are skipped.
pub fn registry_numbers_to_check(graph: &EntityGraph) -> Vec<(ErrorScope, String)> {
    let mut numbers = Vec::new();

    let subject = graph.client().registry_number();
    let unchanged = graph
        .origin()
        .map_or(false, |origin| origin.registry_number == subject);
    if !subject.is_empty() && !unchanged {
        numbers.push((ErrorScope::Client, subject.to_string()));
    }

    if graph.has_providers() {
        for (index, provider) in graph.providers().iter().enumerate() {
            if provider.registry_number.is_empty() {
                continue;
            }
            let unchanged = match (graph.origin(), &provider.durable_id) {
                (Some(origin), Some(id)) => {
                    origin.provider_registry_numbers.get(id) == Some(&provider.registry_number)
                }
                _ => false,
            };
            if !unchanged {
                numbers.push((ErrorScope::Provider(index), provider.registry_number.clone()));
            }
        }
    }

    numbers
}

fn client_payload(client: &Client) -> ClientPayload {
    match client {
        Client::Organization(org) => ClientPayload::Organization {
            business_name: org.business_name.trim().to_string(),
            registry_number: org.registry_number.clone(),
            description: org.description.clone(),
        },
        Client::Individual(person) => ClientPayload::Individual {
            first_name: person.first_name.trim().to_string(),
            middle_name: Some(person.middle_name.trim().to_string()).filter(|m| !m.is_empty()),
            last_name: person.last_name.trim().to_string(),
            registry_number: person.registry_number.clone(),
            description: person.description.clone(),
        },
    }
}

fn address_payload(address: &Address) -> AddressPayload {
    AddressPayload {
        temp_ref: address.temp_id.clone(),
        id: address.durable_id.clone(),
        line1: address.line1.clone(),
        line2: address.line2.clone(),
        city: address.city.clone(),
        state_code: address.state_code.clone(),
        state_name: address.state_name.clone(),
        postal_code: address.postal_code.clone(),
        country: address.country.clone(),
        is_primary: address.is_primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::onboarding::models::{AddressPatch, ClientField, ProviderPatch};

    fn org_with_provider() -> EntityGraph {
        let mut graph = EntityGraph::new(ClientKind::Organization);
        graph
            .update_client_field(ClientField::BusinessName, "Acme Health")
            .unwrap();
        graph
            .update_client_field(ClientField::RegistryNumber, "1234567890")
            .unwrap();
        graph.set_has_providers(true).unwrap();
        let primary = graph.primary_address().temp_id.clone();
        graph
            .update_address(
                &primary,
                AddressPatch {
                    city: Some("Minneapolis".into()),
                    postal_code: Some("554011234".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let index = graph.add_provider().unwrap();
        graph
            .update_provider(
                index,
                ProviderPatch {
                    first_name: Some("Grace".into()),
                    last_name: Some("Hopper".into()),
                    registry_number: Some("2222222222".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        graph
    }

    #[test]
    fn every_provider_reference_is_in_the_address_list() {
        let mut graph = org_with_provider();
        let secondary = graph.add_address().unwrap();
        graph
            .update_address(
                &secondary,
                AddressPatch {
                    line1: Some("2 Side St".into()),
                    city: Some("St Paul".into()),
                    postal_code: Some("551010001".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let index = graph.add_provider().unwrap();
        graph
            .update_provider(index, ProviderPatch::link(secondary))
            .unwrap();

        let payload = assemble(&graph).unwrap();
        let providers = payload.providers.unwrap();
        assert_eq!(providers.len(), 2);
        for provider in &providers {
            assert!(payload
                .addresses
                .iter()
                .any(|a| a.temp_ref == provider.address_ref));
        }
        assert_eq!(payload.primary_ref, payload.addresses[0].temp_ref);
    }

    #[test]
    fn dangling_reference_fails_before_submission() {
        let mut graph = org_with_provider();
        let secondary = graph.add_address().unwrap();
        graph
            .update_provider(0, ProviderPatch::link(secondary.clone()))
            .unwrap();
        graph.remove_address(&secondary);

        let err = assemble(&graph).unwrap_err();
        assert_eq!(
            err,
            AssemblyError::UnresolvedAddressRef {
                index: 0,
                address_ref: secondary
            }
        );
        assert!(err
            .to_field_errors()
            .has(ErrorScope::Provider(0), "address_ref"));
    }

    #[test]
    fn malformed_provider_postal_code_fails() {
        let mut graph = org_with_provider();
        let primary = graph.primary_address().temp_id.clone();
        graph
            .update_address(&primary, AddressPatch::postal_code("5540"))
            .unwrap();

        assert!(matches!(
            assemble(&graph),
            Err(AssemblyError::InvalidPostalCode { index: 0, .. })
        ));
    }

    #[test]
    fn providers_omitted_unless_declared() {
        let mut graph = org_with_provider();
        graph.set_has_providers(false).unwrap();

        let payload = assemble(&graph).unwrap();
        assert!(payload.providers.is_none());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("providers").is_none());
        assert!(json.get("id").is_none());
        assert_eq!(json["client"]["kind"], "organization");
    }

    #[test]
    fn new_session_checks_all_registry_numbers() {
        let graph = org_with_provider();
        assert_eq!(
            registry_numbers_to_check(&graph),
            vec![
                (ErrorScope::Client, "1234567890".to_string()),
                (ErrorScope::Provider(0), "2222222222".to_string()),
            ]
        );
    }
}
