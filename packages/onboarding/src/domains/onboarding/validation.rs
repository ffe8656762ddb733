//! Step validation.
//!
//! `validate(step, graph)` is a pure function returning every field error for
//! that step, keyed by the entity (client, address index, provider index) so
//! callers can show errors next to the offending input. An empty map means
//! the step may be left.

use std::collections::{BTreeMap, HashMap};

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use super::graph::EntityGraph;
use super::machines::WizardStep;
use super::models::{Address, Client, ClientKind};
use crate::common::{is_valid_postal_code, is_valid_registry_number};

/// Entity an error belongs to. Indexes are positions in the graph's
/// address/provider lists at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "entity", content = "index", rename_all = "snake_case")]
pub enum ErrorScope {
    /// Not tied to one input
    Form,
    Client,
    Address(usize),
    Provider(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub scope: ErrorScope,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: BTreeMap<(ErrorScope, String), Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scope: ErrorScope, field: &str, message: impl Into<String>) {
        self.entries
            .entry((scope, field.to_string()))
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, scope: ErrorScope, field: &str) -> &[String] {
        self.entries
            .get(&(scope, field.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has(&self, scope: ErrorScope, field: &str) -> bool {
        !self.get(scope, field).is_empty()
    }

    /// Any error on the given entity.
    pub fn has_scope(&self, scope: ErrorScope) -> bool {
        self.entries.keys().any(|(s, _)| *s == scope)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (key, messages) in other.entries {
            self.entries.entry(key).or_default().extend(messages);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldError> + '_ {
        self.entries.iter().flat_map(|((scope, field), messages)| {
            messages.iter().map(move |message| FieldError {
                scope: *scope,
                field: field.clone(),
                message: message.clone(),
            })
        })
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let errors: Vec<FieldError> = self.iter().collect();
        let mut seq = serializer.serialize_seq(Some(errors.len()))?;
        for error in &errors {
            seq.serialize_element(error)?;
        }
        seq.end()
    }
}

/// Validate the rules of one wizard step.
pub fn validate(step: WizardStep, graph: &EntityGraph) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match step {
        WizardStep::Step1 => validate_client_step(graph, &mut errors),
        WizardStep::Step2 => validate_providers_step(graph, &mut errors),
    }
    errors
}

/// Every rule that applies to the graph as a whole: the client step, plus the
/// providers step when the organization declares providers.
pub fn validate_all(graph: &EntityGraph) -> FieldErrors {
    let mut errors = validate(WizardStep::Step1, graph);
    if graph.has_providers() {
        errors.merge(validate(WizardStep::Step2, graph));
    }
    errors
}

fn validate_client_step(graph: &EntityGraph, errors: &mut FieldErrors) {
    let scope = ErrorScope::Client;
    match graph.client() {
        Client::Organization(org) => {
            require(errors, scope, "business_name", &org.business_name, "Business name");
        }
        Client::Individual(person) => {
            require(errors, scope, "first_name", &person.first_name, "First name");
            require(errors, scope, "last_name", &person.last_name, "Last name");
        }
    }
    check_registry_number(errors, scope, graph.client().registry_number());

    for (index, address) in graph.addresses().iter().enumerate() {
        let scope = ErrorScope::Address(index);
        if address.is_primary {
            require(errors, scope, "city", &address.city, "City");
            check_postal_code(errors, scope, &address.postal_code);
        } else if graph.kind() == ClientKind::Organization {
            // Secondary addresses are all-or-nothing
            require(errors, scope, "line1", &address.line1, "Address line 1");
            require(errors, scope, "city", &address.city, "City");
            check_postal_code(errors, scope, &address.postal_code);
        }
    }
}

fn validate_providers_step(graph: &EntityGraph, errors: &mut FieldErrors) {
    if graph.has_providers() && graph.providers().is_empty() {
        errors.push(
            ErrorScope::Form,
            "providers",
            "At least one provider is required",
        );
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, provider) in graph.providers().iter().enumerate() {
        let scope = ErrorScope::Provider(index);
        require(errors, scope, "first_name", &provider.first_name, "First name");
        require(errors, scope, "last_name", &provider.last_name, "Last name");
        check_registry_number(errors, scope, &provider.registry_number);

        if !provider.registry_number.is_empty() {
            if let Some(first) = seen.insert(provider.registry_number.as_str(), index) {
                errors.push(
                    scope,
                    "registry_number",
                    format!("Registry number is already used by provider {}", first + 1),
                );
                seen.insert(provider.registry_number.as_str(), first);
            }
        }

        match resolve(graph, provider.address_ref.as_ref().map(|r| r.as_str())) {
            AddressLink::Missing => {
                errors.push(scope, "address_ref", "Select an address for this provider");
            }
            AddressLink::Dangling(temp_id) => {
                errors.push(
                    scope,
                    "address_ref",
                    format!("Linked address {} no longer exists", temp_id),
                );
            }
            AddressLink::Resolved(address) => {
                require(errors, scope, "city", &address.city, "City");
                check_postal_code(errors, scope, &address.postal_code);
            }
        }
    }
}

enum AddressLink<'a> {
    Missing,
    Dangling(&'a str),
    Resolved(&'a Address),
}

fn resolve<'a>(graph: &'a EntityGraph, address_ref: Option<&'a str>) -> AddressLink<'a> {
    match address_ref {
        None | Some("") => AddressLink::Missing,
        Some(temp_id) => graph
            .addresses()
            .iter()
            .find(|a| a.temp_id.as_str() == temp_id)
            .map(AddressLink::Resolved)
            .unwrap_or(AddressLink::Dangling(temp_id)),
    }
}

fn require(errors: &mut FieldErrors, scope: ErrorScope, field: &str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.push(scope, field, format!("{} is required", label));
    }
}

fn check_registry_number(errors: &mut FieldErrors, scope: ErrorScope, value: &str) {
    if value.is_empty() {
        errors.push(scope, "registry_number", "Registry number is required");
    } else if !is_valid_registry_number(value) {
        errors.push(scope, "registry_number", "Registry number must be exactly 10 digits");
    }
}

fn check_postal_code(errors: &mut FieldErrors, scope: ErrorScope, value: &str) {
    if value.is_empty() {
        errors.push(scope, "postal_code", "Postal code is required");
    } else if !is_valid_postal_code(value) {
        errors.push(scope, "postal_code", "Postal code must look like 12345-6789");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::onboarding::models::{AddressPatch, ClientField, ProviderPatch};

    fn valid_org() -> EntityGraph {
        let mut graph = EntityGraph::new(ClientKind::Organization);
        graph
            .update_client_field(ClientField::BusinessName, "Acme Health")
            .unwrap();
        graph
            .update_client_field(ClientField::RegistryNumber, "1234567890")
            .unwrap();
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
        graph
    }

    fn fill_provider(graph: &mut EntityGraph, index: usize, number: &str) {
        graph
            .update_provider(
                index,
                ProviderPatch {
                    first_name: Some("Grace".into()),
                    last_name: Some("Hopper".into()),
                    registry_number: Some(number.into()),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn valid_organization_passes_client_step() {
        let graph = valid_org();
        assert!(validate(WizardStep::Step1, &graph).is_empty());
    }

    #[test]
    fn name_rules_follow_client_kind() {
        let graph = EntityGraph::new(ClientKind::Individual);
        let errors = validate(WizardStep::Step1, &graph);

        assert!(errors.has(ErrorScope::Client, "first_name"));
        assert!(errors.has(ErrorScope::Client, "last_name"));
        assert!(!errors.has(ErrorScope::Client, "business_name"));
        assert!(errors.has(ErrorScope::Client, "registry_number"));
    }

    #[test]
    fn short_postal_code_fails() {
        let mut graph = valid_org();
        let primary = graph.primary_address().temp_id.clone();
        graph
            .update_address(&primary, AddressPatch::postal_code("1234"))
            .unwrap();

        let errors = validate(WizardStep::Step1, &graph);
        assert_eq!(
            errors.get(ErrorScope::Address(0), "postal_code"),
            ["Postal code must look like 12345-6789".to_string()]
        );
    }

    #[test]
    fn partially_filled_secondary_address_is_rejected_whole() {
        let mut graph = valid_org();
        let secondary = graph.add_address().unwrap();
        graph
            .update_address(
                &secondary,
                AddressPatch {
                    city: Some("St Paul".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let errors = validate(WizardStep::Step1, &graph);
        assert!(errors.has(ErrorScope::Address(1), "line1"));
        assert!(errors.has(ErrorScope::Address(1), "postal_code"));
        assert!(!errors.has(ErrorScope::Address(1), "city"));
    }

    #[test]
    fn dangling_provider_reference_fails_providers_step() {
        let mut graph = valid_org();
        graph.set_has_providers(true).unwrap();
        let secondary = graph.add_address().unwrap();
        let index = graph.add_provider().unwrap();
        fill_provider(&mut graph, index, "2222222222");
        graph
            .update_provider(index, ProviderPatch::link(secondary.clone()))
            .unwrap();

        graph.remove_address(&secondary);

        let errors = validate(WizardStep::Step2, &graph);
        assert!(errors.has(ErrorScope::Provider(0), "address_ref"));
    }

    #[test]
    fn provider_inherits_address_checks_from_linked_address() {
        let mut graph = valid_org();
        graph.set_has_providers(true).unwrap();
        let index = graph.add_provider().unwrap();
        fill_provider(&mut graph, index, "2222222222");
        assert!(validate(WizardStep::Step2, &graph).is_empty());

        let primary = graph.primary_address().temp_id.clone();
        graph
            .update_address(&primary, AddressPatch::postal_code("55401"))
            .unwrap();
        let errors = validate(WizardStep::Step2, &graph);
        assert!(errors.has(ErrorScope::Provider(0), "postal_code"));
    }

    #[test]
    fn duplicate_provider_registry_numbers_are_flagged() {
        let mut graph = valid_org();
        graph.set_has_providers(true).unwrap();
        for _ in 0..3 {
            let index = graph.add_provider().unwrap();
            fill_provider(&mut graph, index, "2222222222");
        }

        let errors = validate(WizardStep::Step2, &graph);
        assert!(!errors.has(ErrorScope::Provider(0), "registry_number"));
        assert!(errors
            .get(ErrorScope::Provider(2), "registry_number")
            .iter()
            .any(|m| m.contains("provider 1")));
    }

    #[test]
    fn errors_serialize_as_flat_list() {
        let mut errors = FieldErrors::new();
        errors.push(ErrorScope::Provider(1), "city", "City is required");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json[0]["scope"]["entity"], "provider");
        assert_eq!(json[0]["scope"]["index"], 1);
        assert_eq!(json[0]["field"], "city");
    }
}
