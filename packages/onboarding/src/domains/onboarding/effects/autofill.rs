//! Apply lookup results to the graph through the builder's own operations.
//!
//! Each function touches only the slot the lookup was made for: a provider's
//! registry result never changes the subject or another provider, and a
//! postal result changes only the address it was typed into.

use crate::common::TempId;
use crate::domains::onboarding::graph::{EntityGraph, GraphError};
use crate::domains::onboarding::models::{AddressPatch, ClientField, ClientKind, ProviderPatch};
use crate::kernel::{AddressCandidate, PostalPlace, RegistryRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Autofill {
    Filled,
    /// Record belongs to the other kind of entity; nothing was written
    KindMismatch {
        expected: ClientKind,
        found: ClientKind,
    },
    /// The provider or address was removed before the result arrived
    SlotGone,
}

/// Subject lookup: names by kind, preferred address into the primary address.
pub fn fill_subject(graph: &mut EntityGraph, record: &RegistryRecord) -> Result<Autofill, GraphError> {
    let expected = graph.kind();
    if record.kind != expected {
        return Ok(Autofill::KindMismatch {
            expected,
            found: record.kind,
        });
    }

    match expected {
        ClientKind::Organization => {
            if let Some(name) = &record.organization_name {
                graph.update_client_field(ClientField::BusinessName, name.clone())?;
            }
        }
        ClientKind::Individual => {
            if let Some(first) = &record.first_name {
                graph.update_client_field(ClientField::FirstName, first.clone())?;
            }
            graph.update_client_field(
                ClientField::MiddleName,
                record.middle_name.clone().unwrap_or_default(),
            )?;
            if let Some(last) = &record.last_name {
                graph.update_client_field(ClientField::LastName, last.clone())?;
            }
        }
    }

    if let Some(candidate) = record.preferred_address() {
        let primary = graph.primary_address().temp_id.clone();
        graph.update_address(&primary, candidate_patch(candidate))?;
    }

    Ok(Autofill::Filled)
}

/// Provider lookup: names, plus the registry address.
///
/// The address goes into the provider's own linked address when that is a
/// secondary address no other provider uses; otherwise a new secondary
/// address is created and the provider re-linked to it.
pub fn fill_provider(
    graph: &mut EntityGraph,
    provider_key: &TempId,
    record: &RegistryRecord,
) -> Result<Autofill, GraphError> {
    let Some(index) = graph.provider_index(provider_key) else {
        return Ok(Autofill::SlotGone);
    };
    if record.kind != ClientKind::Individual {
        return Ok(Autofill::KindMismatch {
            expected: ClientKind::Individual,
            found: record.kind,
        });
    }

    graph.update_provider(
        index,
        ProviderPatch {
            first_name: record.first_name.clone(),
            middle_name: Some(record.middle_name.clone().unwrap_or_default()),
            last_name: record.last_name.clone(),
            ..Default::default()
        },
    )?;

    let Some(candidate) = record.preferred_address() else {
        return Ok(Autofill::Filled);
    };

    let linked = graph.providers()[index].address_ref.clone();
    let exclusive = linked.filter(|temp_id| {
        graph.address(temp_id).map_or(false, |a| !a.is_primary) && graph.references_to(temp_id) == 1
    });

    let target = match exclusive {
        Some(temp_id) => temp_id,
        None => {
            let temp_id = graph.add_address()?;
            graph.update_provider(index, ProviderPatch::link(temp_id.clone()))?;
            temp_id
        }
    };
    graph.update_address(&target, candidate_patch(candidate))?;

    Ok(Autofill::Filled)
}

/// Postal lookup: city, state and country of the address it was typed into.
pub fn fill_postal(
    graph: &mut EntityGraph,
    temp_id: &TempId,
    place: &PostalPlace,
) -> Result<Autofill, GraphError> {
    if graph.address(temp_id).is_none() {
        return Ok(Autofill::SlotGone);
    }

    graph.update_address(
        temp_id,
        AddressPatch {
            city: Some(place.city.clone()),
            state_code: Some(place.state_code.clone()),
            state_name: Some(place.state_name.clone()),
            country: Some(place.country.clone()),
            ..Default::default()
        },
    )?;
    Ok(Autofill::Filled)
}

fn candidate_patch(candidate: &AddressCandidate) -> AddressPatch {
    AddressPatch {
        line1: Some(candidate.line1.clone()),
        line2: Some(candidate.line2.clone().unwrap_or_default()),
        city: Some(candidate.city.clone()),
        state_code: Some(candidate.state_code.clone()),
        // Registry gives no state name; drop a stale one
        state_name: Some(String::new()),
        postal_code: Some(candidate.postal_code.clone()),
        country: Some(candidate.country.clone()),
    }
}
