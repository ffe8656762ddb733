//! In-memory entity graph edited by the wizard.
//!
//! One client, an ordered address list with exactly one primary entry, and
//! an ordered provider list whose entries point at addresses by temp id.
//! Mutations replace in place and never repair references: removing an
//! address that providers still point at leaves those references dangling
//! for validation to report.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::{
    Address, AddressPatch, Client, ClientField, ClientKind, ExistingAddress, ExistingClient,
    Provider, ProviderPatch,
};
use crate::common::{normalize_postal_code, normalize_registry_number, TempId, TempIdAllocator};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("field {field} does not exist on a {kind} client")]
    FieldNotApplicable { field: &'static str, kind: ClientKind },

    #[error("{0} are only available to organizations")]
    OrganizationOnly(&'static str),

    #[error("unknown address {0}")]
    UnknownAddress(TempId),

    #[error("unknown provider index {0}")]
    UnknownProvider(usize),

    #[error("graph must have exactly one primary address, found {0}")]
    PrimaryAddress(usize),

    #[error("invalid draft: {0}")]
    Draft(#[from] serde_json::Error),
}

/// Where an edit session was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub client_id: String,
    /// Subject registry number when the wizard was opened
    pub registry_number: String,
    /// Provider durable id -> registry number when the wizard was opened
    #[serde(default)]
    pub provider_registry_numbers: BTreeMap<String, String>,
}

/// What a client-kind switch removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantSwitch {
    pub removed_addresses: Vec<TempId>,
    pub removed_providers: Vec<TempId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityGraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<Origin>,
    client: Client,
    addresses: Vec<Address>,
    #[serde(default)]
    providers: Vec<Provider>,
    #[serde(skip)]
    ids: Arc<TempIdAllocator>,
}

impl EntityGraph {
    /// Empty graph for a new client: blank subject plus its primary address.
    pub fn new(kind: ClientKind) -> Self {
        let ids = Arc::new(TempIdAllocator::new());
        let primary = Address::blank(ids.allocate(), true);
        Self {
            origin: None,
            client: Client::empty(kind),
            addresses: vec![primary],
            providers: Vec::new(),
            ids,
        }
    }

    /// Graph for editing an existing client. Durable ids double as temp ids.
    pub fn hydrate(existing: ExistingClient) -> Self {
        let ExistingClient {
            id,
            mut client,
            primary_address,
            addresses,
            providers,
        } = existing;

        let mut all = vec![address_from_existing(primary_address, true)];
        all.extend(
            addresses
                .into_iter()
                .map(|address| address_from_existing(address, false)),
        );

        if let Client::Organization(org) = &mut client {
            org.has_providers = org.has_providers || !providers.is_empty();
        }

        let provider_registry_numbers = providers
            .iter()
            .map(|p| (p.id.clone(), normalize_registry_number(&p.registry_number)))
            .collect();

        let providers = providers
            .into_iter()
            .map(|p| Provider {
                key: TempId::from_durable(p.id.clone()),
                durable_id: Some(p.id),
                first_name: p.first_name,
                middle_name: p.middle_name.filter(|m| !m.is_empty()),
                last_name: p.last_name,
                registry_number: normalize_registry_number(&p.registry_number),
                address_ref: Some(TempId::from_durable(p.address_id)),
                durable_location_id: p.location_id,
            })
            .collect();

        let registry_number = normalize_registry_number(client.registry_number());
        if let Some(number) = client.field_mut(ClientField::RegistryNumber) {
            *number = registry_number.clone();
        }

        Self {
            origin: Some(Origin {
                client_id: id,
                registry_number,
                provider_registry_numbers,
            }),
            client,
            addresses: all,
            providers,
            ids: Arc::new(TempIdAllocator::new()),
        }
    }

    /// Load a graph saved as JSON, checking the primary-address invariant.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let graph: Self = serde_json::from_str(json)?;
        let primaries = graph.addresses.iter().filter(|a| a.is_primary).count();
        if primaries != 1 {
            return Err(GraphError::PrimaryAddress(primaries));
        }
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn kind(&self) -> ClientKind {
        self.client.kind()
    }

    pub fn has_providers(&self) -> bool {
        self.client.has_providers()
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub fn is_edit(&self) -> bool {
        self.origin.is_some()
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn primary_address(&self) -> &Address {
        self.addresses
            .iter()
            .find(|a| a.is_primary)
            .unwrap_or(&self.addresses[0])
    }

    pub fn address(&self, temp_id: &TempId) -> Option<&Address> {
        self.addresses.iter().find(|a| &a.temp_id == temp_id)
    }

    pub fn address_index(&self, temp_id: &TempId) -> Option<usize> {
        self.addresses.iter().position(|a| &a.temp_id == temp_id)
    }

    pub fn provider(&self, index: usize) -> Option<&Provider> {
        self.providers.get(index)
    }

    pub fn provider_index(&self, key: &TempId) -> Option<usize> {
        self.providers.iter().position(|p| &p.key == key)
    }

    /// Number of providers linked to `temp_id`.
    pub fn references_to(&self, temp_id: &TempId) -> usize {
        self.providers
            .iter()
            .filter(|p| p.address_ref.as_ref() == Some(temp_id))
            .count()
    }

    // =========================================================================
    // Client
    // =========================================================================

    /// Switch between organization and individual. Names are cleared; the
    /// registry number and description carry over. Becoming an individual
    /// drops secondary addresses and providers, which only organizations own.
    pub fn set_client_variant(&mut self, kind: ClientKind) -> Option<VariantSwitch> {
        if self.client.kind() == kind {
            return None;
        }

        self.client = self.client.switched_to(kind);

        let mut switch = VariantSwitch::default();
        if kind == ClientKind::Individual {
            switch.removed_addresses = self
                .addresses
                .iter()
                .filter(|a| !a.is_primary)
                .map(|a| a.temp_id.clone())
                .collect();
            switch.removed_providers = self.providers.iter().map(|p| p.key.clone()).collect();
            self.addresses.retain(|a| a.is_primary);
            self.providers.clear();
        }
        Some(switch)
    }

    /// Set a client field. Returns true if the registry number changed.
    pub fn update_client_field(
        &mut self,
        field: ClientField,
        value: impl Into<String>,
    ) -> Result<bool, GraphError> {
        let kind = self.client.kind();
        let slot = self
            .client
            .field_mut(field)
            .ok_or(GraphError::FieldNotApplicable {
                field: field.as_str(),
                kind,
            })?;

        let value = value.into();
        if field == ClientField::RegistryNumber {
            let normalized = normalize_registry_number(&value);
            let changed = *slot != normalized;
            *slot = normalized;
            Ok(changed)
        } else {
            *slot = value;
            Ok(false)
        }
    }

    pub fn set_has_providers(&mut self, has_providers: bool) -> Result<(), GraphError> {
        match &mut self.client {
            Client::Organization(org) => {
                org.has_providers = has_providers;
                Ok(())
            }
            Client::Individual(_) => Err(GraphError::OrganizationOnly("providers")),
        }
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Append a blank secondary address.
    pub fn add_address(&mut self) -> Result<TempId, GraphError> {
        if self.kind() != ClientKind::Organization {
            return Err(GraphError::OrganizationOnly("secondary addresses"));
        }
        let temp_id = self.ids.allocate();
        self.addresses.push(Address::blank(temp_id.clone(), false));
        Ok(temp_id)
    }

    /// Remove a secondary address. The primary address cannot be removed;
    /// attempting it (or naming an unknown address) does nothing.
    pub fn remove_address(&mut self, temp_id: &TempId) -> Option<Address> {
        let index = self.address_index(temp_id)?;
        if self.addresses[index].is_primary {
            return None;
        }
        Some(self.addresses.remove(index))
    }

    /// Returns true if the postal code changed.
    pub fn update_address(
        &mut self,
        temp_id: &TempId,
        patch: AddressPatch,
    ) -> Result<bool, GraphError> {
        let address = self
            .addresses
            .iter_mut()
            .find(|a| &a.temp_id == temp_id)
            .ok_or_else(|| GraphError::UnknownAddress(temp_id.clone()))?;
        Ok(patch.apply(address))
    }

    // =========================================================================
    // Providers
    // =========================================================================

    /// Append a blank provider linked to the primary address.
    pub fn add_provider(&mut self) -> Result<usize, GraphError> {
        if self.kind() != ClientKind::Organization {
            return Err(GraphError::OrganizationOnly("providers"));
        }
        let primary = self.primary_address().temp_id.clone();
        self.providers
            .push(Provider::blank(self.ids.allocate(), Some(primary)));
        Ok(self.providers.len() - 1)
    }

    pub fn remove_provider(&mut self, index: usize) -> Option<Provider> {
        (index < self.providers.len()).then(|| self.providers.remove(index))
    }

    /// Returns true if the registry number changed.
    pub fn update_provider(
        &mut self,
        index: usize,
        patch: ProviderPatch,
    ) -> Result<bool, GraphError> {
        let provider = self
            .providers
            .get_mut(index)
            .ok_or(GraphError::UnknownProvider(index))?;
        Ok(patch.apply(provider))
    }

    /// Seed the provider list on entry to the providers step: exactly one
    /// blank provider linked to the primary address.
    ///
    /// Runs only while the list is untouched (empty, or a single blank
    /// provider still on the primary address). Returns true if the list was
    /// reset.
    pub fn seed_providers(&mut self) -> bool {
        let primary = self.primary_address().temp_id.clone();
        let untouched = match self.providers.as_slice() {
            [] => true,
            [only] => {
                only.is_blank()
                    && only.address_ref.as_ref().map_or(true, |r| *r == primary)
            }
            _ => false,
        };
        if !untouched || self.kind() != ClientKind::Organization {
            return false;
        }

        let key = match self.providers.pop() {
            Some(existing) => existing.key,
            None => self.ids.allocate(),
        };
        self.providers.push(Provider::blank(key, Some(primary)));
        true
    }
}

fn address_from_existing(address: ExistingAddress, is_primary: bool) -> Address {
    Address {
        temp_id: TempId::from_durable(address.id.clone()),
        durable_id: Some(address.id),
        line1: address.line1,
        line2: address.line2.filter(|l| !l.is_empty()),
        city: address.city,
        state_code: address.state_code,
        state_name: address.state_name,
        postal_code: normalize_postal_code(&address.postal_code),
        country: address.country,
        is_primary,
    }
}
