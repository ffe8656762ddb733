use serde::{Deserialize, Serialize};

use crate::common::{normalize_registry_number, TempId};

/// A service provider working for the organization.
///
/// `key` is a stable slot identity used to scope lookups; it survives
/// reordering and removal of sibling providers. `address_ref` joins the
/// provider to an address by temp id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub key: TempId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable_id: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub registry_number: String,
    #[serde(default)]
    pub address_ref: Option<TempId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable_location_id: Option<String>,
}

impl Provider {
    pub fn blank(key: TempId, address_ref: Option<TempId>) -> Self {
        Self {
            key,
            durable_id: None,
            first_name: String::new(),
            middle_name: None,
            last_name: String::new(),
            registry_number: String::new(),
            address_ref,
            durable_location_id: None,
        }
    }

    /// No user-entered data.
    pub fn is_blank(&self) -> bool {
        self.durable_id.is_none()
            && self.first_name.is_empty()
            && self.middle_name.as_deref().unwrap_or("").is_empty()
            && self.last_name.is_empty()
            && self.registry_number.is_empty()
    }
}

/// Partial update of a provider. `address_ref: Some(None)` unlinks the
/// provider from its address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderPatch {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub registry_number: Option<String>,
    pub address_ref: Option<Option<TempId>>,
}

impl ProviderPatch {
    pub fn registry_number(value: impl Into<String>) -> Self {
        Self {
            registry_number: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn link(address: TempId) -> Self {
        Self {
            address_ref: Some(Some(address)),
            ..Default::default()
        }
    }

    /// Apply to `provider`. Returns true if the registry number changed.
    pub(crate) fn apply(self, provider: &mut Provider) -> bool {
        if let Some(first_name) = self.first_name {
            provider.first_name = first_name;
        }
        if let Some(middle_name) = self.middle_name {
            provider.middle_name = (!middle_name.is_empty()).then_some(middle_name);
        }
        if let Some(last_name) = self.last_name {
            provider.last_name = last_name;
        }
        if let Some(address_ref) = self.address_ref {
            provider.address_ref = address_ref;
        }

        match self.registry_number {
            Some(number) => {
                let normalized = normalize_registry_number(&number);
                let changed = normalized != provider.registry_number;
                provider.registry_number = normalized;
                changed
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_until_something_is_typed() {
        let mut provider = Provider::blank(TempId::from_durable("p"), None);
        assert!(provider.is_blank());

        ProviderPatch {
            first_name: Some("Grace".into()),
            ..Default::default()
        }
        .apply(&mut provider);
        assert!(!provider.is_blank());
    }

    #[test]
    fn patch_normalizes_registry_number() {
        let mut provider = Provider::blank(TempId::from_durable("p"), None);
        assert!(ProviderPatch::registry_number("12 3456 7890").apply(&mut provider));
        assert_eq!(provider.registry_number, "1234567890");
        assert!(!ProviderPatch::registry_number("1234567890").apply(&mut provider));
    }

    #[test]
    fn patch_can_unlink_address() {
        let mut provider = Provider::blank(
            TempId::from_durable("p"),
            Some(TempId::from_durable("a")),
        );
        ProviderPatch {
            address_ref: Some(None),
            ..Default::default()
        }
        .apply(&mut provider);
        assert_eq!(provider.address_ref, None);
    }
}
