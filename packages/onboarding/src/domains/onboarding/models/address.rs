use serde::{Deserialize, Serialize};

use crate::common::{normalize_postal_code, TempId};

/// An address in the wizard graph.
///
/// `temp_id` equals the durable id for addresses loaded from an existing
/// record (`durable_id` is then set too).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub temp_id: TempId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable_id: Option<String>,
    #[serde(default)]
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub is_primary: bool,
}

impl Address {
    pub fn blank(temp_id: TempId, is_primary: bool) -> Self {
        Self {
            temp_id,
            durable_id: None,
            line1: String::new(),
            line2: None,
            city: String::new(),
            state_code: String::new(),
            state_name: None,
            postal_code: String::new(),
            country: String::new(),
            is_primary,
        }
    }
}

/// Partial update of an address. `None` leaves a field untouched; an empty
/// `line2`/`state_name` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPatch {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state_code: Option<String>,
    pub state_name: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl AddressPatch {
    pub fn postal_code(value: impl Into<String>) -> Self {
        Self {
            postal_code: Some(value.into()),
            ..Default::default()
        }
    }

    /// Apply to `address`. Returns true if the postal code changed.
    pub(crate) fn apply(self, address: &mut Address) -> bool {
        if let Some(line1) = self.line1 {
            address.line1 = line1;
        }
        if let Some(line2) = self.line2 {
            address.line2 = (!line2.is_empty()).then_some(line2);
        }
        if let Some(city) = self.city {
            address.city = city;
        }
        if let Some(state_code) = self.state_code {
            address.state_code = state_code;
        }
        if let Some(state_name) = self.state_name {
            address.state_name = (!state_name.is_empty()).then_some(state_name);
        }
        if let Some(country) = self.country {
            address.country = country;
        }

        match self.postal_code {
            Some(postal_code) => {
                let normalized = normalize_postal_code(&postal_code);
                let changed = normalized != address.postal_code;
                address.postal_code = normalized;
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
    fn patch_normalizes_postal_code_and_reports_change() {
        let mut address = Address::blank(TempId::from_durable("a"), true);

        assert!(AddressPatch::postal_code("554011234").apply(&mut address));
        assert_eq!(address.postal_code, "55401-1234");

        assert!(!AddressPatch::postal_code("55401-1234").apply(&mut address));
    }

    #[test]
    fn empty_optional_fields_clear() {
        let mut address = Address::blank(TempId::from_durable("a"), false);
        AddressPatch {
            line2: Some("Suite 4".into()),
            ..Default::default()
        }
        .apply(&mut address);
        assert_eq!(address.line2.as_deref(), Some("Suite 4"));

        AddressPatch {
            line2: Some(String::new()),
            ..Default::default()
        }
        .apply(&mut address);
        assert_eq!(address.line2, None);
    }
}
