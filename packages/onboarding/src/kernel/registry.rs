// Registry + postal lookups backed by the public registry-client crate

use anyhow::Result;
use async_trait::async_trait;
use registry_client::{EnumerationType, NpiRecord, RegistryClient, ZipResponse};

use super::traits::{
    AddressCandidate, BasePostalResolver, BaseRegistryLookup, PostalPlace, RegistryRecord,
};
use crate::domains::onboarding::models::ClientKind;

pub struct RegistryClientLookup {
    client: RegistryClient,
}

impl RegistryClientLookup {
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BaseRegistryLookup for RegistryClientLookup {
    async fn lookup(&self, registry_number: &str) -> Result<Option<RegistryRecord>> {
        let record = self.client.lookup_npi(registry_number).await?;
        Ok(record.map(|r| registry_record(registry_number, r)))
    }
}

#[async_trait]
impl BasePostalResolver for RegistryClientLookup {
    async fn resolve(&self, postal_prefix: &str) -> Result<Option<PostalPlace>> {
        let response = self.client.resolve_zip(postal_prefix).await?;
        Ok(response.and_then(postal_place))
    }
}

fn registry_record(number: &str, record: NpiRecord) -> RegistryRecord {
    let kind = match record.enumeration_type {
        EnumerationType::Individual => ClientKind::Individual,
        EnumerationType::Organization => ClientKind::Organization,
    };

    RegistryRecord {
        number: number.to_string(),
        kind,
        organization_name: record.basic.organization_name,
        first_name: record.basic.first_name,
        middle_name: record.basic.middle_name,
        last_name: record.basic.last_name,
        addresses: record
            .addresses
            .into_iter()
            .map(|a| AddressCandidate {
                line1: a.address_1,
                line2: a.address_2.filter(|l| !l.is_empty()),
                city: a.city,
                state_code: a.state,
                postal_code: a.postal_code,
                country: a.country_code,
                purpose: a.address_purpose,
            })
            .collect(),
    }
}

fn postal_place(response: ZipResponse) -> Option<PostalPlace> {
    let place = response.places.into_iter().next()?;
    Some(PostalPlace {
        city: place.place_name,
        state_name: place.state,
        state_code: place.state_abbreviation,
        country: response.country_abbreviation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_client::{NpiAddress, NpiBasic, ZipPlace};

    #[test]
    fn maps_npi_record_to_registry_record() {
        let record = NpiRecord {
            enumeration_type: EnumerationType::Organization,
            basic: NpiBasic {
                organization_name: Some("ACME HEALTH".into()),
                ..Default::default()
            },
            addresses: vec![NpiAddress {
                address_1: "1 MAIN ST".into(),
                address_2: Some(String::new()),
                city: "MINNEAPOLIS".into(),
                state: "MN".into(),
                postal_code: "554011234".into(),
                country_code: "US".into(),
                address_purpose: Some("LOCATION".into()),
            }],
        };

        let mapped = registry_record("1234567890", record);
        assert_eq!(mapped.kind, ClientKind::Organization);
        assert_eq!(mapped.organization_name.as_deref(), Some("ACME HEALTH"));
        assert_eq!(mapped.addresses[0].line2, None);
        assert_eq!(mapped.preferred_address().unwrap().city, "MINNEAPOLIS");
    }

    #[test]
    fn maps_first_zip_place() {
        let response = ZipResponse {
            post_code: "55401".into(),
            country: "United States".into(),
            country_abbreviation: "US".into(),
            places: vec![ZipPlace {
                place_name: "Minneapolis".into(),
                state: "Minnesota".into(),
                state_abbreviation: "MN".into(),
            }],
        };

        let place = postal_place(response).unwrap();
        assert_eq!(place.city, "Minneapolis");
        assert_eq!(place.state_code, "MN");
        assert_eq!(place.country, "US");
    }
}
