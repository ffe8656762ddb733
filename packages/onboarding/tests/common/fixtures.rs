//! Fixtures for filling wizard sessions and building persisted clients.

use onboarding_core::domains::onboarding::{
    AddressPatch, Client, ClientField, ExistingAddress, ExistingClient, ExistingProvider,
    IndividualProfile, OrganizationProfile, ProviderPatch, WizardController,
};

pub fn located(city: &str, postal_code: &str) -> AddressPatch {
    AddressPatch {
        line1: Some("1 Main St".to_string()),
        city: Some(city.to_string()),
        state_code: Some("MN".to_string()),
        postal_code: Some(postal_code.to_string()),
        ..Default::default()
    }
}

pub fn named_provider(first: &str, last: &str, registry_number: &str) -> ProviderPatch {
    ProviderPatch {
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        registry_number: Some(registry_number.to_string()),
        ..Default::default()
    }
}

/// Individual with a valid client step.
pub fn fill_individual(wizard: &mut WizardController) {
    wizard
        .update_client_field(ClientField::FirstName, "Ada")
        .unwrap();
    wizard
        .update_client_field(ClientField::LastName, "Lovelace")
        .unwrap();
    wizard
        .update_client_field(ClientField::RegistryNumber, "1111111111")
        .unwrap();
    let primary = wizard.graph().primary_address().temp_id.clone();
    wizard
        .update_address(&primary, located("Minneapolis", "554011234"))
        .unwrap();
}

/// Organization with a valid client step that declares providers.
pub fn fill_organization(wizard: &mut WizardController) {
    wizard
        .update_client_field(ClientField::BusinessName, "Acme Health")
        .unwrap();
    wizard
        .update_client_field(ClientField::RegistryNumber, "1234567890")
        .unwrap();
    wizard.set_has_providers(true).unwrap();
    let primary = wizard.graph().primary_address().temp_id.clone();
    wizard
        .update_address(&primary, located("Minneapolis", "554011234"))
        .unwrap();
}

fn existing_address(id: &str, city: &str, postal_code: &str) -> ExistingAddress {
    ExistingAddress {
        id: id.to_string(),
        line1: "1 Main St".to_string(),
        line2: None,
        city: city.to_string(),
        state_code: "MN".to_string(),
        state_name: Some("Minnesota".to_string()),
        postal_code: postal_code.to_string(),
        country: "US".to_string(),
    }
}

/// Persisted organization with a secondary address and two providers.
pub fn existing_organization() -> ExistingClient {
    ExistingClient {
        id: "cli_100".to_string(),
        client: Client::Organization(OrganizationProfile {
            business_name: "Acme Health".to_string(),
            registry_number: "1234567890".to_string(),
            description: String::new(),
            has_providers: true,
        }),
        primary_address: existing_address("addr_1", "Minneapolis", "55401-1234"),
        addresses: vec![existing_address("addr_2", "St Paul", "55101-0001")],
        providers: vec![
            ExistingProvider {
                id: "prov_1".to_string(),
                first_name: "Grace".to_string(),
                middle_name: None,
                last_name: "Hopper".to_string(),
                registry_number: "2222222222".to_string(),
                address_id: "addr_1".to_string(),
                location_id: Some("loc_1".to_string()),
            },
            ExistingProvider {
                id: "prov_2".to_string(),
                first_name: "Alan".to_string(),
                middle_name: Some("M".to_string()),
                last_name: "Turing".to_string(),
                registry_number: "3333333333".to_string(),
                address_id: "addr_2".to_string(),
                location_id: Some("loc_2".to_string()),
            },
        ],
    }
}

/// Persisted individual with only a primary address.
pub fn existing_individual() -> ExistingClient {
    ExistingClient {
        id: "cli_200".to_string(),
        client: Client::Individual(IndividualProfile {
            first_name: "Ada".to_string(),
            middle_name: String::new(),
            last_name: "Lovelace".to_string(),
            registry_number: "1111111111".to_string(),
            description: String::new(),
        }),
        primary_address: existing_address("addr_9", "Duluth", "55802-0000"),
        addresses: Vec::new(),
        providers: Vec::new(),
    }
}
