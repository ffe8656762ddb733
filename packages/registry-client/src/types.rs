use serde::{Deserialize, Serialize};

/// NPPES enumeration type of a registry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumerationType {
    /// `NPI-1`: an individual provider.
    #[serde(rename = "NPI-1")]
    Individual,
    /// `NPI-2`: an organization.
    #[serde(rename = "NPI-2")]
    Organization,
}

/// Top-level response of `GET /api/?version=2.1&number=...`.
#[derive(Debug, Clone, Deserialize)]
pub struct NpiSearchResponse {
    #[serde(default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<NpiRecord>,
    #[serde(rename = "Errors", default)]
    pub errors: Vec<NpiApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NpiApiError {
    pub description: String,
    pub field: Option<String>,
}

/// A single registry record.
#[derive(Debug, Clone, Deserialize)]
pub struct NpiRecord {
    pub enumeration_type: EnumerationType,
    #[serde(default)]
    pub basic: NpiBasic,
    #[serde(default)]
    pub addresses: Vec<NpiAddress>,
}

/// Name block. Organizations fill `organization_name`, individuals the
/// person name fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NpiBasic {
    pub organization_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NpiAddress {
    #[serde(default)]
    pub address_1: String,
    pub address_2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country_code: String,
    /// `LOCATION` or `MAILING`
    pub address_purpose: Option<String>,
}

/// Response of `GET /us/{zip}` on the postal resolver.
#[derive(Debug, Clone, Deserialize)]
pub struct ZipResponse {
    #[serde(rename = "post code")]
    pub post_code: String,
    pub country: String,
    #[serde(rename = "country abbreviation")]
    pub country_abbreviation: String,
    #[serde(default)]
    pub places: Vec<ZipPlace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZipPlace {
    #[serde(rename = "place name")]
    pub place_name: String,
    pub state: String,
    #[serde(rename = "state abbreviation")]
    pub state_abbreviation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_organization_record() {
        let body = r#"{
            "result_count": 1,
            "results": [{
                "number": 1234567890,
                "enumeration_type": "NPI-2",
                "basic": { "organization_name": "ACME HEALTH" },
                "addresses": [{
                    "address_1": "1 MAIN ST",
                    "city": "MINNEAPOLIS",
                    "state": "MN",
                    "postal_code": "554011234",
                    "country_code": "US",
                    "address_purpose": "LOCATION"
                }]
            }]
        }"#;

        let parsed: NpiSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.result_count, 1);
        let record = &parsed.results[0];
        assert_eq!(record.enumeration_type, EnumerationType::Organization);
        assert_eq!(record.basic.organization_name.as_deref(), Some("ACME HEALTH"));
        assert_eq!(record.addresses[0].postal_code, "554011234");
    }

    #[test]
    fn parses_registry_error_list() {
        let body = r#"{"Errors": [{"description": "Invalid NPI number", "field": "number"}]}"#;

        let parsed: NpiSearchResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.results.is_empty());
        assert_eq!(parsed.errors[0].description, "Invalid NPI number");
    }

    #[test]
    fn parses_zip_response() {
        let body = r#"{
            "post code": "55401",
            "country": "United States",
            "country abbreviation": "US",
            "places": [{
                "place name": "Minneapolis",
                "longitude": "-93.2683",
                "state": "Minnesota",
                "state abbreviation": "MN",
                "latitude": "44.9848"
            }]
        }"#;

        let parsed: ZipResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.places[0].place_name, "Minneapolis");
        assert_eq!(parsed.places[0].state_abbreviation, "MN");
    }
}
