use serde::{Deserialize, Serialize};

/// Which kind of client the wizard is building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    Organization,
    Individual,
}

impl std::fmt::Display for ClientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientKind::Organization => write!(f, "organization"),
            ClientKind::Individual => write!(f, "individual"),
        }
    }
}

impl std::str::FromStr for ClientKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "organization" => Ok(ClientKind::Organization),
            "individual" => Ok(ClientKind::Individual),
            _ => Err(anyhow::anyhow!("Invalid client kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub business_name: String,
    pub registry_number: String,
    #[serde(default)]
    pub description: String,
    /// Organization declares it employs service providers (unlocks Step 2)
    #[serde(default)]
    pub has_providers: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualProfile {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub last_name: String,
    pub registry_number: String,
    #[serde(default)]
    pub description: String,
}

/// The wizard's subject. Fields of one kind do not exist on the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Client {
    Organization(OrganizationProfile),
    Individual(IndividualProfile),
}

/// Editable client fields. Name fields are only legal for their own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientField {
    BusinessName,
    FirstName,
    MiddleName,
    LastName,
    RegistryNumber,
    Description,
}

impl ClientField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientField::BusinessName => "business_name",
            ClientField::FirstName => "first_name",
            ClientField::MiddleName => "middle_name",
            ClientField::LastName => "last_name",
            ClientField::RegistryNumber => "registry_number",
            ClientField::Description => "description",
        }
    }
}

impl Client {
    pub fn empty(kind: ClientKind) -> Self {
        match kind {
            ClientKind::Organization => Client::Organization(OrganizationProfile::default()),
            ClientKind::Individual => Client::Individual(IndividualProfile::default()),
        }
    }

    pub fn kind(&self) -> ClientKind {
        match self {
            Client::Organization(_) => ClientKind::Organization,
            Client::Individual(_) => ClientKind::Individual,
        }
    }

    pub fn registry_number(&self) -> &str {
        match self {
            Client::Organization(org) => &org.registry_number,
            Client::Individual(person) => &person.registry_number,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Client::Organization(org) => &org.description,
            Client::Individual(person) => &person.description,
        }
    }

    /// Only organizations can declare providers.
    pub fn has_providers(&self) -> bool {
        matches!(self, Client::Organization(org) if org.has_providers)
    }

    /// Human-readable name used in logs.
    pub fn display_name(&self) -> String {
        match self {
            Client::Organization(org) => org.business_name.clone(),
            Client::Individual(person) => [
                person.first_name.as_str(),
                person.middle_name.as_str(),
                person.last_name.as_str(),
            ]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" "),
        }
    }

    /// Mutable handle on a field, or `None` if the field does not exist for
    /// this kind.
    pub(crate) fn field_mut(&mut self, field: ClientField) -> Option<&mut String> {
        match (self, field) {
            (Client::Organization(org), ClientField::BusinessName) => Some(&mut org.business_name),
            (Client::Organization(org), ClientField::RegistryNumber) => {
                Some(&mut org.registry_number)
            }
            (Client::Organization(org), ClientField::Description) => Some(&mut org.description),
            (Client::Individual(person), ClientField::FirstName) => Some(&mut person.first_name),
            (Client::Individual(person), ClientField::MiddleName) => Some(&mut person.middle_name),
            (Client::Individual(person), ClientField::LastName) => Some(&mut person.last_name),
            (Client::Individual(person), ClientField::RegistryNumber) => {
                Some(&mut person.registry_number)
            }
            (Client::Individual(person), ClientField::Description) => {
                Some(&mut person.description)
            }
            _ => None,
        }
    }

    /// Switch kinds, keeping the fields both kinds share.
    pub(crate) fn switched_to(&self, kind: ClientKind) -> Self {
        let registry_number = self.registry_number().to_string();
        let description = self.description().to_string();
        match kind {
            ClientKind::Organization => Client::Organization(OrganizationProfile {
                registry_number,
                description,
                ..Default::default()
            }),
            ClientKind::Individual => Client::Individual(IndividualProfile {
                registry_number,
                description,
                ..Default::default()
            }),
        }
    }
}
