// TestDependencies - mock implementations for testing
//
// Provides in-memory collaborators that can be injected into OnboardingKernel
// for tests. Every mock records the calls it receives.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{
    AddressCandidate, BaseClientGateway, BaseDuplicateCheck, BasePostalResolver,
    BaseRegistryLookup, GatewayError, OnboardingKernel, PersistedClient, PostalPlace,
    RegistryRecord,
};
use crate::domains::onboarding::models::ClientKind;
use crate::domains::onboarding::SubmissionPayload;

// =============================================================================
// Record builders
// =============================================================================

pub fn organization_record(number: &str, name: &str) -> RegistryRecord {
    RegistryRecord {
        number: number.to_string(),
        kind: ClientKind::Organization,
        organization_name: Some(name.to_string()),
        first_name: None,
        middle_name: None,
        last_name: None,
        addresses: Vec::new(),
    }
}

pub fn individual_record(number: &str, first: &str, last: &str) -> RegistryRecord {
    RegistryRecord {
        number: number.to_string(),
        kind: ClientKind::Individual,
        organization_name: None,
        first_name: Some(first.to_string()),
        middle_name: None,
        last_name: Some(last.to_string()),
        addresses: Vec::new(),
    }
}

pub fn location(line1: &str, city: &str, state: &str, postal_code: &str) -> AddressCandidate {
    AddressCandidate {
        line1: line1.to_string(),
        line2: None,
        city: city.to_string(),
        state_code: state.to_string(),
        postal_code: postal_code.to_string(),
        country: "US".to_string(),
        purpose: Some("LOCATION".to_string()),
    }
}

// =============================================================================
// Mock Registry Lookup
// =============================================================================

pub struct MockRegistryLookup {
    records: Mutex<HashMap<String, RegistryRecord>>,
    failures: Mutex<HashSet<String>>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockRegistryLookup {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_record(self, record: RegistryRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(record.number.clone(), record);
        self
    }

    /// Make lookups of `number` fail
    pub fn with_failure(self, number: &str) -> Self {
        self.failures.lock().unwrap().insert(number.to_string());
        self
    }

    /// Simulate a slow registry
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockRegistryLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRegistryLookup for MockRegistryLookup {
    async fn lookup(&self, registry_number: &str) -> Result<Option<RegistryRecord>> {
        self.calls.lock().unwrap().push(registry_number.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failures.lock().unwrap().contains(registry_number) {
            return Err(anyhow!("registry unavailable"));
        }

        Ok(self.records.lock().unwrap().get(registry_number).cloned())
    }
}

// =============================================================================
// Mock Postal Resolver
// =============================================================================

pub struct MockPostalResolver {
    places: Mutex<HashMap<String, PostalPlace>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockPostalResolver {
    pub fn new() -> Self {
        Self {
            places: Mutex::new(HashMap::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_place(self, prefix: &str, city: &str, state_name: &str, state_code: &str) -> Self {
        self.places.lock().unwrap().insert(
            prefix.to_string(),
            PostalPlace {
                city: city.to_string(),
                state_name: state_name.to_string(),
                state_code: state_code.to_string(),
                country: "US".to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockPostalResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePostalResolver for MockPostalResolver {
    async fn resolve(&self, postal_prefix: &str) -> Result<Option<PostalPlace>> {
        self.calls.lock().unwrap().push(postal_prefix.to_string());
        Ok(self.places.lock().unwrap().get(postal_prefix).cloned())
    }
}

// =============================================================================
// Mock Duplicate Check
// =============================================================================

pub struct MockDuplicateCheck {
    existing: Mutex<HashSet<String>>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockDuplicateCheck {
    pub fn new() -> Self {
        Self {
            existing: Mutex::new(HashSet::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_existing(self, registry_number: &str) -> Self {
        self.existing
            .lock()
            .unwrap()
            .insert(registry_number.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockDuplicateCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseDuplicateCheck for MockDuplicateCheck {
    async fn check_existing(&self, registry_numbers: &[String]) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(registry_numbers.to_vec());
        let existing = self.existing.lock().unwrap();
        Ok(registry_numbers
            .iter()
            .filter(|n| existing.contains(*n))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Mock Client Gateway
// =============================================================================

/// Captured create/update call
#[derive(Debug, Clone)]
pub struct GatewayCall {
    /// `None` for create
    pub client_id: Option<String>,
    pub payload: SubmissionPayload,
}

pub struct MockClientGateway {
    responses: Mutex<Vec<Result<PersistedClient, GatewayError>>>,
    calls: Arc<Mutex<Vec<GatewayCall>>>,
}

impl MockClientGateway {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a response; once the queue is empty every call succeeds.
    pub fn with_response(self, response: Result<PersistedClient, GatewayError>) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, client_id: Option<&str>, payload: &SubmissionPayload) -> Result<PersistedClient, GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall {
            client_id: client_id.map(str::to_string),
            payload: payload.clone(),
        });

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(PersistedClient {
                id: client_id.unwrap_or("cli_new").to_string(),
                record: serde_json::Map::new(),
            });
        }
        responses.remove(0)
    }
}

impl Default for MockClientGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseClientGateway for MockClientGateway {
    async fn create(&self, payload: &SubmissionPayload) -> Result<PersistedClient, GatewayError> {
        self.respond(None, payload)
    }

    async fn update(
        &self,
        client_id: &str,
        payload: &SubmissionPayload,
    ) -> Result<PersistedClient, GatewayError> {
        self.respond(Some(client_id), payload)
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// All mocks, kept alongside the kernel built from them so tests can inspect
/// recorded calls.
pub struct TestDependencies {
    pub registry: Arc<MockRegistryLookup>,
    pub postal: Arc<MockPostalResolver>,
    pub duplicates: Arc<MockDuplicateCheck>,
    pub clients: Arc<MockClientGateway>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(MockRegistryLookup::new()),
            postal: Arc::new(MockPostalResolver::new()),
            duplicates: Arc::new(MockDuplicateCheck::new()),
            clients: Arc::new(MockClientGateway::new()),
        }
    }

    pub fn with_registry(mut self, registry: MockRegistryLookup) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_postal(mut self, postal: MockPostalResolver) -> Self {
        self.postal = Arc::new(postal);
        self
    }

    pub fn with_duplicates(mut self, duplicates: MockDuplicateCheck) -> Self {
        self.duplicates = Arc::new(duplicates);
        self
    }

    pub fn with_clients(mut self, clients: MockClientGateway) -> Self {
        self.clients = Arc::new(clients);
        self
    }

    pub fn kernel(&self) -> OnboardingKernel {
        OnboardingKernel::new(
            self.registry.clone(),
            self.postal.clone(),
            self.duplicates.clone(),
            self.clients.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
