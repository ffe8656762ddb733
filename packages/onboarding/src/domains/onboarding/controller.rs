//! Wizard controller: owns the entity graph for the life of one onboarding
//! session and routes every edit, lookup result and submission through it.

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::effects::{
    fill_postal, fill_provider, fill_subject, Autofill, DebounceSettings, LookupError, LookupKey,
    LookupOrchestrator, LookupOutcome, LookupResult, LookupSlot,
};
use super::graph::{EntityGraph, GraphError, VariantSwitch};
use super::machines::{WizardCommand, WizardEvent, WizardMachine, WizardState, WizardStep};
use super::models::{
    Address, AddressPatch, ClientField, ClientKind, ExistingClient, Provider, ProviderPatch,
};
use super::submission::{assemble, registry_numbers_to_check};
use super::validation::{validate, validate_all, ErrorScope, FieldErrors};
use crate::common::TempId;
use crate::kernel::{GatewayError, OnboardingKernel, PersistedClient, RemoteFieldError};

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("wizard is closed")]
    Closed,

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result of pressing next/submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStatus {
    /// Field errors on the current step, duplicate registry numbers, or an
    /// assembly failure; see `errors()`
    Blocked,
    AdvancedToProviders,
    Submitted(PersistedClient),
    /// Backend refused or could not be reached; see `notice()`
    Rejected,
}

/// What applying one lookup result did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupApplied {
    Autofilled(LookupKey),
    NotFound(LookupKey),
    KindMismatch {
        key: LookupKey,
        expected: ClientKind,
        found: ClientKind,
    },
    Failed {
        key: LookupKey,
        message: String,
    },
    /// Slot removed or wizard closed before the result arrived
    Discarded(LookupKey),
}

pub struct WizardController {
    kernel: OnboardingKernel,
    graph: EntityGraph,
    machine: WizardMachine,
    lookups: LookupOrchestrator,
    outcomes: mpsc::UnboundedReceiver<LookupOutcome>,
    errors: FieldErrors,
    lookup_errors: BTreeMap<LookupKey, String>,
    notice: Option<String>,
}

impl WizardController {
    /// Start a new session for a client of `kind`.
    pub fn open_new(kernel: OnboardingKernel, kind: ClientKind, settings: DebounceSettings) -> Self {
        Self::from_draft(kernel, EntityGraph::new(kind), settings)
    }

    /// Start an edit session for a persisted client.
    pub fn open_existing(
        kernel: OnboardingKernel,
        existing: ExistingClient,
        settings: DebounceSettings,
    ) -> Self {
        Self::from_draft(kernel, EntityGraph::hydrate(existing), settings)
    }

    /// Resume from a graph built elsewhere (a saved draft).
    pub fn from_draft(kernel: OnboardingKernel, graph: EntityGraph, settings: DebounceSettings) -> Self {
        let (lookups, outcomes) =
            LookupOrchestrator::new(kernel.registry.clone(), kernel.postal.clone(), settings);
        let lookups = match graph.origin() {
            Some(origin) => lookups.with_baseline(origin.registry_number.clone()),
            None => lookups,
        };

        debug!(kind = %graph.kind(), edit = graph.is_edit(), "wizard opened");
        Self {
            kernel,
            graph,
            machine: WizardMachine::new(),
            lookups,
            outcomes,
            errors: FieldErrors::new(),
            lookup_errors: BTreeMap::new(),
            notice: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    pub fn state(&self) -> WizardState {
        self.machine.state()
    }

    pub fn step(&self) -> Option<WizardStep> {
        self.machine.step()
    }

    /// Errors from the last submit attempt.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn lookup_errors(&self) -> &BTreeMap<LookupKey, String> {
        &self.lookup_errors
    }

    pub fn lookup_error(&self, key: &LookupKey) -> Option<&str> {
        self.lookup_errors.get(key).map(String::as_str)
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn lookups(&self) -> &LookupOrchestrator {
        &self.lookups
    }

    // =========================================================================
    // Edits
    // =========================================================================

    pub fn set_client_variant(&mut self, kind: ClientKind) -> Result<(), WizardError> {
        self.ensure_open()?;
        let Some(VariantSwitch {
            removed_addresses,
            removed_providers,
        }) = self.graph.set_client_variant(kind)
        else {
            return Ok(());
        };

        for key in removed_providers {
            self.forget_slot(LookupSlot::Provider(key));
        }
        for temp_id in removed_addresses {
            self.forget_slot(LookupSlot::Address(temp_id));
        }

        // Same number, different kind: query it again
        let subject = LookupKey::subject_registry();
        self.lookup_errors.remove(&subject);
        self.lookups.reset(&subject);
        self.lookups
            .on_field_change(subject, self.graph.client().registry_number());
        self.leave_providers_if_withdrawn();
        Ok(())
    }

    pub fn update_client_field(
        &mut self,
        field: ClientField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.ensure_open()?;
        let changed = self.graph.update_client_field(field, value)?;
        if changed {
            let subject = LookupKey::subject_registry();
            self.lookup_errors.remove(&subject);
            self.lookups
                .on_field_change(subject, self.graph.client().registry_number());
        }
        Ok(())
    }

    pub fn set_has_providers(&mut self, has_providers: bool) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.graph.set_has_providers(has_providers)?;
        self.leave_providers_if_withdrawn();
        Ok(())
    }

    pub fn add_address(&mut self) -> Result<TempId, WizardError> {
        self.ensure_open()?;
        Ok(self.graph.add_address()?)
    }

    /// Providers linked to the removed address keep their dangling
    /// reference until the user relinks them.
    pub fn remove_address(&mut self, temp_id: &TempId) -> Result<Option<Address>, WizardError> {
        self.ensure_open()?;
        let removed = self.graph.remove_address(temp_id);
        if removed.is_some() {
            self.forget_slot(LookupSlot::Address(temp_id.clone()));
        }
        Ok(removed)
    }

    pub fn update_address(
        &mut self,
        temp_id: &TempId,
        patch: AddressPatch,
    ) -> Result<(), WizardError> {
        self.ensure_open()?;
        if self.graph.update_address(temp_id, patch)? {
            let key = LookupKey::address_postal(temp_id.clone());
            self.lookup_errors.remove(&key);
            if let Some(address) = self.graph.address(temp_id) {
                self.lookups.on_field_change(key, &address.postal_code);
            }
        }
        Ok(())
    }

    pub fn add_provider(&mut self) -> Result<usize, WizardError> {
        self.ensure_open()?;
        Ok(self.graph.add_provider()?)
    }

    pub fn remove_provider(&mut self, index: usize) -> Result<Option<Provider>, WizardError> {
        self.ensure_open()?;
        let removed = self.graph.remove_provider(index);
        if let Some(provider) = &removed {
            self.forget_slot(LookupSlot::Provider(provider.key.clone()));
        }
        Ok(removed)
    }

    pub fn update_provider(&mut self, index: usize, patch: ProviderPatch) -> Result<(), WizardError> {
        self.ensure_open()?;
        if self.graph.update_provider(index, patch)? {
            if let Some(provider) = self.graph.provider(index) {
                let key = LookupKey::provider_registry(provider.key.clone());
                self.lookup_errors.remove(&key);
                self.lookups.on_field_change(key, &provider.registry_number);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Wait for the next lookup result and apply it. Returns `None` once no
    /// lookup is pending or running.
    pub async fn next_lookup(&mut self) -> Option<LookupApplied> {
        let outcome = match self.outcomes.try_recv() {
            Ok(outcome) => outcome,
            Err(_) if self.lookups.is_idle() => return None,
            Err(_) => self.outcomes.recv().await?,
        };
        Some(self.apply_lookup(outcome))
    }

    /// Apply lookup results until every slot is idle.
    pub async fn settle_lookups(&mut self) -> Vec<LookupApplied> {
        let mut applied = Vec::new();
        while let Some(result) = self.next_lookup().await {
            applied.push(result);
        }
        applied
    }

    /// Apply results that have already arrived without waiting for more.
    pub fn apply_pending_lookups(&mut self) -> Vec<LookupApplied> {
        let mut applied = Vec::new();
        while let Ok(outcome) = self.outcomes.try_recv() {
            applied.push(self.apply_lookup(outcome));
        }
        applied
    }

    fn apply_lookup(&mut self, outcome: LookupOutcome) -> LookupApplied {
        let LookupOutcome { key, value, result } = outcome;
        if self.machine.state().is_terminal() {
            return LookupApplied::Discarded(key);
        }

        let filled = match result {
            Err(LookupError::Failed(message)) => {
                self.lookup_errors.insert(key.clone(), message.clone());
                return LookupApplied::Failed { key, message };
            }
            Ok(LookupResult::Registry(None)) => {
                self.lookup_errors
                    .insert(key.clone(), format!("No registry record for {}", value));
                return LookupApplied::NotFound(key);
            }
            Ok(LookupResult::Postal(None)) => {
                self.lookup_errors
                    .insert(key.clone(), format!("Unknown postal code {}", value));
                return LookupApplied::NotFound(key);
            }
            Ok(LookupResult::Registry(Some(record))) => match &key.slot {
                LookupSlot::Subject => fill_subject(&mut self.graph, &record),
                LookupSlot::Provider(provider_key) => {
                    fill_provider(&mut self.graph, provider_key, &record)
                }
                LookupSlot::Address(_) => Ok(Autofill::SlotGone),
            },
            Ok(LookupResult::Postal(Some(place))) => match &key.slot {
                LookupSlot::Address(temp_id) => fill_postal(&mut self.graph, temp_id, &place),
                _ => Ok(Autofill::SlotGone),
            },
        };

        match filled {
            Ok(Autofill::Filled) => {
                debug!(slot = %key, value = %value, "autofilled from lookup");
                self.lookup_errors.remove(&key);
                LookupApplied::Autofilled(key)
            }
            Ok(Autofill::KindMismatch { expected, found }) => {
                warn!(slot = %key, %expected, %found, "registry record kind mismatch");
                self.lookup_errors.insert(
                    key.clone(),
                    format!(
                        "Registry number {} belongs to an {} record, expected {}",
                        value, found, expected
                    ),
                );
                LookupApplied::KindMismatch {
                    key,
                    expected,
                    found,
                }
            }
            Ok(Autofill::SlotGone) => LookupApplied::Discarded(key),
            Err(e) => {
                let message = e.to_string();
                self.lookup_errors.insert(key.clone(), message.clone());
                LookupApplied::Failed { key, message }
            }
        }
    }

    fn forget_slot(&mut self, slot: LookupSlot) {
        self.lookups.forget(&slot);
        self.lookup_errors.retain(|key, _| key.slot != slot);
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Next on Step1, submit on the last step.
    pub async fn submit(&mut self) -> Result<SubmitStatus, WizardError> {
        let step = self.machine.step().ok_or(WizardError::Closed)?;
        let errors = match step {
            WizardStep::Step1 => validate(WizardStep::Step1, &self.graph),
            WizardStep::Step2 => validate_all(&self.graph),
        };
        let event = WizardEvent::SubmitRequested {
            step_valid: errors.is_empty(),
            declares_providers: self.graph.has_providers(),
        };
        self.errors = errors;
        self.notice = None;

        match self.machine.decide(&event) {
            Some(WizardCommand::EnterProviders) => {
                info!(providers = self.graph.providers().len(), "entering providers step");
                self.enter_providers();
                Ok(SubmitStatus::AdvancedToProviders)
            }
            Some(WizardCommand::Submit) => self.send().await,
            _ => {
                debug!(errors = self.errors.len(), ?step, "step blocked");
                Ok(SubmitStatus::Blocked)
            }
        }
    }

    /// Step2 back to Step1. Returns false when already on Step1.
    pub fn back(&mut self) -> Result<bool, WizardError> {
        self.ensure_open()?;
        let moved = self.machine.decide(&WizardEvent::BackRequested)
            == Some(WizardCommand::ReturnToClient);
        if moved {
            self.errors = FieldErrors::new();
        }
        Ok(moved)
    }

    /// Discard the session. Pending lookups are cancelled and results already
    /// queued are dropped.
    pub fn cancel(&mut self) {
        if self.machine.decide(&WizardEvent::CancelRequested).is_some() {
            info!(kind = %self.graph.kind(), "wizard discarded");
        }
        self.close_lookups();
    }

    /// Step2 only exists for organizations that declare providers.
    fn leave_providers_if_withdrawn(&mut self) {
        if self.graph.has_providers() {
            return;
        }
        if self.machine.decide(&WizardEvent::ProvidersWithdrawn)
            == Some(WizardCommand::ReturnToClient)
        {
            debug!(kind = %self.graph.kind(), "providers withdrawn, back to client step");
            self.errors = FieldErrors::new();
        }
    }

    fn enter_providers(&mut self) {
        // An empty list in an edit session has nothing to lose
        let eligible = !self.graph.is_edit() || self.graph.providers().is_empty();
        if eligible && self.graph.seed_providers() {
            debug!("seeded blank provider");
        }
    }

    async fn send(&mut self) -> Result<SubmitStatus, WizardError> {
        let candidates = registry_numbers_to_check(&self.graph);
        if !candidates.is_empty() {
            let numbers: Vec<String> = candidates.iter().map(|(_, n)| n.clone()).collect();
            match self.kernel.duplicates.check_existing(&numbers).await {
                Ok(existing) => {
                    let mut duplicates = FieldErrors::new();
                    for (scope, number) in &candidates {
                        if existing.contains(number) {
                            duplicates.push(
                                *scope,
                                "registry_number",
                                format!("Registry number {} is already registered", number),
                            );
                        }
                    }
                    if !duplicates.is_empty() {
                        warn!(duplicates = duplicates.len(), "duplicate registry numbers");
                        self.errors = duplicates;
                        self.machine.decide(&WizardEvent::SubmissionRejected);
                        return Ok(SubmitStatus::Blocked);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "duplicate check failed");
                    self.notice = Some("Could not verify registry numbers, please retry".to_string());
                    self.machine.decide(&WizardEvent::SubmissionRejected);
                    return Ok(SubmitStatus::Rejected);
                }
            }
        }

        let payload = match assemble(&self.graph) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "submission assembly failed");
                self.errors = e.to_field_errors();
                self.machine.decide(&WizardEvent::SubmissionRejected);
                return Ok(SubmitStatus::Blocked);
            }
        };

        let result = match &payload.id {
            Some(client_id) => self.kernel.clients.update(client_id, &payload).await,
            None => self.kernel.clients.create(&payload).await,
        };

        match result {
            Ok(persisted) => {
                info!(client_id = %persisted.id, kind = %self.graph.kind(), "client submitted");
                self.machine.decide(&WizardEvent::SubmissionAccepted);
                self.close_lookups();
                Ok(SubmitStatus::Submitted(persisted))
            }
            Err(GatewayError::Rejected {
                message,
                field_errors,
            }) => {
                warn!(message = %message, field_errors = field_errors.len(), "submission rejected");
                self.errors.merge(remote_field_errors(&field_errors));
                self.notice = Some(message);
                self.machine.decide(&WizardEvent::SubmissionRejected);
                Ok(SubmitStatus::Rejected)
            }
            Err(GatewayError::Transport(message)) => {
                warn!(error = %message, "submission failed");
                self.notice = Some(format!("Could not reach the onboarding service: {}", message));
                self.machine.decide(&WizardEvent::SubmissionRejected);
                Ok(SubmitStatus::Rejected)
            }
        }
    }

    fn close_lookups(&mut self) {
        self.lookups.cancel_all();
        while self.outcomes.try_recv().is_ok() {}
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.machine.state().is_terminal() {
            return Err(WizardError::Closed);
        }
        Ok(())
    }
}

fn remote_field_errors(remote: &[RemoteFieldError]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for error in remote {
        let scope = match (error.entity.as_str(), error.index) {
            ("client", _) => ErrorScope::Client,
            ("address", Some(index)) => ErrorScope::Address(index),
            ("provider", Some(index)) => ErrorScope::Provider(index),
            _ => ErrorScope::Form,
        };
        errors.push(scope, &error.field, error.message.clone());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::TestDependencies;

    fn individual(deps: &TestDependencies) -> WizardController {
        let mut wizard =
            WizardController::open_new(deps.kernel(), ClientKind::Individual, DebounceSettings::default());
        wizard
            .update_client_field(ClientField::FirstName, "Ada")
            .unwrap();
        wizard
            .update_client_field(ClientField::LastName, "Lovelace")
            .unwrap();
        wizard
            .update_client_field(ClientField::RegistryNumber, "1234567890")
            .unwrap();
        let primary = wizard.graph().primary_address().temp_id.clone();
        wizard
            .update_address(
                &primary,
                AddressPatch {
                    city: Some("Minneapolis".into()),
                    postal_code: Some("554011234".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        wizard
    }

    #[test]
    fn remote_errors_map_to_scopes() {
        let errors = remote_field_errors(&[
            RemoteFieldError {
                entity: "provider".into(),
                index: Some(1),
                field: "registry_number".into(),
                message: "taken".into(),
            },
            RemoteFieldError {
                entity: "unknown".into(),
                index: None,
                field: "base".into(),
                message: "nope".into(),
            },
        ]);
        assert!(errors.has(ErrorScope::Provider(1), "registry_number"));
        assert!(errors.has(ErrorScope::Form, "base"));
    }

    #[tokio::test(start_paused = true)]
    async fn submitted_wizard_rejects_further_edits() {
        let deps = TestDependencies::new();
        let mut wizard = individual(&deps);

        let status = wizard.submit().await.unwrap();
        assert!(matches!(status, SubmitStatus::Submitted(_)));
        assert_eq!(wizard.state(), WizardState::Submitted);
        assert!(matches!(
            wizard.update_client_field(ClientField::Description, "late"),
            Err(WizardError::Closed)
        ));
        assert!(matches!(wizard.submit().await, Err(WizardError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_keeps_session_open() {
        let deps = TestDependencies::new().with_clients(
            crate::kernel::test_dependencies::MockClientGateway::new()
                .with_response(Err(GatewayError::Transport("timeout".into()))),
        );
        let mut wizard = individual(&deps);

        assert_eq!(wizard.submit().await.unwrap(), SubmitStatus::Rejected);
        assert_eq!(wizard.step(), Some(WizardStep::Step1));
        assert!(wizard.notice().unwrap().contains("timeout"));

        assert!(matches!(
            wizard.submit().await.unwrap(),
            SubmitStatus::Submitted(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn back_is_a_no_op_on_step_one() {
        let deps = TestDependencies::new();
        let mut wizard = individual(&deps);
        assert!(!wizard.back().unwrap());
        assert_eq!(wizard.step(), Some(WizardStep::Step1));
    }
}
