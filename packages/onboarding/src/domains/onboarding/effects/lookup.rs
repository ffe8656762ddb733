//! Debounced, per-slot registry and postal lookups.
//!
//! Every lookup target (the subject's registry number, each provider's
//! registry number, each address's postal code) is a slot with its own
//! timer, its own fetch gate and its own record of the last value queried.
//!
//! - A new edit cancels the slot's pending timer and starts a fresh one.
//! - A slot is never queried twice in a row for the same value, so an
//!   autofill that rewrites the triggering field cannot start a refetch loop.
//! - At most one fetch per slot is in flight; a timer that fires during a
//!   fetch waits for it instead of racing it.
//! - Once a fetch has started it runs to completion and its result is
//!   delivered even if the field was edited meanwhile (last resolved wins).
//!
//! Results are not applied here. They are sent on a channel to the wizard
//! controller, which owns the graph.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::common::{is_valid_registry_number, postal_prefix, TempId};
use crate::kernel::{BasePostalResolver, BaseRegistryLookup, PostalPlace, RegistryRecord};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupSlot {
    Subject,
    /// Keyed by the provider's stable key, not its list position
    Provider(TempId),
    Address(TempId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupField {
    RegistryNumber,
    PostalCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupKey {
    pub slot: LookupSlot,
    pub field: LookupField,
}

impl LookupKey {
    pub fn subject_registry() -> Self {
        Self {
            slot: LookupSlot::Subject,
            field: LookupField::RegistryNumber,
        }
    }

    pub fn provider_registry(key: TempId) -> Self {
        Self {
            slot: LookupSlot::Provider(key),
            field: LookupField::RegistryNumber,
        }
    }

    pub fn address_postal(temp_id: TempId) -> Self {
        Self {
            slot: LookupSlot::Address(temp_id),
            field: LookupField::PostalCode,
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            LookupField::RegistryNumber => "registry_number",
            LookupField::PostalCode => "postal_code",
        };
        match &self.slot {
            LookupSlot::Subject => write!(f, "subject.{}", field),
            LookupSlot::Provider(key) => write!(f, "provider[{}].{}", key, field),
            LookupSlot::Address(temp_id) => write!(f, "address[{}].{}", temp_id, field),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    Registry(Option<RegistryRecord>),
    Postal(Option<PostalPlace>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Lookup failed: {0}")]
    Failed(String),
}

/// A finished fetch, waiting to be applied by the controller.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub key: LookupKey,
    /// Value that was queried (postal lookups query the 5-digit prefix)
    pub value: String,
    pub result: Result<LookupResult, LookupError>,
}

/// What `on_field_change` did with an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Debounce {
    /// Timer (re)started
    Scheduled,
    /// Value already queried, or unchanged since the wizard opened
    Unchanged,
    /// Not a complete registry number / postal prefix yet
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceSettings {
    pub registry: Duration,
    pub postal: Duration,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            registry: Duration::from_millis(400),
            postal: Duration::from_millis(500),
        }
    }
}

#[derive(Default)]
struct SlotState {
    last_queried: Option<String>,
    in_flight: bool,
    /// Bumped on every schedule; a timer only fires if it still holds the
    /// latest ticket
    ticket: u64,
    pending: Option<JoinHandle<()>>,
    gate: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Default)]
struct Shared {
    slots: Mutex<HashMap<LookupKey, SlotState>>,
    /// Bumped by `cancel_all`; fetches started under an older generation
    /// drop their result
    generation: AtomicU64,
}

impl Shared {
    fn slots(&self) -> MutexGuard<'_, HashMap<LookupKey, SlotState>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct LookupOrchestrator {
    registry: Arc<dyn BaseRegistryLookup>,
    postal: Arc<dyn BasePostalResolver>,
    settings: DebounceSettings,
    /// Subject registry number when the wizard was opened for editing
    baseline: Option<String>,
    shared: Arc<Shared>,
    outcomes: mpsc::UnboundedSender<LookupOutcome>,
}

impl LookupOrchestrator {
    /// Returns the orchestrator and the receiving end of its result channel.
    pub fn new(
        registry: Arc<dyn BaseRegistryLookup>,
        postal: Arc<dyn BasePostalResolver>,
        settings: DebounceSettings,
    ) -> (Self, mpsc::UnboundedReceiver<LookupOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            registry,
            postal,
            settings,
            baseline: None,
            shared: Arc::new(Shared::default()),
            outcomes: tx,
        };
        (orchestrator, rx)
    }

    /// Suppress subject lookups of the registry number the record was
    /// loaded with.
    pub fn with_baseline(mut self, registry_number: impl Into<String>) -> Self {
        self.baseline = Some(registry_number.into());
        self
    }

    /// Feed an edit of a lookup-trigger field.
    pub fn on_field_change(&self, key: LookupKey, value: &str) -> Debounce {
        let (query, delay) = match key.field {
            LookupField::RegistryNumber => {
                if !is_valid_registry_number(value) {
                    self.cancel_pending(&key);
                    return Debounce::Incomplete;
                }
                if key.slot == LookupSlot::Subject && self.baseline.as_deref() == Some(value) {
                    self.cancel_pending(&key);
                    return Debounce::Unchanged;
                }
                (value.to_string(), self.settings.registry)
            }
            LookupField::PostalCode => match postal_prefix(value) {
                Some(prefix) => (prefix, self.settings.postal),
                None => {
                    self.cancel_pending(&key);
                    return Debounce::Incomplete;
                }
            },
        };

        let mut slots = self.shared.slots();
        let state = slots.entry(key.clone()).or_default();
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        if state.last_queried.as_deref() == Some(query.as_str()) {
            return Debounce::Unchanged;
        }

        state.ticket += 1;
        debug!(slot = %key, value = %query, delay_ms = delay.as_millis() as u64, "lookup scheduled");
        state.pending = Some(self.spawn_fetch(key, query, state.ticket, state.gate.clone(), delay));
        Debounce::Scheduled
    }

    fn spawn_fetch(
        &self,
        key: LookupKey,
        query: String,
        ticket: u64,
        gate: Arc<tokio::sync::Mutex<()>>,
        delay: Duration,
    ) -> JoinHandle<()> {
        let shared = self.shared.clone();
        let registry = self.registry.clone();
        let postal = self.postal.clone();
        let outcomes = self.outcomes.clone();
        let generation = shared.generation.load(Ordering::SeqCst);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Queue behind a fetch already in flight for this slot
            let _permit = gate.lock().await;
            {
                let mut slots = shared.slots();
                let Some(state) = slots.get_mut(&key) else {
                    return;
                };
                if state.ticket != ticket {
                    return;
                }
                state.pending = None;
                if state.last_queried.as_deref() == Some(query.as_str()) {
                    return;
                }
                state.last_queried = Some(query.clone());
                state.in_flight = true;
            }

            debug!(slot = %key, value = %query, "lookup firing");
            let result = match key.field {
                LookupField::RegistryNumber => {
                    registry.lookup(&query).await.map(LookupResult::Registry)
                }
                LookupField::PostalCode => postal.resolve(&query).await.map(LookupResult::Postal),
            }
            .map_err(|e| {
                warn!(slot = %key, value = %query, error = %e, "lookup failed");
                LookupError::Failed(e.to_string())
            });

            // Clear the flag and deliver under one lock so `is_idle` never
            // observes a finished fetch whose result is not yet queued
            let mut slots = shared.slots();
            if let Some(state) = slots.get_mut(&key) {
                state.in_flight = false;
                // A failed value may be retried after the next edit
                if result.is_err() {
                    state.last_queried = None;
                }
            }

            if shared.generation.load(Ordering::SeqCst) != generation {
                debug!(slot = %key, "dropping lookup result from closed session");
                return;
            }
            let _ = outcomes.send(LookupOutcome {
                key,
                value: query,
                result,
            });
            drop(slots);
        })
    }

    fn cancel_pending(&self, key: &LookupKey) {
        if let Some(state) = self.shared.slots().get_mut(key) {
            if let Some(pending) = state.pending.take() {
                pending.abort();
            }
        }
    }

    /// Forget the value last queried for `key` so the next edit queries again.
    pub fn reset(&self, key: &LookupKey) {
        if let Some(state) = self.shared.slots().get_mut(key) {
            state.last_queried = None;
        }
    }

    /// Drop every lookup of a slot (provider or address removed).
    pub fn forget(&self, slot: &LookupSlot) {
        self.shared.slots().retain(|key, state| {
            if &key.slot != slot {
                return true;
            }
            if let Some(pending) = state.pending.take() {
                pending.abort();
            }
            false
        });
    }

    /// Cancel every pending timer and drop results of fetches still in
    /// flight. Called when the wizard closes.
    pub fn cancel_all(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        let mut slots = self.shared.slots();
        for (_, state) in slots.iter_mut() {
            if let Some(pending) = state.pending.take() {
                pending.abort();
            }
        }
        slots.clear();
    }

    pub fn is_pending(&self, key: &LookupKey) -> bool {
        self.shared
            .slots()
            .get(key)
            .map_or(false, |state| state.pending.is_some())
    }

    /// No timer waiting and no fetch running in any slot.
    pub fn is_idle(&self) -> bool {
        self.shared
            .slots()
            .values()
            .all(|state| state.pending.is_none() && !state.in_flight)
    }

    pub fn is_in_flight(&self, key: &LookupKey) -> bool {
        self.shared
            .slots()
            .get(key)
            .map_or(false, |state| state.in_flight)
    }

    pub fn last_queried(&self, key: &LookupKey) -> Option<String> {
        self.shared
            .slots()
            .get(key)
            .and_then(|state| state.last_queried.clone())
    }
}

impl Drop for LookupOrchestrator {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
