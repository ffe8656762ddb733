// Onboarding domain - composite client/address/provider wizard
//
// Responsibilities:
// - Entity graph: one client, its addresses, its providers (joined by temp ids)
// - Registry and postal lookups, debounced and deduplicated per slot
// - Step validation (client step, providers step)
// - Wizard state machine (Step1 -> Step2 -> submit)
// - Submission payload assembly with reference resolution

pub mod controller;
pub mod effects;
pub mod graph;
pub mod machines;
pub mod models;
pub mod submission;
pub mod validation;

pub use controller::{LookupApplied, SubmitStatus, WizardController, WizardError};
pub use effects::{DebounceSettings, LookupKey, LookupSlot};
pub use graph::{EntityGraph, GraphError};
pub use machines::{WizardCommand, WizardEvent, WizardMachine, WizardState, WizardStep};
pub use models::*;
pub use submission::{assemble, registry_numbers_to_check, AssemblyError, SubmissionPayload};
pub use validation::{validate, validate_all, ErrorScope, FieldErrors};
