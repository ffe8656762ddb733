use serde::Serialize;
use tracing::debug;

/// Wizard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    /// Client details and addresses
    Step1,
    /// Service providers (organizations that declare providers only)
    Step2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardState {
    Active(WizardStep),
    /// Backend accepted the submission
    Submitted,
    /// Cancelled or closed without submitting
    Discarded,
}

impl WizardState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WizardState::Active(_))
    }
}

/// Facts the controller reports to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    /// User pressed next/submit; the controller has already validated the
    /// current step
    SubmitRequested {
        step_valid: bool,
        declares_providers: bool,
    },
    BackRequested,
    /// The client no longer qualifies for the providers step
    ProvidersWithdrawn,
    CancelRequested,
    SubmissionAccepted,
    SubmissionRejected,
}

/// What the controller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardCommand {
    ShowErrors,
    /// Step1 -> Step2; seed the provider list if untouched
    EnterProviders,
    ReturnToClient,
    /// Assemble and send the payload
    Submit,
    Discard,
}

/// Wizard state machine
/// Pure decision logic - NO IO, only state transitions
#[derive(Debug, Clone)]
pub struct WizardMachine {
    state: WizardState,
}

impl WizardMachine {
    pub fn new() -> Self {
        Self {
            state: WizardState::Active(WizardStep::Step1),
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    /// Current step, or `None` once the wizard is closed.
    pub fn step(&self) -> Option<WizardStep> {
        match self.state {
            WizardState::Active(step) => Some(step),
            _ => None,
        }
    }

    pub fn decide(&mut self, event: &WizardEvent) -> Option<WizardCommand> {
        let WizardState::Active(step) = self.state else {
            return None;
        };

        let command = match (step, event) {
            (_, WizardEvent::CancelRequested) => {
                self.state = WizardState::Discarded;
                Some(WizardCommand::Discard)
            }

            (_, WizardEvent::SubmitRequested { step_valid: false, .. }) => {
                Some(WizardCommand::ShowErrors)
            }

            (
                WizardStep::Step1,
                WizardEvent::SubmitRequested {
                    declares_providers: true,
                    ..
                },
            ) => {
                self.state = WizardState::Active(WizardStep::Step2);
                Some(WizardCommand::EnterProviders)
            }

            (_, WizardEvent::SubmitRequested { .. }) => Some(WizardCommand::Submit),

            (WizardStep::Step2, WizardEvent::BackRequested) => {
                self.state = WizardState::Active(WizardStep::Step1);
                Some(WizardCommand::ReturnToClient)
            }
            (WizardStep::Step1, WizardEvent::BackRequested) => None,

            (WizardStep::Step2, WizardEvent::ProvidersWithdrawn) => {
                self.state = WizardState::Active(WizardStep::Step1);
                Some(WizardCommand::ReturnToClient)
            }
            (WizardStep::Step1, WizardEvent::ProvidersWithdrawn) => None,

            (_, WizardEvent::SubmissionAccepted) => {
                self.state = WizardState::Submitted;
                None
            }
            // Stay on the current step so the user can fix and resubmit
            (_, WizardEvent::SubmissionRejected) => None,
        };

        debug!(?event, ?command, state = ?self.state, "wizard transition");
        command
    }
}

impl Default for WizardMachine {
    fn default() -> Self {
        Self::new()
    }
}
