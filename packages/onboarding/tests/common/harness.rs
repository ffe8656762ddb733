//! Test harness wiring the wizard to in-memory collaborators.
//!
//! Run with `RUST_LOG=debug cargo test -- --nocapture` to see wizard logs.

use onboarding_core::domains::onboarding::{
    ClientKind, DebounceSettings, ExistingClient, WizardController,
};
use onboarding_core::kernel::test_dependencies::TestDependencies;

pub struct TestHarness {
    pub deps: TestDependencies,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_deps(TestDependencies::new())
    }

    pub fn with_deps(deps: TestDependencies) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        Self { deps }
    }

    pub fn new_wizard(&self, kind: ClientKind) -> WizardController {
        WizardController::open_new(self.deps.kernel(), kind, DebounceSettings::default())
    }

    pub fn edit_wizard(&self, existing: ExistingClient) -> WizardController {
        WizardController::open_existing(self.deps.kernel(), existing, DebounceSettings::default())
    }
}
