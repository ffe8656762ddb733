//! Editing persisted clients and resuming saved drafts.

mod common;

use crate::common::{existing_individual, existing_organization, named_provider, TestHarness};
use onboarding_core::common::TempId;
use onboarding_core::domains::onboarding::{
    ClientKind, DebounceSettings, EntityGraph, ErrorScope, ProviderPatch, SubmitStatus,
    WizardController, WizardStep,
};
use onboarding_core::kernel::test_dependencies::{MockDuplicateCheck, TestDependencies};

#[tokio::test(start_paused = true)]
async fn hydrated_organization_updates_in_place() {
    let harness = TestHarness::new();
    let mut wizard = harness.edit_wizard(existing_organization());

    assert_eq!(
        wizard.submit().await.unwrap(),
        SubmitStatus::AdvancedToProviders
    );
    // Existing providers are kept as loaded
    assert_eq!(wizard.graph().providers().len(), 2);
    assert!(matches!(
        wizard.submit().await.unwrap(),
        SubmitStatus::Submitted(ref client) if client.id == "cli_100"
    ));

    let calls = harness.deps.clients.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].client_id.as_deref(), Some("cli_100"));

    let payload = &calls[0].payload;
    assert_eq!(payload.id.as_deref(), Some("cli_100"));
    assert_eq!(payload.primary_ref, TempId::from_durable("addr_1"));
    let providers = payload.providers.as_ref().unwrap();
    assert_eq!(providers[0].id.as_deref(), Some("prov_1"));
    assert_eq!(providers[0].location_id.as_deref(), Some("loc_1"));
    assert_eq!(providers[1].address_ref, TempId::from_durable("addr_2"));

    // Nothing changed since loading, so nothing to duplicate-check
    assert!(harness.deps.duplicates.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn only_changed_registry_numbers_are_duplicate_checked() {
    let harness = TestHarness::with_deps(
        TestDependencies::new().with_duplicates(MockDuplicateCheck::new().with_existing("4444444444")),
    );
    let mut wizard = harness.edit_wizard(existing_organization());
    wizard.submit().await.unwrap();

    wizard
        .update_provider(1, ProviderPatch::registry_number("4444444444"))
        .unwrap();

    assert_eq!(wizard.submit().await.unwrap(), SubmitStatus::Blocked);
    assert_eq!(
        harness.deps.duplicates.calls(),
        vec![vec!["4444444444".to_string()]]
    );
    assert!(wizard.errors().has(ErrorScope::Provider(1), "registry_number"));
    assert!(!wizard.errors().has_scope(ErrorScope::Provider(0)));
    assert_eq!(wizard.step(), Some(WizardStep::Step2));
}

#[tokio::test(start_paused = true)]
async fn hydrated_individual_payload_has_no_providers() {
    let harness = TestHarness::new();
    let mut wizard = harness.edit_wizard(existing_individual());

    assert!(matches!(
        wizard.submit().await.unwrap(),
        SubmitStatus::Submitted(_)
    ));

    let json = serde_json::to_value(&harness.deps.clients.calls()[0].payload).unwrap();
    assert_eq!(json["id"], "cli_200");
    assert!(json.get("providers").is_none());
    assert_eq!(json["addresses"][0]["id"], "addr_9");
}

#[tokio::test(start_paused = true)]
async fn provider_added_while_editing_links_to_durable_primary() {
    let harness = TestHarness::new();
    let mut wizard = harness.edit_wizard(existing_organization());
    wizard.submit().await.unwrap();

    let index = wizard.add_provider().unwrap();
    wizard
        .update_provider(index, named_provider("Katherine", "Johnson", "5555555555"))
        .unwrap();
    assert!(matches!(
        wizard.submit().await.unwrap(),
        SubmitStatus::Submitted(_)
    ));

    let payload = &harness.deps.clients.calls()[0].payload;
    let added = &payload.providers.as_ref().unwrap()[index];
    assert_eq!(added.id, None);
    assert_eq!(added.address_ref, TempId::from_durable("addr_1"));
    assert_eq!(
        harness.deps.duplicates.calls(),
        vec![vec!["5555555555".to_string()]]
    );
}

#[tokio::test(start_paused = true)]
async fn saved_draft_resumes_where_it_left_off() {
    let harness = TestHarness::new();
    let mut wizard = harness.new_wizard(ClientKind::Organization);
    common::fill_organization(&mut wizard);
    wizard.submit().await.unwrap();
    wizard
        .update_provider(0, named_provider("Grace", "Hopper", "2222222222"))
        .unwrap();
    let draft = wizard.graph().to_json().unwrap();
    wizard.cancel();

    let graph = EntityGraph::from_json(&draft).unwrap();
    let mut resumed =
        WizardController::from_draft(harness.deps.kernel(), graph, DebounceSettings::default());

    // Filled provider survives re-entering the providers step
    assert_eq!(
        resumed.submit().await.unwrap(),
        SubmitStatus::AdvancedToProviders
    );
    assert_eq!(resumed.graph().providers()[0].first_name, "Grace");

    // New temp ids never collide with ones saved in the draft
    let secondary = resumed.add_address().unwrap();
    assert!(resumed
        .graph()
        .addresses()
        .iter()
        .filter(|a| a.temp_id == secondary)
        .count()
        == 1);

    resumed.remove_address(&secondary).unwrap();
    assert!(matches!(
        resumed.submit().await.unwrap(),
        SubmitStatus::Submitted(_)
    ));
    assert_eq!(harness.deps.clients.calls()[0].client_id, None);
}
