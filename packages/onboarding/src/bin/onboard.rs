//! Onboarding CLI
//!
//! Runs registry/postal lookups and validates or submits wizard drafts saved
//! as JSON. Results are printed to stdout as JSON; logs go to stderr.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onboarding_core::common::{normalize_postal_code, normalize_registry_number, postal_prefix};
use onboarding_core::config::Config;
use onboarding_core::domains::onboarding::{
    assemble, validate_all, EntityGraph, FieldErrors, SubmitStatus, WizardController,
};
use onboarding_core::kernel::{BasePostalResolver, BaseRegistryLookup, OnboardingKernel};

#[derive(Parser)]
#[command(name = "onboard")]
#[command(about = "Client onboarding wizard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a registry number
    Lookup { number: String },

    /// Resolve a postal code to city and state
    Postal { code: String },

    /// Validate a draft and print its errors or the assembled payload
    Check { draft: PathBuf },

    /// Validate, duplicate-check and submit a draft
    Submit { draft: PathBuf },
}

#[derive(Serialize)]
struct CheckReport<'a> {
    valid: bool,
    errors: &'a FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct SubmitReport<'a> {
    submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<&'a str>,
    errors: &'a FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    client: Option<serde_json::Value>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn load_draft(path: &PathBuf) -> Result<EntityGraph> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read draft {}", path.display()))?;
    EntityGraph::from_json(&json).with_context(|| format!("Invalid draft {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,onboarding_core=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lookup { number } => {
            let number = normalize_registry_number(&number);
            let kernel = OnboardingKernel::from_config(&Config::from_env()?)?;
            let record = kernel
                .registry
                .lookup(&number)
                .await
                .context("Registry lookup failed")?
                .ok_or_else(|| anyhow!("No registry record for {}", number))?;
            print_json(&record)
        }

        Commands::Postal { code } => {
            let prefix = postal_prefix(&normalize_postal_code(&code))
                .ok_or_else(|| anyhow!("Postal code needs at least 5 digits"))?;
            let kernel = OnboardingKernel::from_config(&Config::from_env()?)?;
            let place = kernel
                .postal
                .resolve(&prefix)
                .await
                .context("Postal lookup failed")?
                .ok_or_else(|| anyhow!("Unknown postal code {}", prefix))?;
            print_json(&place)
        }

        Commands::Check { draft } => {
            let graph = load_draft(&draft)?;
            let errors = validate_all(&graph);
            if !errors.is_empty() {
                print_json(&CheckReport {
                    valid: false,
                    errors: &errors,
                    payload: None,
                })?;
                bail!("{} field(s) failed validation", errors.len());
            }

            match assemble(&graph) {
                Ok(payload) => print_json(&CheckReport {
                    valid: true,
                    errors: &errors,
                    payload: Some(serde_json::to_value(&payload)?),
                }),
                Err(e) => {
                    print_json(&CheckReport {
                        valid: false,
                        errors: &e.to_field_errors(),
                        payload: None,
                    })?;
                    Err(e.into())
                }
            }
        }

        Commands::Submit { draft } => {
            let graph = load_draft(&draft)?;
            let config = Config::from_env()?;
            let kernel = OnboardingKernel::from_config(&config)?;
            let mut wizard = WizardController::from_draft(kernel, graph, config.debounce());

            loop {
                match wizard.submit().await? {
                    SubmitStatus::AdvancedToProviders => {
                        tracing::info!("Client step valid, continuing to providers");
                    }
                    SubmitStatus::Submitted(client) => {
                        return print_json(&SubmitReport {
                            submitted: true,
                            notice: None,
                            errors: wizard.errors(),
                            client: Some(serde_json::to_value(&client)?),
                        });
                    }
                    SubmitStatus::Blocked | SubmitStatus::Rejected => {
                        print_json(&SubmitReport {
                            submitted: false,
                            notice: wizard.notice(),
                            errors: wizard.errors(),
                            client: None,
                        })?;
                        bail!("Submission did not go through");
                    }
                }
            }
        }
    }
}
