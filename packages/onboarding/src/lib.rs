// Client Onboarding Wizard - Core
//
// Builds the composite graph of one client, its addresses and its service
// providers, keeps registry/postal lookups scoped to the entity that
// triggered them, validates each wizard step and assembles the single
// create/update payload sent to the onboarding API.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
