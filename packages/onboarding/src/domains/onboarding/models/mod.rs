pub mod address;
pub mod client;
pub mod existing;
pub mod provider;

pub use address::{Address, AddressPatch};
pub use client::{Client, ClientField, ClientKind, IndividualProfile, OrganizationProfile};
pub use existing::{ExistingAddress, ExistingClient, ExistingProvider};
pub use provider::{Provider, ProviderPatch};
