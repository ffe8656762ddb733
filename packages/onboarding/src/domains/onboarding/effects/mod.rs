// Effects - the wizard's asynchronous side: registry/postal lookups and
// applying their results back onto the graph

pub mod autofill;
pub mod lookup;

pub use autofill::{fill_postal, fill_provider, fill_subject, Autofill};
pub use lookup::{
    Debounce, DebounceSettings, LookupError, LookupField, LookupKey, LookupOrchestrator,
    LookupOutcome, LookupResult, LookupSlot,
};
