//! Temporary identities for entities that have not been persisted yet.
//!
//! A `TempId` joins a provider to an address before either has a durable
//! server-assigned identifier. Entities hydrated from an existing record reuse
//! their durable identifier as the `TempId`, so references made while editing
//! stay valid without remapping.
//!
//! # Example
//!
//! ```rust
//! use onboarding_core::common::{TempId, TempIdAllocator};
//!
//! let ids = TempIdAllocator::new();
//! let a = ids.allocate();
//! let b = ids.allocate();
//! assert_ne!(a, b);
//!
//! let existing = TempId::from_durable("addr_42");
//! assert_eq!(existing.as_str(), "addr_42");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Opaque join key between providers and addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(String);

impl TempId {
    /// Reuse a durable identifier as the temporary one.
    pub fn from_durable(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TempId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Issues session-unique temporary identifiers.
///
/// Each allocator gets a random session prefix; ids within a session are
/// numbered, so two allocators never collide and a single allocator never
/// repeats itself.
#[derive(Debug)]
pub struct TempIdAllocator {
    session: String,
    next: AtomicU64,
}

impl TempIdAllocator {
    pub fn new() -> Self {
        let session = Uuid::new_v4().simple().to_string();
        Self {
            session: session[..12].to_string(),
            next: AtomicU64::new(1),
        }
    }

    pub fn allocate(&self) -> TempId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        TempId(format!("tmp-{}-{}", self.session, n))
    }
}

impl Default for TempIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn allocations_are_unique_within_a_session() {
        let ids = TempIdAllocator::new();
        let issued: HashSet<TempId> = (0..1000).map(|_| ids.allocate()).collect();
        assert_eq!(issued.len(), 1000);
    }

    #[test]
    fn separate_sessions_do_not_collide() {
        let a = TempIdAllocator::new().allocate();
        let b = TempIdAllocator::new().allocate();
        assert_ne!(a, b);
    }

    #[test]
    fn durable_ids_pass_through_unchanged() {
        let id = TempId::from_durable("loc_7");
        assert_eq!(id.to_string(), "loc_7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"loc_7\"");
    }
}
