//! Persistence-layer boundary.
//!
//! The world server never touches the database schema directly; persistence
//! lives in another crate behind this trait. The only contract the core
//! depends on is the startup liveness check: a node whose data tier is
//! unreachable must never open its socket or publish a cluster record.

use async_trait::async_trait;

/// Handle to the persistence layer.
#[async_trait]
pub trait WorldDatabase: Send + Sync {
    /// Returns true if the database answers a round-trip probe.
    async fn is_alive(&self) -> bool;
}

/// Database stand-in with a fixed liveness answer.
///
/// Used by tests and by deployments that run the node detached from a data
/// tier (local tooling, protocol capture).
#[derive(Debug, Clone)]
pub struct StaticDatabase {
    alive: bool,
}

impl StaticDatabase {
    /// A database that always answers the liveness probe.
    pub fn reachable() -> Self {
        Self { alive: true }
    }

    /// A database that never answers the liveness probe.
    pub fn unreachable() -> Self {
        Self { alive: false }
    }
}

#[async_trait]
impl WorldDatabase for StaticDatabase {
    async fn is_alive(&self) -> bool {
        self.alive
    }
}
