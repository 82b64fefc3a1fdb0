//! # Core Type Definitions
//!
//! Fundamental identifier types used throughout the Orvane server ecosystem.
//! These types provide the building blocks for session tracking, player
//! identity, and cross-process addressing.
//!
//! ## Design Principles
//!
//! - **Type Safety**: Wrapper types prevent ID confusion (PlayerId vs CharacterId)
//! - **Wire Compatibility**: Player and character ids are `u32`, matching the
//!   identifiers carried by the client protocol
//! - **Serialization**: All types support JSON serialization for transmission

use serde::{Deserialize, Serialize};

/// Unique identifier for a player entity in the game world.
///
/// This is the id the client echoes back in gameplay packets (attacker id,
/// target id), so it is a plain `u32` newtype rather than a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistent identifier for a character record.
///
/// Unlike [`PlayerId`], which identifies the live entity in this process,
/// the character id survives across sessions and processes (it is the key
/// messenger and cache-update messages are addressed by).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub u32);

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-local identifier for a connected session.
///
/// Assigned monotonically by the session manager on accept; never reused
/// within a process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Online status carried by messenger presence updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessengerStatus {
    /// Player is connected and reachable.
    Online,
    /// Player is connected but marked away.
    Absent,
    /// Player does not want to receive messages.
    HardPlay,
    /// Player is not connected to any world node.
    Offline,
}

impl Default for MessengerStatus {
    fn default() -> Self {
        Self::Offline
    }
}

/// Reason a session was removed from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// The client closed the connection.
    ClientDisconnect,
    /// The transport failed mid-session.
    TransportError,
    /// The server removed the session (kick, shutdown).
    ServerKick,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_newtypes_do_not_compare_across_kinds() {
        // Compile-time property really, but keep the display behavior pinned.
        assert_eq!(PlayerId(7).to_string(), "7");
        assert_eq!(CharacterId(7).to_string(), "7");
        assert_eq!(SessionId(7).to_string(), "7");
    }

    #[test]
    fn messenger_status_defaults_to_offline() {
        assert_eq!(MessengerStatus::default(), MessengerStatus::Offline);
    }
}
