//! Cross-process message payloads exchanged between server nodes.
//!
//! Each message is an immutable serde payload keyed by a character identity,
//! published on the [`MessageBus`](crate::bus::MessageBus) by whichever node
//! observed the change and consumed by every node interested in it (world
//! nodes for messenger routing, the cluster tier for presence).
//!
//! The canonical bus name for each payload lives next to it as an associated
//! `NAME` constant so publishers and subscribers cannot drift apart.

use crate::types::{CharacterId, MessengerStatus};
use serde::{Deserialize, Serialize};

/// A player finished connecting to a world node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConnected {
    /// Persistent character identity of the player.
    pub id: CharacterId,
    /// Messenger status the player connected with.
    pub status: MessengerStatus,
}

impl PlayerConnected {
    pub const NAME: &'static str = "player_connected";
}

/// A player left a world node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDisconnected {
    /// Persistent character identity of the player.
    pub id: CharacterId,
}

impl PlayerDisconnected {
    pub const NAME: &'static str = "player_disconnected";
}

/// A player's messenger presence changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMessengerStatusUpdate {
    /// Character whose status changed.
    pub id: CharacterId,
    /// The new status.
    pub status: MessengerStatus,
}

impl PlayerMessengerStatusUpdate {
    pub const NAME: &'static str = "player_messenger_status_update";

    pub fn new(id: CharacterId, status: MessengerStatus) -> Self {
        Self { id, status }
    }
}

/// A player removed another character from their friend list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMessengerRemoveFriend {
    /// Character that initiated the removal.
    pub id: CharacterId,
    /// Character that was removed and must be notified if online here.
    pub removed_id: CharacterId,
}

impl PlayerMessengerRemoveFriend {
    pub const NAME: &'static str = "player_messenger_remove_friend";
}

/// A player blocked or unblocked a character on their friend list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMessengerBlockFriend {
    /// Character that changed the block state.
    pub id: CharacterId,
    /// Character being blocked or unblocked.
    pub blocked_id: CharacterId,
    /// New block state.
    pub blocked: bool,
}

impl PlayerMessengerBlockFriend {
    pub const NAME: &'static str = "player_messenger_block_friend";
}

/// A private messenger chat line addressed to a character that may live on
/// any world node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMessengerMessage {
    /// Character that sent the line.
    pub from_id: CharacterId,
    /// Character the line is addressed to.
    pub to_id: CharacterId,
    /// Chat text.
    pub message: String,
    /// Unix timestamp (seconds) stamped by the sending node.
    pub sent_at: u64,
}

impl PlayerMessengerMessage {
    pub const NAME: &'static str = "player_messenger_message";

    pub fn new(from_id: CharacterId, to_id: CharacterId, message: String) -> Self {
        Self {
            from_id,
            to_id,
            message,
            sent_at: crate::utils::current_timestamp(),
        }
    }
}

/// A character's shared cache entry was refreshed and readers should
/// re-fetch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCacheUpdate {
    /// Character whose cache entry changed.
    pub id: CharacterId,
}

impl PlayerCacheUpdate {
    pub const NAME: &'static str = "player_cache_update";
}
