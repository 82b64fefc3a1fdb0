//! Messenger and cache bus message handlers.
//!
//! These messages arrive over the cluster bus; the sender may live on any
//! node, so every handler first checks whether the addressed character is
//! connected here and quietly does nothing when it is not.

use crate::dispatch::HandlerInvoker;
use crate::packets::PacketKind;
use crate::session::SessionManager;
use orvane_event_system::messages::{
    PlayerCacheUpdate, PlayerConnected, PlayerDisconnected, PlayerMessengerBlockFriend,
    PlayerMessengerMessage, PlayerMessengerRemoveFriend, PlayerMessengerStatusUpdate,
};
use orvane_event_system::MessengerStatus;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Registers handlers for every messenger and cache message this node
/// consumes.
pub fn register(invoker: &HandlerInvoker, sessions: Arc<SessionManager>) {
    // Connect/disconnect double as presence changes: the messenger status
    // of a character connected here follows its lifecycle messages.
    let connected_sessions = sessions.clone();
    invoker.register_message(PlayerConnected::NAME, move |connected: PlayerConnected| {
        let sessions = connected_sessions.clone();
        async move {
            if let Some(session) = sessions.get_by_character_id(connected.id) {
                session.set_status(connected.status);
            }
            debug!(
                "Character {} came online with status {:?}",
                connected.id, connected.status
            );
            Ok(())
        }
    });

    let disconnected_sessions = sessions.clone();
    invoker.register_message(
        PlayerDisconnected::NAME,
        move |disconnected: PlayerDisconnected| {
            let sessions = disconnected_sessions.clone();
            async move {
                if let Some(session) = sessions.get_by_character_id(disconnected.id) {
                    session.set_status(MessengerStatus::Offline);
                }
                debug!("Character {} went offline", disconnected.id);
                Ok(())
            }
        },
    );

    let status_sessions = sessions.clone();
    invoker.register_message(
        PlayerMessengerStatusUpdate::NAME,
        move |update: PlayerMessengerStatusUpdate| {
            let sessions = status_sessions.clone();
            async move {
                if let Some(session) = sessions.get_by_character_id(update.id) {
                    session.set_status(update.status);
                    debug!(
                        "Messenger status of character {} is now {:?}",
                        update.id, update.status
                    );
                }
                Ok(())
            }
        },
    );

    let remove_sessions = sessions.clone();
    invoker.register_message(
        PlayerMessengerRemoveFriend::NAME,
        move |removal: PlayerMessengerRemoveFriend| {
            let sessions = remove_sessions.clone();
            async move {
                if let Some(session) = sessions.get_by_character_id(removal.removed_id) {
                    info!(
                        "Character {} was removed from {}'s friends, notifying {}",
                        removal.removed_id, removal.id, session
                    );
                }
                Ok(())
            }
        },
    );

    let block_sessions = sessions.clone();
    invoker.register_message(
        PlayerMessengerBlockFriend::NAME,
        move |block: PlayerMessengerBlockFriend| {
            let sessions = block_sessions.clone();
            async move {
                if let Some(_session) = sessions.get_by_character_id(block.blocked_id) {
                    debug!(
                        "Character {} {} character {}",
                        block.id,
                        if block.blocked { "blocked" } else { "unblocked" },
                        block.blocked_id
                    );
                }
                Ok(())
            }
        },
    );

    let chat_sessions = sessions.clone();
    invoker.register_message(
        PlayerMessengerMessage::NAME,
        move |chat: PlayerMessengerMessage| {
            let sessions = chat_sessions.clone();
            async move {
                let Some(session) = sessions.get_by_character_id(chat.to_id) else {
                    // Recipient lives on another node or is offline.
                    return Ok(());
                };
                if let Err(e) = session.send(PacketKind::MessengerChat, &chat) {
                    error!("❌ Failed to deliver messenger chat to {}: {}", session, e);
                }
                Ok(())
            }
        },
    );

    invoker.register_message(PlayerCacheUpdate::NAME, move |update: PlayerCacheUpdate| {
        let sessions = sessions.clone();
        async move {
            if sessions.get_by_character_id(update.id).is_some() {
                debug!("Cache entry for character {} refreshed", update.id);
            }
            Ok(())
        }
    });
}
