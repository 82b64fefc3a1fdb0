//! Session identity announcement.

use crate::dispatch::HandlerInvoker;
use crate::packets::{JoinPacket, PacketKind};
use crate::session::SessionManager;
use std::sync::Arc;
use tracing::warn;

/// Registers the join handler.
///
/// Binds the announced identity to the session and publishes the player's
/// arrival. A second join on an already-authenticated session is ignored;
/// the client is confused or probing.
pub fn register(invoker: &HandlerInvoker, sessions: Arc<SessionManager>) {
    invoker.register_packet(PacketKind::Join, move |session, packet: JoinPacket| {
        let sessions = sessions.clone();
        async move {
            if session.identity().is_some() {
                warn!("{} sent a duplicate join, ignoring", session);
                return Ok(());
            }
            sessions
                .authenticate(&session, packet.user_id, packet.character_id, packet.name)
                .await;
            Ok(())
        }
    });
}
