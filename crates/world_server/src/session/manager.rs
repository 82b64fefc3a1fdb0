//! Session registry and lifecycle.

use crate::projectile::ProjectileTracker;
use crate::session::{ClientSession, SessionIdentity};
use orvane_event_system::{
    messages::{PlayerConnected, PlayerDisconnected},
    CharacterId, DisconnectReason, MessageBus, MessengerStatus, PlayerId, SessionId,
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Registry of every session connected to this node.
///
/// Sessions enter on accept, gain an identity on authentication, and leave
/// through [`SessionManager::disconnect`]. Disconnect is idempotent; racing
/// teardown paths (reader error, kick, shutdown) all funnel through it and
/// only the first caller performs the side effects.
pub struct SessionManager {
    sessions: DashMap<SessionId, Arc<ClientSession>>,
    next_session_id: AtomicU64,
    next_player_id: AtomicU32,
    bus: Arc<MessageBus>,
    projectiles: Arc<ProjectileTracker>,
}

impl SessionManager {
    pub fn new(bus: Arc<MessageBus>, projectiles: Arc<ProjectileTracker>) -> Self {
        Self {
            sessions: DashMap::new(),
            next_session_id: AtomicU64::new(1),
            next_player_id: AtomicU32::new(1),
            bus,
            projectiles,
        }
    }

    /// Registers a freshly accepted connection.
    ///
    /// The returned session is unauthenticated; gameplay packets are ignored
    /// until [`SessionManager::authenticate`] binds an identity.
    pub fn accept(
        &self,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Arc<ClientSession> {
        let id = SessionId(self.next_session_id.fetch_add(1, Ordering::SeqCst));
        let session = Arc::new(ClientSession::new(id, addr, outbound));
        self.sessions.insert(id, session.clone());
        info!("🔗 Accepted connection from {} as session {}", addr, id);
        session
    }

    /// Binds an identity to the session and announces the player.
    ///
    /// Assigns the live entity id, marks the player online, and publishes
    /// `PlayerConnected` so messenger and cache subscribers see the arrival.
    pub async fn authenticate(
        &self,
        session: &Arc<ClientSession>,
        user_id: u32,
        character_id: CharacterId,
        name: String,
    ) -> PlayerId {
        let player_id = PlayerId(self.next_player_id.fetch_add(1, Ordering::SeqCst));
        session.set_identity(SessionIdentity {
            player_id,
            user_id,
            character_id,
            name: name.clone(),
            status: MessengerStatus::Online,
        });
        info!(
            "✅ {} joined as player {} (character {})",
            name, player_id, character_id
        );

        if let Err(e) = self
            .bus
            .publish(
                PlayerConnected::NAME,
                &PlayerConnected {
                    id: character_id,
                    status: MessengerStatus::Online,
                },
            )
            .await
        {
            error!("❌ Failed to publish player_connected: {}", e);
        }
        player_id
    }

    /// Looks up a session by its process-local id.
    pub fn get(&self, id: SessionId) -> Option<Arc<ClientSession>> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Looks up an authenticated session by live entity id.
    pub fn get_by_player_id(&self, player_id: PlayerId) -> Option<Arc<ClientSession>> {
        self.sessions.iter().find_map(|entry| {
            let session = entry.value();
            (session.player_id() == Some(player_id)).then(|| session.clone())
        })
    }

    /// Looks up an authenticated session by character name,
    /// case-insensitively.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<ClientSession>> {
        self.sessions.iter().find_map(|entry| {
            let session = entry.value();
            session
                .identity()
                .filter(|identity| identity.name.eq_ignore_ascii_case(name))
                .map(|_| session.clone())
        })
    }

    /// Looks up an authenticated session by persistent character id.
    pub fn get_by_character_id(&self, character_id: CharacterId) -> Option<Arc<ClientSession>> {
        self.sessions.iter().find_map(|entry| {
            let session = entry.value();
            session
                .identity()
                .filter(|identity| identity.character_id == character_id)
                .map(|_| session.clone())
        })
    }

    /// Retires a session.
    ///
    /// Removes it from the registry, sweeps the player's projectiles, and
    /// publishes `PlayerDisconnected` if the session was authenticated.
    /// Calling this twice for the same id is a no-op the second time.
    pub async fn disconnect(&self, id: SessionId, reason: DisconnectReason) {
        let Some((_, session)) = self.sessions.remove(&id) else {
            return;
        };
        session.mark_disconnected();

        match session.identity() {
            Some(identity) => {
                self.projectiles.remove_owner(identity.player_id);
                info!(
                    "🛑 {} (player {}) disconnected: {:?}",
                    identity.name, identity.player_id, reason
                );
                if let Err(e) = self
                    .bus
                    .publish(
                        PlayerDisconnected::NAME,
                        &PlayerDisconnected {
                            id: identity.character_id,
                        },
                    )
                    .await
                {
                    error!("❌ Failed to publish player_disconnected: {}", e);
                }
            }
            None => {
                warn!("🛑 Unauthenticated session {} disconnected: {:?}", id, reason);
            }
        }
    }

    /// Number of sessions currently registered, authenticated or not.
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Snapshot of every registered session.
    pub fn all(&self) -> Vec<Arc<ClientSession>> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projectile::{Projectile, ProjectileKind};

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MessageBus::new()), Arc::new(ProjectileTracker::new()))
    }

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn lookups_find_authenticated_sessions() {
        let manager = manager();
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = manager.accept(addr(), tx);
        let player_id = manager
            .authenticate(&session, 42, CharacterId(7), "Riven".to_string())
            .await;

        assert_eq!(manager.count(), 1);
        assert!(manager.get(session.id()).is_some());
        assert!(manager.get_by_player_id(player_id).is_some());
        assert!(manager.get_by_character_id(CharacterId(7)).is_some());
        // Name lookup ignores case.
        assert!(manager.get_by_name("riVEN").is_some());
        assert!(manager.get_by_name("someone-else").is_none());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_and_sweeps_projectiles() {
        let projectiles = Arc::new(ProjectileTracker::new());
        let manager = SessionManager::new(Arc::new(MessageBus::new()), projectiles.clone());
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = manager.accept(addr(), tx);
        let player_id = manager
            .authenticate(&session, 42, CharacterId(7), "Riven".to_string())
            .await;

        projectiles.insert(
            player_id,
            1,
            Projectile::new(1200, ProjectileKind::Magic { magic_power: 50 }, || {}),
        );

        manager
            .disconnect(session.id(), DisconnectReason::ClientDisconnect)
            .await;
        assert_eq!(manager.count(), 0);
        assert!(!session.is_connected());
        assert!(projectiles.is_empty());

        // Second call finds nothing to do.
        manager
            .disconnect(session.id(), DisconnectReason::TransportError)
            .await;
        assert_eq!(manager.count(), 0);
    }

    #[tokio::test]
    async fn unauthenticated_sessions_are_invisible_to_player_lookups() {
        let manager = manager();
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = manager.accept(addr(), tx);

        assert_eq!(manager.count(), 1);
        assert!(manager.get(session.id()).is_some());
        assert!(manager.get_by_name("anyone").is_none());
        assert!(manager.get_by_character_id(CharacterId(1)).is_none());
    }
}
