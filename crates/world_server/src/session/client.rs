//! Per-connection session state.

use crate::error::ServerError;
use crate::packets::{encode_frame, PacketKind};
use orvane_event_system::{CharacterId, MessengerStatus, PlayerId, SessionId};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::warn;

/// Identity bound to a session once the client's join packet is accepted.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    /// Live entity id assigned by this node, unique while the session lasts.
    pub player_id: PlayerId,
    /// Authenticated account id.
    pub user_id: u32,
    /// Persistent character id.
    pub character_id: CharacterId,
    /// Character display name.
    pub name: String,
    /// Messenger presence last published for this player.
    pub status: MessengerStatus,
}

/// One connected client.
///
/// Created unauthenticated when the socket is accepted; the identity is
/// bound exactly once when the join packet passes. Outbound packets go
/// through an unbounded channel drained by the connection's writer task, so
/// any thread can send without blocking on the socket.
pub struct ClientSession {
    id: SessionId,
    addr: SocketAddr,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    connected: AtomicBool,
    identity: RwLock<Option<SessionIdentity>>,
}

impl ClientSession {
    pub fn new(id: SessionId, addr: SocketAddr, outbound: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self {
            id,
            addr,
            outbound,
            connected: AtomicBool::new(true),
            identity: RwLock::new(None),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Whether the transport is still considered live.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Marks the transport dead and queues the close sentinel so the writer
    /// task shuts the socket down. Further sends become no-ops.
    pub fn mark_disconnected(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        // Empty frame is the writer's close signal; real frames are never
        // empty (the length prefix alone is four bytes).
        let _ = self.outbound.send(Vec::new());
    }

    /// Binds the authenticated identity. Rebinding replaces the previous
    /// identity; callers reject duplicate joins before getting here.
    pub fn set_identity(&self, identity: SessionIdentity) {
        if let Ok(mut slot) = self.identity.write() {
            *slot = Some(identity);
        }
    }

    /// Snapshot of the bound identity, if any.
    pub fn identity(&self) -> Option<SessionIdentity> {
        self.identity.read().ok().and_then(|slot| slot.clone())
    }

    /// Live entity id, present once authenticated.
    pub fn player_id(&self) -> Option<PlayerId> {
        self.identity
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|identity| identity.player_id))
    }

    /// Updates the messenger presence recorded on the identity.
    pub fn set_status(&self, status: MessengerStatus) {
        if let Ok(mut slot) = self.identity.write() {
            if let Some(identity) = slot.as_mut() {
                identity.status = status;
            }
        }
    }

    /// Queues one packet for the writer task.
    ///
    /// A dead transport is tolerated silently; the disconnect path is
    /// already in flight and will retire this session.
    pub fn send<T: Serialize>(&self, kind: PacketKind, body: &T) -> Result<(), ServerError> {
        let bytes = encode_frame(kind, body)?;
        if !self.is_connected() {
            return Ok(());
        }
        if self.outbound.send(bytes).is_err() {
            self.mark_disconnected();
            warn!("Send to closed session {} dropped", self.id);
        }
        Ok(())
    }
}

impl std::fmt::Display for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.identity() {
            Some(identity) => write!(f, "{} (session {})", identity.name, self.id),
            None => write!(f, "unauthenticated session {}", self.id),
        }
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("connected", &self.is_connected())
            .field("identity", &self.identity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (ClientSession, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = ClientSession::new(SessionId(1), "127.0.0.1:40000".parse().unwrap(), tx);
        (session, rx)
    }

    #[test]
    fn identity_binds_once_and_reads_back() {
        let (session, _rx) = session();
        assert!(session.identity().is_none());

        session.set_identity(SessionIdentity {
            player_id: PlayerId(10),
            user_id: 42,
            character_id: CharacterId(7),
            name: "Riven".to_string(),
            status: MessengerStatus::Online,
        });

        let identity = session.identity().expect("identity missing");
        assert_eq!(identity.player_id, PlayerId(10));
        assert_eq!(identity.character_id, CharacterId(7));
        assert_eq!(session.player_id(), Some(PlayerId(10)));
        assert_eq!(format!("{session}"), "Riven (session 1)");
    }

    #[test]
    fn send_after_disconnect_is_a_silent_noop() {
        let (session, mut rx) = session();
        session
            .send(PacketKind::Join, &serde_json::json!({"ping": true}))
            .expect("send failed");
        assert!(rx.try_recv().is_ok());

        session.mark_disconnected();
        // The close sentinel is the only thing queued by the disconnect.
        assert_eq!(rx.try_recv().expect("sentinel missing"), Vec::<u8>::new());

        session
            .send(PacketKind::Join, &serde_json::json!({"ping": true}))
            .expect("send after disconnect must not error");
        assert!(rx.try_recv().is_err());
    }
}
