//! Typed handler dispatch for inbound packets and bus messages.
//!
//! The invoker maps each [`DispatchTag`] to exactly one registered handler.
//! Registration captures the payload type; dispatch decodes the serialized
//! body into that type before calling the handler, so handlers never see raw
//! bytes or untyped JSON.
//!
//! Two payload shapes exist. Packet handlers receive the originating
//! [`ClientSession`] along with the decoded packet; message handlers receive
//! only the payload, because bus messages may originate on another process
//! with no local session behind them.
//!
//! A tag with no registered handler is dropped with a trace log; unhandled
//! traffic is normal. A payload that fails to decode into the registered
//! type is a [`DispatchError::Contract`] and surfaces to the caller
//! immediately, because it means a handler was registered against the wrong
//! type.

use crate::error::DispatchError;
use crate::packets::{PacketFrame, PacketKind};
use crate::session::ClientSession;
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Routing key for one handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchTag {
    /// Inbound client packet, keyed by its wire tag.
    Packet(PacketKind),
    /// Bus message, keyed by its canonical name.
    Message(&'static str),
}

impl std::fmt::Display for DispatchTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchTag::Packet(kind) => write!(f, "packet::{kind:?}"),
            DispatchTag::Message(name) => write!(f, "message::{name}"),
        }
    }
}

type PacketHandlerFn = Arc<
    dyn Fn(Arc<ClientSession>, serde_json::Value) -> BoxFuture<'static, Result<(), DispatchError>>
        + Send
        + Sync,
>;

type MessageHandlerFn =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<(), DispatchError>> + Send + Sync>;

enum HandlerEntry {
    Packet(PacketHandlerFn),
    Message(MessageHandlerFn),
}

/// Registry that routes decoded payloads to their single handler.
pub struct HandlerInvoker {
    handlers: DashMap<DispatchTag, HandlerEntry>,
}

impl std::fmt::Debug for HandlerInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerInvoker")
            .field("registered", &self.handlers.len())
            .finish()
    }
}

impl HandlerInvoker {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Registers the handler for a packet tag.
    ///
    /// Exactly one handler serves each tag; registering a tag twice replaces
    /// the previous handler with a warning.
    pub fn register_packet<T, F, Fut>(&self, kind: PacketKind, handler: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(Arc<ClientSession>, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DispatchError>> + Send + 'static,
    {
        let tag = DispatchTag::Packet(kind);
        let wrapped: PacketHandlerFn = Arc::new(move |session, body| {
            let invocation: BoxFuture<'static, Result<(), DispatchError>> =
                match serde_json::from_value::<T>(body) {
                    Ok(packet) => Box::pin(handler(session, packet)),
                    Err(e) => Box::pin(async move {
                        Err(DispatchError::Contract(format!(
                            "packet body does not match registered type {}: {e}",
                            std::any::type_name::<T>()
                        )))
                    }),
                };
            invocation
        });
        if self
            .handlers
            .insert(tag, HandlerEntry::Packet(wrapped))
            .is_some()
        {
            warn!("Handler for {} replaced an existing registration", tag);
        }
        debug!("📝 Registered handler for {}", tag);
    }

    /// Registers the handler for a bus message name.
    pub fn register_message<T, F, Fut>(&self, name: &'static str, handler: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DispatchError>> + Send + 'static,
    {
        let tag = DispatchTag::Message(name);
        let wrapped: MessageHandlerFn = Arc::new(move |body| {
            let invocation: BoxFuture<'static, Result<(), DispatchError>> =
                match serde_json::from_value::<T>(body) {
                    Ok(payload) => Box::pin(handler(payload)),
                    Err(e) => Box::pin(async move {
                        Err(DispatchError::Contract(format!(
                            "message body does not match registered type {}: {e}",
                            std::any::type_name::<T>()
                        )))
                    }),
                };
            invocation
        });
        if self
            .handlers
            .insert(tag, HandlerEntry::Message(wrapped))
            .is_some()
        {
            warn!("Handler for {} replaced an existing registration", tag);
        }
        debug!("📝 Registered handler for {}", tag);
    }

    /// Routes one decoded frame to its packet handler.
    ///
    /// An unregistered tag is dropped silently; a decode failure or handler
    /// failure surfaces as the corresponding [`DispatchError`].
    pub async fn dispatch_packet(
        &self,
        session: Arc<ClientSession>,
        frame: &PacketFrame,
    ) -> Result<(), DispatchError> {
        let tag = DispatchTag::Packet(frame.kind);
        let handler = match self.handlers.get(&tag) {
            Some(entry) => match entry.value() {
                HandlerEntry::Packet(handler) => handler.clone(),
                HandlerEntry::Message(_) => {
                    return Err(DispatchError::Contract(format!(
                        "{tag} registered as a message handler"
                    )));
                }
            },
            None => {
                trace!("No handler for {}, dropping", tag);
                return Ok(());
            }
        };
        handler(session, frame.body.clone()).await
    }

    /// Routes one bus payload to its message handler.
    pub async fn dispatch_message<T: Serialize>(
        &self,
        name: &'static str,
        payload: &T,
    ) -> Result<(), DispatchError> {
        let tag = DispatchTag::Message(name);
        let handler = match self.handlers.get(&tag) {
            Some(entry) => match entry.value() {
                HandlerEntry::Message(handler) => handler.clone(),
                HandlerEntry::Packet(_) => {
                    return Err(DispatchError::Contract(format!(
                        "{tag} registered as a packet handler"
                    )));
                }
            },
            None => {
                trace!("No handler for {}, dropping", tag);
                return Ok(());
            }
        };
        let body = serde_json::to_value(payload)
            .map_err(|e| DispatchError::Contract(format!("message serialization: {e}")))?;
        handler(body).await
    }

    /// Number of registered handlers across both surfaces.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for HandlerInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::SfxIdPacket;
    use orvane_event_system::SessionId;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::mpsc;

    fn session() -> Arc<ClientSession> {
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(ClientSession::new(
            SessionId(1),
            "127.0.0.1:40000".parse().unwrap(),
            tx,
        ))
    }

    fn frame(kind: PacketKind, body: serde_json::Value) -> PacketFrame {
        PacketFrame { kind, body }
    }

    #[tokio::test]
    async fn dispatch_decodes_and_calls_the_registered_handler() {
        let invoker = HandlerInvoker::new();
        let hits = Arc::new(AtomicU32::new(0));

        let hits_clone = hits.clone();
        invoker.register_packet(PacketKind::SfxId, move |_session, packet: SfxIdPacket| {
            let hits = hits_clone.clone();
            async move {
                hits.fetch_add(packet.object_id, Ordering::SeqCst);
                Ok(())
            }
        });

        let body = serde_json::json!({"object_id": 7, "target_id": 1200, "flags": 16});
        invoker
            .dispatch_packet(session(), &frame(PacketKind::SfxId, body))
            .await
            .expect("dispatch failed");
        assert_eq!(hits.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn unregistered_tag_is_a_silent_noop() {
        let invoker = HandlerInvoker::new();
        invoker
            .dispatch_packet(
                session(),
                &frame(PacketKind::Unknown, serde_json::json!({})),
            )
            .await
            .expect("unhandled packet must not error");
    }

    #[tokio::test]
    async fn shape_mismatch_is_a_contract_violation() {
        let invoker = HandlerInvoker::new();
        invoker.register_packet(PacketKind::SfxId, |_session, _packet: SfxIdPacket| async {
            Ok(())
        });

        let err = invoker
            .dispatch_packet(
                session(),
                &frame(PacketKind::SfxId, serde_json::json!({"wrong": true})),
            )
            .await
            .expect_err("mismatched body must fail");
        assert!(matches!(err, DispatchError::Contract(_)));
    }

    #[tokio::test]
    async fn message_handlers_dispatch_by_name() {
        let invoker = HandlerInvoker::new();
        let hits = Arc::new(AtomicU32::new(0));

        #[derive(Debug, Serialize, serde::Deserialize)]
        struct Note {
            value: u32,
        }

        let hits_clone = hits.clone();
        invoker.register_message("note", move |note: Note| {
            let hits = hits_clone.clone();
            async move {
                hits.fetch_add(note.value, Ordering::SeqCst);
                Ok(())
            }
        });

        invoker
            .dispatch_message("note", &Note { value: 5 })
            .await
            .expect("dispatch failed");
        invoker
            .dispatch_message("unregistered", &Note { value: 9 })
            .await
            .expect("unregistered name must be a no-op");
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn re_registration_replaces_the_handler() {
        let invoker = HandlerInvoker::new();
        let hits = Arc::new(AtomicU32::new(0));

        invoker.register_packet(PacketKind::SfxId, |_session, _packet: SfxIdPacket| async {
            panic!("replaced handler must never run")
        });
        let hits_clone = hits.clone();
        invoker.register_packet(PacketKind::SfxId, move |_session, _packet: SfxIdPacket| {
            let hits = hits_clone.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        assert_eq!(invoker.handler_count(), 1);

        let body = serde_json::json!({"object_id": 7, "target_id": 1200, "flags": 16});
        invoker
            .dispatch_packet(session(), &frame(PacketKind::SfxId, body))
            .await
            .expect("dispatch failed");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
