//! The in-process/cross-process publish-subscribe message bus.
//!
//! The bus decouples the component that raises a lifecycle or social-state
//! change (player connected, friend removed, status update) from the
//! handlers that react to it, possibly in another subsystem entirely.
//!
//! Delivery is synchronous within the publishing flow of control: `publish`
//! awaits every subscribed handler before returning. A subscriber that must
//! perform block-prone work (I/O toward another process) must hand that work
//! to an independent task with `tokio::spawn` instead of blocking inside the
//! handler, because other subscribers and the original publisher are waiting
//! on the same call.

use crate::error::MessageError;
use crate::message::{Message, MessageHandler, TypedMessageHandler};
use dashmap::DashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Bus statistics for monitoring.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MessageBusStats {
    /// Total number of registered subscribers across all message names.
    pub total_handlers: usize,
    /// Total number of messages published since startup.
    pub messages_published: u64,
}

/// Typed publish/subscribe bus.
///
/// Handlers are keyed by message name. Multiple handlers may subscribe to
/// the same name; no registration-order guarantee is made to callers.
/// Uses `DashMap` for lock-free concurrent access to the handler table.
pub struct MessageBus {
    handlers: DashMap<String, Vec<Arc<dyn MessageHandler>>>,
    stats: tokio::sync::RwLock<MessageBusStats>,
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("message_names", &self.handlers.len())
            .finish()
    }
}

impl MessageBus {
    /// Creates a new bus with no subscribers.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            stats: tokio::sync::RwLock::new(MessageBusStats::default()),
        }
    }

    /// Registers a handler for a message name.
    ///
    /// Any number of handlers may register for the same name; each delivery
    /// reaches all of them.
    pub async fn subscribe<T, F>(&self, message_name: &str, handler: F) -> Result<(), MessageError>
    where
        T: Message + 'static,
        F: Fn(T) -> Result<(), MessageError> + Send + Sync + Clone + 'static,
    {
        let handler_name = format!("{}::{}", message_name, T::type_name());
        let typed_handler: Arc<dyn MessageHandler> =
            Arc::new(TypedMessageHandler::new(handler_name, handler));

        self.handlers
            .entry(message_name.to_string())
            .or_default()
            .push(typed_handler);

        let mut stats = self.stats.write().await;
        stats.total_handlers += 1;

        info!("📝 Subscribed handler for '{}'", message_name);
        Ok(())
    }

    /// Publishes a message to every handler subscribed to `message_name`.
    ///
    /// All handlers are awaited before this method returns. A handler error
    /// is logged and contained; it does not prevent delivery to the
    /// remaining subscribers. Publishing with zero subscribers is a no-op.
    pub async fn publish<T>(&self, message_name: &str, message: &T) -> Result<(), MessageError>
    where
        T: Message,
    {
        let data = message.serialize()?;
        let subscribers = self
            .handlers
            .get(message_name)
            .map(|entry| entry.value().clone());

        match subscribers {
            Some(subscribers) if !subscribers.is_empty() => {
                debug!(
                    "📤 Publishing '{}' to {} handler(s)",
                    message_name,
                    subscribers.len()
                );

                let mut futures = FuturesUnordered::new();
                for handler in subscribers.iter() {
                    let data = data.clone();
                    let handler = handler.clone();
                    futures.push(async move {
                        if let Err(e) = handler.handle(&data).await {
                            error!("❌ Handler {} failed: {}", handler.handler_name(), e);
                        }
                    });
                }
                while futures.next().await.is_some() {}
            }
            _ => {
                trace!("No subscribers for '{}'", message_name);
            }
        }

        let mut stats = self.stats.write().await;
        stats.messages_published += 1;
        Ok(())
    }

    /// Returns a snapshot of the bus statistics.
    pub async fn get_stats(&self) -> MessageBusStats {
        self.stats.read().await.clone()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping {
        value: u32,
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn publish_reaches_every_subscriber() {
        let bus = MessageBus::new();
        let hits = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            bus.subscribe("ping", move |message: Ping| {
                hits.fetch_add(message.value, Ordering::SeqCst);
                Ok(())
            })
            .await
            .expect("subscribe failed");
        }

        bus.publish("ping", &Ping { value: 2 })
            .await
            .expect("publish failed");

        assert_eq!(hits.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn publish_without_subscribers_is_a_noop() {
        let bus = MessageBus::new();
        bus.publish("nobody_home", &Ping { value: 1 })
            .await
            .expect("publish to empty bus must not error");

        let stats = bus.get_stats().await;
        assert_eq!(stats.messages_published, 1);
        assert_eq!(stats.total_handlers, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn handler_error_does_not_stop_remaining_handlers() {
        let bus = MessageBus::new();
        let hits = Arc::new(AtomicU32::new(0));

        bus.subscribe("ping", |_message: Ping| {
            Err(MessageError::HandlerExecution("boom".into()))
        })
        .await
        .expect("subscribe failed");

        let hits_clone = hits.clone();
        bus.subscribe("ping", move |_message: Ping| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .expect("subscribe failed");

        bus.publish("ping", &Ping { value: 1 })
            .await
            .expect("publish failed");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn handlers_are_isolated_per_message_name() {
        let bus = MessageBus::new();
        let hits = Arc::new(AtomicU32::new(0));

        let hits_clone = hits.clone();
        bus.subscribe("a", move |_message: Ping| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .expect("subscribe failed");

        bus.publish("b", &Ping { value: 1 })
            .await
            .expect("publish failed");

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
