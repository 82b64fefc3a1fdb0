//! # Message Traits and Handler Infrastructure
//!
//! This module defines the typed message abstraction used by the
//! [`MessageBus`](crate::bus::MessageBus): the fundamental [`Message`] trait,
//! the [`MessageHandler`] abstraction the bus dispatches through, and the
//! [`TypedMessageHandler`] wrapper that bridges the two.
//!
//! ## Design Principles
//!
//! - **Type Safety**: messages are strongly typed; handlers declare the
//!   payload shape they expect and the wrapper enforces it at dispatch time
//! - **Serialization**: built-in JSON serialization so the same payloads can
//!   cross process boundaries unchanged
//! - **Immutability**: messages are passed by value to subscribers; a
//!   subscriber must never mutate and re-publish the instance it received

use crate::error::MessageError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::any::{Any, TypeId};
use std::fmt::Debug;

/// Core trait that all bus messages must implement.
///
/// Most types get this for free through the blanket implementation: anything
/// that is `Serialize + DeserializeOwned + Send + Sync + Debug + 'static`
/// is a valid message.
pub trait Message: Send + Sync + Any + Debug {
    /// Returns a stable type name for routing and diagnostics.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// Serializes the message for delivery or cross-process transmission.
    fn serialize(&self) -> Result<Vec<u8>, MessageError>;

    /// Deserializes a message previously produced by [`Message::serialize`].
    fn deserialize(data: &[u8]) -> Result<Self, MessageError>
    where
        Self: Sized;
}

impl<T> Message for T
where
    T: Serialize + DeserializeOwned + Send + Sync + Any + Debug + 'static,
{
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn serialize(&self) -> Result<Vec<u8>, MessageError> {
        serde_json::to_vec(self).map_err(|e| {
            tracing::error!(
                "Message serialization failed for type '{}': {}",
                Self::type_name(),
                e
            );
            MessageError::Serialization(e)
        })
    }

    fn deserialize(data: &[u8]) -> Result<Self, MessageError> {
        serde_json::from_slice(data).map_err(|e| {
            tracing::error!(
                "Message deserialization failed for type '{}': {} ({} bytes)",
                Self::type_name(),
                e,
                data.len()
            );
            MessageError::Deserialization(e)
        })
    }
}

/// Handler trait the bus dispatches serialized messages through.
///
/// Users normally do not implement this directly; [`TypedMessageHandler`]
/// adapts a plain closure over a concrete message type.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static + Debug {
    /// Handles one serialized message.
    async fn handle(&self, data: &[u8]) -> Result<(), MessageError>;

    /// The payload type this handler expects, for routing sanity checks.
    fn expected_type_id(&self) -> TypeId;

    /// Human-readable handler name for diagnostics.
    fn handler_name(&self) -> &str;
}

/// Type-safe wrapper bridging a typed closure to the generic
/// [`MessageHandler`] interface.
pub struct TypedMessageHandler<T, F>
where
    T: Message,
    F: Fn(T) -> Result<(), MessageError> + Send + Sync,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<T>,
}

impl<T, F> TypedMessageHandler<T, F>
where
    T: Message,
    F: Fn(T) -> Result<(), MessageError> + Send + Sync,
{
    /// Creates a new typed handler with a diagnostic name.
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T, F> Debug for TypedMessageHandler<T, F>
where
    T: Message,
    F: Fn(T) -> Result<(), MessageError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedMessageHandler")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<T, F> MessageHandler for TypedMessageHandler<T, F>
where
    T: Message + 'static,
    F: Fn(T) -> Result<(), MessageError> + Send + Sync + Clone + 'static,
{
    async fn handle(&self, data: &[u8]) -> Result<(), MessageError> {
        let message = T::deserialize(data)?;
        (self.handler)(message)
    }

    fn expected_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}
