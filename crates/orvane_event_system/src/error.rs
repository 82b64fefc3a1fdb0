//! Error types for the message bus.

use thiserror::Error;

/// Errors raised while serializing, routing, or executing bus messages.
#[derive(Debug, Error)]
pub enum MessageError {
    /// A message payload could not be serialized for delivery.
    #[error("Serialization failed: {0}")]
    Serialization(serde_json::Error),

    /// A delivered payload did not match the shape the handler expects.
    #[error("Deserialization failed: {0}")]
    Deserialization(serde_json::Error),

    /// A subscriber returned an error while processing a message.
    #[error("Handler execution failed: {0}")]
    HandlerExecution(String),
}
