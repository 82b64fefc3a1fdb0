//! Error types and handling for the world server.
//!
//! This module defines the error types that can occur during server
//! operations, providing clear categorization of different failure modes.
//! Validation rejections (bad projectile echoes, wrong attacker ids) are
//! deliberately NOT errors: they are logged and dropped where they occur.

/// Enumeration of possible server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or broken transports.
    #[error("Network error: {0}")]
    Network(String),

    /// The persistence layer is unreachable. Fatal during startup.
    #[error("Database error: {0}")]
    Database(String),

    /// A resource table or subsystem failed to load during startup.
    #[error("Resource error: {0}")]
    Resource(String),

    /// Internal server errors including bus and dispatch failures.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors surfaced by the handler invoker.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The payload did not match the shape declared by the registered
    /// handler. This is a programming error, not a runtime condition.
    #[error("Dispatch contract violation: {0}")]
    Contract(String),

    /// The handler itself failed while processing a valid payload.
    #[error("Handler failed: {0}")]
    Handler(String),
}
