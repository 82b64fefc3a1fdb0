//! # Orvane Event System
//!
//! Typed publish/subscribe infrastructure shared by every Orvane server
//! process (world nodes, the login tier, the cluster coordinator).
//!
//! The crate provides:
//!
//! - [`MessageBus`] - synchronous in-process fan-out of typed messages, the
//!   local end of the cross-process messaging fabric
//! - [`Message`] / [`MessageHandler`] - the typed message abstraction with a
//!   serde-JSON blanket implementation
//! - The closed set of cross-process payloads in [`messages`]
//! - Core identifier newtypes ([`PlayerId`], [`CharacterId`], [`SessionId`])
//! - [`ShutdownState`] for coordinated graceful shutdown
//!
//! ## Example
//!
//! ```rust,no_run
//! use orvane_event_system::{MessageBus, messages::PlayerDisconnected, CharacterId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = MessageBus::new();
//!
//! bus.subscribe(PlayerDisconnected::NAME, |message: PlayerDisconnected| {
//!     println!("character {} went offline", message.id);
//!     Ok(())
//! })
//! .await?;
//!
//! bus.publish(PlayerDisconnected::NAME, &PlayerDisconnected { id: CharacterId(7) })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod bus;
mod error;
mod message;
pub mod messages;
mod shutdown;
mod types;
mod utils;

pub use bus::{MessageBus, MessageBusStats};
pub use error::MessageError;
pub use message::{Message, MessageHandler, TypedMessageHandler};
pub use shutdown::ShutdownState;
pub use types::{CharacterId, DisconnectReason, MessengerStatus, PlayerId, SessionId};
pub use utils::current_timestamp;
