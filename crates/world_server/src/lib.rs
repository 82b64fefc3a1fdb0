//! # Orvane World Server
//!
//! The authoritative world node of the Orvane cluster. One process owns the
//! live state for its channel: connected sessions, the projectiles they
//! fire, and the cluster-visible reachability record other tiers route by.
//!
//! ## Architecture
//!
//! - **Sessions** ([`session`]): every connection gets a [`ClientSession`];
//!   the [`SessionManager`] owns the registry and the connect/disconnect
//!   lifecycle, including the projectile sweep on disconnect.
//! - **Dispatch** ([`dispatch`]): inbound packets and cluster bus messages
//!   route through the [`HandlerInvoker`], one typed handler per tag.
//! - **Projectiles** ([`projectile`]): fire-and-validate tracking with the
//!   anti-cheat checks on the client's echo and arrival reports.
//! - **Cluster** ([`cluster`]): the shared cache seam and the
//!   [`WorldChannel`] record lifecycle.
//! - **Server** ([`server`]): ordered startup, the accept loop, and
//!   graceful shutdown.

pub mod cluster;
pub mod config;
pub mod database;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod packets;
pub mod projectile;
pub mod resources;
pub mod server;
pub mod session;

pub use cluster::{CacheManager, CacheType, ClusterCache, ClusterCacheExt, InMemoryCacheManager, WorldChannel};
pub use config::WorldConfig;
pub use database::{StaticDatabase, WorldDatabase};
pub use dispatch::{DispatchTag, HandlerInvoker};
pub use error::{DispatchError, ServerError};
pub use packets::{
    attack_flags, decode_frame, encode_frame, JoinPacket, MagicAttackPacket, PacketFrame,
    PacketKind, SfxHitPacket, SfxIdPacket,
};
pub use projectile::{
    ArrivalOutcome, LaunchOutcome, Projectile, ProjectileKind, ProjectileTracker,
};
pub use resources::{BehaviorManager, ChatCommandManager, GameResources, MapManager, ResourceLoader};
pub use server::WorldServer;
pub use session::{ClientSession, SessionIdentity, SessionManager};

#[cfg(test)]
mod tests;
