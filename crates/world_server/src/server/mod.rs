//! Server core: startup ordering, accept loop, shutdown.

mod connection;
mod core;

pub use core::WorldServer;
