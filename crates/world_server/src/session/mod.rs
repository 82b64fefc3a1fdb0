//! Client sessions and the per-node session registry.

mod client;
mod manager;

pub use client::{ClientSession, SessionIdentity};
pub use manager::SessionManager;
