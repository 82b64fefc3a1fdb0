//! Handler registrations for inbound packets and bus messages.
//!
//! Each submodule owns one gameplay concern and exposes a `register`
//! function that installs its handlers on the [`HandlerInvoker`]. The server
//! core calls every `register` during startup, before the accept socket
//! opens.

mod attack;
mod join;
mod messenger;
mod projectile;

use crate::dispatch::HandlerInvoker;
use crate::projectile::ProjectileTracker;
use crate::session::SessionManager;
use std::sync::Arc;

/// Installs every core handler.
pub fn register_all(
    invoker: &HandlerInvoker,
    sessions: Arc<SessionManager>,
    projectiles: Arc<ProjectileTracker>,
) {
    join::register(invoker, sessions.clone());
    attack::register(invoker, projectiles.clone());
    projectile::register(invoker, projectiles);
    messenger::register(invoker, sessions);
}
