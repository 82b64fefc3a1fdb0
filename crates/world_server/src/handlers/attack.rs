//! Attack requests that spawn projectiles.

use crate::dispatch::HandlerInvoker;
use crate::packets::{MagicAttackPacket, PacketKind};
use crate::projectile::{Projectile, ProjectileKind, ProjectileTracker};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registers the magic attack handler.
///
/// A magic attack from an authenticated player creates a tracked projectile
/// keyed by the client-chosen object id. The arrival callback applies the
/// hit once the client's echo and arrival reports both validate.
pub fn register(invoker: &HandlerInvoker, projectiles: Arc<ProjectileTracker>) {
    invoker.register_packet(
        PacketKind::MagicAttack,
        move |session, packet: MagicAttackPacket| {
            let projectiles = projectiles.clone();
            async move {
                let Some(owner) = session.player_id() else {
                    warn!("{} fired before joining, dropping attack", session);
                    return Ok(());
                };

                let target_id = packet.target_id;
                let magic_power = packet.magic_power;
                let projectile = Projectile::new(
                    target_id,
                    ProjectileKind::Magic { magic_power },
                    move || {
                        // Damage application lives with the combat system;
                        // resolving the projectile is what gates it.
                        info!(
                            "💥 Magic bolt from player {} hit target {} (power {})",
                            owner, target_id, magic_power
                        );
                    },
                );

                projectiles.insert(owner, packet.object_id, projectile);
                debug!(
                    "Player {} fired projectile {} at target {}",
                    owner, packet.object_id, target_id
                );
                Ok(())
            }
        },
    );
}
