//! Projectile echo and arrival validation.

use crate::dispatch::HandlerInvoker;
use crate::packets::{PacketKind, SfxHitPacket, SfxIdPacket};
use crate::projectile::{ArrivalOutcome, LaunchOutcome, ProjectileTracker};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Registers the `SfxId` (launch echo) and `SfxHit` (arrival) handlers.
///
/// Both validate the client's claims against the projectile recorded at
/// fire time. A rejection is logged against the player and the projectile
/// is dropped; nothing is reported back to the client, so a cheating client
/// learns nothing about which check it tripped.
pub fn register(invoker: &HandlerInvoker, projectiles: Arc<ProjectileTracker>) {
    let launch_tracker = projectiles.clone();
    invoker.register_packet(PacketKind::SfxId, move |session, packet: SfxIdPacket| {
        let projectiles = launch_tracker.clone();
        async move {
            let Some(owner) = session.player_id() else {
                warn!("{} sent a launch echo before joining", session);
                return Ok(());
            };

            match projectiles.validate_launch(owner, packet.object_id, packet.target_id, packet.flags)
            {
                LaunchOutcome::Valid => {}
                LaunchOutcome::Invalidated => {
                    error!(
                        "❌ {} echoed projectile {} with forged target {} or flags {:#x}",
                        session, packet.object_id, packet.target_id, packet.flags
                    );
                }
                LaunchOutcome::NotFound => {
                    debug!(
                        "{} echoed unknown projectile {}, stale",
                        session, packet.object_id
                    );
                }
            }
            Ok(())
        }
    });

    invoker.register_packet(PacketKind::SfxHit, move |session, packet: SfxHitPacket| {
        let projectiles = projectiles.clone();
        async move {
            let Some(owner) = session.player_id() else {
                warn!("{} sent an arrival report before joining", session);
                return Ok(());
            };

            match projectiles.resolve_arrival(owner, packet.attacker_id, &packet) {
                ArrivalOutcome::Resolved => {}
                ArrivalOutcome::Rejected => {
                    error!(
                        "❌ {} reported an invalid hit for projectile {} (attacker {})",
                        session, packet.object_id, packet.attacker_id
                    );
                }
                ArrivalOutcome::NotFound => {
                    debug!(
                        "Cannot find projectile {} for {}, stale arrival",
                        packet.object_id, session
                    );
                }
            }
            Ok(())
        }
    });
}
