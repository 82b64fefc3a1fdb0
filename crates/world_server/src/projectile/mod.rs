//! Projectile tracking and packet validation.
//!
//! A projectile is a short-lived server-side object created when a player's
//! fire action is accepted, validated against the client's echo packets, and
//! retired on arrival, invalidation, owner disconnect, or TTL expiry.
//!
//! State machine per object: `Fired -> AwaitingArrival -> {Resolved |
//! Invalidated}`, both terminal. The tracker enforces one invariant above
//! all: at most one projectile exists per `(owner, object id)` pair, and a
//! failed validation never leaves the object retrievable afterward, so a
//! forged retry from a held id goes nowhere.
//!
//! Object ids are scoped to the owning player; two players may use the same
//! id concurrently without interference. Operations on different owners
//! never block each other (the table is a sharded [`DashMap`]), and
//! operations on one key are linearizable through the map's atomic
//! remove/insert primitives.

use crate::packets::{attack_flags, SfxHitPacket};
use dashmap::DashMap;
use orvane_event_system::PlayerId;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Completion callback invoked exactly once when a projectile arrives with a
/// fully valid report.
pub type ArrivalCallback = Box<dyn FnOnce() + Send + Sync>;

/// Type tag plus the validation field specific to that type.
///
/// Each variant defines its own required match exactly once; variants
/// without a field (melee swings with a travel effect) fall back to the
/// base attacker-id check only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    /// Close-range effect, no variant field.
    Melee,
    /// Plain magic bolt, validated by magic power.
    Magic { magic_power: u32 },
    /// Skill-cast magic, validated by skill id.
    MagicSkill { skill_id: u32 },
    /// Arrow, validated by damage power.
    RangeArrow { power: u32 },
}

impl ProjectileKind {
    /// The wire attack-type flags a client must echo for this kind.
    pub fn flags(&self) -> u32 {
        match self {
            ProjectileKind::Melee => attack_flags::MELEE,
            ProjectileKind::Magic { .. } => attack_flags::MAGIC,
            ProjectileKind::MagicSkill { .. } => attack_flags::MAGIC_SKILL,
            ProjectileKind::RangeArrow { .. } => attack_flags::RANGE,
        }
    }
}

/// One tracked in-flight effect.
pub struct Projectile {
    target_id: u32,
    kind: ProjectileKind,
    on_arrived: Option<ArrivalCallback>,
    created_at: Instant,
}

impl Projectile {
    /// Creates a projectile ready for tracking.
    pub fn new(
        target_id: u32,
        kind: ProjectileKind,
        on_arrived: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            target_id,
            kind,
            on_arrived: Some(Box::new(on_arrived)),
            created_at: Instant::now(),
        }
    }

    pub fn target_id(&self) -> u32 {
        self.target_id
    }

    pub fn kind(&self) -> ProjectileKind {
        self.kind
    }
}

impl std::fmt::Debug for Projectile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projectile")
            .field("target_id", &self.target_id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Outcome of a launch-echo validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Echo matched the recorded values; the projectile stays tracked.
    Valid,
    /// Target id or flags were forged; the projectile was removed without
    /// firing its callback.
    Invalidated,
    /// No projectile tracked under this id; stale echo, nothing changed.
    NotFound,
}

/// Outcome of an arrival validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    /// All fields matched; the callback fired and the object is gone.
    Resolved,
    /// Attacker or variant field mismatched; removed, callback never fired.
    Rejected,
    /// No projectile tracked under this id; stale arrival, nothing changed.
    NotFound,
}

/// Tracks every in-flight projectile owned by players on this node.
pub struct ProjectileTracker {
    projectiles: DashMap<(PlayerId, u32), Projectile>,
}

impl ProjectileTracker {
    pub fn new() -> Self {
        Self {
            projectiles: DashMap::new(),
        }
    }

    /// Starts tracking a projectile under `(owner, object_id)`.
    ///
    /// A colliding key replaces the previous entry; the replaced projectile
    /// is implicitly invalidated and its callback never fires.
    pub fn insert(&self, owner: PlayerId, object_id: u32, projectile: Projectile) {
        if self
            .projectiles
            .insert((owner, object_id), projectile)
            .is_some()
        {
            debug!(
                "Projectile {} for player {} replaced a live entry",
                object_id, owner
            );
        }
    }

    /// Validates the client's launch echo against the recorded values.
    ///
    /// Either mismatched field invalidates the projectile: it is removed
    /// without firing its callback. The caller logs the rejection with the
    /// offending player identity.
    pub fn validate_launch(
        &self,
        owner: PlayerId,
        object_id: u32,
        reported_target_id: u32,
        reported_flags: u32,
    ) -> LaunchOutcome {
        let key = (owner, object_id);
        match self.projectiles.entry(key) {
            dashmap::Entry::Occupied(entry) => {
                let projectile = entry.get();
                let valid = projectile.target_id == reported_target_id
                    && projectile.kind.flags() == reported_flags;
                if valid {
                    LaunchOutcome::Valid
                } else {
                    entry.remove();
                    LaunchOutcome::Invalidated
                }
            }
            dashmap::Entry::Vacant(_) => LaunchOutcome::NotFound,
        }
    }

    /// Validates an arrival report and resolves the projectile.
    ///
    /// `owner` is the acting player the packet came from. Whatever the
    /// outcome short of `NotFound`, the entry is removed: a resolved
    /// projectile fired its callback, a rejected one never will.
    pub fn resolve_arrival(
        &self,
        owner: PlayerId,
        reported_attacker_id: u32,
        report: &SfxHitPacket,
    ) -> ArrivalOutcome {
        let Some((_, mut projectile)) = self.projectiles.remove(&(owner, report.object_id)) else {
            return ArrivalOutcome::NotFound;
        };

        let mut valid = reported_attacker_id == owner.0;
        valid = valid
            && match projectile.kind {
                ProjectileKind::Magic { magic_power } => report.magic_power == magic_power,
                ProjectileKind::MagicSkill { skill_id } => report.skill_id == skill_id,
                ProjectileKind::RangeArrow { power } => report.damage_power == power,
                ProjectileKind::Melee => true,
            };

        if valid {
            if let Some(on_arrived) = projectile.on_arrived.take() {
                on_arrived();
            }
            ArrivalOutcome::Resolved
        } else {
            ArrivalOutcome::Rejected
        }
    }

    /// Returns true if `(owner, object_id)` is currently tracked.
    pub fn contains(&self, owner: PlayerId, object_id: u32) -> bool {
        self.projectiles.contains_key(&(owner, object_id))
    }

    /// Drops a projectile without firing its callback.
    pub fn remove(&self, owner: PlayerId, object_id: u32) {
        self.projectiles.remove(&(owner, object_id));
    }

    /// Drops every projectile owned by `owner`. Called when the owner's
    /// session goes away.
    pub fn remove_owner(&self, owner: PlayerId) {
        self.projectiles.retain(|(key_owner, _), _| *key_owner != owner);
    }

    /// Retires projectiles older than `ttl` without firing their callbacks.
    ///
    /// Arrival packets for swept ids are treated as stale afterwards, the
    /// same as any unknown id. Returns the number of entries removed.
    pub fn sweep_expired(&self, ttl: Duration) -> usize {
        let before = self.projectiles.len();
        self.projectiles
            .retain(|_, projectile| projectile.created_at.elapsed() < ttl);
        let swept = before.saturating_sub(self.projectiles.len());
        if swept > 0 {
            info!("🧹 Swept {} expired projectile(s)", swept);
        }
        swept
    }

    /// Number of projectiles currently tracked.
    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }
}

impl Default for ProjectileTracker {
    fn default() -> Self {
        Self::new()
    }
}
