//! Wire packet types and frame codec.
//!
//! Every packet is a fixed tag ([`PacketKind`]) paired with a decoded serde
//! body. On the wire a packet travels as one length-prefixed frame:
//! a `u32` little-endian body length followed by the JSON document
//! `{"kind": ..., "body": ...}`. The historical fixed binary layout is
//! isolated behind [`encode_frame`] / [`decode_frame`]; nothing above this
//! module knows about bytes.
//!
//! Unknown tags decode fine and are dropped later by the handler invoker;
//! an unhandled packet type is expected traffic, not an error.

use crate::error::ServerError;
use orvane_event_system::CharacterId;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Attack-type flags echoed by the client on projectile packets.
///
/// Kept as plain bit constants rather than an enum: the wire value is a
/// combinable flag set and unknown bits must survive a round trip.
pub mod attack_flags {
    /// Close-range physical attack.
    pub const MELEE: u32 = 0x0000_0001;
    /// Ranged physical attack (arrows).
    pub const RANGE: u32 = 0x0000_0002;
    /// Plain magic bolt.
    pub const MAGIC: u32 = 0x0000_0010;
    /// Magic cast through a skill.
    pub const MAGIC_SKILL: u32 = 0x0000_0020;
}

/// Closed set of packet tags the core consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketKind {
    /// Session identity announcement after the login handoff.
    Join,
    /// Magic bolt launch request.
    MagicAttack,
    /// Client echo acknowledging a projectile launch.
    SfxId,
    /// Client report that a projectile arrived at its target.
    SfxHit,
    /// Outbound messenger chat line delivered to a connected recipient.
    MessengerChat,
    /// Any tag this node does not understand.
    #[serde(other)]
    Unknown,
}

/// Identity announcement. Stands in for the full login/cluster handoff,
/// which happens against the login tier before the client reaches a world
/// node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPacket {
    /// Authenticated account id.
    pub user_id: u32,
    /// Persistent character id selected at the cluster tier.
    pub character_id: CharacterId,
    /// Character display name.
    pub name: String,
}

/// Magic bolt launch request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicAttackPacket {
    /// Client-chosen projectile id, scoped to the firing player.
    pub object_id: u32,
    /// Entity the bolt was aimed at.
    pub target_id: u32,
    /// Magic power the client claims to cast with.
    pub magic_power: u32,
}

/// Client echo acknowledging a projectile launch (`SFX_ID`).
///
/// The values must match what the server recorded when the projectile was
/// created; this is the first anti-cheat checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SfxIdPacket {
    /// Projectile id being acknowledged.
    pub object_id: u32,
    /// Target the client claims the projectile flies toward.
    pub target_id: u32,
    /// Attack-type flags the client claims.
    pub flags: u32,
}

/// Client report that a projectile arrived (`SFX_HIT`).
///
/// Only the field matching the projectile's recorded kind is validated;
/// the others ride along as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SfxHitPacket {
    /// Projectile id that arrived.
    pub object_id: u32,
    /// Player the client claims fired the projectile.
    pub attacker_id: u32,
    /// Magic power for `Magic` projectiles.
    pub magic_power: u32,
    /// Skill id for `MagicSkill` projectiles.
    pub skill_id: u32,
    /// Damage power for `RangeArrow` projectiles.
    pub damage_power: u32,
}

/// One decoded frame: tag plus the still-serialized body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketFrame {
    /// Packet tag.
    pub kind: PacketKind,
    /// Serialized body, decoded by the handler registered for `kind`.
    pub body: serde_json::Value,
}

impl PacketFrame {
    /// Decodes the body into the packet struct the handler expects.
    pub fn decode_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }
}

/// Encodes a packet into one length-prefixed frame ready to write.
pub fn encode_frame<T: Serialize>(kind: PacketKind, body: &T) -> Result<Vec<u8>, ServerError> {
    let frame = PacketFrame {
        kind,
        body: serde_json::to_value(body)
            .map_err(|e| ServerError::Internal(format!("packet body serialization: {e}")))?,
    };
    let payload = serde_json::to_vec(&frame)
        .map_err(|e| ServerError::Internal(format!("frame serialization: {e}")))?;

    let mut bytes = Vec::with_capacity(4 + payload.len());
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes one frame body (the bytes after the length prefix).
pub fn decode_frame(payload: &[u8]) -> Result<PacketFrame, ServerError> {
    serde_json::from_slice(payload)
        .map_err(|e| ServerError::Network(format!("malformed packet frame: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_survives_encode_decode() {
        let packet = SfxIdPacket {
            object_id: 7,
            target_id: 1200,
            flags: attack_flags::MAGIC,
        };

        let bytes = encode_frame(PacketKind::SfxId, &packet).expect("encode failed");
        let length = u32::from_le_bytes(bytes[..4].try_into().unwrap()) as usize;
        assert_eq!(length, bytes.len() - 4);

        let frame = decode_frame(&bytes[4..]).expect("decode failed");
        assert_eq!(frame.kind, PacketKind::SfxId);
        let back: SfxIdPacket = frame.decode_body().expect("body decode failed");
        assert_eq!(back.object_id, 7);
        assert_eq!(back.target_id, 1200);
        assert_eq!(back.flags, attack_flags::MAGIC);
    }

    #[test]
    fn malformed_frame_is_a_network_error() {
        let err = decode_frame(b"not json").expect_err("must fail");
        assert!(matches!(err, ServerError::Network(_)));
    }
}
