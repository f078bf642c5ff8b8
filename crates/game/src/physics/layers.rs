use bitflags::bitflags;

use crate::actor::ActorId;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionLayers: u32 {
        /// Static world geometry.
        const DEFAULT = 1 << 0;
        /// Movement capsules of actors.
        const PLAYER = 1 << 1;
        /// Damage volumes of actors, separate from the movement capsule.
        const PLAYER_HIT = 1 << 2;
    }
}

impl CollisionLayers {
    pub const PROJECTILE_MASK: Self = Self::DEFAULT.union(Self::PLAYER_HIT);
    pub const SAFETY_MASK: Self = Self::DEFAULT;
    pub const MOTOR_MASK: Self = Self::DEFAULT.union(Self::PLAYER);
}

const ACTOR_PRESENT_BIT: u128 = 1 << 32;
const ACTOR_SHIFT: u32 = 64;

/// Packs layer bits and an optional owning actor into a rapier `user_data` slot.
pub(crate) fn encode_tag(layers: CollisionLayers, actor: Option<ActorId>) -> u128 {
    let mut tag = layers.bits() as u128;
    if let Some(actor) = actor {
        tag |= ACTOR_PRESENT_BIT;
        tag |= (actor.0 as u128) << ACTOR_SHIFT;
    }
    tag
}

pub(crate) fn decode_layers(tag: u128) -> CollisionLayers {
    CollisionLayers::from_bits_truncate(tag as u32)
}

pub(crate) fn decode_actor(tag: u128) -> Option<ActorId> {
    if tag & ACTOR_PRESENT_BIT == 0 {
        return None;
    }
    Some(ActorId((tag >> ACTOR_SHIFT) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_roundtrip_keeps_layers_and_actor() {
        let tag = encode_tag(CollisionLayers::PLAYER_HIT, Some(ActorId(7)));
        assert_eq!(decode_layers(tag), CollisionLayers::PLAYER_HIT);
        assert_eq!(decode_actor(tag), Some(ActorId(7)));

        let world = encode_tag(CollisionLayers::DEFAULT, None);
        assert_eq!(decode_layers(world), CollisionLayers::DEFAULT);
        assert_eq!(decode_actor(world), None);
    }

    #[test]
    fn actor_zero_is_distinct_from_untagged() {
        let tag = encode_tag(CollisionLayers::empty(), Some(ActorId(0)));
        assert_eq!(decode_actor(tag), Some(ActorId(0)));
        assert_eq!(decode_actor(0), None);
    }

    #[test]
    fn projectile_mask_skips_movement_capsules() {
        assert!(CollisionLayers::PROJECTILE_MASK.contains(CollisionLayers::PLAYER_HIT));
        assert!(!CollisionLayers::PROJECTILE_MASK.intersects(CollisionLayers::PLAYER));
    }
}
