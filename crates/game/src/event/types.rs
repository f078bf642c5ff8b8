use glam::Vec3;

use crate::actor::{ActorId, ParticipantId};
use crate::weapon::{ImpactKind, ProjectileId};

/// Something a replica observed this tick that presentation layers
/// (sound, effects, scoreboards) may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicaEvent {
    ActorSpawned {
        actor: ActorId,
        owner: ParticipantId,
        position: Vec3,
    },
    ActorDestroyed {
        actor: ActorId,
    },
    ActorDied {
        actor: ActorId,
        killer: Option<ParticipantId>,
    },
    Jumped {
        actor: ActorId,
    },
    Dashed {
        actor: ActorId,
    },
    Landed {
        actor: ActorId,
    },
    ProjectileFired {
        projectile: ProjectileId,
        owner_actor: ActorId,
    },
    Impact {
        projectile: ProjectileId,
        point: Vec3,
        kind: ImpactKind,
        authoritative: bool,
    },
    DamageTaken {
        actor: ActorId,
        amount: f32,
        absorbed: f32,
        source: ParticipantId,
    },
}

impl ReplicaEvent {
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            Self::ActorSpawned { actor, .. }
            | Self::ActorDestroyed { actor }
            | Self::ActorDied { actor, .. }
            | Self::Jumped { actor }
            | Self::Dashed { actor }
            | Self::Landed { actor }
            | Self::DamageTaken { actor, .. } => Some(*actor),
            Self::ProjectileFired { owner_actor, .. } => Some(*owner_actor),
            Self::Impact { .. } => None,
        }
    }

    /// Cosmetic cues that are fine to lose when the queue overflows.
    pub fn is_cosmetic(&self) -> bool {
        matches!(
            self,
            Self::Jumped { .. } | Self::Dashed { .. } | Self::Landed { .. } | Self::Impact { .. }
        )
    }
}
