use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::movement::{ActorInput, MovementState};
use crate::net::{ObserverState, ReplicationConfig};

use super::Vitals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl ActorId {
    const SERIAL_BITS: u32 = 20;

    /// Ids minted by different participants never collide.
    pub fn compose(owner: ParticipantId, serial: u32) -> Self {
        Self((owner.0 << Self::SERIAL_BITS) | (serial & ((1 << Self::SERIAL_BITS) - 1)))
    }
}

/// Whether this replica owns an actor's state or only mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Authority,
    Observer,
}

impl Role {
    pub fn for_owner(owner: ParticipantId, local: ParticipantId) -> Self {
        if owner == local {
            Self::Authority
        } else {
            Self::Observer
        }
    }

    pub fn is_authority(self) -> bool {
        matches!(self, Self::Authority)
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: ActorId,
    pub owner: ParticipantId,
    pub role: Role,
    pub movement: MovementState,
    pub vitals: Vitals,
    /// Latest sampled input. Only read on the authority.
    pub input: ActorInput,
    /// Smoothing state for a mirrored actor; `None` on the authority.
    pub observer: Option<ObserverState>,
    pub death_requested: bool,
}

impl Actor {
    pub fn new(
        id: ActorId,
        owner: ParticipantId,
        local: ParticipantId,
        spawn: Vec3,
        replication: &ReplicationConfig,
    ) -> Self {
        let role = Role::for_owner(owner, local);
        let observer = match role {
            Role::Authority => None,
            Role::Observer => Some(ObserverState::new(replication)),
        };

        Self {
            id,
            owner,
            role,
            movement: MovementState::at(spawn),
            vitals: Vitals::default(),
            input: ActorInput::default(),
            observer,
            death_requested: false,
        }
    }

    pub fn is_authority(&self) -> bool {
        self.role.is_authority()
    }

    pub fn position(&self) -> Vec3 {
        self.movement.position
    }

    /// Rotation to present: the true look rotation on the authority, the
    /// blended one on observers.
    pub fn display_rotation(&self) -> Quat {
        match &self.observer {
            Some(observer) => observer.smooth_rotation,
            None => self.movement.look_rotation(),
        }
    }
}
