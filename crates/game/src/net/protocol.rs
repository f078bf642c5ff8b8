use rkyv::{rancor, Archive, Deserialize, Serialize};

pub const DEFAULT_TICK_RATE: u32 = 60;
pub const DEFAULT_SEND_RATE: u32 = 15;
pub const MAX_MESSAGE_SIZE: usize = 1200;

const SEQUENCE_WRAP_THRESHOLD: u32 = u32::MAX / 2;

#[inline]
pub fn sequence_greater_than(s1: u32, s2: u32) -> bool {
    ((s1 > s2) && (s1 - s2 <= SEQUENCE_WRAP_THRESHOLD))
        || ((s1 < s2) && (s2 - s1 > SEQUENCE_WRAP_THRESHOLD))
}

/// Per replication tick projection of one actor's movement state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct NetworkSnapshot {
    pub actor: u32,
    pub tick: u32,
    pub position: [f32; 3],
    pub input_velocity: [f32; 3],
    pub falling_velocity: [f32; 3],
    pub recoil_velocity: [f32; 3],
    pub look_euler: [f32; 3],
    pub actively_jumping: bool,
    pub play_jump: bool,
    pub play_dash: bool,
    pub locomotion: u8,
    pub health: f32,
    pub shield: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct DamageNotice {
    pub hit: u64,
    pub target: u32,
    pub amount: f32,
    /// Participant whose projectile landed the hit.
    pub source: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ProjectileLaunch {
    pub projectile: u64,
    pub owner_actor: u32,
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub speed: f32,
    pub damage: f32,
    pub area_of_effect: f32,
    pub homing: f32,
    pub target: Option<u32>,
    pub lifetime: f32,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum Message {
    Snapshot(NetworkSnapshot),
    ActorSpawned {
        actor: u32,
        owner: u32,
        position: [f32; 3],
    },
    ActorDestroyed {
        actor: u32,
    },
    ProjectileFired(ProjectileLaunch),
    ApplyDamage(DamageNotice),
    AddRecoil {
        actor: u32,
        impulse: [f32; 3],
    },
    /// Ask the owner to destroy one of its actors.
    DestroyActor {
        actor: u32,
    },
    /// Ask the owner to run the death sequence for one of its actors.
    RequestDeath {
        actor: u32,
    },
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Snapshot(_) => "snapshot",
            Self::ActorSpawned { .. } => "actor_spawned",
            Self::ActorDestroyed { .. } => "actor_destroyed",
            Self::ProjectileFired(_) => "projectile_fired",
            Self::ApplyDamage(_) => "apply_damage",
            Self::AddRecoil { .. } => "add_recoil",
            Self::DestroyActor { .. } => "destroy_actor",
            Self::RequestDeath { .. } => "request_death",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Envelope {
    pub from: u32,
    pub message: Message,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("message of {0} bytes exceeds the size limit")]
    TooLarge(usize),
}

impl Envelope {
    pub fn new(from: u32, message: Message) -> Self {
        Self { from, message }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ProtocolError> {
        let bytes = rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(ProtocolError::Serialize)?;
        if bytes.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::TooLarge(bytes.len()));
        }
        Ok(bytes)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, ProtocolError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(ProtocolError::Deserialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_comparison() {
        assert!(sequence_greater_than(2, 1));
        assert!(!sequence_greater_than(1, 2));
        assert!(!sequence_greater_than(5, 5));
        assert!(sequence_greater_than(0, u32::MAX));
        assert!(!sequence_greater_than(u32::MAX, 0));
    }

    #[test]
    fn test_snapshot_envelope() {
        let snapshot = NetworkSnapshot {
            actor: 7,
            tick: 42,
            position: [1.0, 2.0, 3.0],
            falling_velocity: [0.0, 65.0, 0.0],
            play_jump: true,
            health: 2.0,
            shield: 1.0,
            ..NetworkSnapshot::default()
        };
        let envelope = Envelope::new(3, Message::Snapshot(snapshot));

        let bytes = envelope.serialize().unwrap();
        let decoded = Envelope::deserialize(&bytes).unwrap();

        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result = Envelope::deserialize(&[0xff; 5]);
        assert!(matches!(result, Err(ProtocolError::Deserialize(_))));
    }
}
