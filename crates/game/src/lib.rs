pub mod actor;
pub mod event;
pub mod interpolation;
pub mod map;
pub mod movement;
pub mod net;
pub mod physics;
pub mod simulation;
pub mod weapon;

pub use actor::{Actor, ActorId, ActorRegistry, ParticipantId, Role, Vitals};
pub use event::{EventQueue, PendingEvent, ReplicaEvent};
pub use interpolation::{Interpolator, RotationInterpolator, VectorInterpolator};
pub use map::Arena;
pub use movement::{ActorInput, MovementConfig, MovementSimulator, MovementState, TickReport};
pub use net::{
    DEFAULT_SEND_RATE, DEFAULT_TICK_RATE, Envelope, LinkConditions, LinkConditionsError, LinkStats,
    LoopbackHub,
    Message, NetworkSnapshot, NetworkStateReplicator, ReplicationConfig, Target, Transport,
};
pub use physics::PhysicsWorld;
pub use simulation::{FixedTimestep, Replica, ReplicaStats, SimulationConfig};
pub use weapon::{DamageEvent, DamageLedger, Projectile, ProjectileConfig, ProjectileId};
