mod loopback;
mod protocol;
mod replicator;
mod stats;
mod transport;

pub use loopback::LoopbackHub;
pub use protocol::{
    sequence_greater_than, DamageNotice, Envelope, Message, NetworkSnapshot, ProjectileLaunch,
    ProtocolError, DEFAULT_SEND_RATE, DEFAULT_TICK_RATE, MAX_MESSAGE_SIZE,
};
pub use replicator::{NetworkStateReplicator, ObserverState, ReplicationConfig, SnapshotApply};
pub use stats::{LinkConditions, LinkConditionsError, LinkStats};
pub use transport::{Target, Transport};
