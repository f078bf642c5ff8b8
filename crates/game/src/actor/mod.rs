mod entity;
mod registry;
mod vitals;

pub use entity::{Actor, ActorId, ParticipantId, Role};
pub use registry::ActorRegistry;
pub use vitals::{DamageOutcome, Vitals};
