mod animation;
mod config;
mod input;
mod simulator;
mod state;

pub use animation::{LocomotionState, select_locomotion};
pub use config::MovementConfig;
pub use input::ActorInput;
pub use simulator::{MovementSimulator, TickReport};
pub use state::{MovementCues, MovementState, RocketJumpGrace};
