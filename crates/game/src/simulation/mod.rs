mod config;
mod replica;
mod tick;

pub use config::SimulationConfig;
pub use replica::{Replica, ReplicaStats};
pub use tick::FixedTimestep;
