use serde::{Deserialize, Serialize};

use crate::movement::MovementConfig;
use crate::net::{ReplicationConfig, DEFAULT_TICK_RATE};
use crate::weapon::ProjectileConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_rate: u32,
    pub movement: MovementConfig,
    pub weapon: ProjectileConfig,
    pub replication: ReplicationConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            movement: MovementConfig::default(),
            weapon: ProjectileConfig::default(),
            replication: ReplicationConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}
