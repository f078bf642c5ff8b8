use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use dashfire::{LinkConditions, ProjectileConfig, SimulationConfig};

/// Scripted behaviour for the bot driving each participant's actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Chance per tick of pressing jump.
    pub jump_chance: f64,
    /// Chance per tick of firing at the nearest other actor.
    pub fire_chance: f64,
    /// Chance per tick of picking a new wander heading.
    pub turn_chance: f64,
    pub rocket_chance: f64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            jump_chance: 0.02,
            fire_chance: 0.03,
            turn_chance: 0.01,
            rocket_chance: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub participants: u32,
    /// Ticks to run before stopping; `0` runs until interrupted.
    pub ticks: u64,
    pub realtime: bool,
    pub seed: u64,
    pub simulation: SimulationConfig,
    pub rocket: ProjectileConfig,
    pub link: LinkConditions,
    pub bots: BotConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            participants: 4,
            ticks: 3600,
            realtime: false,
            seed: 1,
            simulation: SimulationConfig::default(),
            rocket: ProjectileConfig::rocket(),
            link: LinkConditions::default(),
            bots: BotConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            ron::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.link.validate().context("invalid link conditions")?;
        self.bots.validate()
    }
}

impl BotConfig {
    /// Chances are probabilities in 0..=1; anything else (NaN included) is rejected.
    pub fn validate(&self) -> Result<()> {
        let chances = [
            ("jump_chance", self.jump_chance),
            ("fire_chance", self.fire_chance),
            ("turn_chance", self.turn_chance),
            ("rocket_chance", self.rocket_chance),
        ];
        for (field, value) in chances {
            ensure!((0.0..=1.0).contains(&value), "bot {field} must be between 0 and 1, got {value}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults() {
        let config: SessionConfig =
            ron::from_str("(participants: 2, link: (loss_percent: 5.0))").unwrap();

        assert_eq!(config.participants, 2);
        assert_eq!(config.link.loss_percent, 5.0);
        assert_eq!(config.ticks, 3600);
        assert_eq!(config.simulation.tick_rate, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_finite_link_percent_is_rejected() {
        let config: SessionConfig = ron::from_str("(link: (duplicate_percent: NaN))").unwrap();
        assert!(config.validate().is_err());

        let config: SessionConfig = ron::from_str("(link: (loss_percent: inf))").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_bot_chance_is_rejected() {
        let config = SessionConfig {
            bots: BotConfig {
                fire_chance: 1.5,
                ..BotConfig::default()
            },
            ..SessionConfig::default()
        };
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("fire_chance"));
    }

    #[test]
    fn load_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("dashfire-invalid-{}.ron", std::process::id()));
        std::fs::write(&path, "(link: (reorder_percent: NaN))").unwrap();

        let result = SessionConfig::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
