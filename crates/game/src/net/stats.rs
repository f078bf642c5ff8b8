use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkConditionsError {
    #[error("{field} must be a percentage between 0 and 100, got {value}")]
    Percent { field: &'static str, value: f32 },
    #[error("min_delay_ticks ({min}) exceeds max_delay_ticks ({max})")]
    DelayRange { min: u32, max: u32 },
}

/// Impairments applied by the loopback link. Delays are in hub ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConditions {
    pub loss_percent: f32,
    pub duplicate_percent: f32,
    /// Chance that a packet is held back a few extra ticks, overtaking order.
    pub reorder_percent: f32,
    pub min_delay_ticks: u32,
    pub max_delay_ticks: u32,
    pub seed: u64,
}

impl Default for LinkConditions {
    fn default() -> Self {
        Self {
            loss_percent: 0.0,
            duplicate_percent: 0.0,
            reorder_percent: 0.0,
            min_delay_ticks: 0,
            max_delay_ticks: 0,
            seed: 0x4441_5348,
        }
    }
}

impl LinkConditions {
    pub const MAX_REORDER_TICKS: u32 = 3;

    pub fn perfect() -> Self {
        Self::default()
    }

    /// Rejects percentages outside 0..=100 (NaN included) and inverted
    /// delay bounds.
    pub fn validate(&self) -> Result<(), LinkConditionsError> {
        let percents = [
            ("loss_percent", self.loss_percent),
            ("duplicate_percent", self.duplicate_percent),
            ("reorder_percent", self.reorder_percent),
        ];
        for (field, value) in percents {
            if !(0.0..=100.0).contains(&value) {
                return Err(LinkConditionsError::Percent { field, value });
            }
        }
        if self.min_delay_ticks > self.max_delay_ticks {
            return Err(LinkConditionsError::DelayRange {
                min: self.min_delay_ticks,
                max: self.max_delay_ticks,
            });
        }
        Ok(())
    }

    pub fn should_drop(&self, rng: &mut StdRng) -> bool {
        chance(rng, self.loss_percent)
    }

    pub fn should_duplicate(&self, rng: &mut StdRng) -> bool {
        chance(rng, self.duplicate_percent)
    }

    pub fn delay_ticks(&self, rng: &mut StdRng) -> u32 {
        let base = if self.max_delay_ticks > self.min_delay_ticks {
            rng.gen_range(self.min_delay_ticks..=self.max_delay_ticks)
        } else {
            self.min_delay_ticks
        };
        let held = if chance(rng, self.reorder_percent) {
            rng.gen_range(1..=Self::MAX_REORDER_TICKS)
        } else {
            0
        };
        base + held
    }
}

fn chance(rng: &mut StdRng, percent: f32) -> bool {
    if percent.is_nan() || percent <= 0.0 {
        return false;
    }
    rng.gen_bool((percent as f64 / 100.0).clamp(0.0, 1.0))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub packets_dropped: u64,
    pub packets_duplicated: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl LinkStats {
    pub fn loss_percent(&self) -> f32 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        self.packets_dropped as f32 / self.packets_sent as f32 * 100.0
    }
}
