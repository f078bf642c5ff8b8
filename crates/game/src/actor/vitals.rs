use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub shield: f32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: Self::MAX_HEALTH,
            shield: Self::MAX_SHIELD,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageOutcome {
    pub absorbed: f32,
    pub taken: f32,
    /// Health crossed zero with this hit.
    pub died: bool,
}

impl Vitals {
    pub const MAX_HEALTH: f32 = 2.0;
    pub const MAX_SHIELD: f32 = 2.0;

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Shield soaks damage before health does.
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if !self.is_alive() || amount <= 0.0 {
            return DamageOutcome::default();
        }

        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let taken = (amount - absorbed).min(self.health);
        self.health -= taken;

        DamageOutcome {
            absorbed,
            taken,
            died: !self.is_alive(),
        }
    }
}
