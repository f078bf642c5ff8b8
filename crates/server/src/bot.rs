use glam::Vec3;
use rand::Rng;
use rand::rngs::StdRng;

use dashfire::{ActorId, ActorInput, MovementState};

use crate::config::BotConfig;

/// What a bot wants to do this tick.
#[derive(Debug, Clone, Copy)]
pub struct BotAction {
    pub input: ActorInput,
    pub fire: bool,
    /// Fire the rocket instead of the hitscan-speed default.
    pub rocket: bool,
}

/// Wanders the arena, hops now and then, and shoots at whoever is closest.
pub struct Bot {
    pub actor: ActorId,
    heading: f32,
    config: BotConfig,
}

impl Bot {
    pub fn new(actor: ActorId, config: BotConfig, rng: &mut StdRng) -> Self {
        Self {
            actor,
            heading: rng.gen_range(0.0..std::f32::consts::TAU),
            config,
        }
    }

    pub fn think(
        &mut self,
        state: &MovementState,
        sensitivity: f32,
        nearest_enemy: Option<Vec3>,
        rng: &mut StdRng,
    ) -> BotAction {
        if rng.gen_bool(self.config.turn_chance) {
            self.heading = rng.gen_range(0.0..std::f32::consts::TAU);
        }

        // steer back toward the centre once the bot strays off the ring
        if state.position.length() > 40.0 {
            self.heading = (-state.position.x).atan2(-state.position.z);
        }

        let desired_yaw = match nearest_enemy {
            Some(enemy) => {
                let to_enemy = enemy - state.position;
                to_enemy.x.atan2(to_enemy.z)
            }
            None => self.heading,
        };
        let yaw_step = wrap_angle(desired_yaw - state.look_euler.y) / sensitivity.max(f32::EPSILON);

        let wander = wrap_angle(self.heading - state.look_euler.y);
        let mut input = ActorInput::moving(wander.sin(), wander.cos()).with_look(0.0, yaw_step);

        if rng.gen_bool(self.config.jump_chance) {
            input = input.with_jump_press().with_jump_held();
        }

        BotAction {
            input,
            fire: nearest_enemy.is_some() && rng.gen_bool(self.config.fire_chance),
            rocket: rng.gen_bool(self.config.rocket_chance),
        }
    }
}

fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU);
    wrapped - std::f32::consts::PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn wrap_angle_stays_in_range() {
        for angle in [-10.0_f32, -3.5, 0.0, 3.5, 10.0] {
            let wrapped = wrap_angle(angle);
            assert!((-std::f32::consts::PI..=std::f32::consts::PI).contains(&wrapped));
        }
    }

    #[test]
    fn bot_turns_toward_enemy() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut bot = Bot::new(ActorId(1), BotConfig::default(), &mut rng);
        let state = MovementState::at(Vec3::ZERO);

        let action = bot.think(&state, 1.0, Some(Vec3::new(5.0, 0.0, 0.0)), &mut rng);
        assert!((action.input.look_axes.y - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }
}
