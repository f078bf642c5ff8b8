use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub speed: f32,

    pub look_sensitivity: f32,
    pub look_angle_limit: f32,
    pub invert_look: bool,

    pub gravity: f32,
    pub jump_velocity: f32,
    /// Upward falling velocity kept when jump is released early.
    pub jump_release_velocity: f32,
    /// Presses are only queued while falling velocity is at or below this.
    pub jump_admit_velocity: f32,
    pub jump_input_queue_time: f32,
    pub ungrounded_grace: f32,

    pub time_between_dashes: f32,
    pub dash_forward_velocity: f32,
    pub dash_upward_velocity: f32,
    /// Direction used for a dash without directional input, scaled from up.
    pub dash_idle_lift: f32,

    /// Fraction of horizontal falling velocity kept after one second airborne.
    pub air_velocity_damping: f32,
    pub recoil_damping: f32,

    pub input_smoothing_new: f32,
    pub input_smoothing_last: f32,
    pub falling_smoothing_new: f32,
    pub falling_smoothing_last: f32,

    pub rocket_jump_window: f32,
    /// Minimum `dot(look, down)` margin: looking down when `dot > 1 - threshold`.
    pub rocket_jump_look_threshold: f32,
    pub rocket_jump_ground_probe: f32,

    pub instant_overlap_ejection: bool,
    pub overlap_ejection_speed: f32,

    pub landing_airtime: f32,
    pub animation_deadzone: f32,
    pub idle_epsilon: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: 10.0,

            look_sensitivity: 1.5,
            look_angle_limit: 80_f32.to_radians(),
            invert_look: true,

            gravity: -100.0,
            jump_velocity: 65.0,
            jump_release_velocity: 2.0,
            jump_admit_velocity: 2.0,
            jump_input_queue_time: 0.2,
            ungrounded_grace: 0.25,

            time_between_dashes: 1.0,
            dash_forward_velocity: 70.0,
            dash_upward_velocity: 30.0,
            dash_idle_lift: 0.4,

            air_velocity_damping: 0.05,
            recoil_damping: 0.0005,

            input_smoothing_new: 0.6,
            input_smoothing_last: 0.45,
            falling_smoothing_new: 0.4,
            falling_smoothing_last: 0.65,

            rocket_jump_window: 0.2,
            rocket_jump_look_threshold: 0.3,
            rocket_jump_ground_probe: 3.0,

            instant_overlap_ejection: true,
            overlap_ejection_speed: 100.0,

            landing_airtime: 0.25,
            animation_deadzone: 5.0,
            idle_epsilon: 0.1,
        }
    }
}
