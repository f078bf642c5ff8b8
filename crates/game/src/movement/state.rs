use glam::{EulerRot, Quat, Vec3};

use super::LocomotionState;

/// Grace window opened by firing a weapon straight down close to the ground.
///
/// Once consumed by a jump it stays unavailable until [`RocketJumpGrace::arm`]
/// is called again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocketJumpGrace {
    since_armed: f32,
    available: bool,
}

impl Default for RocketJumpGrace {
    fn default() -> Self {
        Self {
            since_armed: f32::INFINITY,
            available: false,
        }
    }
}

impl RocketJumpGrace {
    pub fn arm(&mut self) {
        self.since_armed = 0.0;
        self.available = true;
    }

    pub fn advance(&mut self, dt: f32) {
        self.since_armed += dt;
    }

    pub fn is_active(&self, window: f32) -> bool {
        self.available && self.since_armed < window
    }

    pub fn consume(&mut self) {
        self.available = false;
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

/// One-shot cues raised by the simulator and carried to observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementCues {
    pub jump: bool,
    pub dash: bool,
    pub landed: bool,
}

impl MovementCues {
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn any(&self) -> bool {
        self.jump || self.dash || self.landed
    }
}

#[derive(Debug, Clone)]
pub struct MovementState {
    pub position: Vec3,
    /// Pitch (x), yaw (y), roll (z) in radians.
    pub look_euler: Vec3,

    pub input_velocity: Vec3,
    pub last_input_velocity: Vec3,
    pub falling_velocity: Vec3,
    pub last_falling_velocity: Vec3,
    pub recoil_velocity: Vec3,

    pub dash_cooldown: f32,
    pub clock: f32,
    pub last_jump_input_time: Option<f32>,
    pub since_not_grounded: f32,
    pub jumps_since_grounded: u32,
    pub actively_jumping: bool,
    pub rocket_jump: RocketJumpGrace,

    pub grounded: bool,
    pub last_safe_position: Vec3,
    pub locomotion: LocomotionState,
    pub cues: MovementCues,
}

impl Default for MovementState {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl MovementState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            look_euler: Vec3::ZERO,
            input_velocity: Vec3::ZERO,
            last_input_velocity: Vec3::ZERO,
            falling_velocity: Vec3::ZERO,
            last_falling_velocity: Vec3::ZERO,
            recoil_velocity: Vec3::ZERO,
            dash_cooldown: 0.0,
            clock: 0.0,
            last_jump_input_time: None,
            since_not_grounded: 0.0,
            jumps_since_grounded: 0,
            actively_jumping: false,
            rocket_jump: RocketJumpGrace::default(),
            grounded: false,
            last_safe_position: position,
            locomotion: LocomotionState::Idle,
            cues: MovementCues::default(),
        }
    }

    pub fn yaw_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.look_euler.y)
    }

    pub fn look_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.look_euler.y, self.look_euler.x, self.look_euler.z)
    }

    pub fn forward(&self) -> Vec3 {
        self.yaw_rotation() * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.yaw_rotation() * Vec3::X
    }

    /// Direction the camera looks along; positive pitch looks down.
    pub fn look_direction(&self) -> Vec3 {
        self.look_rotation() * Vec3::Z
    }

    pub fn has_queued_jump(&self, queue_time: f32) -> bool {
        self.last_jump_input_time
            .is_some_and(|pressed_at| self.clock - pressed_at <= queue_time)
    }

    /// Adds an external impulse. An upward kick counts as having left the
    /// ground so the ungrounded grace does not allow an immediate re-jump.
    pub fn add_recoil(&mut self, impulse: Vec3, ungrounded_grace: f32) {
        self.recoil_velocity += impulse;
        if impulse.y > 0.0 {
            self.since_not_grounded = ungrounded_grace;
        }
    }

    pub fn reset_velocities(&mut self) {
        self.recoil_velocity = Vec3::ZERO;
        self.falling_velocity = Vec3::ZERO;
    }

    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.last_safe_position = position;
        self.reset_velocities();
        self.last_falling_velocity = Vec3::ZERO;
        self.last_input_velocity = Vec3::ZERO;
        self.input_velocity = Vec3::ZERO;
        self.locomotion = LocomotionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rocket_jump_grace_expires_and_consumes() {
        let mut grace = RocketJumpGrace::default();
        assert!(!grace.is_active(0.2));

        grace.arm();
        grace.advance(0.1);
        assert!(grace.is_active(0.2));

        grace.consume();
        assert!(!grace.is_active(0.2));

        grace.arm();
        grace.advance(0.25);
        assert!(!grace.is_active(0.2));
        assert!(grace.is_available());
    }

    #[test]
    fn upward_recoil_marks_ungrounded() {
        let mut state = MovementState::default();
        state.add_recoil(Vec3::new(0.0, 10.0, 0.0), 0.25);
        assert_eq!(state.since_not_grounded, 0.25);

        let mut flat = MovementState::default();
        flat.add_recoil(Vec3::new(5.0, 0.0, 0.0), 0.25);
        assert_eq!(flat.since_not_grounded, 0.0);
        assert_eq!(flat.recoil_velocity, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn forward_and_right_follow_yaw() {
        let mut state = MovementState::default();
        assert!((state.forward() - Vec3::Z).length() < 1e-5);
        assert!((state.right() - Vec3::X).length() < 1e-5);

        state.look_euler.y = std::f32::consts::FRAC_PI_2;
        assert!((state.forward() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn positive_pitch_looks_down() {
        let mut state = MovementState::default();
        state.look_euler.x = std::f32::consts::FRAC_PI_2;
        assert!(state.look_direction().dot(Vec3::NEG_Y) > 0.99);
    }

    #[test]
    fn cues_take_clears() {
        let mut state = MovementState::default();
        state.cues.jump = true;
        let taken = state.cues.take();
        assert!(taken.jump);
        assert!(!state.cues.any());
    }
}
