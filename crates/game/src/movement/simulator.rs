use glam::Vec3;

use crate::actor::{ActorId, Role};
use crate::physics::{CharacterMotor, CollisionLayers};

use super::animation::select_locomotion;
use super::{ActorInput, LocomotionState, MovementConfig, MovementState};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// The actor had no collision body; nothing was simulated.
    pub skipped: bool,
    pub jumped: bool,
    pub dash_impulse: Option<Vec3>,
    pub landed: bool,
    pub overlap_corrected: bool,
    pub locomotion: LocomotionState,
}

impl TickReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn dashed(&self) -> bool {
        self.dash_impulse.is_some()
    }
}

pub struct MovementSimulator {
    config: MovementConfig,
}

impl Default for MovementSimulator {
    fn default() -> Self {
        Self::new(MovementConfig::default())
    }
}

impl MovementSimulator {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Advances one actor by `dt`.
    ///
    /// Authorities sample `input` and resolve queued jumps and dashes. Observers
    /// ignore `input` and only integrate the velocities last received from the
    /// authority.
    pub fn tick<M: CharacterMotor>(
        &self,
        role: Role,
        actor: ActorId,
        state: &mut MovementState,
        input: &ActorInput,
        motor: &mut M,
        dt: f32,
    ) -> TickReport {
        if !motor.has_body(actor) {
            return TickReport::skipped();
        }

        state.clock += dt;
        state.rocket_jump.advance(dt);

        let mut report = TickReport::default();

        if role.is_authority() {
            self.sample_input(state, input);
        }

        let smoothed_input = state.input_velocity * self.config.input_smoothing_new
            + state.last_input_velocity * self.config.input_smoothing_last;
        state.last_input_velocity = smoothed_input;

        state.dash_cooldown = (state.dash_cooldown - dt).max(0.0);

        let just_jumped = match role {
            Role::Authority => self.resolve_jump_or_dash(state, input, &mut report),
            Role::Observer => false,
        };

        self.integrate_vertical(state, just_jumped, dt);

        if state.grounded && !just_jumped {
            state.locomotion = select_locomotion(
                state.locomotion,
                smoothed_input,
                state.forward(),
                state.right(),
                self.config.animation_deadzone,
                self.config.idle_epsilon,
            );
        }

        let smoothed_falling = state.falling_velocity * self.config.falling_smoothing_new
            + state.last_falling_velocity * self.config.falling_smoothing_last;
        state.last_falling_velocity = smoothed_falling;

        self.damp_recoil(state, dt);

        let movement = (smoothed_falling + smoothed_input + state.recoil_velocity) * dt;
        report.overlap_corrected = self.move_and_correct(actor, state, movement, motor, dt);

        if state.grounded {
            if state.since_not_grounded > self.config.landing_airtime {
                state.cues.landed = true;
                report.landed = true;
            }
            state.recoil_velocity.y = 0.0;
        }

        report.locomotion = state.locomotion;
        report
    }

    /// Opens the rocket-jump grace if the actor fired while looking steeply
    /// down with ground close beneath it.
    pub fn notify_weapon_fired<M: CharacterMotor>(
        &self,
        actor: ActorId,
        state: &mut MovementState,
        motor: &M,
    ) -> bool {
        let looking_down = state.look_direction().dot(Vec3::NEG_Y)
            > 1.0 - self.config.rocket_jump_look_threshold;
        if !looking_down {
            return false;
        }

        let probe = state.position - Vec3::Y * self.config.rocket_jump_ground_probe;
        if motor.overlaps(actor, probe, CollisionLayers::SAFETY_MASK) {
            state.rocket_jump.arm();
            true
        } else {
            false
        }
    }

    fn sample_input(&self, state: &mut MovementState, input: &ActorInput) {
        let cfg = &self.config;

        let mut velocity = input.move_axes.x * state.right() + input.move_axes.y * state.forward();
        if velocity.length_squared() > 1.0 {
            velocity = velocity.normalize();
        }
        state.input_velocity = velocity * cfg.speed;

        if input.jump_pressed
            && state.falling_velocity.y <= cfg.jump_admit_velocity
            && !(state.since_not_grounded > 0.0 && state.jumps_since_grounded > 1)
        {
            state.jumps_since_grounded += 1;
            state.last_jump_input_time = Some(state.clock);
        }

        if !input.jump_held {
            state.actively_jumping = false;
            if state.falling_velocity.y > cfg.jump_release_velocity {
                state.falling_velocity.y = cfg.jump_release_velocity;
            }
        }

        let invert = if cfg.invert_look { -1.0 } else { 1.0 };
        state.look_euler.x += cfg.look_sensitivity * input.look_axes.x * invert;
        state.look_euler.y += cfg.look_sensitivity * input.look_axes.y;
        state.look_euler.x = state
            .look_euler
            .x
            .clamp(-cfg.look_angle_limit, cfg.look_angle_limit);

        if input.rocket_jump_started {
            state.rocket_jump.arm();
        }
    }

    /// Returns whether a jump was accepted this tick.
    ///
    /// Precedence: a jump wins whenever its grounded/grace and recoil checks
    /// pass; otherwise the queued press becomes a dash once the cooldown is
    /// spent; otherwise it stays queued until the input window closes.
    fn resolve_jump_or_dash(
        &self,
        state: &mut MovementState,
        input: &ActorInput,
        report: &mut TickReport,
    ) -> bool {
        let cfg = &self.config;
        if !state.has_queued_jump(cfg.jump_input_queue_time) {
            return false;
        }

        let rocket_grace = state.rocket_jump.is_active(cfg.rocket_jump_window);
        let grounded_or_rocket = state.grounded || rocket_grace;
        let recoil_ok = state.recoil_velocity.y <= 0.0;

        if (grounded_or_rocket || state.since_not_grounded < cfg.ungrounded_grace)
            && (recoil_ok || rocket_grace)
        {
            state.rocket_jump.consume();
            state.last_jump_input_time = None;
            state.actively_jumping = true;
            state.falling_velocity.y = cfg.jump_velocity;
            state.since_not_grounded = cfg.ungrounded_grace;
            state.locomotion = LocomotionState::Jump;
            state.cues.jump = true;
            report.jumped = true;
            log::debug!("jump accepted (rocket grace: {rocket_grace})");
            return true;
        }

        if state.dash_cooldown <= 0.0 {
            state.actively_jumping = false;
            state.last_jump_input_time = None;
            state.dash_cooldown = cfg.time_between_dashes;

            let direction = self.dash_direction(state, input);
            let impulse = direction * cfg.dash_forward_velocity + Vec3::Y * cfg.dash_upward_velocity;
            state.falling_velocity += impulse;
            state.recoil_velocity.y *= 0.5;

            state.locomotion = LocomotionState::Jump;
            state.cues.dash = true;
            report.dash_impulse = Some(impulse);
            log::debug!("dash impulse {impulse:?}");
        }

        false
    }

    fn dash_direction(&self, state: &MovementState, input: &ActorInput) -> Vec3 {
        let raw = input.raw_move_axes.x * state.right() + input.raw_move_axes.y * state.forward();
        let direction = raw.normalize_or_zero();
        if direction.length() < f32::EPSILON {
            Vec3::Y * self.config.dash_idle_lift
        } else {
            direction
        }
    }

    fn integrate_vertical(&self, state: &mut MovementState, just_jumped: bool, dt: f32) {
        let cfg = &self.config;

        if state.grounded {
            if !just_jumped {
                state.since_not_grounded = 0.0;
                state.jumps_since_grounded = 0;
            }
            // infinite ground friction
            if state.falling_velocity.y <= 0.0 {
                state.falling_velocity = Vec3::Y * cfg.gravity * dt;
            }
        } else {
            state.since_not_grounded += dt;
            state.falling_velocity.y += cfg.gravity * dt;
            let damping = cfg.air_velocity_damping.powf(dt);
            state.falling_velocity.x *= damping;
            state.falling_velocity.z *= damping;
        }
    }

    fn damp_recoil(&self, state: &mut MovementState, dt: f32) {
        let base = self.config.recoil_damping;
        let horizontal = if state.grounded { base / 25.0 } else { base * 10.0 };
        let horizontal = horizontal.powf(dt);
        let vertical = (base * 100.0).powf(dt);

        state.recoil_velocity.x *= horizontal;
        state.recoil_velocity.y *= vertical;
        state.recoil_velocity.z *= horizontal;
    }

    /// Moves through the motor, then pulls the actor back to its last
    /// non-overlapping position if it ended up inside the safety mask.
    fn move_and_correct<M: CharacterMotor>(
        &self,
        actor: ActorId,
        state: &mut MovementState,
        movement: Vec3,
        motor: &mut M,
        dt: f32,
    ) -> bool {
        let moved = motor.move_character(actor, state.position, movement, dt);
        state.position = moved.position;
        state.grounded = moved.grounded;

        if !motor.overlaps(actor, state.position, CollisionLayers::SAFETY_MASK) {
            state.last_safe_position = state.position;
            return false;
        }

        state.falling_velocity = Vec3::ZERO;
        state.position = if self.config.instant_overlap_ejection {
            state.last_safe_position
        } else {
            let blend = (dt * self.config.overlap_ejection_speed).min(1.0);
            state.position.lerp(state.last_safe_position, blend)
        };
        motor.place(actor, state.position);
        log::trace!("actor {} ejected from overlap", actor.0);
        true
    }
}
