use glam::Vec3;

/// Discrete locomotion state handed to the animation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum LocomotionState {
    #[default]
    Idle = 0,
    Run = 1,
    Backward = 2,
    StrafeLeft = 3,
    StrafeRight = 4,
    Jump = 5,
}

impl From<u8> for LocomotionState {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Run,
            2 => Self::Backward,
            3 => Self::StrafeLeft,
            4 => Self::StrafeRight,
            5 => Self::Jump,
            _ => Self::Idle,
        }
    }
}

/// Picks the grounded locomotion state from the smoothed input velocity.
///
/// Forward/backward wins over strafing. Inside the deadzone on both axes the
/// current state is kept, so a slowing actor does not flicker between clips.
pub fn select_locomotion(
    current: LocomotionState,
    velocity: Vec3,
    forward: Vec3,
    right: Vec3,
    deadzone: f32,
    idle_epsilon: f32,
) -> LocomotionState {
    if velocity.abs_diff_eq(Vec3::ZERO, idle_epsilon) {
        return LocomotionState::Idle;
    }

    let forward_speed = velocity.dot(forward);
    let right_speed = velocity.dot(right);

    if forward_speed > deadzone {
        LocomotionState::Run
    } else if forward_speed < -deadzone {
        LocomotionState::Backward
    } else if right_speed > deadzone {
        LocomotionState::StrafeRight
    } else if right_speed < -deadzone {
        LocomotionState::StrafeLeft
    } else {
        current
    }
}
