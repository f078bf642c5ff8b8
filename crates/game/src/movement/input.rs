use glam::Vec2;

/// One tick of sampled player input.
///
/// `move_axes` are the smoothed axes (x = strafe, y = thrust) that drive
/// regular motion; `raw_move_axes` are the unsmoothed values used to aim dashes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActorInput {
    pub move_axes: Vec2,
    pub raw_move_axes: Vec2,
    /// x = vertical look, y = horizontal look.
    pub look_axes: Vec2,
    /// Edge: set only on the tick the jump button went down.
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub rocket_jump_started: bool,
}

impl ActorInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(strafe: f32, thrust: f32) -> Self {
        let axes = Vec2::new(strafe, thrust);
        Self {
            move_axes: axes,
            raw_move_axes: axes,
            ..Self::default()
        }
    }

    pub fn with_jump_press(mut self) -> Self {
        self.jump_pressed = true;
        self.jump_held = true;
        self
    }

    pub fn with_jump_held(mut self) -> Self {
        self.jump_held = true;
        self
    }

    pub fn with_look(mut self, vertical: f32, horizontal: f32) -> Self {
        self.look_axes = Vec2::new(vertical, horizontal);
        self
    }
}
