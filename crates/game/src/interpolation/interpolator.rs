use glam::{Quat, Vec3};

/// A correction that can be spread over several ticks.
pub trait Correction: Copy {
    fn identity() -> Self;

    /// Too small to be worth smoothing; the caller should snap instead.
    fn is_negligible(&self) -> bool;

    /// The part of the correction covering `t` of the window, `t` in `[0, 1]`.
    fn fraction(&self, t: f32) -> Self;
}

impl Correction for Vec3 {
    fn identity() -> Self {
        Vec3::ZERO
    }

    fn is_negligible(&self) -> bool {
        self.abs_diff_eq(Vec3::ZERO, 0.01)
    }

    fn fraction(&self, t: f32) -> Self {
        *self * t
    }
}

impl Correction for Quat {
    fn identity() -> Self {
        Quat::IDENTITY
    }

    fn is_negligible(&self) -> bool {
        self.angle_between(Quat::IDENTITY) <= 1e-4
    }

    fn fraction(&self, t: f32) -> Self {
        Quat::IDENTITY.slerp(*self, t)
    }
}

/// Spreads a discrete correction evenly across a fixed window.
///
/// Only observers run these; an authority always holds the true value.
#[derive(Debug, Clone, Copy)]
pub struct Interpolator<T: Correction> {
    delta: T,
    elapsed: f32,
    window: f32,
    running: bool,
}

pub type VectorInterpolator = Interpolator<Vec3>;
pub type RotationInterpolator = Interpolator<Quat>;

impl<T: Correction> Interpolator<T> {
    pub fn new(window: f32) -> Self {
        Self {
            delta: T::identity(),
            elapsed: 0.0,
            window,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns `false` when `delta` is negligible (or the window is empty),
    /// in which case the caller should apply the value directly.
    pub fn start(&mut self, delta: T) -> bool {
        self.delta = delta;
        self.elapsed = 0.0;
        self.running = self.window > 0.0 && !delta.is_negligible();
        self.running
    }

    /// Correction to apply this tick. Identity once the window has elapsed.
    pub fn update(&mut self, dt: f32) -> T {
        if !self.running {
            return T::identity();
        }

        let before = self.elapsed;
        self.elapsed = (self.elapsed + dt).min(self.window);
        if self.elapsed >= self.window {
            self.running = false;
        }

        self.delta.fraction((self.elapsed - before) / self.window)
    }

    pub fn stop(&mut self) {
        self.running = false;
    }
}
