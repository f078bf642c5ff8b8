use glam::Vec3;

use crate::actor::ActorId;

use super::CollisionLayers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub collider: ColliderId,
    pub point: Vec3,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorMove {
    pub position: Vec3,
    pub grounded: bool,
}

/// Moves an actor's collision shape through the world.
///
/// The caller owns the actor's position; the motor only resolves where a
/// requested translation ends up and whether the shape is resting on ground.
pub trait CharacterMotor {
    /// `false` while the actor has no collision body yet.
    fn has_body(&self, actor: ActorId) -> bool;

    fn move_character(&mut self, actor: ActorId, from: Vec3, translation: Vec3, dt: f32)
        -> MotorMove;

    fn overlaps(&self, actor: ActorId, position: Vec3, mask: CollisionLayers) -> bool;

    /// Teleports the body without sweeping.
    fn place(&mut self, actor: ActorId, position: Vec3);
}

pub trait GeometryQuery {
    /// `direction` must be normalized. Colliders whose damage target satisfies
    /// `ignore` are skipped, so whatever lies behind them can still be hit.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionLayers,
        ignore: &dyn Fn(ActorId) -> bool,
    ) -> Option<RayHit>;

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionLayers) -> Vec<ColliderId>;

    /// Actor that takes damage for `collider`: the collider's own tag, else the
    /// actor owning the body it is attached to.
    fn damage_target(&self, collider: ColliderId) -> Option<ActorId>;
}
