use glam::Vec3;

use crate::physics::{ActorShape, PhysicsWorld};

use super::{MapObject, MapObjectKind};

/// Flat practice arena with step platforms, a staircase and a wall for
/// rocket jumping.
pub struct Arena {
    objects: Vec<MapObject>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    const GROUND_SIZE: f32 = 100.0;
    const GROUND_Y: f32 = 0.0;
    const SPAWN_RADIUS: f32 = 25.0;

    pub fn new() -> Self {
        let mut objects = vec![MapObject::ground(Self::GROUND_Y, Self::GROUND_SIZE)];

        Self::add_platform_obstacles(&mut objects);
        Self::add_stair_platforms(&mut objects);
        Self::add_walls(&mut objects);

        Self { objects }
    }

    /// Ground only, for tests that want no obstacles.
    pub fn flat() -> Self {
        Self {
            objects: vec![MapObject::ground(Self::GROUND_Y, Self::GROUND_SIZE)],
        }
    }

    fn add_platform_obstacles(objects: &mut Vec<MapObject>) {
        let steps = [
            (5.0, 0.25, 1.0),
            (8.0, 0.5, 1.0),
            (11.0, 1.0, 1.0),
            (14.0, 1.5, 1.5),
            (18.0, 2.0, 2.0),
        ];
        for (x, half_height, half_width) in steps {
            objects.push(MapObject::static_box(
                Vec3::new(x, half_height, 0.0),
                Vec3::new(half_width, half_height, half_width),
            ));
        }
    }

    fn add_stair_platforms(objects: &mut Vec<MapObject>) {
        let stair_start = Vec3::new(-5.0, 0.0, 5.0);
        let step_height = 0.3;
        let step_depth = 0.4;
        let step_width = 2.0;

        for i in 0..10 {
            let y = step_height * (i as f32 + 0.5);
            let z = stair_start.z + step_depth * i as f32;
            objects.push(MapObject::static_box(
                Vec3::new(stair_start.x, y, z),
                Vec3::new(step_width, step_height * 0.5, step_depth * 0.5),
            ));
        }
    }

    fn add_walls(objects: &mut Vec<MapObject>) {
        objects.push(MapObject::static_box(
            Vec3::new(0.0, 6.0, -12.0),
            Vec3::new(6.0, 6.0, 0.5),
        ));
    }

    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    pub fn build(&self, physics: &mut PhysicsWorld) {
        for object in &self.objects {
            match object.kind {
                MapObjectKind::Ground => {
                    physics.add_ground(object.position.y, object.half_extents.x);
                }
                MapObjectKind::StaticBox => {
                    physics.add_static_box(object.position, object.half_extents);
                }
            }
        }
    }

    /// Spawn positions on a ring around the centre, clear of every obstacle.
    pub fn spawn_point(&self, index: usize, slots: usize) -> Vec3 {
        let slots = slots.max(1);
        let angle = std::f32::consts::TAU * (index % slots) as f32 / slots as f32;
        let stand_height = ActorShape::default().height * 0.5 + 0.05;
        Vec3::new(
            angle.cos() * Self::SPAWN_RADIUS,
            Self::GROUND_Y + stand_height,
            angle.sin() * Self::SPAWN_RADIUS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorId;
    use crate::physics::{CharacterMotor, CollisionLayers};

    #[test]
    fn arena_builds_colliders() {
        let arena = Arena::new();
        let mut physics = PhysicsWorld::new();
        arena.build(&mut physics);

        assert_eq!(physics.colliders.len(), arena.objects().len());
    }

    #[test]
    fn spawn_points_are_clear() {
        let arena = Arena::new();
        let mut physics = PhysicsWorld::new();
        arena.build(&mut physics);

        for index in 0..8 {
            let actor = ActorId(index as u32 + 1);
            let spawn = arena.spawn_point(index, 8);
            physics.add_actor(actor, spawn, ActorShape::default());
        }
        physics.step();

        for index in 0..8 {
            let actor = ActorId(index as u32 + 1);
            let spawn = arena.spawn_point(index, 8);
            assert!(!physics.overlaps(actor, spawn, CollisionLayers::SAFETY_MASK));
        }
    }
}
