use std::collections::HashMap;

use glam::Vec3;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;

use crate::actor::ActorId;

use super::layers::{decode_actor, decode_layers, encode_tag};
use super::{CharacterMotor, ColliderId, CollisionLayers, GeometryQuery, MotorMove, RayHit};

/// Fraction the capsule is shrunk by for overlap tests, so resting contact
/// with the floor does not count as penetration.
const OVERLAP_SHRINK: f32 = 0.08;
const GROUND_HALF_DEPTH: f32 = 4.0;

#[derive(Debug, Clone, Copy)]
pub struct ActorShape {
    pub radius: f32,
    pub height: f32,
    /// Extra radius of the damage volume around the movement capsule.
    pub hit_margin: f32,
}

impl Default for ActorShape {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 2.0,
            hit_margin: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActorBody {
    handle: RigidBodyHandle,
    shape: ActorShape,
}

pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector,
    character_controller: KinematicCharacterController,
    actors: HashMap<ActorId, ActorBody>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    const TICK_RATE: Real = 1.0 / 60.0;

    pub fn new() -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = Self::TICK_RATE;
        integration_parameters.min_ccd_dt = Self::TICK_RATE / 100.0;

        let mut character_controller = KinematicCharacterController::default();
        character_controller.offset = CharacterLength::Absolute(0.02);
        character_controller.up = Vector::Y;
        character_controller.max_slope_climb_angle = 50_f32.to_radians();
        character_controller.min_slope_slide_angle = 35_f32.to_radians();
        character_controller.snap_to_ground = Some(CharacterLength::Absolute(0.2));
        character_controller.autostep = Some(CharacterAutostep {
            max_height: CharacterLength::Absolute(0.35),
            min_width: CharacterLength::Absolute(0.15),
            include_dynamic_bodies: false,
        });

        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector::new(0.0, -9.81, 0.0),
            character_controller,
            actors: HashMap::new(),
        }
    }

    /// Advances the pipeline so the broad phase sees inserted or moved colliders.
    pub fn step(&mut self) {
        self.pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    pub fn add_static_box(&mut self, position: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_vector(position))
            .user_data(encode_tag(CollisionLayers::DEFAULT, None))
            .build();
        self.colliders.insert(collider)
    }

    /// Ground slab whose top face sits at `y`. It is deep enough for the
    /// rocket-jump ground check a few metres under a standing actor to overlap it.
    pub fn add_ground(&mut self, y: Real, half_size: Real) -> ColliderHandle {
        self.add_static_box(
            Vec3::new(0.0, y - GROUND_HALF_DEPTH, 0.0),
            Vec3::new(half_size, GROUND_HALF_DEPTH, half_size),
        )
    }

    /// Spawns the kinematic body for `actor`: a movement capsule on
    /// [`CollisionLayers::PLAYER`] and an untagged damage volume on
    /// [`CollisionLayers::PLAYER_HIT`] that resolves to the actor through its
    /// parent body.
    pub fn add_actor(&mut self, actor: ActorId, position: Vec3, shape: ActorShape) -> RigidBodyHandle {
        if let Some(existing) = self.actors.get(&actor) {
            return existing.handle;
        }

        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_vector(position))
            .lock_rotations()
            .user_data(encode_tag(CollisionLayers::empty(), Some(actor)))
            .build();
        let handle = self.bodies.insert(body);

        let motor = ColliderBuilder::new(capsule(shape.radius, shape.height))
            .friction(0.0)
            .user_data(encode_tag(CollisionLayers::PLAYER, None))
            .build();
        self.colliders
            .insert_with_parent(motor, handle, &mut self.bodies);

        let hit_radius = shape.radius + shape.hit_margin;
        let hit_volume = ColliderBuilder::new(capsule(hit_radius, shape.height + shape.hit_margin))
            .user_data(encode_tag(CollisionLayers::PLAYER_HIT, None))
            .build();
        self.colliders
            .insert_with_parent(hit_volume, handle, &mut self.bodies);

        self.actors.insert(actor, ActorBody { handle, shape });
        handle
    }

    pub fn remove_actor(&mut self, actor: ActorId) {
        let Some(body) = self.actors.remove(&actor) else {
            return;
        };
        self.bodies.remove(
            body.handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn actor_position(&self, actor: ActorId) -> Option<Vec3> {
        let body = self.actors.get(&actor)?;
        self.bodies
            .get(body.handle)
            .map(|b| from_vector(b.translation()))
    }

    fn set_body_position(&mut self, handle: RigidBodyHandle, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            let current_rot = *body.rotation();
            let new_pose = Pose::from_parts(to_vector(position), current_rot);
            body.set_position(new_pose, true);
        }
    }
}

impl CharacterMotor for PhysicsWorld {
    fn has_body(&self, actor: ActorId) -> bool {
        self.actors.contains_key(&actor)
    }

    fn move_character(&mut self, actor: ActorId, from: Vec3, translation: Vec3, dt: f32) -> MotorMove {
        let Some(body) = self.actors.get(&actor).copied() else {
            return MotorMove {
                position: from,
                grounded: false,
            };
        };

        self.set_body_position(body.handle, from);

        let shape = capsule(body.shape.radius, body.shape.height);
        let position = Pose::from_parts(to_vector(from), Rotation::IDENTITY);
        let predicate = |_handle: ColliderHandle, collider: &Collider| {
            decode_layers(collider.user_data).intersects(CollisionLayers::MOTOR_MASK)
        };
        let filter = QueryFilter::default()
            .exclude_rigid_body(body.handle)
            .predicate(&predicate);
        let query_pipeline = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        );

        let corrected = self.character_controller.move_shape(
            dt,
            &query_pipeline,
            shape.as_ref(),
            &position,
            to_vector(translation),
            |_collision| {},
        );

        let new_position = from + from_vector(corrected.translation);
        self.set_body_position(body.handle, new_position);

        MotorMove {
            position: new_position,
            grounded: corrected.grounded,
        }
    }

    fn overlaps(&self, actor: ActorId, position: Vec3, mask: CollisionLayers) -> bool {
        let Some(body) = self.actors.get(&actor) else {
            return false;
        };

        let shrink = 1.0 - OVERLAP_SHRINK;
        let shape = capsule(body.shape.radius * shrink, body.shape.height * shrink);
        let predicate = |_handle: ColliderHandle, collider: &Collider| {
            decode_layers(collider.user_data).intersects(mask)
        };
        let filter = QueryFilter::default()
            .exclude_rigid_body(body.handle)
            .predicate(&predicate);
        let query = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        );

        let pose = Pose::from_parts(to_vector(position), Rotation::IDENTITY);
        query.intersect_shape(pose, shape.as_ref()).next().is_some()
    }

    fn place(&mut self, actor: ActorId, position: Vec3) {
        if let Some(body) = self.actors.get(&actor).copied() {
            self.set_body_position(body.handle, position);
        }
    }
}

impl GeometryQuery for PhysicsWorld {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionLayers,
        ignore: &dyn Fn(ActorId) -> bool,
    ) -> Option<RayHit> {
        let predicate = |_handle: ColliderHandle, collider: &Collider| {
            decode_layers(collider.user_data).intersects(mask)
                && !self.collider_actor(collider).is_some_and(ignore)
        };
        let query = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            QueryFilter::default().predicate(&predicate),
        );
        let ray = Ray::new(to_vector(origin), to_vector(direction));

        query
            .cast_ray(&ray, max_distance, true)
            .map(|(handle, toi)| RayHit {
                collider: collider_id(handle),
                point: origin + direction * toi,
                distance: toi,
            })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionLayers) -> Vec<ColliderId> {
        let predicate = |_handle: ColliderHandle, collider: &Collider| {
            decode_layers(collider.user_data).intersects(mask)
        };
        let query = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            QueryFilter::default().predicate(&predicate),
        );

        let ball = SharedShape::ball(radius);
        let pose = Pose::from_parts(to_vector(center), Rotation::IDENTITY);
        query
            .intersect_shape(pose, ball.as_ref())
            .map(|(handle, _)| collider_id(handle))
            .collect()
    }

    fn damage_target(&self, collider: ColliderId) -> Option<ActorId> {
        let collider = self.colliders.get(collider_handle(collider))?;
        self.collider_actor(collider)
    }
}

impl PhysicsWorld {
    fn collider_actor(&self, collider: &Collider) -> Option<ActorId> {
        if let Some(actor) = decode_actor(collider.user_data) {
            return Some(actor);
        }

        let parent = self.bodies.get(collider.parent()?)?;
        decode_actor(parent.user_data)
    }
}

fn capsule(radius: f32, height: f32) -> SharedShape {
    let half_segment = (height / 2.0 - radius).max(0.0);
    SharedShape::capsule_y(half_segment, radius)
}

fn to_vector(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

fn from_vector(v: Vector) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn collider_id(handle: ColliderHandle) -> ColliderId {
    let (index, generation) = handle.into_raw_parts();
    ColliderId(((generation as u64) << 32) | index as u64)
}

fn collider_handle(id: ColliderId) -> ColliderHandle {
    ColliderHandle::from_raw_parts(id.0 as u32, (id.0 >> 32) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with_actor(actor: ActorId, position: Vec3) -> PhysicsWorld {
        let mut physics = PhysicsWorld::new();
        physics.add_ground(0.0, 50.0);
        physics.add_actor(actor, position, ActorShape::default());
        physics.step();
        physics
    }

    #[test]
    fn raycast_resolves_hit_volume_to_actor_through_parent() {
        let actor = ActorId(3);
        let physics = arena_with_actor(actor, Vec3::new(0.0, 1.0, 5.0));

        let hit = physics
            .raycast(
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::Z,
                20.0,
                CollisionLayers::PROJECTILE_MASK,
                &|_| false,
            )
            .expect("ray should reach the hit volume");

        assert!(hit.distance < 5.0);
        assert_eq!(physics.damage_target(hit.collider), Some(actor));
    }

    #[test]
    fn raycast_ignores_layers_outside_mask() {
        let actor = ActorId(1);
        let physics = arena_with_actor(actor, Vec3::new(0.0, 1.0, 5.0));

        let hit = physics.raycast(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::Z,
            20.0,
            CollisionLayers::DEFAULT,
            &|_| false,
        );

        assert!(hit.is_none());
    }

    #[test]
    fn raycast_skips_ignored_actor_and_reaches_ground() {
        let actor = ActorId(4);
        let physics = arena_with_actor(actor, Vec3::new(0.0, 1.05, 0.0));

        // starts inside the actor's own hit volume, aiming at the floor
        let origin = Vec3::new(0.0, 1.2, 0.1);
        let down = Vec3::new(0.0, -1.0, 0.2).normalize();

        let blocked = physics
            .raycast(origin, down, 15.0, CollisionLayers::PROJECTILE_MASK, &|_| false)
            .expect("own volume is hit first");
        assert_eq!(physics.damage_target(blocked.collider), Some(actor));

        let hit = physics
            .raycast(origin, down, 15.0, CollisionLayers::PROJECTILE_MASK, &|a| a == actor)
            .expect("ground behind the ignored volume");
        assert_eq!(physics.damage_target(hit.collider), None);
        assert!(hit.point.y.abs() < 0.01);
    }

    #[test]
    fn ground_collider_has_no_damage_target() {
        let physics = arena_with_actor(ActorId(1), Vec3::new(10.0, 1.0, 10.0));

        let hit = physics
            .raycast(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y, 10.0, CollisionLayers::DEFAULT, &|_| false)
            .expect("ground below");

        assert_eq!(physics.damage_target(hit.collider), None);
        assert!((hit.point.y - 0.0).abs() < 0.01);
    }

    #[test]
    fn overlap_detects_embedded_capsule() {
        let actor = ActorId(2);
        let mut physics = arena_with_actor(actor, Vec3::new(0.0, 1.1, 0.0));
        physics.add_static_box(Vec3::new(0.0, 1.0, 3.0), Vec3::splat(1.0));
        physics.step();

        assert!(!physics.overlaps(actor, Vec3::new(0.0, 1.1, 0.0), CollisionLayers::SAFETY_MASK));
        assert!(physics.overlaps(actor, Vec3::new(0.0, 1.1, 3.0), CollisionLayers::SAFETY_MASK));
    }

    #[test]
    fn ground_is_solid_well_below_its_surface() {
        let actor = ActorId(5);
        let physics = arena_with_actor(actor, Vec3::new(0.0, 1.05, 0.0));

        assert!(physics.overlaps(actor, Vec3::new(0.0, -1.95, 0.0), CollisionLayers::SAFETY_MASK));
    }

    #[test]
    fn removed_actor_has_no_body() {
        let actor = ActorId(9);
        let mut physics = arena_with_actor(actor, Vec3::new(0.0, 1.0, 0.0));
        assert!(physics.has_body(actor));

        physics.remove_actor(actor);
        assert!(!physics.has_body(actor));
        assert!(physics.actor_position(actor).is_none());
    }
}
