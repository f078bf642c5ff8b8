use std::collections::BTreeSet;

use glam::{Quat, Vec3};

use crate::actor::{ActorId, ParticipantId, Role};
use crate::net::ProjectileLaunch;
use crate::physics::{CollisionLayers, GeometryQuery, RayHit};

use super::{DamageEvent, ProjectileConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u64);

impl ProjectileId {
    pub fn compose(owner: ParticipantId, serial: u32) -> Self {
        Self(((owner.0 as u64) << 32) | serial as u64)
    }

    pub fn fired_by(self) -> ParticipantId {
        ParticipantId((self.0 >> 32) as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileState {
    Flying,
    /// Hidden and no longer tracing; waits to be removed.
    Resolved,
    Destroyed,
}

/// Effect to play at an impact point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpactKind {
    pub hit_actor: bool,
    pub area: bool,
}

impl ImpactKind {
    pub fn effect_name(self) -> &'static str {
        match (self.hit_actor, self.area) {
            (false, false) => "Explosion",
            (true, false) => "ExplosionHit",
            (false, true) => "ExplosionArea",
            (true, true) => "ExplosionHitArea",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub point: Vec3,
    pub kind: ImpactKind,
    /// Resolved by the firing authority rather than seen locally.
    pub authoritative: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectileTick {
    pub impact: Option<Impact>,
    pub damage: Vec<DamageEvent>,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner_actor: ActorId,
    pub position: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub area_of_effect: f32,
    pub homing: f32,
    /// Held by id only; a despawned target simply stops the homing.
    pub target: Option<ActorId>,
    pub lifetime: f32,
    pub state: ProjectileState,
}

impl Projectile {
    pub fn new(
        id: ProjectileId,
        owner_actor: ActorId,
        origin: Vec3,
        direction: Vec3,
        config: &ProjectileConfig,
    ) -> Self {
        Self {
            id,
            owner_actor,
            position: origin,
            direction: direction.normalize_or(Vec3::Z),
            speed: config.speed,
            damage: config.damage,
            area_of_effect: config.area_of_effect,
            homing: config.homing,
            target: None,
            lifetime: config.lifetime,
            state: ProjectileState::Flying,
        }
    }

    pub fn with_target(mut self, target: ActorId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn source(&self) -> ParticipantId {
        self.id.fired_by()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == ProjectileState::Destroyed
    }

    pub fn to_launch(&self) -> ProjectileLaunch {
        ProjectileLaunch {
            projectile: self.id.0,
            owner_actor: self.owner_actor.0,
            origin: self.position.into(),
            direction: self.direction.into(),
            speed: self.speed,
            damage: self.damage,
            area_of_effect: self.area_of_effect,
            homing: self.homing,
            target: self.target.map(|t| t.0),
            lifetime: self.lifetime,
        }
    }

    pub fn from_launch(launch: &ProjectileLaunch) -> Self {
        Self {
            id: ProjectileId(launch.projectile),
            owner_actor: ActorId(launch.owner_actor),
            position: Vec3::from(launch.origin),
            direction: Vec3::from(launch.direction).normalize_or(Vec3::Z),
            speed: launch.speed,
            damage: launch.damage,
            area_of_effect: launch.area_of_effect,
            homing: launch.homing,
            target: launch.target.map(ActorId),
            lifetime: launch.lifetime,
            state: ProjectileState::Flying,
        }
    }

    /// Advances the projectile by `dt`.
    ///
    /// `role` is this replica's role for the firing actor: only the authority
    /// turns a hit into damage. `is_friendly` reports actors owned by the
    /// firing participant; their colliders never stop the projectile.
    /// `target_position` is the homing target's current position, if any.
    pub fn tick<G, F>(
        &mut self,
        role: Role,
        world: &G,
        is_friendly: F,
        target_position: Option<Vec3>,
        dt: f32,
    ) -> ProjectileTick
    where
        G: GeometryQuery,
        F: Fn(ActorId) -> bool,
    {
        let mut outcome = ProjectileTick::default();
        if self.state == ProjectileState::Destroyed {
            return outcome;
        }

        if self.state == ProjectileState::Flying {
            let distance = self.speed * dt;
            let hit = world.raycast(
                self.position,
                self.direction,
                distance,
                CollisionLayers::PROJECTILE_MASK,
                &is_friendly,
            );

            match hit {
                Some(hit) => self.resolve(role, world, &is_friendly, hit, &mut outcome),
                None => {
                    self.position += self.direction * distance;
                    if let Some(target) = target_position {
                        self.steer_toward(target, dt);
                    }
                }
            }
        }

        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.state = ProjectileState::Destroyed;
        }

        outcome
    }

    fn resolve<G, F>(
        &mut self,
        role: Role,
        world: &G,
        is_friendly: &F,
        hit: RayHit,
        outcome: &mut ProjectileTick,
    ) where
        G: GeometryQuery,
        F: Fn(ActorId) -> bool,
    {
        self.position = hit.point;
        let area = self.area_of_effect > 0.0;

        if !role.is_authority() {
            self.state = ProjectileState::Resolved;
            outcome.impact = Some(Impact {
                point: hit.point,
                kind: ImpactKind {
                    hit_actor: false,
                    area,
                },
                authoritative: false,
            });
            return;
        }

        let targets: BTreeSet<ActorId> = if area {
            world
                .overlap_sphere(hit.point, self.area_of_effect, CollisionLayers::PLAYER_HIT)
                .into_iter()
                .filter_map(|collider| world.damage_target(collider))
                .filter(|actor| !is_friendly(*actor))
                .collect()
        } else {
            world.damage_target(hit.collider).into_iter().collect()
        };

        outcome.damage = targets
            .iter()
            .map(|&target| DamageEvent {
                hit: self.id,
                target,
                amount: self.damage,
                source: self.source(),
            })
            .collect();

        let kind = ImpactKind {
            hit_actor: !targets.is_empty(),
            area,
        };
        log::debug!(
            "projectile {:x} resolved at {:?}: {} ({} targets)",
            self.id.0,
            hit.point,
            kind.effect_name(),
            targets.len()
        );

        outcome.impact = Some(Impact {
            point: hit.point,
            kind,
            authoritative: true,
        });
        // the authority has applied every effect of the hit
        self.state = ProjectileState::Destroyed;
    }

    fn steer_toward(&mut self, target: Vec3, dt: f32) {
        if self.homing <= 0.0 {
            return;
        }
        let desired = (target - self.position).normalize_or_zero();
        if desired == Vec3::ZERO {
            return;
        }

        let current = Quat::from_rotation_arc(Vec3::Z, self.direction);
        let goal = Quat::from_rotation_arc(Vec3::Z, desired);
        let blend = (self.homing * dt * 4.0).clamp(0.0, 1.0);
        self.direction = (current.slerp(goal, blend) * Vec3::Z).normalize_or(self.direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ColliderId;

    const DT: f32 = 1.0 / 60.0;
    const SHOOTER: ActorId = ActorId(100);

    enum Shape {
        Floor { y: f32 },
        Sphere { center: Vec3, radius: f32 },
    }

    struct Collider {
        shape: Shape,
        layers: CollisionLayers,
        actor: Option<ActorId>,
    }

    #[derive(Default)]
    struct FakeWorld {
        colliders: Vec<Collider>,
    }

    impl FakeWorld {
        fn with_floor(mut self, y: f32) -> Self {
            self.colliders.push(Collider {
                shape: Shape::Floor { y },
                layers: CollisionLayers::DEFAULT,
                actor: None,
            });
            self
        }

        fn with_actor(mut self, actor: ActorId, center: Vec3) -> Self {
            self.colliders.push(Collider {
                shape: Shape::Sphere {
                    center,
                    radius: 0.6,
                },
                layers: CollisionLayers::PLAYER_HIT,
                actor: Some(actor),
            });
            self
        }
    }

    impl GeometryQuery for FakeWorld {
        fn raycast(
            &self,
            origin: Vec3,
            direction: Vec3,
            max_distance: f32,
            mask: CollisionLayers,
            ignore: &dyn Fn(ActorId) -> bool,
        ) -> Option<RayHit> {
            self.colliders
                .iter()
                .enumerate()
                .filter(|(_, c)| c.layers.intersects(mask))
                .filter(|(_, c)| !c.actor.is_some_and(ignore))
                .filter_map(|(i, c)| {
                    let toi = match c.shape {
                        Shape::Floor { y } => {
                            if direction.y.abs() < 1e-6 {
                                return None;
                            }
                            let t = (y - origin.y) / direction.y;
                            (t >= 0.0).then_some(t)?
                        }
                        Shape::Sphere { center, radius } => {
                            let oc = origin - center;
                            let b = oc.dot(direction);
                            let c2 = oc.length_squared() - radius * radius;
                            if c2 <= 0.0 {
                                0.0
                            } else {
                                let disc = b * b - c2;
                                if b > 0.0 || disc < 0.0 {
                                    return None;
                                }
                                -b - disc.sqrt()
                            }
                        }
                    };
                    (toi <= max_distance).then_some((i, toi))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, toi)| RayHit {
                    collider: ColliderId(i as u64),
                    point: origin + direction * toi,
                    distance: toi,
                })
        }

        fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionLayers) -> Vec<ColliderId> {
            self.colliders
                .iter()
                .enumerate()
                .filter(|(_, c)| c.layers.intersects(mask))
                .filter(|(_, c)| match c.shape {
                    Shape::Floor { y } => center.y - radius <= y,
                    Shape::Sphere { center: other, radius: r } => center.distance(other) <= radius + r,
                })
                .map(|(i, _)| ColliderId(i as u64))
                .collect()
        }

        fn damage_target(&self, collider: ColliderId) -> Option<ActorId> {
            self.colliders.get(collider.0 as usize)?.actor
        }
    }

    fn bullet(origin: Vec3, direction: Vec3) -> Projectile {
        let config = ProjectileConfig {
            speed: 60.0,
            ..ProjectileConfig::default()
        };
        Projectile::new(ProjectileId::compose(ParticipantId(1), 1), SHOOTER, origin, direction, &config)
    }

    fn not_friendly(_: ActorId) -> bool {
        false
    }

    fn run_until_done<F: Fn(ActorId) -> bool>(
        projectile: &mut Projectile,
        role: Role,
        world: &FakeWorld,
        is_friendly: F,
    ) -> ProjectileTick {
        for _ in 0..600 {
            let outcome = projectile.tick(role, world, &is_friendly, None, DT);
            if outcome.impact.is_some() || projectile.is_destroyed() {
                return outcome;
            }
        }
        ProjectileTick::default()
    }

    #[test]
    fn flies_speed_times_dt_without_hits() {
        let world = FakeWorld::default();
        let mut projectile = bullet(Vec3::ZERO, Vec3::X);

        let outcome = projectile.tick(Role::Authority, &world, not_friendly, None, DT);

        assert!(outcome.impact.is_none());
        assert!((projectile.position - Vec3::X).length() < 1e-5);
        assert_eq!(projectile.state, ProjectileState::Flying);
    }

    #[test]
    fn authority_hit_damages_target_once() {
        let target = ActorId(7);
        let world = FakeWorld::default().with_actor(target, Vec3::new(0.0, 1.0, 5.0));
        let mut projectile = bullet(Vec3::new(0.0, 1.0, 0.0), Vec3::Z);

        let outcome = run_until_done(&mut projectile, Role::Authority, &world, not_friendly);

        assert_eq!(outcome.damage.len(), 1);
        assert_eq!(outcome.damage[0].target, target);
        assert_eq!(outcome.damage[0].source, ParticipantId(1));
        let impact = outcome.impact.unwrap();
        assert_eq!(impact.kind.effect_name(), "ExplosionHit");
        assert!(impact.authoritative);
        assert!(projectile.is_destroyed());

        let after = projectile.tick(Role::Authority, &world, not_friendly, None, DT);
        assert!(after.damage.is_empty());
    }

    #[test]
    fn observer_hit_is_visual_only() {
        let world = FakeWorld::default().with_actor(ActorId(7), Vec3::new(0.0, 1.0, 5.0));
        let mut projectile = bullet(Vec3::new(0.0, 1.0, 0.0), Vec3::Z);

        let outcome = run_until_done(&mut projectile, Role::Observer, &world, not_friendly);

        assert!(outcome.damage.is_empty());
        assert!(!outcome.impact.unwrap().authoritative);
        assert_eq!(projectile.state, ProjectileState::Resolved);

        let later = projectile.tick(Role::Observer, &world, not_friendly, None, DT);
        assert!(later.impact.is_none());
    }

    #[test]
    fn friendly_colliders_do_not_stop_projectile() {
        let world = FakeWorld::default().with_actor(SHOOTER, Vec3::new(0.0, 1.0, 0.0));
        let mut projectile = bullet(Vec3::new(0.0, 1.0, 0.0), Vec3::Z);

        let outcome = projectile.tick(Role::Authority, &world, |actor| actor == SHOOTER, None, DT);

        assert!(outcome.impact.is_none());
        assert_eq!(projectile.state, ProjectileState::Flying);
        assert!(projectile.position.z > 0.0);
    }

    #[test]
    fn shot_from_inside_own_volume_hits_floor_behind() {
        let world = FakeWorld::default()
            .with_actor(SHOOTER, Vec3::new(0.0, 1.0, 0.0))
            .with_floor(0.0);
        let mut projectile = bullet(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y);

        let outcome = run_until_done(&mut projectile, Role::Authority, &world, |actor| actor == SHOOTER);

        let impact = outcome.impact.expect("floor should be hit");
        assert!(impact.point.y.abs() < 1e-4);
        assert_eq!(impact.kind.effect_name(), "Explosion");
        assert!(outcome.damage.is_empty());
    }

    #[test]
    fn wall_hit_without_target_deals_no_damage() {
        let world = FakeWorld::default().with_floor(0.0);
        let mut projectile = bullet(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y);

        let outcome = run_until_done(&mut projectile, Role::Authority, &world, not_friendly);

        assert!(outcome.damage.is_empty());
        assert_eq!(outcome.impact.unwrap().kind.effect_name(), "Explosion");
    }

    #[test]
    fn area_hit_reaches_everyone_inside_radius_only() {
        let inside = [ActorId(1), ActorId(2), ActorId(3)];
        let outside = [ActorId(4), ActorId(5)];
        let mut world = FakeWorld::default().with_floor(0.0);
        world = world
            .with_actor(inside[0], Vec3::new(1.0, 1.0, 0.0))
            .with_actor(inside[1], Vec3::new(-1.0, 1.0, 1.0))
            .with_actor(inside[2], Vec3::new(0.0, 1.0, -2.0))
            // second volume on the same actor must not double the damage
            .with_actor(inside[2], Vec3::new(0.0, 1.5, -2.0))
            .with_actor(outside[0], Vec3::new(20.0, 1.0, 0.0))
            .with_actor(outside[1], Vec3::new(0.0, 1.0, 30.0))
            .with_actor(SHOOTER, Vec3::new(0.5, 1.0, 0.5));

        let config = ProjectileConfig {
            speed: 60.0,
            area_of_effect: 4.0,
            ..ProjectileConfig::default()
        };
        let mut projectile = Projectile::new(
            ProjectileId::compose(ParticipantId(1), 2),
            SHOOTER,
            Vec3::new(0.0, 0.05, 0.0),
            Vec3::NEG_Y,
            &config,
        );

        let outcome = projectile.tick(Role::Authority, &world, |actor| actor == SHOOTER, None, DT);

        let mut hit: Vec<ActorId> = outcome.damage.iter().map(|event| event.target).collect();
        hit.sort();
        assert_eq!(hit, inside.to_vec());
        assert_eq!(outcome.impact.unwrap().kind.effect_name(), "ExplosionHitArea");
    }

    #[test]
    fn lifetime_expiry_destroys_without_hit() {
        let world = FakeWorld::default();
        let mut projectile = bullet(Vec3::ZERO, Vec3::X);
        projectile.lifetime = 0.04;

        let mut ticks = 0;
        while !projectile.is_destroyed() {
            projectile.tick(Role::Authority, &world, not_friendly, None, DT);
            ticks += 1;
            assert!(ticks < 10);
        }
        assert_eq!(ticks, 3);
    }

    #[test]
    fn homing_turns_toward_target() {
        let world = FakeWorld::default();
        let mut projectile = bullet(Vec3::ZERO, Vec3::Z);
        projectile.homing = 2.0;
        let target = Vec3::new(50.0, 0.0, 0.0);

        let before = projectile.direction.dot(Vec3::X);
        projectile.tick(Role::Observer, &world, not_friendly, Some(target), DT);
        let after = projectile.direction.dot((target - projectile.position).normalize());

        assert!(after > before);
        assert!((projectile.direction.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn launch_message_recreates_projectile() {
        let original = bullet(Vec3::new(1.0, 2.0, 3.0), Vec3::X).with_target(ActorId(9));
        let copy = Projectile::from_launch(&original.to_launch());

        assert_eq!(copy.id, original.id);
        assert_eq!(copy.target, Some(ActorId(9)));
        assert_eq!(copy.position, original.position);
        assert_eq!(copy.source(), ParticipantId(1));
    }
}
