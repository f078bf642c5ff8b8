use std::collections::{HashSet, VecDeque};

use glam::Vec3;

use crate::actor::{Actor, ActorId, ActorRegistry, ParticipantId, Role};
use crate::event::{EventQueue, PendingEvent, ReplicaEvent};
use crate::map::Arena;
use crate::movement::{ActorInput, MovementSimulator};
use crate::net::{
    Envelope, Message, NetworkSnapshot, NetworkStateReplicator, SnapshotApply, Target, Transport,
};
use crate::physics::{ActorShape, CharacterMotor, PhysicsWorld};
use crate::weapon::{
    DamageEvent, DamageLedger, Projectile, ProjectileConfig, ProjectileId, ProjectileTick,
};

use super::SimulationConfig;

/// Recently destroyed actor ids. Only the newest `capacity` are kept; a
/// snapshot delayed past that many destructions is not expected.
struct Tombstones {
    ids: HashSet<ActorId>,
    order: VecDeque<ActorId>,
    capacity: usize,
}

impl Tombstones {
    const DEFAULT_CAPACITY: usize = 256;

    fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn insert(&mut self, id: ActorId) {
        if !self.ids.insert(id) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn contains(&self, id: ActorId) -> bool {
        self.ids.contains(&id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicaStats {
    pub ticks: u64,
    pub messages_received: u64,
    pub decode_errors: u64,
    pub encode_errors: u64,
    pub snapshots_sent: u64,
    pub snapshots_applied: u64,
    pub snapshots_stale: u64,
    pub projectiles_fired: u64,
    pub damage_sent: u64,
    pub damage_applied: u64,
    pub damage_duplicates: u64,
}

/// One participant's view of the session.
///
/// Each tick runs the same fixed phases: receive, movement, projectiles,
/// damage, replication, then flushing queued messages to the transport.
pub struct Replica {
    local: ParticipantId,
    config: SimulationConfig,
    tick: u32,
    physics: PhysicsWorld,
    registry: ActorRegistry,
    simulator: MovementSimulator,
    replicator: NetworkStateReplicator,
    projectiles: Vec<Projectile>,
    next_projectile: u32,
    outgoing_damage: Vec<DamageEvent>,
    incoming_damage: Vec<DamageEvent>,
    ledger: DamageLedger,
    /// Actors destroyed here; late snapshots must not bring them back.
    tombstones: Tombstones,
    outbox: Vec<(Target, Message)>,
    events: EventQueue,
    stats: ReplicaStats,
}

impl Replica {
    pub fn new(local: ParticipantId, config: SimulationConfig, arena: &Arena) -> Self {
        let mut physics = PhysicsWorld::new();
        arena.build(&mut physics);
        physics.step();

        Self {
            local,
            simulator: MovementSimulator::new(config.movement.clone()),
            replicator: NetworkStateReplicator::new(config.replication.clone()),
            config,
            tick: 0,
            physics,
            registry: ActorRegistry::new(),
            projectiles: Vec::new(),
            next_projectile: 0,
            outgoing_damage: Vec::new(),
            incoming_damage: Vec::new(),
            ledger: DamageLedger::default(),
            tombstones: Tombstones::new(Tombstones::DEFAULT_CAPACITY),
            outbox: Vec::new(),
            events: EventQueue::default(),
            stats: ReplicaStats::default(),
        }
    }

    pub fn local(&self) -> ParticipantId {
        self.local
    }

    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.registry.get(id)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn stats(&self) -> ReplicaStats {
        self.stats
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn drain_events(&mut self) -> Vec<PendingEvent> {
        self.events.drain()
    }

    pub fn role_of(&self, id: ActorId) -> Option<Role> {
        self.registry.get(id).map(|actor| actor.role)
    }

    /// Creates an actor owned by this replica and announces it.
    pub fn spawn_local_actor(&mut self, position: Vec3) -> ActorId {
        let id = self.registry.allocate_id(self.local);
        self.insert_actor(id, self.local, position);
        self.outbox.push((
            Target::Others,
            Message::ActorSpawned {
                actor: id.0,
                owner: self.local.0,
                position: position.into(),
            },
        ));
        id
    }

    /// Sets the input sampled for an owned actor. Ignored for mirrors.
    pub fn set_input(&mut self, id: ActorId, input: ActorInput) -> bool {
        match self.registry.get_mut(id) {
            Some(actor) if actor.is_authority() => {
                actor.input = input;
                true
            }
            _ => false,
        }
    }

    /// Fires a projectile from an owned actor along its look direction.
    pub fn fire(
        &mut self,
        shooter: ActorId,
        weapon: &ProjectileConfig,
        target: Option<ActorId>,
    ) -> Option<ProjectileId> {
        let actor = self.registry.get_mut(shooter)?;
        if !actor.is_authority() {
            return None;
        }

        let direction = actor.movement.look_direction();
        let origin =
            actor.movement.position + Vec3::Y * weapon.eye_height + direction * weapon.muzzle_offset;

        self.next_projectile += 1;
        let id = ProjectileId::compose(self.local, self.next_projectile);
        let mut projectile = Projectile::new(id, shooter, origin, direction, weapon);
        projectile.target = target;

        self.simulator
            .notify_weapon_fired(shooter, &mut actor.movement, &self.physics);

        self.outbox
            .push((Target::Others, Message::ProjectileFired(projectile.to_launch())));
        self.events.push(
            self.tick,
            ReplicaEvent::ProjectileFired {
                projectile: id,
                owner_actor: shooter,
            },
        );
        self.projectiles.push(projectile);
        self.stats.projectiles_fired += 1;
        Some(id)
    }

    /// Adds an impulse to an actor, forwarding to its owner when mirrored.
    pub fn add_recoil(&mut self, id: ActorId, impulse: Vec3) {
        let grace = self.config.movement.ungrounded_grace;
        match self.registry.get_mut(id) {
            Some(actor) if actor.is_authority() => actor.movement.add_recoil(impulse, grace),
            Some(actor) => {
                let owner = actor.owner;
                self.outbox.push((
                    Target::Participant(owner),
                    Message::AddRecoil {
                        actor: id.0,
                        impulse: impulse.into(),
                    },
                ));
            }
            None => {}
        }
    }

    /// Moves an owned actor without sweeping and clears its momentum.
    /// Observers pick the new position up from the next snapshot.
    pub fn teleport_actor(&mut self, id: ActorId, position: Vec3) -> bool {
        match self.registry.get_mut(id) {
            Some(actor) if actor.is_authority() => {
                actor.movement.teleport(position);
                self.physics.place(id, position);
                true
            }
            _ => false,
        }
    }

    /// Destroys an owned actor right away; a mirror forwards the request to
    /// its owner instead.
    pub fn destroy_actor(&mut self, id: ActorId) {
        let Some(actor) = self.registry.get(id) else {
            return;
        };

        if actor.is_authority() {
            self.despawn(id);
            self.outbox
                .push((Target::Others, Message::ActorDestroyed { actor: id.0 }));
        } else {
            let owner = actor.owner;
            self.outbox
                .push((Target::Participant(owner), Message::DestroyActor { actor: id.0 }));
        }
    }

    /// Runs the death sequence for an owned actor, or asks its owner to.
    pub fn request_death(&mut self, id: ActorId, killer: Option<ParticipantId>) {
        let Some(actor) = self.registry.get_mut(id) else {
            return;
        };

        if !actor.is_authority() {
            let owner = actor.owner;
            self.outbox
                .push((Target::Participant(owner), Message::RequestDeath { actor: id.0 }));
            return;
        }
        if actor.death_requested {
            return;
        }
        actor.death_requested = true;

        log::info!("actor {} died (killer: {:?})", id.0, killer.map(|k| k.0));
        self.events
            .push(self.tick, ReplicaEvent::ActorDied { actor: id, killer });
        self.destroy_actor(id);
    }

    pub fn tick<T: Transport>(&mut self, transport: &mut T) {
        let dt = self.config.dt();

        self.receive(transport);
        self.step_movement(dt);
        self.physics.step();
        self.step_projectiles(dt);
        self.resolve_damage();
        self.replicate();
        self.flush(transport);

        self.tick = self.tick.wrapping_add(1);
        self.stats.ticks += 1;
    }

    fn receive<T: Transport>(&mut self, transport: &mut T) {
        for payload in transport.receive(self.local) {
            self.stats.messages_received += 1;
            match Envelope::deserialize(&payload) {
                Ok(envelope) => self.handle(envelope),
                Err(err) => {
                    self.stats.decode_errors += 1;
                    log::warn!("participant {} dropped a message: {err}", self.local.0);
                }
            }
        }
    }

    fn handle(&mut self, envelope: Envelope) {
        let from = ParticipantId(envelope.from);
        log::trace!(
            "participant {} <- {} {}",
            self.local.0,
            from.0,
            envelope.message.kind()
        );

        match envelope.message {
            Message::Snapshot(snapshot) => self.apply_snapshot(from, &snapshot),
            Message::ActorSpawned {
                actor,
                owner,
                position,
            } => {
                let id = ActorId(actor);
                if !self.registry.contains(id) && !self.tombstones.contains(id) {
                    self.insert_actor(id, ParticipantId(owner), Vec3::from(position));
                }
            }
            Message::ActorDestroyed { actor } => {
                let id = ActorId(actor);
                self.tombstones.insert(id);
                self.despawn(id);
            }
            Message::ProjectileFired(launch) => {
                let id = ProjectileId(launch.projectile);
                if self.projectiles.iter().any(|p| p.id == id) {
                    return;
                }
                let projectile = Projectile::from_launch(&launch);
                self.events.push(
                    self.tick,
                    ReplicaEvent::ProjectileFired {
                        projectile: id,
                        owner_actor: projectile.owner_actor,
                    },
                );
                self.projectiles.push(projectile);
            }
            Message::ApplyDamage(notice) => {
                self.incoming_damage.push(DamageEvent::from_notice(&notice));
            }
            Message::AddRecoil { actor, impulse } => {
                let id = ActorId(actor);
                if self.role_of(id) == Some(Role::Authority) {
                    self.add_recoil(id, Vec3::from(impulse));
                }
            }
            Message::DestroyActor { actor } => {
                let id = ActorId(actor);
                if self.role_of(id) == Some(Role::Authority) {
                    self.destroy_actor(id);
                }
            }
            Message::RequestDeath { actor } => {
                let id = ActorId(actor);
                if self.role_of(id) == Some(Role::Authority) {
                    self.request_death(id, None);
                }
            }
        }
    }

    fn apply_snapshot(&mut self, from: ParticipantId, snapshot: &NetworkSnapshot) {
        let id = ActorId(snapshot.actor);
        if self.tombstones.contains(id) {
            return;
        }
        if !self.registry.contains(id) {
            // the spawn announcement was lost; the snapshot is enough to mirror it
            self.insert_actor(id, from, Vec3::from(snapshot.position));
        }
        let Some(actor) = self.registry.get_mut(id) else {
            return;
        };

        let outcome = self.replicator.apply(snapshot, actor);
        match outcome {
            SnapshotApply::Ignored => return,
            SnapshotApply::Stale => {
                self.stats.snapshots_stale += 1;
                return;
            }
            SnapshotApply::Snapped { .. } => {
                self.physics.place(id, actor.movement.position);
            }
            SnapshotApply::Interpolating { .. } => {}
        }
        self.stats.snapshots_applied += 1;

        let cues = outcome.cues();
        if cues.jump {
            self.events.push(self.tick, ReplicaEvent::Jumped { actor: id });
        }
        if cues.dash {
            self.events.push(self.tick, ReplicaEvent::Dashed { actor: id });
        }
    }

    fn step_movement(&mut self, dt: f32) {
        let simulator = &self.simulator;
        let replicator = &self.replicator;
        let physics = &mut self.physics;
        let events = &mut self.events;
        let tick = self.tick;

        self.registry.visit(|registry, id| {
            let Some(actor) = registry.get_mut(id) else {
                return;
            };

            let input = actor.input;
            let report = simulator.tick(actor.role, id, &mut actor.movement, &input, &mut *physics, dt);
            if report.skipped {
                return;
            }

            match actor.role {
                Role::Authority => {
                    actor.input.jump_pressed = false;
                    actor.input.rocket_jump_started = false;
                    if report.jumped {
                        events.push(tick, ReplicaEvent::Jumped { actor: id });
                    }
                    if report.dashed() {
                        events.push(tick, ReplicaEvent::Dashed { actor: id });
                    }
                }
                Role::Observer => {
                    actor.movement.cues.take();
                    if replicator.update(actor, dt) != Vec3::ZERO {
                        physics.place(id, actor.movement.position);
                    }
                }
            }

            if report.landed {
                events.push(tick, ReplicaEvent::Landed { actor: id });
            }
        });
    }

    fn step_projectiles(&mut self, dt: f32) {
        let mut results: Vec<(ProjectileId, ProjectileTick)> = Vec::new();

        for projectile in &mut self.projectiles {
            let source = projectile.source();
            let role = Role::for_owner(source, self.local);
            let registry = &self.registry;
            let is_friendly = |actor: ActorId| registry.get(actor).is_some_and(|a| a.owner == source);
            let target_position = projectile
                .target
                .and_then(|target| registry.get(target))
                .map(|target| target.position());

            let outcome = projectile.tick(role, &self.physics, is_friendly, target_position, dt);
            if outcome.impact.is_some() || !outcome.damage.is_empty() {
                results.push((projectile.id, outcome));
            }
        }
        self.projectiles.retain(|projectile| !projectile.is_destroyed());

        for (projectile, outcome) in results {
            if let Some(impact) = outcome.impact {
                self.events.push(
                    self.tick,
                    ReplicaEvent::Impact {
                        projectile,
                        point: impact.point,
                        kind: impact.kind,
                        authoritative: impact.authoritative,
                    },
                );
            }
            self.outgoing_damage.extend(outcome.damage);
        }
    }

    fn resolve_damage(&mut self) {
        for event in std::mem::take(&mut self.outgoing_damage) {
            self.outbox
                .push((Target::Others, Message::ApplyDamage(event.to_notice())));
            self.stats.damage_sent += 1;
        }

        for event in std::mem::take(&mut self.incoming_damage) {
            if self.role_of(event.target) != Some(Role::Authority) {
                continue;
            }
            if !self.ledger.record(&event) {
                self.stats.damage_duplicates += 1;
                continue;
            }
            self.apply_damage(event);
        }
    }

    fn apply_damage(&mut self, event: DamageEvent) {
        let Some(actor) = self.registry.get_mut(event.target) else {
            return;
        };

        let outcome = actor.vitals.apply_damage(event.amount);
        self.stats.damage_applied += 1;
        self.events.push(
            self.tick,
            ReplicaEvent::DamageTaken {
                actor: event.target,
                amount: outcome.taken,
                absorbed: outcome.absorbed,
                source: event.source,
            },
        );

        if outcome.died {
            self.request_death(event.target, Some(event.source));
        }
    }

    fn replicate(&mut self) {
        if !self.replicator.should_send(self.tick, self.config.tick_rate) {
            return;
        }

        let tick = self.tick;
        let replicator = &self.replicator;
        let outbox = &mut self.outbox;
        let mut sent = 0;

        self.registry.visit(|registry, id| {
            let Some(actor) = registry.get_mut(id) else {
                return;
            };
            if actor.is_authority() {
                let snapshot = replicator.capture(tick, actor);
                outbox.push((Target::Others, Message::Snapshot(snapshot)));
                sent += 1;
            }
        });
        self.stats.snapshots_sent += sent;
    }

    fn flush<T: Transport>(&mut self, transport: &mut T) {
        for (target, message) in self.outbox.drain(..) {
            let envelope = Envelope::new(self.local.0, message);
            match envelope.serialize() {
                Ok(bytes) => transport.send(self.local, target, bytes),
                Err(err) => {
                    self.stats.encode_errors += 1;
                    log::warn!("participant {} failed to encode message: {err}", self.local.0);
                }
            }
        }
    }

    fn insert_actor(&mut self, id: ActorId, owner: ParticipantId, position: Vec3) {
        let actor = Actor::new(id, owner, self.local, position, &self.config.replication);
        if self.registry.register(actor) {
            self.physics.add_actor(id, position, ActorShape::default());
            self.events.push(
                self.tick,
                ReplicaEvent::ActorSpawned {
                    actor: id,
                    owner,
                    position,
                },
            );
        }
    }

    fn despawn(&mut self, id: ActorId) {
        if self.registry.unregister(id).is_some() {
            self.physics.remove_actor(id);
            self.events
                .push(self.tick, ReplicaEvent::ActorDestroyed { actor: id });
        }
    }
}
