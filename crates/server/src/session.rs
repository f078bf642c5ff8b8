use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use dashfire::{
    ActorId, Arena, LinkStats, LoopbackHub, ParticipantId, Replica, ReplicaEvent, ReplicaStats,
    Transport,
};

use crate::bot::Bot;
use crate::config::SessionConfig;

struct Seat {
    replica: Replica,
    bot: Option<Bot>,
    deaths: u32,
    kills: u32,
}

/// Per-participant totals reported when the session ends.
#[derive(Debug, Clone, Copy)]
pub struct SeatReport {
    pub participant: ParticipantId,
    pub replica: ReplicaStats,
    pub link: LinkStats,
    pub kills: u32,
    pub deaths: u32,
}

/// Actors below this height have left the arena and are put back on a spawn point.
const FALL_LIMIT: f32 = -20.0;

/// Runs every participant's replica in one process over a loopback link.
pub struct Session {
    config: SessionConfig,
    arena: Arena,
    hub: LoopbackHub,
    seats: Vec<Seat>,
    rng: StdRng,
    tick: u64,
    running: Arc<AtomicBool>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let arena = Arena::new();
        let mut hub = LoopbackHub::new(config.link.clone());
        let mut rng = StdRng::seed_from_u64(config.seed);
        let slots = config.participants.max(1) as usize;

        let seats = (0..config.participants)
            .map(|index| {
                let participant = ParticipantId(index + 1);
                hub.connect(participant);

                let mut replica = Replica::new(participant, config.simulation.clone(), &arena);
                let actor = replica.spawn_local_actor(arena.spawn_point(index as usize, slots));
                let bot = Bot::new(actor, config.bots.clone(), &mut rng);
                log::info!("participant {} joined with actor {}", participant.0, actor.0);

                Seat {
                    replica,
                    bot: Some(bot),
                    deaths: 0,
                    kills: 0,
                }
            })
            .collect();

        Self {
            config,
            arena,
            hub,
            seats,
            rng,
            tick: 0,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn tick_once(&mut self) {
        for index in 0..self.seats.len() {
            self.recover_fallen(index);
            self.drive_bot(index);
            self.seats[index].replica.tick(&mut self.hub);
            self.handle_events(index);
        }
        self.hub.advance();
        self.tick += 1;

        if self.config.ticks > 0 && self.tick >= self.config.ticks {
            self.running.store(false, Ordering::SeqCst);
        }
    }

    fn recover_fallen(&mut self, index: usize) {
        let seat = &self.seats[index];
        let Some(actor) = seat.bot.as_ref().map(|bot| bot.actor) else {
            return;
        };
        let fallen = seat
            .replica
            .actor(actor)
            .is_some_and(|a| a.position().y < FALL_LIMIT);
        if !fallen {
            return;
        }

        let slots = self.seats.len();
        let position = self.arena.spawn_point(self.rng.gen_range(0..slots), slots);
        if self.seats[index].replica.teleport_actor(actor, position) {
            log::info!("actor {} fell out of the arena, moved to {position}", actor.0);
        }
    }

    fn drive_bot(&mut self, index: usize) {
        let sensitivity = self.config.simulation.movement.look_sensitivity;
        let seat = &mut self.seats[index];
        let Some(bot) = seat.bot.as_mut() else {
            return;
        };
        let Some(actor) = seat.replica.actor(bot.actor) else {
            return;
        };

        let position = actor.position();
        let nearest = nearest_enemy(&seat.replica, bot.actor, position);
        let action = bot.think(&actor.movement, sensitivity, nearest, &mut self.rng);
        let actor = bot.actor;

        seat.replica.set_input(actor, action.input);
        if action.fire {
            let weapon = if action.rocket {
                &self.config.rocket
            } else {
                &self.config.simulation.weapon
            };
            seat.replica.fire(actor, weapon, None);
        }
    }

    fn handle_events(&mut self, index: usize) {
        let slots = self.seats.len();
        let participant = self.seats[index].replica.local();
        let events = self.seats[index].replica.drain_events();

        for pending in events {
            match pending.event {
                ReplicaEvent::ActorDied { actor, killer } => {
                    let owned = self.seats[index].bot.as_ref().is_some_and(|b| b.actor == actor);
                    if !owned {
                        continue;
                    }
                    log::info!(
                        "tick {}: actor {} of participant {} killed by {:?}",
                        pending.tick,
                        actor.0,
                        participant.0,
                        killer.map(|k| k.0)
                    );
                    self.seats[index].deaths += 1;
                    if let Some(seat) = killer.and_then(|k| self.seat_mut(k)) {
                        seat.kills += 1;
                    }
                    self.respawn(index, slots);
                }
                ReplicaEvent::DamageTaken {
                    actor,
                    amount,
                    absorbed,
                    source,
                } => {
                    log::debug!(
                        "participant {}: actor {} took {amount} ({absorbed} absorbed) from {}",
                        participant.0,
                        actor.0,
                        source.0
                    );
                }
                ReplicaEvent::Impact {
                    point,
                    kind,
                    authoritative: true,
                    ..
                } => {
                    log::trace!("participant {}: {} at {point}", participant.0, kind.effect_name());
                }
                other => log::trace!("participant {}: {other:?}", participant.0),
            }
        }
    }

    fn seat_mut(&mut self, participant: ParticipantId) -> Option<&mut Seat> {
        self.seats
            .iter_mut()
            .find(|seat| seat.replica.local() == participant)
    }

    fn respawn(&mut self, index: usize, slots: usize) {
        let spawn_index = self.rng.gen_range(0..slots.max(1));
        let position = self.arena.spawn_point(spawn_index, slots);
        let seat = &mut self.seats[index];
        let actor = seat.replica.spawn_local_actor(position);

        if let Some(bot) = seat.bot.as_mut() {
            bot.actor = actor;
        }
        log::info!("participant {} respawned as actor {}", seat.replica.local().0, actor.0);
    }

    pub fn reports(&self) -> Vec<SeatReport> {
        self.seats
            .iter()
            .map(|seat| SeatReport {
                participant: seat.replica.local(),
                replica: seat.replica.stats(),
                link: self.hub.stats(seat.replica.local()),
                kills: seat.kills,
                deaths: seat.deaths,
            })
            .collect()
    }

    /// Drains whatever is still on the link so the final stats are settled.
    pub fn shutdown(&mut self) {
        for seat in &mut self.seats {
            let leftover = self.hub.receive(seat.replica.local()).len();
            if leftover > 0 {
                log::debug!(
                    "participant {} left {leftover} messages unread",
                    seat.replica.local().0
                );
            }
        }
    }
}

fn nearest_enemy(replica: &Replica, own: ActorId, from: Vec3) -> Option<Vec3> {
    replica
        .registry()
        .actors()
        .filter(|actor| actor.id != own)
        .map(|actor| actor.position())
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
}
