use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, Vitals};
use crate::interpolation::VectorInterpolator;
use crate::movement::{LocomotionState, MovementCues};

use super::protocol::{sequence_greater_than, NetworkSnapshot, DEFAULT_SEND_RATE};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Snapshots sent per second by each authority.
    pub send_rate: u32,
    /// Interpolation window as a multiple of the send interval.
    pub interpolate_over: f32,
    /// Fraction of rotational error left after one second of blending.
    pub rotation_decay: f32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            send_rate: DEFAULT_SEND_RATE,
            interpolate_over: 1.0,
            rotation_decay: 1e-10,
        }
    }
}

impl ReplicationConfig {
    pub fn interpolation_window(&self) -> f32 {
        (1.0 / self.send_rate.max(1) as f32) * self.interpolate_over
    }

    /// Number of simulation ticks between two snapshots, at least one.
    pub fn send_interval_ticks(&self, tick_rate: u32) -> u32 {
        (tick_rate / self.send_rate.max(1)).max(1)
    }
}

/// Smoothing state kept for an actor this replica only mirrors.
#[derive(Debug, Clone)]
pub struct ObserverState {
    pub position: VectorInterpolator,
    pub last_received_position: Option<Vec3>,
    pub last_tick: Option<u32>,
    pub smooth_rotation: Quat,
}

impl ObserverState {
    pub fn new(config: &ReplicationConfig) -> Self {
        Self {
            position: VectorInterpolator::new(config.interpolation_window()),
            last_received_position: None,
            last_tick: None,
            smooth_rotation: Quat::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotApply {
    /// Sent to the actor's own authority; nothing to do.
    Ignored,
    /// Same or older tick than one already applied.
    Stale,
    Snapped { cues: MovementCues },
    Interpolating { cues: MovementCues },
}

impl SnapshotApply {
    pub fn cues(&self) -> MovementCues {
        match self {
            Self::Snapped { cues } | Self::Interpolating { cues } => *cues,
            Self::Ignored | Self::Stale => MovementCues::default(),
        }
    }
}

pub struct NetworkStateReplicator {
    config: ReplicationConfig,
}

impl Default for NetworkStateReplicator {
    fn default() -> Self {
        Self::new(ReplicationConfig::default())
    }
}

impl NetworkStateReplicator {
    pub fn new(config: ReplicationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    pub fn should_send(&self, tick: u32, tick_rate: u32) -> bool {
        tick % self.config.send_interval_ticks(tick_rate) == 0
    }

    /// Projects an owned actor into a snapshot. The jump and dash cues are
    /// consumed here so each is sent at most once.
    pub fn capture(&self, tick: u32, actor: &mut Actor) -> NetworkSnapshot {
        let cues = actor.movement.cues.take();
        let movement = &actor.movement;

        NetworkSnapshot {
            actor: actor.id.0,
            tick,
            position: movement.position.into(),
            input_velocity: movement.input_velocity.into(),
            falling_velocity: movement.falling_velocity.into(),
            recoil_velocity: movement.recoil_velocity.into(),
            look_euler: movement.look_euler.into(),
            actively_jumping: movement.actively_jumping,
            play_jump: cues.jump,
            play_dash: cues.dash,
            locomotion: movement.locomotion as u8,
            health: actor.vitals.health,
            shield: actor.vitals.shield,
        }
    }

    /// Folds a received snapshot into a mirrored actor.
    ///
    /// Velocities and look are taken as-is so local dead reckoning continues
    /// from them. Position is snapped when it repeats the previous snapshot,
    /// otherwise the gap to the local position is handed to the interpolator.
    pub fn apply(&self, snapshot: &NetworkSnapshot, actor: &mut Actor) -> SnapshotApply {
        let Some(observer) = actor.observer.as_mut() else {
            return SnapshotApply::Ignored;
        };

        if observer
            .last_tick
            .is_some_and(|last| !sequence_greater_than(snapshot.tick, last))
        {
            log::trace!("dropping stale snapshot {} for actor {}", snapshot.tick, actor.id.0);
            return SnapshotApply::Stale;
        }
        observer.last_tick = Some(snapshot.tick);

        let movement = &mut actor.movement;
        movement.input_velocity = Vec3::from(snapshot.input_velocity);
        movement.falling_velocity = Vec3::from(snapshot.falling_velocity);
        movement.recoil_velocity = Vec3::from(snapshot.recoil_velocity);
        movement.look_euler = Vec3::from(snapshot.look_euler);
        movement.actively_jumping = snapshot.actively_jumping;
        movement.locomotion = LocomotionState::from(snapshot.locomotion);

        actor.vitals = Vitals {
            health: snapshot.health,
            shield: snapshot.shield,
        };

        let cues = MovementCues {
            jump: snapshot.play_jump,
            dash: snapshot.play_dash,
            landed: false,
        };

        let received = Vec3::from(snapshot.position);
        let repeated = observer.last_received_position == Some(received);
        observer.last_received_position = Some(received);

        if !repeated && observer.position.start(received - movement.position) {
            return SnapshotApply::Interpolating { cues };
        }

        observer.position.stop();
        movement.position = received;
        movement.last_safe_position = received;
        SnapshotApply::Snapped { cues }
    }

    /// Per-tick observer smoothing. Returns the positional correction applied.
    pub fn update(&self, actor: &mut Actor, dt: f32) -> Vec3 {
        let Some(observer) = actor.observer.as_mut() else {
            return Vec3::ZERO;
        };

        let correction = observer.position.update(dt);
        actor.movement.position += correction;

        let euler = actor.movement.look_euler;
        let target = Quat::from_euler(EulerRot::YXZ, euler.y, euler.x, euler.z);
        let blend = 1.0 - self.config.rotation_decay.powf(dt);
        observer.smooth_rotation = observer.smooth_rotation.slerp(target, blend);

        correction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorId, ParticipantId};

    const DT: f32 = 1.0 / 60.0;

    fn pair() -> (Actor, Actor) {
        let config = ReplicationConfig::default();
        let id = ActorId::compose(ParticipantId(1), 1);
        let owned = Actor::new(id, ParticipantId(1), ParticipantId(1), Vec3::ZERO, &config);
        let mirror = Actor::new(id, ParticipantId(1), ParticipantId(2), Vec3::ZERO, &config);
        (owned, mirror)
    }

    #[test]
    fn capture_clears_one_shot_cues() {
        let replicator = NetworkStateReplicator::default();
        let (mut owned, _) = pair();
        owned.movement.cues.jump = true;

        let first = replicator.capture(1, &mut owned);
        let second = replicator.capture(2, &mut owned);

        assert!(first.play_jump);
        assert!(!second.play_jump);
    }

    #[test]
    fn moved_position_starts_interpolation() {
        let replicator = NetworkStateReplicator::default();
        let (mut owned, mut mirror) = pair();

        owned.movement.position = Vec3::new(2.0, 0.0, 0.0);
        let snapshot = replicator.capture(1, &mut owned);

        let outcome = replicator.apply(&snapshot, &mut mirror);
        assert!(matches!(outcome, SnapshotApply::Interpolating { .. }));
        assert_eq!(mirror.movement.position, Vec3::ZERO);

        let window = replicator.config().interpolation_window();
        let ticks = (window / DT).ceil() as usize;
        for _ in 0..ticks {
            replicator.update(&mut mirror, DT);
        }
        assert!((mirror.movement.position - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn repeated_position_snaps() {
        let replicator = NetworkStateReplicator::default();
        let (mut owned, mut mirror) = pair();
        owned.movement.position = Vec3::new(2.0, 0.0, 0.0);

        let first = replicator.capture(1, &mut owned);
        replicator.apply(&first, &mut mirror);
        mirror.movement.position = Vec3::new(1.5, 0.0, 0.0);

        let second = replicator.capture(2, &mut owned);
        let outcome = replicator.apply(&second, &mut mirror);

        assert!(matches!(outcome, SnapshotApply::Snapped { .. }));
        assert_eq!(mirror.movement.position, Vec3::new(2.0, 0.0, 0.0));
        assert!(!mirror.observer.as_ref().unwrap().position.is_running());
    }

    #[test]
    fn negligible_gap_snaps() {
        let replicator = NetworkStateReplicator::default();
        let (mut owned, mut mirror) = pair();
        owned.movement.position = Vec3::new(0.001, 0.0, 0.0);

        let snapshot = replicator.capture(1, &mut owned);
        let outcome = replicator.apply(&snapshot, &mut mirror);

        assert!(matches!(outcome, SnapshotApply::Snapped { .. }));
        assert_eq!(mirror.movement.position, Vec3::new(0.001, 0.0, 0.0));
    }

    #[test]
    fn duplicate_snapshot_is_a_no_op() {
        let replicator = NetworkStateReplicator::default();
        let (mut owned, mut mirror) = pair();
        owned.movement.position = Vec3::new(3.0, 0.0, 0.0);
        owned.movement.cues.dash = true;

        let snapshot = replicator.capture(5, &mut owned);
        let first = replicator.apply(&snapshot, &mut mirror);
        assert!(first.cues().dash);

        replicator.update(&mut mirror, DT);
        let position = mirror.movement.position;

        let second = replicator.apply(&snapshot, &mut mirror);
        assert_eq!(second, SnapshotApply::Stale);
        assert!(!second.cues().any());
        assert_eq!(mirror.movement.position, position);
    }

    #[test]
    fn older_snapshot_is_stale() {
        let replicator = NetworkStateReplicator::default();
        let (mut owned, mut mirror) = pair();

        let early = replicator.capture(3, &mut owned);
        owned.movement.position = Vec3::new(1.0, 0.0, 0.0);
        let late = replicator.capture(4, &mut owned);

        replicator.apply(&late, &mut mirror);
        assert_eq!(replicator.apply(&early, &mut mirror), SnapshotApply::Stale);
    }

    #[test]
    fn authority_ignores_snapshots() {
        let replicator = NetworkStateReplicator::default();
        let (mut owned, _) = pair();
        let snapshot = replicator.capture(1, &mut owned);
        assert_eq!(replicator.apply(&snapshot, &mut owned), SnapshotApply::Ignored);
    }

    #[test]
    fn rotation_converges_toward_received_look() {
        let replicator = NetworkStateReplicator::default();
        let (mut owned, mut mirror) = pair();
        owned.movement.look_euler = Vec3::new(0.0, 1.2, 0.0);

        let snapshot = replicator.capture(1, &mut owned);
        replicator.apply(&snapshot, &mut mirror);
        for _ in 0..30 {
            replicator.update(&mut mirror, DT);
        }

        let target = Quat::from_rotation_y(1.2);
        assert!(mirror.display_rotation().angle_between(target) < 1e-3);
    }

    #[test]
    fn send_interval_follows_send_rate() {
        let replicator = NetworkStateReplicator::default();
        assert!(replicator.should_send(0, 60));
        assert!(!replicator.should_send(1, 60));
        assert!(replicator.should_send(4, 60));
    }
}
