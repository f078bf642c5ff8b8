use std::collections::{HashSet, VecDeque};

use crate::actor::{ActorId, ParticipantId};
use crate::net::DamageNotice;

use super::ProjectileId;

/// One target's share of one resolved hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub hit: ProjectileId,
    pub target: ActorId,
    pub amount: f32,
    pub source: ParticipantId,
}

impl DamageEvent {
    pub fn to_notice(self) -> DamageNotice {
        DamageNotice {
            hit: self.hit.0,
            target: self.target.0,
            amount: self.amount,
            source: self.source.0,
        }
    }

    pub fn from_notice(notice: &DamageNotice) -> Self {
        Self {
            hit: ProjectileId(notice.hit),
            target: ActorId(notice.target),
            amount: notice.amount,
            source: ParticipantId(notice.source),
        }
    }
}

/// Remembers which (hit, target) pairs were already applied so a duplicated
/// notice cannot deal damage twice.
#[derive(Debug)]
pub struct DamageLedger {
    seen: HashSet<(ProjectileId, ActorId)>,
    order: VecDeque<(ProjectileId, ActorId)>,
    capacity: usize,
}

impl Default for DamageLedger {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl DamageLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// `true` the first time an event is seen.
    pub fn record(&mut self, event: &DamageEvent) -> bool {
        let key = (event.hit, event.target);
        if !self.seen.insert(key) {
            return false;
        }

        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
