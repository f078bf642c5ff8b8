use std::collections::VecDeque;

use super::types::ReplicaEvent;

#[derive(Debug, Clone)]
pub struct PendingEvent {
    pub tick: u32,
    pub sequence: u32,
    pub event: ReplicaEvent,
}

/// Bounded queue of replica events waiting to be drained by the host.
///
/// When full, the oldest cosmetic event is evicted first; lifecycle events
/// are only dropped if nothing cosmetic is left.
pub struct EventQueue {
    pending: VecDeque<PendingEvent>,
    next_sequence: u32,
    max_pending: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(max_pending),
            next_sequence: 0,
            max_pending: max_pending.max(1),
        }
    }

    pub fn push(&mut self, tick: u32, event: ReplicaEvent) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        if self.pending.len() >= self.max_pending {
            self.evict_oldest();
        }

        self.pending.push_back(PendingEvent {
            tick,
            sequence,
            event,
        });

        sequence
    }

    pub fn drain(&mut self) -> Vec<PendingEvent> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn evict_oldest(&mut self) {
        let index = self
            .pending
            .iter()
            .position(|e| e.event.is_cosmetic())
            .unwrap_or(0);
        self.pending.remove(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorId;

    #[test]
    fn drain_empties_in_push_order() {
        let mut queue = EventQueue::new(16);
        queue.push(1, ReplicaEvent::Jumped { actor: ActorId(1) });
        queue.push(2, ReplicaEvent::Dashed { actor: ActorId(1) });
        queue.push(2, ReplicaEvent::Landed { actor: ActorId(2) });

        let ticks: Vec<u32> = queue.drain().iter().map(|p| p.tick).collect();
        assert_eq!(ticks, vec![1, 2, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn overflow_evicts_cosmetic_first() {
        let mut queue = EventQueue::new(2);
        queue.push(0, ReplicaEvent::ActorDestroyed { actor: ActorId(1) });
        queue.push(0, ReplicaEvent::Jumped { actor: ActorId(1) });
        queue.push(0, ReplicaEvent::ActorDied {
            actor: ActorId(2),
            killer: None,
        });

        let events: Vec<_> = queue.drain().into_iter().map(|p| p.event).collect();
        assert_eq!(
            events,
            vec![
                ReplicaEvent::ActorDestroyed { actor: ActorId(1) },
                ReplicaEvent::ActorDied {
                    actor: ActorId(2),
                    killer: None
                },
            ]
        );
    }

    #[test]
    fn sequences_increase() {
        let mut queue = EventQueue::default();
        let a = queue.push(0, ReplicaEvent::Jumped { actor: ActorId(1) });
        let b = queue.push(0, ReplicaEvent::Jumped { actor: ActorId(1) });
        assert_eq!(b, a + 1);
    }
}
