use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::actor::ParticipantId;

use super::stats::{LinkConditions, LinkStats};
use super::transport::{Target, Transport};

#[derive(Debug)]
struct DelayedPacket {
    release_tick: u64,
    order: u64,
    payload: Vec<u8>,
}

impl PartialEq for DelayedPacket {
    fn eq(&self, other: &Self) -> bool {
        self.release_tick == other.release_tick && self.order == other.order
    }
}

impl Eq for DelayedPacket {}

impl PartialOrd for DelayedPacket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedPacket {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .release_tick
            .cmp(&self.release_tick)
            .then_with(|| other.order.cmp(&self.order))
    }
}

#[derive(Debug, Default)]
struct Mailbox {
    queue: BinaryHeap<DelayedPacket>,
    stats: LinkStats,
}

/// In-memory transport connecting every replica of a session.
///
/// Packets are released on hub ticks; [`LoopbackHub::advance`] moves the
/// clock. Loss, duplication, and delay are drawn from a seeded generator so
/// a run can be replayed exactly.
pub struct LoopbackHub {
    conditions: LinkConditions,
    rng: StdRng,
    tick: u64,
    next_order: u64,
    mailboxes: BTreeMap<ParticipantId, Mailbox>,
}

impl LoopbackHub {
    pub fn new(conditions: LinkConditions) -> Self {
        let rng = StdRng::seed_from_u64(conditions.seed);
        Self {
            conditions,
            rng,
            tick: 0,
            next_order: 0,
            mailboxes: BTreeMap::new(),
        }
    }

    pub fn connect(&mut self, participant: ParticipantId) {
        self.mailboxes.entry(participant).or_default();
    }

    pub fn participants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.mailboxes.keys().copied()
    }

    pub fn advance(&mut self) {
        self.tick += 1;
    }

    pub fn stats(&self, participant: ParticipantId) -> LinkStats {
        self.mailboxes
            .get(&participant)
            .map(|mailbox| mailbox.stats)
            .unwrap_or_default()
    }

    fn deliver(&mut self, from: ParticipantId, to: ParticipantId, payload: &[u8]) {
        let bytes = payload.len() as u64;
        if let Some(sender) = self.mailboxes.get_mut(&from) {
            sender.stats.packets_sent += 1;
            sender.stats.bytes_sent += bytes;
        }

        if self.conditions.should_drop(&mut self.rng) {
            if let Some(sender) = self.mailboxes.get_mut(&from) {
                sender.stats.packets_dropped += 1;
            }
            return;
        }

        let copies = if self.conditions.should_duplicate(&mut self.rng) {
            if let Some(sender) = self.mailboxes.get_mut(&from) {
                sender.stats.packets_duplicated += 1;
            }
            2
        } else {
            1
        };

        for _ in 0..copies {
            let delay = self.conditions.delay_ticks(&mut self.rng) as u64;
            let order = self.next_order;
            self.next_order += 1;
            let Some(mailbox) = self.mailboxes.get_mut(&to) else {
                return;
            };
            mailbox.queue.push(DelayedPacket {
                release_tick: self.tick + delay,
                order,
                payload: payload.to_vec(),
            });
        }
    }
}

impl Transport for LoopbackHub {
    fn send(&mut self, from: ParticipantId, target: Target, payload: Vec<u8>) {
        let recipients: Vec<ParticipantId> = match target {
            Target::Others => self.participants().filter(|p| *p != from).collect(),
            Target::Participant(to) if to == from => {
                log::warn!("participant {} tried to message itself", from.0);
                Vec::new()
            }
            Target::Participant(to) => vec![to],
        };

        for to in recipients {
            self.deliver(from, to, &payload);
        }
    }

    fn receive(&mut self, to: ParticipantId) -> Vec<Vec<u8>> {
        let tick = self.tick;
        let Some(mailbox) = self.mailboxes.get_mut(&to) else {
            return Vec::new();
        };

        let mut payloads = Vec::new();
        while mailbox
            .queue
            .peek()
            .is_some_and(|packet| packet.release_tick <= tick)
        {
            if let Some(packet) = mailbox.queue.pop() {
                mailbox.stats.packets_received += 1;
                mailbox.stats.bytes_received += packet.payload.len() as u64;
                payloads.push(packet.payload);
            }
        }
        payloads
    }
}
