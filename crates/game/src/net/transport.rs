use crate::actor::ParticipantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Every participant except the sender.
    Others,
    Participant(ParticipantId),
}

/// Unreliable, unordered datagram delivery between participants.
pub trait Transport {
    fn send(&mut self, from: ParticipantId, target: Target, payload: Vec<u8>);

    /// Payloads addressed to `to` that are due for delivery.
    fn receive(&mut self, to: ParticipantId) -> Vec<Vec<u8>>;
}
