use std::collections::BTreeMap;

use super::{Actor, ActorId, ParticipantId};

/// Live actors known to one replica.
///
/// Iteration through [`ActorRegistry::visit`] works on a copy of the id list,
/// so callbacks may register or unregister actors (including the one being
/// visited) without invalidating the walk.
#[derive(Debug, Default)]
pub struct ActorRegistry {
    actors: BTreeMap<ActorId, Actor>,
    next_serial: u32,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&mut self, owner: ParticipantId) -> ActorId {
        self.next_serial += 1;
        ActorId::compose(owner, self.next_serial)
    }

    /// Returns `false` if an actor with the same id is already live.
    pub fn register(&mut self, actor: Actor) -> bool {
        if self.actors.contains_key(&actor.id) {
            return false;
        }
        log::debug!("registered actor {} (owner {})", actor.id.0, actor.owner.0);
        self.actors.insert(actor.id, actor);
        true
    }

    pub fn unregister(&mut self, id: ActorId) -> Option<Actor> {
        let actor = self.actors.remove(&id);
        if actor.is_some() {
            log::debug!("unregistered actor {}", id.0);
        }
        actor
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Calls `f` for every actor live at the start of the walk that is still
    /// live when its turn comes.
    pub fn visit<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Self, ActorId),
    {
        for id in self.ids() {
            if self.contains(id) {
                f(self, id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::net::ReplicationConfig;

    fn spawn(registry: &mut ActorRegistry, owner: u32) -> ActorId {
        let owner = ParticipantId(owner);
        let id = registry.allocate_id(owner);
        let actor = Actor::new(id, owner, owner, Vec3::ZERO, &ReplicationConfig::default());
        assert!(registry.register(actor));
        id
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = ActorRegistry::new();
        let id = spawn(&mut registry, 1);
        let copy = registry.get(id).cloned().unwrap();
        assert!(!registry.register(copy));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn removal_during_visit_is_safe() {
        let mut registry = ActorRegistry::new();
        let first = spawn(&mut registry, 1);
        let second = spawn(&mut registry, 1);
        let third = spawn(&mut registry, 1);

        let mut visited = Vec::new();
        registry.visit(|registry, id| {
            visited.push(id);
            if id == first {
                registry.unregister(first);
                registry.unregister(second);
            }
        });

        assert_eq!(visited, vec![first, third]);
        assert_eq!(registry.ids(), vec![third]);
    }

    #[test]
    fn actors_registered_during_visit_wait_for_next_walk() {
        let mut registry = ActorRegistry::new();
        spawn(&mut registry, 1);

        let mut count = 0;
        registry.visit(|registry, _| {
            count += 1;
            spawn(registry, 1);
        });

        assert_eq!(count, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn spawn_and_despawn_cycles_leave_nothing_behind() {
        let mut registry = ActorRegistry::new();
        for _ in 0..1000 {
            let id = spawn(&mut registry, 1);
            assert!(registry.unregister(id).is_some());
        }
        assert!(registry.is_empty());
        assert!(registry.unregister(ActorId(1)).is_none());
    }
}
