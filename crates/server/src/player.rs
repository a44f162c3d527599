//! Player state and the registry keyed by connection.

use glam::Vec2;
use protocol::Facing;
use std::collections::HashMap;
use std::fmt;

/// Transport-assigned identity of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One connected participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
    pub position: Vec2,
    pub radius: f32,
    /// Base distance covered by one move.
    pub speed: f32,
    pub facing: Facing,
}

impl Player {
    pub fn new(id: ConnectionId, name: String, position: Vec2, radius: f32, speed: f32) -> Self {
        Self {
            id,
            name,
            position,
            radius,
            speed,
            facing: Facing::default(),
        }
    }
}

/// Authoritative mapping of connection id to player.
///
/// Iteration follows insertion order, so collision resolution visits other
/// players deterministically.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<ConnectionId, Player>,
    order: Vec<ConnectionId>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new player, replacing any stale entry for `id`.
    pub fn spawn(
        &mut self,
        id: ConnectionId,
        name: String,
        position: Vec2,
        radius: f32,
        speed: f32,
    ) -> &Player {
        let player = Player::new(id, name, position, radius, speed);
        if self.players.insert(id, player).is_none() {
            self.order.push(id);
        }
        &self.players[&id]
    }

    #[inline]
    pub fn get(&self, id: ConnectionId) -> Option<&Player> {
        self.players.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Remove a player. Returns the removed entry, if any.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        self.order.retain(|&other| other != id);
        Some(player)
    }

    #[inline]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.players.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.order.iter().filter_map(|id| self.players.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(registry: &mut PlayerRegistry, id: u32, name: &str) {
        registry.spawn(ConnectionId(id), name.to_string(), Vec2::new(50.0, 50.0), 10.0, 5.0);
    }

    #[test]
    fn test_spawn_and_get() {
        let mut registry = PlayerRegistry::new();
        let player = registry
            .spawn(ConnectionId(1), "alice".into(), Vec2::new(100.0, 120.0), 10.0, 5.0)
            .clone();

        assert_eq!(player.position, Vec2::new(100.0, 120.0));
        assert_eq!(player.facing, Facing::Down);
        assert_eq!(registry.get(ConnectionId(1)), Some(&player));
        assert!(registry.get(ConnectionId(2)).is_none());
    }

    #[test]
    fn test_respawn_overwrites_without_duplicating() {
        let mut registry = PlayerRegistry::new();
        spawn(&mut registry, 1, "alice");
        spawn(&mut registry, 2, "bob");
        registry.spawn(ConnectionId(1), "alice2".into(), Vec2::new(9.0, 9.0), 4.0, 2.0);

        assert_eq!(registry.len(), 2);
        let names: Vec<&str> = registry.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["alice2", "bob"]);
        assert_eq!(registry.get(ConnectionId(1)).unwrap().radius, 4.0);
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let mut registry = PlayerRegistry::new();
        spawn(&mut registry, 1, "alice");

        assert!(registry.remove(ConnectionId(5)).is_none());
        assert_eq!(registry.len(), 1);

        let removed = registry.remove(ConnectionId(1)).unwrap();
        assert_eq!(removed.name, "alice");
        assert!(registry.is_empty());
        assert_eq!(registry.iter().count(), 0);
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut registry = PlayerRegistry::new();
        for (id, name) in [(30, "c"), (10, "a"), (20, "b")] {
            spawn(&mut registry, id, name);
        }
        let ids: Vec<u32> = registry.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, [30, 10, 20]);
    }
}
