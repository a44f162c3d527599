//! Game state and the per-connection event handler.

use crate::collision::{self, ArenaBounds};
use crate::config::{CollisionFidelity, Config};
use crate::grid::OccupancyGrid;
use crate::movement::{self, MoveIntent};
use crate::player::{ConnectionId, Player, PlayerRegistry};
use glam::Vec2;
use protocol::packets::ClientPacket;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

use super::fanout::{ConnectionRegistry, Outbox};
use super::OutboundEvent;

/// Spawn payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub name: String,
    pub position: Vec2,
    pub radius: f32,
    pub speed: f32,
}

impl SpawnRequest {
    /// Non-finite numbers and negative sizes are rejected.
    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.radius.is_finite()
            && self.speed.is_finite()
            && self.radius >= 0.0
            && self.speed >= 0.0
    }
}

/// Event received from one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Spawn(SpawnRequest),
    Move(MoveIntent),
    Disconnect,
}

impl From<ClientPacket> for InboundEvent {
    fn from(packet: ClientPacket) -> Self {
        match packet {
            ClientPacket::Spawn {
                name,
                x,
                y,
                radius,
                speed,
            } => InboundEvent::Spawn(SpawnRequest {
                name,
                position: Vec2::new(x, y),
                radius,
                speed,
            }),
            ClientPacket::Move(flags) => InboundEvent::Move(flags.into()),
            ClientPacket::Disconnect => InboundEvent::Disconnect,
        }
    }
}

/// Why an event had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Move or disconnect before the connection spawned.
    NotSpawned,
    /// The connection already left.
    Terminated,
    /// Spawn payload failed validation or the body cannot fit in the arena.
    MalformedSpawn,
}

/// Result of handling one inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// State changed and `event` went out to `delivered` connections.
    Broadcast {
        event: OutboundEvent,
        delivered: usize,
    },
    Ignored(IgnoreReason),
}

/// Lifecycle of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unspawned,
    Active,
    Terminated,
}

/// Per-connection handle owned by the transport task.
#[derive(Debug)]
pub struct Session {
    pub id: ConnectionId,
    pub state: SessionState,
    outbox: Outbox,
}

impl Session {
    pub fn new(id: ConnectionId, outbox: Outbox) -> Self {
        Self {
            id,
            state: SessionState::Unspawned,
            outbox,
        }
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }
}

/// Authoritative arena state.
pub struct GameState {
    pub config: Config,
    bounds: ArenaBounds,
    grid: Option<OccupancyGrid>,

    // ID counter
    next_connection_id: u32,

    players: PlayerRegistry,
    connections: ConnectionRegistry,
}

impl GameState {
    /// Create a new game state. `grid` is only consulted when the collision
    /// fidelity includes tiles.
    pub fn new(config: &Config, grid: Option<OccupancyGrid>) -> Self {
        let arena = &config.arena;
        Self {
            config: config.clone(),
            bounds: ArenaBounds::new(arena.width, arena.height, arena.edge_margin),
            grid,
            next_connection_id: 1,
            players: PlayerRegistry::new(),
            connections: ConnectionRegistry::new(),
        }
    }

    #[inline]
    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    #[inline]
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    #[inline]
    pub fn bounds(&self) -> ArenaBounds {
        self.bounds
    }

    /// Assign an id to a freshly accepted connection.
    pub fn open_session(&mut self, addr: SocketAddr, outbox: Outbox) -> Session {
        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id = self.next_connection_id.wrapping_add(1);
        info!("Client {} connected from {}", id, addr);
        Session::new(id, outbox)
    }

    /// Apply one event from `session` and fan out the result.
    ///
    /// The registry update and the broadcast happen under the same borrow,
    /// so no other event can observe one without the other.
    pub fn handle(&mut self, session: &mut Session, event: InboundEvent) -> Outcome {
        let outcome = match (session.state, event) {
            (SessionState::Terminated, event) => {
                debug!("Client {} sent {:?} after leaving", session.id, event);
                Outcome::Ignored(IgnoreReason::Terminated)
            }
            (_, InboundEvent::Spawn(request)) => self.handle_spawn(session, request),
            (SessionState::Unspawned, InboundEvent::Move(_)) => {
                Outcome::Ignored(IgnoreReason::NotSpawned)
            }
            (SessionState::Active, InboundEvent::Move(intent)) => {
                self.handle_move(session.id, intent)
            }
            (SessionState::Unspawned, InboundEvent::Disconnect) => {
                session.state = SessionState::Terminated;
                Outcome::Ignored(IgnoreReason::NotSpawned)
            }
            (SessionState::Active, InboundEvent::Disconnect) => {
                session.state = SessionState::Terminated;
                self.handle_disconnect(session.id)
            }
        };

        if let Outcome::Ignored(reason) = &outcome {
            debug!("Client {} event ignored: {:?}", session.id, reason);
        }
        outcome
    }

    fn handle_spawn(&mut self, session: &mut Session, request: SpawnRequest) -> Outcome {
        if !request.is_valid() || !self.bounds.fits(request.radius) {
            return Outcome::Ignored(IgnoreReason::MalformedSpawn);
        }

        let position = self
            .bounds
            .clamp(request.position, request.radius, request.speed);
        let position = self.bounds.contain(position, request.radius);
        let player = self.players.spawn(
            session.id,
            request.name,
            position,
            request.radius,
            request.speed,
        );
        info!(
            "Client {} spawned as \"{}\" at ({:.1}, {:.1})",
            session.id, player.name, player.position.x, player.position.y
        );

        self.connections.register(session.id, session.outbox.clone());
        session.state = SessionState::Active;

        let snapshot: Arc<[Player]> = self.players.iter().cloned().collect();
        self.broadcast(OutboundEvent::PlayerJoined(snapshot))
    }

    fn handle_move(&mut self, id: ConnectionId, intent: MoveIntent) -> Outcome {
        let Some(player) = self.resolve_move(id, intent) else {
            return Outcome::Ignored(IgnoreReason::NotSpawned);
        };

        let event = OutboundEvent::PositionUpdate {
            name: player.name.clone(),
            position: player.position,
            facing: player.facing,
        };
        if let Some(entry) = self.players.get_mut(id) {
            *entry = player;
        }
        self.broadcast(event)
    }

    /// Run the movement step and every collision pass for `id` without
    /// committing. Passes run in order: circle separation, arena clamp,
    /// tile correction. The result is then held to the arena bounds.
    pub fn resolve_move(&self, id: ConnectionId, intent: MoveIntent) -> Option<Player> {
        let mut mover = self.players.get(id)?.clone();

        let step = movement::step(&mover, intent, self.config.movement.boost_speed);
        mover.position = step.position;
        mover.facing = step.facing;

        mover.position = collision::resolve_player_collisions(
            &mover,
            self.players.iter(),
            self.config.collision.self_exclusion,
        );
        mover.position = self.bounds.clamp(mover.position, mover.radius, mover.speed);

        if self.config.collision.fidelity == CollisionFidelity::BoundsAndTiles {
            if let Some(grid) = &self.grid {
                mover.position = collision::tile_correction(mover.position, mover.facing, grid);
            }
        }
        mover.position = self.bounds.contain(mover.position, mover.radius);

        Some(mover)
    }

    fn handle_disconnect(&mut self, id: ConnectionId) -> Outcome {
        let Some(player) = self.players.get(id) else {
            self.connections.unregister(id);
            return Outcome::Ignored(IgnoreReason::NotSpawned);
        };
        info!("Client {} (\"{}\") disconnected", id, player.name);

        let outcome = self.broadcast(OutboundEvent::PlayerLeft {
            name: player.name.clone(),
        });
        self.players.remove(id);
        self.connections.unregister(id);
        outcome
    }

    fn broadcast(&self, event: OutboundEvent) -> Outcome {
        let delivered = self.connections.broadcast(&event);
        Outcome::Broadcast { event, delivered }
    }
}
