//! WebSocket server.

use crate::config::{CollisionFidelity, Config};
use crate::grid::{OccupancyGrid, TileLayer};
use crate::player::Player;
use anyhow::Context;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use glam::Vec2;
use protocol::packets::{ClientPacket, JoinedPlayer};
use protocol::Facing;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

pub mod fanout;
pub mod game;

pub use fanout::{ConnectionRegistry, Outbox, OUTBOX_CAPACITY};
pub use game::{GameState, IgnoreReason, InboundEvent, Outcome, Session, SessionState, SpawnRequest};

/// Event fanned out to every connection.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// Full registry snapshot, sent after every spawn.
    PlayerJoined(Arc<[Player]>),
    /// One player's new position and facing.
    PositionUpdate {
        name: String,
        position: Vec2,
        facing: Facing,
    },
    /// A player left.
    PlayerLeft { name: String },
}

impl OutboundEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundEvent::PlayerJoined(_) => "player_joined",
            OutboundEvent::PositionUpdate { .. } => "position_update",
            OutboundEvent::PlayerLeft { .. } => "player_left",
        }
    }

    /// Encode as a binary frame.
    pub fn encode(&self) -> Bytes {
        let packet = match self {
            OutboundEvent::PlayerJoined(players) => {
                let entries: Vec<JoinedPlayer> = players
                    .iter()
                    .map(|p| JoinedPlayer {
                        id: p.id.0,
                        name: p.name.clone(),
                        position: p.position,
                        radius: p.radius,
                        speed: p.speed,
                        facing: p.facing,
                    })
                    .collect();
                protocol::packets::build_player_joined(&entries)
            }
            OutboundEvent::PositionUpdate {
                name,
                position,
                facing,
            } => protocol::packets::build_position_update(name, *position, *facing),
            OutboundEvent::PlayerLeft { name } => protocol::packets::build_player_left(name),
        };
        packet.finish()
    }
}

/// Connection tracking state (shared across connection handlers).
struct ConnectionState {
    /// Number of connections per IP address.
    ip_connections: HashMap<IpAddr, usize>,
    /// Total number of connections.
    total_connections: usize,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            ip_connections: HashMap::new(),
            total_connections: 0,
        }
    }

    /// Try to add a connection, returns true if allowed.
    fn try_add_connection(&mut self, ip: IpAddr, max_total: usize, max_per_ip: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }

        let current = self.ip_connections.get(&ip).copied().unwrap_or(0);
        if current >= max_per_ip {
            return false;
        }

        *self.ip_connections.entry(ip).or_insert(0) += 1;
        self.total_connections += 1;
        true
    }

    /// Remove a connection.
    fn remove_connection(&mut self, ip: IpAddr) {
        if let Some(count) = self.ip_connections.get_mut(&ip) {
            if *count > 0 {
                *count -= 1;
                self.total_connections = self.total_connections.saturating_sub(1);
            }
            if *count == 0 {
                self.ip_connections.remove(&ip);
            }
        }
    }
}

/// Build the occupancy grid from the configured tile layer, if any.
pub fn load_grid(config: &Config) -> anyhow::Result<Option<OccupancyGrid>> {
    let Some(path) = &config.map.layer else {
        if config.collision.fidelity == CollisionFidelity::BoundsAndTiles {
            warn!("Tile collision enabled but no map layer configured; every cell is open");
        }
        return Ok(None);
    };

    let layer = TileLayer::load(path)?;
    let grid = OccupancyGrid::from_layer(&layer, config.map.tile_size)
        .with_context(|| format!("building occupancy grid from {:?}", path))?;
    info!(
        "Loaded {}x{} tile layer from {:?}",
        grid.columns(),
        grid.rows(),
        path
    );
    Ok(Some(grid))
}

/// Run the arena server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let grid = load_grid(&config)?;

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);
    info!(
        "Arena {}x{}, collision {:?}, self exclusion by {:?}",
        config.arena.width,
        config.arena.height,
        config.collision.fidelity,
        config.collision.self_exclusion
    );

    let conn_state = Arc::new(RwLock::new(ConnectionState::new()));
    let game_state = Arc::new(RwLock::new(GameState::new(&config, grid)));

    let max_connections = config.server.max_connections;
    let ip_limit = config.server.ip_limit;

    loop {
        let (stream, addr) = listener.accept().await?;
        let ip = addr.ip();

        {
            let mut state = conn_state.write().await;
            if !state.try_add_connection(ip, max_connections, ip_limit) {
                warn!("Connection rejected (limit reached): {}", addr);
                continue;
            }
        }

        let game_state = Arc::clone(&game_state);
        let conn_state = Arc::clone(&conn_state);

        tokio::spawn(async move {
            let result = handle_connection(stream, addr, game_state).await;

            // Always remove from connection tracking when done
            {
                let mut state = conn_state.write().await;
                state.remove_connection(addr.ip());
            }

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    game_state: Arc<RwLock<GameState>>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    let (outbox, mut inbox) = fanout::outbox_channel();
    let mut session = {
        let mut state = game_state.write().await;
        state.open_session(addr, outbox)
    };

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        let event = match ClientPacket::parse(&data) {
                            Ok(packet) => InboundEvent::from(packet),
                            Err(e) => {
                                warn!("Packet error from {}: {}", addr, e);
                                continue;
                            }
                        };
                        let mut state = game_state.write().await;
                        state.handle(&mut session, event);
                        if session.is_terminated() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} closed the connection", session.id);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        break;
                    }
                    _ => {}
                }
            }
            Some(event) = inbox.recv() => {
                if let Err(e) = write.send(Message::Binary(event.encode())).await {
                    warn!("Failed to send {} to {}: {}", event.kind(), addr, e);
                    break;
                }
            }
        }
    }

    // A dropped socket leaves the same way an explicit disconnect does.
    {
        let mut state = game_state.write().await;
        state.handle(&mut session, InboundEvent::Disconnect);
    }

    // Flush whatever was queued before leaving, including our own PlayerLeft.
    while let Ok(event) = inbox.try_recv() {
        if let Err(e) = write.send(Message::Binary(event.encode())).await {
            debug!("Dropped {} to departing {}: {}", event.kind(), addr, e);
            break;
        }
    }
    if let Err(e) = write.close().await {
        debug!("Close handshake with {} failed: {}", addr, e);
    }

    Ok(())
}
