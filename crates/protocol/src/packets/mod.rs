//! Packet definitions for the arena protocol.
//!
//! This module contains both client->server and server->client packet types.

mod client;
mod server;

pub use client::*;
pub use server::*;

/// Opcodes for client -> server packets.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientOpcode {
    /// Spawn with name, position, radius and speed.
    Spawn = 0x00,
    /// Movement intent flags.
    Move = 0x10,
    /// Explicit leave.
    Disconnect = 0xFF,
}

/// Opcodes for server -> client packets.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerOpcode {
    /// One player's new position and facing.
    PositionUpdate = 0x11,
    /// Full registry snapshot after a spawn.
    PlayerJoined = 0x20,
    /// A player left.
    PlayerLeft = 0x30,
}
