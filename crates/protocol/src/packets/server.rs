//! Server -> Client packet building.

use super::ServerOpcode;
use crate::{BinaryReader, BinaryWriter, Facing, Position, ProtocolError};

/// One registry entry in a PlayerJoined snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedPlayer {
    /// Connection id of the owner.
    pub id: u32,
    pub name: String,
    pub position: Position,
    pub radius: f32,
    pub speed: f32,
    pub facing: Facing,
}

/// Build a PlayerJoined packet (0x20) carrying the whole registry.
pub fn build_player_joined(players: &[JoinedPlayer]) -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(3 + players.len() * 32);
    w.put_u8(ServerOpcode::PlayerJoined as u8);
    w.put_u16(players.len().min(u16::MAX as usize) as u16);
    for player in players.iter().take(u16::MAX as usize) {
        w.put_u32(player.id);
        w.put_string_utf8(&player.name);
        w.put_f32(player.position.x);
        w.put_f32(player.position.y);
        w.put_f32(player.radius);
        w.put_f32(player.speed);
        w.put_u8(player.facing.code());
    }
    w
}

/// Build a PositionUpdate packet (0x11).
pub fn build_position_update(name: &str, position: Position, facing: Facing) -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(11 + name.len());
    w.put_u8(ServerOpcode::PositionUpdate as u8);
    w.put_string_utf8(name);
    w.put_f32(position.x);
    w.put_f32(position.y);
    w.put_u8(facing.code());
    w
}

/// Build a PlayerLeft packet (0x30).
pub fn build_player_left(name: &str) -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(2 + name.len());
    w.put_u8(ServerOpcode::PlayerLeft as u8);
    w.put_string_utf8(name);
    w
}

/// Parsed server packet, for clients and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerPacket {
    PlayerJoined(Vec<JoinedPlayer>),
    PositionUpdate {
        name: String,
        position: Position,
        facing: Facing,
    },
    PlayerLeft {
        name: String,
    },
}

impl ServerPacket {
    /// Parse a server packet from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = BinaryReader::new(data.to_vec());
        let opcode = reader.get_u8()?;

        let packet = match opcode {
            0x20 => {
                let count = reader.get_u16()? as usize;
                let mut players = Vec::with_capacity(count);
                for _ in 0..count {
                    let id = reader.get_u32()?;
                    let name = reader.get_string_utf8()?;
                    let x = reader.get_f32()?;
                    let y = reader.get_f32()?;
                    let radius = reader.get_f32()?;
                    let speed = reader.get_f32()?;
                    let facing = Facing::from_code(reader.get_u8()?)?;
                    players.push(JoinedPlayer {
                        id,
                        name,
                        position: Position::new(x, y),
                        radius,
                        speed,
                        facing,
                    });
                }
                ServerPacket::PlayerJoined(players)
            }
            0x11 => {
                let name = reader.get_string_utf8()?;
                let x = reader.get_f32()?;
                let y = reader.get_f32()?;
                let facing = Facing::from_code(reader.get_u8()?)?;
                ServerPacket::PositionUpdate {
                    name,
                    position: Position::new(x, y),
                    facing,
                }
            }
            0x30 => ServerPacket::PlayerLeft {
                name: reader.get_string_utf8()?,
            },
            _ => return Err(ProtocolError::InvalidOpcode(opcode)),
        };

        reader.finish()?;
        Ok(packet)
    }
}
