//! Client -> Server packet parsing.

use bytes::Bytes;

use super::ClientOpcode;
use crate::{BinaryReader, BinaryWriter, ProtocolError};

const FLAG_LEFT: u8 = 1 << 0;
const FLAG_RIGHT: u8 = 1 << 1;
const FLAG_UP: u8 = 1 << 2;
const FLAG_DOWN: u8 = 1 << 3;
const FLAG_BOOST: u8 = 1 << 4;

/// Direction flags sent with a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveFlags {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub boost: bool,
}

impl MoveFlags {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            left: bits & FLAG_LEFT != 0,
            right: bits & FLAG_RIGHT != 0,
            up: bits & FLAG_UP != 0,
            down: bits & FLAG_DOWN != 0,
            boost: bits & FLAG_BOOST != 0,
        }
    }

    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.left {
            bits |= FLAG_LEFT;
        }
        if self.right {
            bits |= FLAG_RIGHT;
        }
        if self.up {
            bits |= FLAG_UP;
        }
        if self.down {
            bits |= FLAG_DOWN;
        }
        if self.boost {
            bits |= FLAG_BOOST;
        }
        bits
    }
}

/// Parsed client packet.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientPacket {
    /// Spawn (0x00).
    Spawn {
        name: String,
        x: f32,
        y: f32,
        radius: f32,
        speed: f32,
    },
    /// Move (0x10).
    Move(MoveFlags),
    /// Disconnect (0xFF).
    Disconnect,
}

impl ClientPacket {
    /// Parse a client packet from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = BinaryReader::new(data.to_vec());
        let opcode = reader.get_u8()?;

        let packet = match opcode {
            0x00 => {
                let name = reader.get_string_utf8()?;
                let x = reader.get_f32()?;
                let y = reader.get_f32()?;
                let radius = reader.get_f32()?;
                let speed = reader.get_f32()?;
                ClientPacket::Spawn {
                    name,
                    x,
                    y,
                    radius,
                    speed,
                }
            }
            0x10 => ClientPacket::Move(MoveFlags::from_bits(reader.get_u8()?)),
            0xFF => ClientPacket::Disconnect,
            _ => return Err(ProtocolError::InvalidOpcode(opcode)),
        };

        reader.finish()?;
        Ok(packet)
    }

    /// Encode this packet for sending to the server.
    pub fn encode(&self) -> Bytes {
        let mut w = BinaryWriter::new();
        match self {
            ClientPacket::Spawn {
                name,
                x,
                y,
                radius,
                speed,
            } => {
                w.put_u8(ClientOpcode::Spawn as u8);
                w.put_string_utf8(name);
                w.put_f32(*x);
                w.put_f32(*y);
                w.put_f32(*radius);
                w.put_f32(*speed);
            }
            ClientPacket::Move(flags) => {
                w.put_u8(ClientOpcode::Move as u8);
                w.put_u8(flags.bits());
            }
            ClientPacket::Disconnect => w.put_u8(ClientOpcode::Disconnect as u8),
        }
        w.finish()
    }
}
