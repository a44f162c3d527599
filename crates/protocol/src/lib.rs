//! Shared protocol crate for the tile arena.
//!
//! This crate contains:
//! - Binary reading/writing utilities
//! - Packet definitions and builders
//! - Shared types (Facing, Position)

mod binary;
mod error;
pub mod packets;

pub use binary::{BinaryReader, BinaryWriter};
pub use error::ProtocolError;

/// Represents a 2D position using glam's Vec2.
pub type Position = glam::Vec2;

/// Direction a player last moved in.
///
/// The wire codes are fixed: down=0, left=1, right=2, up=3.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Down = 0,
    Left = 1,
    Right = 2,
    Up = 3,
}

impl Facing {
    /// Wire code for this facing.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a wire code.
    pub fn from_code(code: u8) -> Result<Self, ProtocolError> {
        match code {
            0 => Ok(Facing::Down),
            1 => Ok(Facing::Left),
            2 => Ok(Facing::Right),
            3 => Ok(Facing::Up),
            other => Err(ProtocolError::InvalidFacing(other)),
        }
    }

    /// Unit step along the facing axis (y grows downward).
    pub fn unit(self) -> Position {
        match self {
            Facing::Down => Position::new(0.0, 1.0),
            Facing::Left => Position::new(-1.0, 0.0),
            Facing::Right => Position::new(1.0, 0.0),
            Facing::Up => Position::new(0.0, -1.0),
        }
    }
}
