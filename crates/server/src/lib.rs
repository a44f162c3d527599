//! Authoritative arena position server library.

pub mod collision;
pub mod config;
pub mod grid;
pub mod movement;
pub mod player;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use player::{ConnectionId, Player, PlayerRegistry};
pub use server::{run, GameState, InboundEvent, OutboundEvent, Outcome};
