//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Largest player count a PlayerJoined snapshot can carry.
pub const MAX_CONNECTIONS_LIMIT: usize = u16::MAX as usize;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub collision: CollisionConfig,
    #[serde(default)]
    pub map: MapConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::from_toml_str(&contents)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// Parse configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(contents)?;
        if config.server.max_connections > MAX_CONNECTIONS_LIMIT {
            warn!(
                "max_connections {} exceeds {}, capping",
                config.server.max_connections, MAX_CONNECTIONS_LIMIT
            );
            config.server.max_connections = MAX_CONNECTIONS_LIMIT;
        }
        Ok(config)
    }
}

/// Server networking settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connections per IP limit.
    #[serde(default = "default_ip_limit")]
    pub ip_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            ip_limit: default_ip_limit(),
        }
    }
}

fn default_port() -> u16 {
    1234
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    100
}
fn default_ip_limit() -> usize {
    100
}

/// Arena bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArenaConfig {
    #[serde(default = "default_arena_size")]
    pub width: f32,
    #[serde(default = "default_arena_size")]
    pub height: f32,
    /// Gap left between a clamped player's edge and the arena border.
    #[serde(default = "default_edge_margin")]
    pub edge_margin: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: default_arena_size(),
            height: default_arena_size(),
            edge_margin: default_edge_margin(),
        }
    }
}

fn default_arena_size() -> f32 {
    512.0
}
fn default_edge_margin() -> f32 {
    1.0
}

/// Movement tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MovementConfig {
    /// Speed used instead of the player's own speed when a move is boosted.
    /// The reference deployments use 4 and 25.
    #[serde(default = "default_boost_speed")]
    pub boost_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            boost_speed: default_boost_speed(),
        }
    }
}

fn default_boost_speed() -> f32 {
    4.0
}

/// Which collision passes run after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionFidelity {
    /// Circle separation and arena clamp.
    #[default]
    Bounds,
    /// Circle separation, arena clamp and tile-occupancy correction.
    BoundsAndTiles,
}

/// How the mover recognises itself when resolving circle collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfExclusion {
    /// Skip entries with the same display name. Players sharing a name
    /// never collide with each other.
    #[default]
    Name,
    /// Skip the mover's own connection id.
    Id,
}

/// Collision settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CollisionConfig {
    #[serde(default)]
    pub fidelity: CollisionFidelity,
    #[serde(default)]
    pub self_exclusion: SelfExclusion,
}

/// Tile map settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapConfig {
    /// Side of one grid cell in arena units.
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    /// Optional TOML tile layer used to build the occupancy grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<PathBuf>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_size: default_tile_size(),
            layer: None,
        }
    }
}

fn default_tile_size() -> f32 {
    32.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = Config::default();
        assert_eq!(config.server.port, 1234);
        assert_eq!(config.arena.width, 512.0);
        assert_eq!(config.arena.height, 512.0);
        assert_eq!(config.arena.edge_margin, 1.0);
        assert_eq!(config.movement.boost_speed, 4.0);
        assert_eq!(config.map.tile_size, 32.0);
        assert_eq!(config.collision.fidelity, CollisionFidelity::Bounds);
        assert_eq!(config.collision.self_exclusion, SelfExclusion::Name);
        assert!(config.map.layer.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [movement]
            boost_speed = 25.0

            [collision]
            fidelity = "bounds_and_tiles"
            self_exclusion = "id"

            [map]
            layer = "maps/level1.toml"
            "#,
        )
        .unwrap();

        assert_eq!(config.movement.boost_speed, 25.0);
        assert_eq!(config.collision.fidelity, CollisionFidelity::BoundsAndTiles);
        assert_eq!(config.collision.self_exclusion, SelfExclusion::Id);
        assert_eq!(config.map.layer, Some(PathBuf::from("maps/level1.toml")));
        assert_eq!(config.map.tile_size, 32.0);
        assert_eq!(config.server.bind, "0.0.0.0");
    }

    #[test]
    fn test_default_config_survives_serialization() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed = Config::from_toml_str(&text).unwrap();
        assert_eq!(parsed.server.port, 1234);
        assert_eq!(parsed.arena.width, 512.0);
    }

    #[test]
    fn test_max_connections_is_capped() {
        let config = Config::from_toml_str("[server]\nmax_connections = 1000000").unwrap();
        assert_eq!(config.server.max_connections, MAX_CONNECTIONS_LIMIT);

        let config = Config::from_toml_str("[server]\nmax_connections = 500").unwrap();
        assert_eq!(config.server.max_connections, 500);
    }

    #[test]
    fn test_unknown_fidelity_is_an_error() {
        assert!(Config::from_toml_str("[collision]\nfidelity = \"swept\"").is_err());
    }
}
