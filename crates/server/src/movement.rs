//! Directional movement.

use crate::player::Player;
use glam::Vec2;
use protocol::packets::MoveFlags;
use protocol::Facing;

/// Directional flags for one move, plus the boost modifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub boost: bool,
}

impl MoveIntent {
    /// Raw direction before normalization. Opposing flags cancel.
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        dir
    }

    /// Facing implied by the flags. Flags are checked left, right, up, down
    /// and the last active one wins. `None` when no flag is set.
    pub fn facing(&self) -> Option<Facing> {
        [
            (self.left, Facing::Left),
            (self.right, Facing::Right),
            (self.up, Facing::Up),
            (self.down, Facing::Down),
        ]
        .into_iter()
        .filter_map(|(active, facing)| active.then_some(facing))
        .last()
    }
}

impl From<MoveFlags> for MoveIntent {
    fn from(flags: MoveFlags) -> Self {
        Self {
            left: flags.left,
            right: flags.right,
            up: flags.up,
            down: flags.down,
            boost: flags.boost,
        }
    }
}

/// Result of applying an intent, before collision passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub position: Vec2,
    pub facing: Facing,
}

/// Compute the candidate position and facing for `player`.
///
/// Diagonals are normalized so they cover the same distance as a straight
/// move. A boosted move uses `boost_speed` in place of the player's speed.
/// With no active flag the position and facing are unchanged.
pub fn step(player: &Player, intent: MoveIntent, boost_speed: f32) -> Step {
    let speed = if intent.boost {
        boost_speed
    } else {
        player.speed
    };
    let offset = intent.direction().normalize_or_zero() * speed;

    Step {
        position: player.position + offset,
        facing: intent.facing().unwrap_or(player.facing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::ConnectionId;

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(ConnectionId(1), "p".into(), Vec2::new(x, y), 10.0, 5.0)
    }

    fn intent(left: bool, right: bool, up: bool, down: bool) -> MoveIntent {
        MoveIntent {
            left,
            right,
            up,
            down,
            boost: false,
        }
    }

    #[test]
    fn test_straight_move() {
        let s = step(&player_at(100.0, 100.0), intent(true, false, false, false), 4.0);
        assert_eq!(s.position, Vec2::new(95.0, 100.0));
        assert_eq!(s.facing, Facing::Left);

        let s = step(&player_at(100.0, 100.0), intent(false, false, false, true), 4.0);
        assert_eq!(s.position, Vec2::new(100.0, 105.0));
        assert_eq!(s.facing, Facing::Down);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let start = player_at(100.0, 100.0);
        let s = step(&start, intent(false, true, true, false), 4.0);
        assert!((s.position.distance(start.position) - 5.0).abs() < 1e-4);
        assert!(s.position.x > 100.0 && s.position.y < 100.0);
        assert_eq!(s.facing, Facing::Up);
    }

    #[test]
    fn test_opposing_flags_cancel_but_set_facing() {
        let s = step(&player_at(100.0, 100.0), intent(true, true, false, false), 4.0);
        assert_eq!(s.position, Vec2::new(100.0, 100.0));
        assert_eq!(s.facing, Facing::Right);

        let s = step(&player_at(100.0, 100.0), intent(true, true, true, true), 4.0);
        assert_eq!(s.position, Vec2::new(100.0, 100.0));
        assert_eq!(s.facing, Facing::Down);
    }

    #[test]
    fn test_no_flags_keeps_position_and_facing() {
        let mut p = player_at(40.0, 60.0);
        p.facing = Facing::Left;
        let s = step(&p, MoveIntent::default(), 4.0);
        assert_eq!(s.position, p.position);
        assert_eq!(s.facing, Facing::Left);
    }

    #[test]
    fn test_boost_replaces_speed() {
        let boosted = MoveIntent {
            right: true,
            boost: true,
            ..Default::default()
        };
        let s = step(&player_at(100.0, 100.0), boosted, 25.0);
        assert_eq!(s.position, Vec2::new(125.0, 100.0));
    }

    #[test]
    fn test_from_wire_flags() {
        let intent = MoveIntent::from(MoveFlags::from_bits(0b1_0101));
        assert!(intent.left && intent.up && intent.boost);
        assert!(!intent.right && !intent.down);
    }
}
