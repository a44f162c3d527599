//! Collision detection and resolution.
//!
//! This module handles the passes run after every move:
//! - Circle-circle separation between the mover and every other player
//! - Arena bound clamp
//! - Tile occupancy correction against the facing direction
//!
//! Every pass is idempotent: applying it to an already-valid position
//! returns that position unchanged.

use crate::config::SelfExclusion;
use crate::grid::OccupancyGrid;
use crate::player::Player;
use glam::Vec2;
use protocol::Facing;

/// Extra distance left between two circles after separating them.
pub const SEPARATION_GAP: f32 = 1.0;
/// Body extent used when probing the tile ahead of a player.
pub const PROBE_LOOKAHEAD: f32 = 32.0;
/// Probe offset past the leading edge when moving right or down.
pub const PROBE_FORWARD_MARGIN: f32 = 1.0;
/// Probe offset behind the anchor when moving left or up.
pub const PROBE_BACKWARD_MARGIN: f32 = 4.0;
/// How far a blocked player is pushed back.
pub const TILE_NUDGE: f32 = 1.0;

/// Result of checking collision between two circles.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResult {
    /// Combined radius of both circles
    pub r: f32,
    /// Offset from the other circle to this one
    pub delta: Vec2,
    /// Distance between centres
    pub d: f32,
}

impl CollisionResult {
    /// Check if the circles actually overlap.
    #[inline]
    pub fn is_colliding(&self) -> bool {
        self.d < self.r
    }

    /// Unit vector pointing from the other circle to this one.
    /// Coincident centres resolve along +x.
    #[inline]
    pub fn push_direction(&self) -> Vec2 {
        if self.d > 0.0 { self.delta / self.d } else { Vec2::X }
    }
}

/// Check collision between two circles.
#[inline]
pub fn check_circle_collision(
    pos: Vec2,
    radius: f32,
    other_pos: Vec2,
    other_radius: f32,
) -> CollisionResult {
    let delta = pos - other_pos;
    CollisionResult {
        r: radius + other_radius,
        delta,
        d: delta.length(),
    }
}

/// Move `pos` directly away from `other_pos` until the circles are
/// `SEPARATION_GAP` apart. Non-overlapping circles are left alone.
pub fn separate(pos: Vec2, radius: f32, other_pos: Vec2, other_radius: f32) -> Vec2 {
    let result = check_circle_collision(pos, radius, other_pos, other_radius);
    if !result.is_colliding() {
        return pos;
    }
    other_pos + result.push_direction() * (result.r + SEPARATION_GAP)
}

/// Whether `other` is the mover itself under the configured exclusion key.
#[inline]
pub fn is_same_player(mover: &Player, other: &Player, exclusion: SelfExclusion) -> bool {
    match exclusion {
        SelfExclusion::Name => mover.name == other.name,
        SelfExclusion::Id => mover.id == other.id,
    }
}

/// Push the mover out of every player it overlaps, one other player at a
/// time in the order given. A later push may reintroduce an earlier overlap;
/// there is no second pass.
pub fn resolve_player_collisions<'a>(
    mover: &Player,
    others: impl IntoIterator<Item = &'a Player>,
    exclusion: SelfExclusion,
) -> Vec2 {
    let mut pos = mover.position;
    for other in others {
        if is_same_player(mover, other, exclusion) {
            continue;
        }
        pos = separate(pos, mover.radius, other.position, other.radius);
    }
    pos
}

/// Arena dimensions used by the bound clamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub width: f32,
    pub height: f32,
    /// Gap between a clamped player's edge and the border.
    pub margin: f32,
}

impl ArenaBounds {
    pub fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    /// Pull a player back inside the arena.
    ///
    /// The check includes `speed`, so a player within one move of an edge is
    /// snapped to it before it could step out.
    pub fn clamp(&self, pos: Vec2, radius: f32, speed: f32) -> Vec2 {
        Vec2::new(
            clamp_axis(pos.x, radius, speed, self.width, self.margin),
            clamp_axis(pos.y, radius, speed, self.height, self.margin),
        )
    }

    /// Whether `pos` satisfies `radius <= v <= extent - radius` on both axes.
    pub fn contains(&self, pos: Vec2, radius: f32) -> bool {
        (radius..=self.width - radius).contains(&pos.x)
            && (radius..=self.height - radius).contains(&pos.y)
    }

    /// Whether a circle of `radius` can be placed inside the arena at all.
    pub fn fits(&self, radius: f32) -> bool {
        2.0 * radius <= self.width && 2.0 * radius <= self.height
    }

    /// Hard clamp to `[radius, extent - radius]` per axis.
    ///
    /// Applied after every other pass so no correction can leave the arena.
    /// Requires `fits(radius)`.
    pub fn contain(&self, pos: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            pos.x.clamp(radius, self.width - radius),
            pos.y.clamp(radius, self.height - radius),
        )
    }
}

#[inline]
fn clamp_axis(v: f32, radius: f32, speed: f32, extent: f32, margin: f32) -> f32 {
    if v - radius - speed < 0.0 {
        radius + margin
    } else if v + radius + speed > extent {
        extent - radius - margin
    } else {
        v
    }
}

/// Arena point probed for a wall ahead of a player.
///
/// The body is treated as a `PROBE_LOOKAHEAD` box anchored at the position.
pub fn probe_point(pos: Vec2, facing: Facing) -> Vec2 {
    match facing {
        Facing::Right => Vec2::new(pos.x + PROBE_LOOKAHEAD + PROBE_FORWARD_MARGIN, pos.y),
        Facing::Left => Vec2::new(pos.x - PROBE_BACKWARD_MARGIN, pos.y),
        Facing::Down => Vec2::new(pos.x, pos.y + PROBE_LOOKAHEAD + PROBE_FORWARD_MARGIN),
        Facing::Up => Vec2::new(pos.x, pos.y - PROBE_BACKWARD_MARGIN),
    }
}

/// Nudge a player back one step if the tile ahead of it is blocked.
///
/// This is a single discrete check, so fast movers can pass through thin walls.
pub fn tile_correction(pos: Vec2, facing: Facing, grid: &OccupancyGrid) -> Vec2 {
    if grid.is_blocked_at(probe_point(pos, facing)) {
        pos - facing.unit() * TILE_NUDGE
    } else {
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::ConnectionId;

    fn player(id: u32, name: &str, x: f32, y: f32) -> Player {
        Player::new(ConnectionId(id), name.to_string(), Vec2::new(x, y), 10.0, 5.0)
    }

    #[test]
    fn test_collision_check() {
        let result = check_circle_collision(Vec2::new(0.0, 0.0), 50.0, Vec2::new(30.0, 0.0), 20.0);
        assert!(result.is_colliding()); // 50 + 20 = 70, distance = 30
        assert_eq!(result.d, 30.0);
        assert_eq!(result.push_direction(), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_touching_circles_do_not_collide() {
        let result = check_circle_collision(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0);
        assert!(!result.is_colliding());
    }

    #[test]
    fn test_separation_reaches_sum_plus_gap() {
        let pos = separate(Vec2::new(100.0, 100.0), 10.0, Vec2::new(108.0, 100.0), 10.0);
        assert!((pos.x - 87.0).abs() < 1e-4);
        assert!((pos.y - 100.0).abs() < 1e-4);
        assert!((pos.distance(Vec2::new(108.0, 100.0)) - 21.0).abs() < 1e-4);
    }

    #[test]
    fn test_separation_keeps_diagonal_direction() {
        let other = Vec2::new(200.0, 200.0);
        let pos = separate(Vec2::new(194.0, 192.0), 10.0, other, 15.0);
        let dir = (pos - other).normalize();
        assert!((dir - Vec2::new(-0.6, -0.8)).length() < 1e-4);
        assert!((pos.distance(other) - 26.0).abs() < 1e-3);
    }

    #[test]
    fn test_separation_is_idempotent() {
        let other = Vec2::new(108.0, 100.0);
        let once = separate(Vec2::new(100.0, 100.0), 10.0, other, 10.0);
        let twice = separate(once, 10.0, other, 10.0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_coincident_centres_push_along_x() {
        let pos = separate(Vec2::new(50.0, 50.0), 10.0, Vec2::new(50.0, 50.0), 10.0);
        assert_eq!(pos, Vec2::new(71.0, 50.0));
    }

    #[test]
    fn test_resolution_skips_self_by_name() {
        let mover = player(1, "alice", 100.0, 100.0);
        let twin = player(2, "alice", 105.0, 100.0);
        let others = [mover.clone(), twin.clone()];

        let by_name = resolve_player_collisions(&mover, &others, SelfExclusion::Name);
        assert_eq!(by_name, mover.position);

        let by_id = resolve_player_collisions(&mover, &others, SelfExclusion::Id);
        assert!((by_id.distance(twin.position) - 21.0).abs() < 1e-4);
    }

    #[test]
    fn test_resolution_is_single_pass_in_order() {
        // B pushes the mover left into C; C is resolved afterwards and wins.
        let mover = player(1, "m", 100.0, 100.0);
        let b = player(2, "b", 105.0, 100.0);
        let c = player(3, "c", 80.0, 100.0);
        let pos = resolve_player_collisions(&mover, [&b, &c], SelfExclusion::Name);

        assert!(pos.distance(c.position) >= 20.0);
        assert!(pos.distance(b.position) < 20.0);
    }

    #[test]
    fn test_clamp_left_edge_uses_speed_margin() {
        let bounds = ArenaBounds::new(512.0, 512.0, 1.0);
        assert_eq!(bounds.clamp(Vec2::new(3.0, 200.0), 10.0, 5.0), Vec2::new(11.0, 200.0));
        // 14 - 10 - 5 < 0: within one step of the wall
        assert_eq!(bounds.clamp(Vec2::new(14.0, 200.0), 10.0, 5.0).x, 11.0);
        assert_eq!(bounds.clamp(Vec2::new(15.0, 200.0), 10.0, 5.0).x, 15.0);
    }

    #[test]
    fn test_clamp_far_edges() {
        let bounds = ArenaBounds::new(512.0, 512.0, 1.0);
        let pos = bounds.clamp(Vec2::new(600.0, 499.0), 10.0, 5.0);
        assert_eq!(pos, Vec2::new(501.0, 501.0));
        assert!(bounds.contains(pos, 10.0));
    }

    #[test]
    fn test_clamp_is_idempotent() {
        let bounds = ArenaBounds::new(512.0, 512.0, 1.0);
        let once = bounds.clamp(Vec2::new(-40.0, 530.0), 10.0, 5.0);
        assert_eq!(bounds.clamp(once, 10.0, 5.0), once);
    }

    #[test]
    fn test_clamp_keeps_random_positions_inside() {
        use rand::Rng;
        let mut rng = rand::rng();
        let bounds = ArenaBounds::new(512.0, 512.0, 1.0);
        for _ in 0..1000 {
            let radius = rng.random_range(1.0..40.0);
            let speed = rng.random_range(0.0..30.0);
            let pos = Vec2::new(rng.random_range(-600.0..1100.0), rng.random_range(-600.0..1100.0));
            let clamped = bounds.clamp(pos, radius, speed);
            assert!(bounds.contains(clamped, radius), "{:?} r={} s={}", clamped, radius, speed);
        }
    }

    #[test]
    fn test_contain_pulls_nudged_position_back() {
        let bounds = ArenaBounds::new(512.0, 512.0, 1.0);
        assert_eq!(bounds.contain(Vec2::new(9.7, 200.0), 10.0), Vec2::new(10.0, 200.0));
        assert_eq!(bounds.contain(Vec2::new(503.0, -2.0), 10.0), Vec2::new(502.0, 10.0));
        let inside = Vec2::new(250.0, 250.0);
        assert_eq!(bounds.contain(inside, 10.0), inside);
    }

    #[test]
    fn test_fits() {
        let bounds = ArenaBounds::new(512.0, 300.0, 1.0);
        assert!(bounds.fits(150.0));
        assert!(!bounds.fits(150.5));
        assert!(!bounds.fits(300.0));
    }

    #[test]
    fn test_probe_offsets() {
        let pos = Vec2::new(100.0, 100.0);
        assert_eq!(probe_point(pos, Facing::Right), Vec2::new(133.0, 100.0));
        assert_eq!(probe_point(pos, Facing::Left), Vec2::new(96.0, 100.0));
        assert_eq!(probe_point(pos, Facing::Down), Vec2::new(100.0, 133.0));
        assert_eq!(probe_point(pos, Facing::Up), Vec2::new(100.0, 96.0));
    }

    #[test]
    fn test_tile_correction_nudges_back() {
        // Cell (4, 3) is blocked.
        let mut rows = vec![vec![0; 16]; 16];
        rows[3][4] = 1;
        let grid = OccupancyGrid::from_rows(&rows, 32.0).unwrap();

        let pos = Vec2::new(100.0, 100.0);
        assert_eq!(tile_correction(pos, Facing::Right, &grid), Vec2::new(99.0, 100.0));
        assert_eq!(tile_correction(pos, Facing::Left, &grid), pos);
        assert_eq!(tile_correction(pos, Facing::Down, &grid), pos);
    }

    #[test]
    fn test_tile_correction_vertical() {
        let mut rows = vec![vec![0; 16]; 16];
        rows[2][3] = 1; // y in [64, 96)
        let grid = OccupancyGrid::from_rows(&rows, 32.0).unwrap();

        let pos = Vec2::new(100.0, 99.0);
        assert_eq!(tile_correction(pos, Facing::Up, &grid), Vec2::new(100.0, 100.0));
        let clear = Vec2::new(100.0, 100.5);
        assert_eq!(tile_correction(clear, Facing::Up, &grid), clear);
    }
}
