//! Star Siege - A vertically scrolling arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic combat simulation (waves, enemies, bosses, collisions)
//! - `tuning`: Data-driven game balance (crafts, enemies, bosses, wave scripts)
//! - `outcome`: Match result handed to the shell, plus the star rating

pub mod outcome;
pub mod sim;
pub mod tuning;

pub use outcome::{MatchResult, StarRating};
pub use tuning::{ConfigError, GameConfig};

use glam::Vec2;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Simulation rate (ticks per second)
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;

    /// Arena dimensions (portrait, y grows downward)
    pub const ARENA_WIDTH: f32 = 720.0;
    pub const ARENA_HEIGHT: f32 = 1280.0;
    /// Projectiles further than this outside the arena are destroyed
    pub const OUT_OF_BOUNDS_MARGIN: f32 = 48.0;
    /// Enemies are spawned this far above the top edge
    pub const SPAWN_Y: f32 = -40.0;
    /// Horizontal padding used when picking random spawn columns
    pub const SPAWN_PADDING: f32 = 60.0;

    /// Largest body radius a config may give an enemy, boss or turret
    pub const MAX_BODY_RADIUS: f32 = 240.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 22.0;
    pub const PLAYER_START_X: f32 = ARENA_WIDTH / 2.0;
    pub const PLAYER_START_Y: f32 = ARENA_HEIGHT - 180.0;

    /// Ultimate gauge ceiling
    pub const ULT_MAX_CHARGE: f32 = 100.0;

    /// Default projectile radii
    pub const PLAYER_BULLET_RADIUS: f32 = 6.0;
    pub const ENEMY_BULLET_RADIUS: f32 = 7.0;
    pub const MISSILE_RADIUS: f32 = 9.0;
}

/// Convert a millisecond duration from the tuning tables to simulation ticks.
///
/// Rounds to the nearest tick. Non-zero durations always yield at least one tick.
#[inline]
pub fn ms_to_ticks(ms: u32) -> u32 {
    if ms == 0 {
        return 0;
    }
    let ticks = (u64::from(ms) * u64::from(consts::TICK_RATE) + 500) / 1000;
    (ticks as u32).max(1)
}

/// Whether a point is inside the arena, allowing `margin` pixels of slack
#[inline]
pub fn in_arena(pos: Vec2, margin: f32) -> bool {
    pos.x >= -margin
        && pos.x <= consts::ARENA_WIDTH + margin
        && pos.y >= -margin
        && pos.y <= consts::ARENA_HEIGHT + margin
}

/// Clamp into `[lo, hi]`. An empty span collapses to its midpoint.
#[inline]
pub fn clamp_span(value: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi { (lo + hi) / 2.0 } else { value.clamp(lo, hi) }
}

/// Uniform pick from `[lo, hi)`; an empty span yields its midpoint
#[inline]
pub fn random_span(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if lo < hi { rng.random_range(lo..hi) } else { (lo + hi) / 2.0 }
}

/// Clamp a point so a circle of `radius` stays within the arena
#[inline]
pub fn clamp_to_arena(pos: Vec2, radius: f32) -> Vec2 {
    Vec2::new(
        clamp_span(pos.x, radius, consts::ARENA_WIDTH - radius),
        clamp_span(pos.y, radius, consts::ARENA_HEIGHT - radius),
    )
}

/// Unit vector for an angle (radians, 0 = +x, y down)
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle (radians) of the vector from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Rotate `current` toward `target` by at most `max_step` radians
#[inline]
pub fn turn_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = normalize_angle(target - current);
    normalize_angle(current + delta.clamp(-max_step, max_step))
}
