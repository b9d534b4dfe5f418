//! Ultimate abilities
//!
//! The missile swarm is a fan of homing projectiles that re-acquire the
//! nearest live hostile every tick; [`LockOnTable`] counts how many missiles
//! are tracking each target. The beam is a timed column above the player that
//! damages every hostile inside it on a fixed interval.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::projectile::{Projectile, nearest_in_bounds};
use super::timer::Timer;
use crate::direction;
use crate::ms_to_ticks;

/// Total fan angle of a missile launch
pub const SWARM_FAN: f32 = 2.4;

/// Incoming-missile counts per target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockOnTable {
    counts: BTreeMap<EntityId, u32>,
}

impl LockOnTable {
    pub fn acquire(&mut self, target: EntityId) {
        *self.counts.entry(target).or_insert(0) += 1;
    }

    pub fn release(&mut self, target: EntityId) {
        if let Some(count) = self.counts.get_mut(&target) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&target);
            }
        }
    }

    pub fn count(&self, target: EntityId) -> u32 {
        self.counts.get(&target).copied().unwrap_or(0)
    }

    pub fn is_locked(&self, target: EntityId) -> bool {
        self.count(target) > 0
    }

    pub fn targets(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.counts.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Fan of missiles launched upward from `origin`, each locked on the nearest hostile
pub fn launch_missile_swarm(
    origin: Vec2,
    missiles: u32,
    damage: f32,
    speed: f32,
    turn_rate: f32,
    hostiles: &[(EntityId, Vec2)],
    lock_on: &mut LockOnTable,
) -> Vec<Projectile> {
    let count = missiles.max(1);
    let up = -std::f32::consts::FRAC_PI_2;
    let target = nearest_in_bounds(origin, hostiles);
    (0..count)
        .map(|i| {
            let t = if count > 1 { i as f32 / (count - 1) as f32 - 0.5 } else { 0.0 };
            let vel = direction(up + t * SWARM_FAN) * speed;
            if let Some(id) = target {
                lock_on.acquire(id);
            }
            Projectile::missile(origin, vel, damage, turn_rate, target)
        })
        .collect()
}

/// Re-acquire the nearest live hostile for every missile, then steer.
/// Missiles with nothing to chase fly straight.
pub fn steer_missiles(
    projectiles: &mut [Projectile],
    hostiles: &[(EntityId, Vec2)],
    lock_on: &mut LockOnTable,
    dt: f32,
) {
    for missile in projectiles.iter_mut().filter(|p| p.alive && p.is_missile()) {
        let previous = missile.target();
        let next = nearest_in_bounds(missile.body.pos, hostiles);
        if previous != next {
            if let Some(old) = previous {
                lock_on.release(old);
            }
            if let Some(new) = next {
                lock_on.acquire(new);
            }
            missile.set_target(next);
        }
        let Some(target) = next else { continue };
        let Some(&(_, aim)) = hostiles.iter().find(|(id, _)| *id == target) else {
            continue;
        };
        if let super::projectile::ProjectileKind::Missile { turn_rate, .. } = missile.kind {
            missile.steer_toward(aim, turn_rate * dt);
        }
    }
}

/// Release the lock held by a missile that has resolved (hit or expired)
pub fn resolve_missile(missile: &mut Projectile, lock_on: &mut LockOnTable) {
    if let Some(target) = missile.target() {
        lock_on.release(target);
        missile.set_target(None);
    }
}

/// Live beam ultimate, owned by the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamState {
    duration: Timer,
    interval: Timer,
    pub width: f32,
    pub damage: f32,
}

/// What the beam did this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BeamTick {
    /// Apply damage to everything in the column this tick
    pub strike: bool,
    /// Duration ran out; the beam must be dropped
    pub ended: bool,
}

impl BeamState {
    pub fn new(duration_ms: u32, width: f32, damage: f32, interval_ms: u32) -> Self {
        Self {
            duration: Timer::once(ms_to_ticks(duration_ms)),
            interval: Timer::repeating(ms_to_ticks(interval_ms)),
            width,
            damage,
        }
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.duration.remaining()
    }

    /// Advance one tick. The tick that ends the beam never strikes.
    pub fn tick(&mut self) -> BeamTick {
        let strike = self.interval.tick();
        let ended = self.duration.tick();
        if ended {
            self.interval.cancel();
        }
        BeamTick {
            strike: strike && !ended,
            ended,
        }
    }

    /// Whether a circle is inside the column rising from `origin`
    pub fn covers(&self, origin: Vec2, pos: Vec2, radius: f32) -> bool {
        (pos.x - origin.x).abs() < self.width / 2.0 + radius && pos.y < origin.y + radius
    }
}
