//! Boss-deployed turrets
//!
//! A turret flies out from its boss, and only once it has arrived does its
//! fire timer start. After that it wanders between random points in the upper
//! arena, shooting at the player.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::ms_to_ticks;
use crate::sim::entity::{Body, Combatant, EntityId, Health};
use crate::sim::projectile::{Owner, Projectile};
use crate::sim::timer::Timer;
use crate::tuning::TurretStats;

/// Flight time from the boss to the deployment slot
pub const TURRET_DEPLOY_MS: u32 = 600;
pub const TURRET_BULLET_SPEED: f32 = 340.0;
/// Distance at which a wander target counts as reached
pub const TURRET_ARRIVE_DISTANCE: f32 = 4.0;
/// Region turrets wander inside
pub const TURRET_WANDER_MIN_Y: f32 = 120.0;
pub const TURRET_WANDER_MAX_Y: f32 = 520.0;
pub const TURRET_WANDER_PADDING: f32 = 60.0;

/// Stats applied to turrets at deploy time; upgraded once on boss rage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurretProfile {
    pub hp: f32,
    pub radius: f32,
    pub fire_delay_ticks: u32,
    pub move_speed: f32,
    pub bullet_damage: f32,
    pub reward: u32,
}

impl From<&TurretStats> for TurretProfile {
    fn from(stats: &TurretStats) -> Self {
        Self {
            hp: stats.hp,
            radius: stats.radius,
            fire_delay_ticks: ms_to_ticks(stats.fire_delay_ms),
            move_speed: stats.move_speed,
            bullet_damage: stats.bullet_damage,
            reward: stats.reward,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurretState {
    Deploying { from: Vec2, to: Vec2, elapsed: u32 },
    Active,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turret {
    pub id: EntityId,
    pub body: Body,
    pub health: Health,
    pub state: TurretState,
    fire_timer: Timer,
    pub wander_target: Vec2,
    pub move_speed: f32,
    pub bullet_damage: f32,
    pub reward: u32,
}

impl Turret {
    pub fn deploy(id: EntityId, from: Vec2, to: Vec2, profile: &TurretProfile) -> Self {
        Self {
            id,
            body: Body::new(from, profile.radius),
            health: Health::new(profile.hp),
            state: TurretState::Deploying { from, to, elapsed: 0 },
            fire_timer: Timer::repeating(profile.fire_delay_ticks).paused(),
            wander_target: to,
            move_speed: profile.move_speed,
            bullet_damage: profile.bullet_damage,
            reward: profile.reward,
        }
    }

    pub fn is_deployed(&self) -> bool {
        self.state == TurretState::Active
    }

    pub fn is_firing(&self) -> bool {
        self.fire_timer.is_active()
    }

    pub fn fire_delay_ticks(&self) -> u32 {
        self.fire_timer.period()
    }

    /// Adopt an upgraded profile; hp grows by `hp_factor`
    pub fn apply_profile(&mut self, profile: &TurretProfile, hp_factor: f32) {
        if self.is_dead() {
            return;
        }
        self.fire_timer.set_period(profile.fire_delay_ticks);
        self.move_speed = profile.move_speed;
        self.bullet_damage = profile.bullet_damage;
        self.health.scale_max(hp_factor);
    }

    /// Teardown by the owning boss. Returns true if the turret was alive.
    pub fn destroy(&mut self) -> bool {
        if self.health.kill() {
            self.die();
            return true;
        }
        false
    }

    pub fn update(
        &mut self,
        player_pos: Vec2,
        dt: f32,
        rng: &mut impl Rng,
        out: &mut Vec<Projectile>,
    ) {
        if self.is_dead() {
            return;
        }
        match self.state {
            TurretState::Deploying { from, to, ref mut elapsed } => {
                *elapsed += 1;
                let t = (*elapsed as f32 / ms_to_ticks(TURRET_DEPLOY_MS) as f32).min(1.0);
                let eased = 1.0 - (1.0 - t) * (1.0 - t);
                self.body.pos = from.lerp(to, eased);
                if t >= 1.0 {
                    self.state = TurretState::Active;
                    self.fire_timer.reset();
                    self.wander_target = random_wander_point(rng);
                }
            }
            TurretState::Active => {
                let to_target = self.wander_target - self.body.pos;
                let step = self.move_speed * dt;
                if to_target.length() <= step.max(TURRET_ARRIVE_DISTANCE) {
                    self.body.pos = self.wander_target;
                    self.wander_target = random_wander_point(rng);
                } else {
                    self.body.pos += to_target.normalize_or_zero() * step;
                }

                if self.fire_timer.tick() {
                    let aim = (player_pos - self.body.pos).try_normalize().unwrap_or(Vec2::Y);
                    out.push(Projectile::bullet(
                        self.body.pos + aim * self.body.radius,
                        aim * TURRET_BULLET_SPEED,
                        ENEMY_BULLET_RADIUS,
                        self.bullet_damage,
                        Owner::Turret(self.id),
                    ));
                }
            }
        }
    }
}

fn random_wander_point(rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        rng.random_range(TURRET_WANDER_PADDING..ARENA_WIDTH - TURRET_WANDER_PADDING),
        rng.random_range(TURRET_WANDER_MIN_Y..TURRET_WANDER_MAX_Y),
    )
}

impl Combatant for Turret {
    fn id(&self) -> EntityId {
        self.id
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn health(&self) -> &Health {
        &self.health
    }

    fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    fn die(&mut self) {
        // Firing stops before anything else happens to the turret
        self.fire_timer.cancel();
        self.body.enabled = false;
    }
}
