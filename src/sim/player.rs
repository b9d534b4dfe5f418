//! Player craft: movement, autofire and the ultimate gauge

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ability::BeamState;
use super::entity::{Body, Combatant, EntityId, Health};
use super::projectile::{Owner, Projectile};
use super::timer::Timer;
use crate::consts::*;
use crate::tuning::CraftStats;
use crate::{clamp_to_arena, direction, ms_to_ticks};

/// The player always has id 0; spawned entities start at 1
pub const PLAYER_ID: EntityId = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    pub health: Health,
    pub craft: CraftStats,
    fire_timer: Timer,
    /// Always in [0, ULT_MAX_CHARGE]; readiness is derived from it
    charge: f32,
    /// Live beam ultimate, if any
    pub beam: Option<BeamState>,
}

impl Player {
    pub fn new(craft: CraftStats) -> Self {
        Self {
            body: Body::new(Vec2::new(PLAYER_START_X, PLAYER_START_Y), PLAYER_RADIUS),
            health: Health::new(craft.hp),
            fire_timer: Timer::repeating(ms_to_ticks(craft.fire_rate_ms)),
            charge: 0.0,
            beam: None,
            craft,
        }
    }

    pub fn charge(&self) -> f32 {
        self.charge
    }

    pub fn is_ult_ready(&self) -> bool {
        self.charge >= ULT_MAX_CHARGE
    }

    /// Add charge, clamped. Returns true on the call that made the ultimate ready.
    pub fn add_charge(&mut self, amount: f32) -> bool {
        if self.is_dead() {
            return false;
        }
        let was_ready = self.is_ult_ready();
        self.charge = (self.charge + amount.max(0.0)).min(ULT_MAX_CHARGE);
        !was_ready && self.is_ult_ready()
    }

    /// Consume a full gauge. Charge and readiness reset in the same step.
    pub fn take_ultimate(&mut self) -> bool {
        if self.is_dead() || !self.is_ult_ready() {
            return false;
        }
        self.charge = 0.0;
        true
    }

    /// Move toward `target` at craft speed, staying inside the arena
    pub fn steer(&mut self, target: Vec2, dt: f32) {
        if self.is_dead() {
            return;
        }
        let to_target = target - self.body.pos;
        let step = self.craft.speed * dt;
        let moved = if to_target.length() <= step {
            target
        } else {
            self.body.pos + to_target.normalize_or_zero() * step
        };
        self.body.pos = clamp_to_arena(moved, self.body.radius);
    }

    /// Run the autofire cadence, pushing any shots into `out`
    pub fn autofire(&mut self, out: &mut Vec<Projectile>) {
        if self.is_dead() || !self.fire_timer.tick() {
            return;
        }
        out.extend(self.volley());
    }

    /// One volley of the craft's shot pattern
    pub fn volley(&self) -> Vec<Projectile> {
        let shot = &self.craft.shot;
        let count = shot.count.max(1);
        let speed = self.craft.bullet_speed;
        let radius = PLAYER_BULLET_RADIUS * self.craft.bullet_scale;
        let muzzle = self.body.pos - Vec2::new(0.0, self.body.radius);
        let up = -std::f32::consts::FRAC_PI_2;
        let centered = |i: u32| i as f32 - (count - 1) as f32 / 2.0;

        (0..count)
            .map(|i| {
                let (pos, vel) = if shot.spread_deg > 0.0 && count > 1 {
                    let step = shot.spread_deg.to_radians() / (count - 1) as f32;
                    (muzzle, direction(up + centered(i) * step) * speed)
                } else {
                    (
                        muzzle + Vec2::new(centered(i) * shot.lane_spacing, 0.0),
                        Vec2::new(0.0, -speed),
                    )
                };
                Projectile::bullet(pos, vel, radius, self.craft.bullet_damage, Owner::Player)
            })
            .collect()
    }
}

impl Combatant for Player {
    fn id(&self) -> EntityId {
        PLAYER_ID
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
        self.fire_timer.cancel();
        self.beam = None;
        self.body.enabled = false;
    }
}
