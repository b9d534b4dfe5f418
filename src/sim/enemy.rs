//! Enemy variants
//!
//! One `Enemy` struct for every variant; the variant-specific state and timers
//! live in [`EnemyBehavior`], selected from the [`EnemyKind`] at construction.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Combatant, EntityId, Health};
use super::projectile::{Owner, Projectile};
use super::timer::Timer;
use crate::consts::*;
use crate::tuning::{EnemyKind, EnemyStats};
use crate::{angle_between, clamp_span, direction, turn_toward};

/// Bouncer sideways speed (px/s)
pub const BOUNCER_HORIZONTAL_SPEED: f32 = 120.0;

/// Gunship sub-state durations
pub const GUNSHIP_MOVE_MS: u32 = 2000;
pub const GUNSHIP_STOP_MS: u32 = 3000;
/// Gunship turret rotation speed (rad/s)
pub const GUNSHIP_TURN_RATE: f32 = 2.5;
/// Extra clearance below a gunship that must be free before it moves
pub const GUNSHIP_CLEARANCE: f32 = 30.0;
/// Rapid fire: a pair of light rounds
pub const GUNSHIP_RAPID_MS: u32 = 800;
pub const GUNSHIP_RAPID_DAMAGE: f32 = 5.0;
pub const GUNSHIP_RAPID_SPEED: f32 = 420.0;
/// Heavy burst: four rounds
pub const GUNSHIP_HEAVY_MS: u32 = 3000;
pub const GUNSHIP_HEAVY_ROUNDS: u8 = 4;
pub const GUNSHIP_HEAVY_GAP_MS: u32 = 120;
pub const GUNSHIP_HEAVY_DAMAGE: f32 = 12.0;
pub const GUNSHIP_HEAVY_SPEED: f32 = 360.0;
/// Missile salvo
pub const GUNSHIP_SALVO_MS: u32 = 6000;
pub const GUNSHIP_SALVO_DAMAGE: f32 = 15.0;
pub const GUNSHIP_SALVO_SPEED: f32 = 260.0;
pub const GUNSHIP_SALVO_FUEL_TICKS: u32 = 180;
pub const GUNSHIP_RECOIL: f32 = 160.0;

/// Kamikaze wobble and dash
pub const KAMIKAZE_WOBBLE_FREQ: f32 = 4.0;
pub const KAMIKAZE_WOBBLE_SPEED: f32 = 90.0;
pub const KAMIKAZE_TRIGGER_RADIUS: f32 = 220.0;
pub const KAMIKAZE_DASH_SPEED: f32 = 520.0;

/// What an enemy can see when it updates
#[derive(Debug, Clone, Copy)]
pub struct EnemyContext<'a> {
    pub dt: f32,
    pub player_pos: Vec2,
    /// Live enemies at the start of the tick: (id, pos, radius)
    pub occupancy: &'a [(EntityId, Vec2, f32)],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GunshipMode {
    Moving,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GunshipState {
    pub mode: GunshipMode,
    mode_timer: Timer,
    /// Barrel heading (radians)
    pub facing: f32,
    /// Something is parked directly below
    pub blocked: bool,
    rapid_timer: Timer,
    heavy_timer: Timer,
    burst_timer: Timer,
    burst_left: u8,
    salvo_timer: Timer,
    recoil: Vec2,
}

impl GunshipState {
    fn new() -> Self {
        Self {
            mode: GunshipMode::Moving,
            mode_timer: Timer::once_ms(GUNSHIP_MOVE_MS),
            facing: std::f32::consts::FRAC_PI_2,
            blocked: false,
            rapid_timer: Timer::repeating_ms(GUNSHIP_RAPID_MS),
            heavy_timer: Timer::repeating_ms(GUNSHIP_HEAVY_MS),
            burst_timer: Timer::repeating_ms(GUNSHIP_HEAVY_GAP_MS).paused(),
            burst_left: 0,
            salvo_timer: Timer::repeating_ms(GUNSHIP_SALVO_MS),
            recoil: Vec2::ZERO,
        }
    }

    fn cancel_timers(&mut self) {
        self.mode_timer.cancel();
        self.rapid_timer.cancel();
        self.heavy_timer.cancel();
        self.burst_timer.cancel();
        self.salvo_timer.cancel();
        self.burst_left = 0;
    }

    fn has_active_timers(&self) -> bool {
        self.mode_timer.is_active()
            || self.rapid_timer.is_active()
            || self.heavy_timer.is_active()
            || self.burst_timer.is_active()
            || self.salvo_timer.is_active()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KamikazeState {
    /// Committed to the dash; never reverts
    pub dashing: bool,
    wobble_phase: f32,
}

/// Variant-specific state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EnemyBehavior {
    Drone,
    Bouncer,
    Gunship(GunshipState),
    Kamikaze(KamikazeState),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub body: Body,
    pub health: Health,
    pub reward: u32,
    pub contact_damage: f32,
    /// Vertical cruise speed
    pub speed: f32,
    pub behavior: EnemyBehavior,
}

impl Enemy {
    /// Build a variant with its initial physics applied
    pub fn new(
        id: EntityId,
        kind: EnemyKind,
        pos: Vec2,
        stats: &EnemyStats,
        rng: &mut impl Rng,
    ) -> Self {
        let mut body = Body::new(pos, stats.radius);
        let behavior = match kind {
            EnemyKind::Drone => {
                body.vel = Vec2::new(0.0, stats.speed);
                EnemyBehavior::Drone
            }
            EnemyKind::Bouncer => {
                let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                body.vel = Vec2::new(sign * BOUNCER_HORIZONTAL_SPEED, stats.speed);
                EnemyBehavior::Bouncer
            }
            EnemyKind::Gunship => {
                body.vel = Vec2::new(0.0, stats.speed);
                EnemyBehavior::Gunship(GunshipState::new())
            }
            EnemyKind::Kamikaze => {
                body.vel = Vec2::new(0.0, stats.speed);
                EnemyBehavior::Kamikaze(KamikazeState {
                    dashing: false,
                    wobble_phase: rng.random_range(0.0..std::f32::consts::TAU),
                })
            }
        };
        Self {
            id,
            kind,
            body,
            health: Health::new(stats.hp),
            reward: stats.reward,
            contact_damage: stats.contact_damage,
            speed: stats.speed,
            behavior,
        }
    }

    pub fn is_dashing(&self) -> bool {
        matches!(&self.behavior, EnemyBehavior::Kamikaze(k) if k.dashing)
    }

    /// True if any variant timer is still scheduled
    pub fn has_active_timers(&self) -> bool {
        match &self.behavior {
            EnemyBehavior::Gunship(g) => g.has_active_timers(),
            _ => false,
        }
    }

    /// Left the arena past any edge, including a dash out through the top
    pub fn escaped(&self) -> bool {
        let r = self.body.radius + OUT_OF_BOUNDS_MARGIN;
        let p = self.body.pos;
        p.y > ARENA_HEIGHT + r || p.y < -r || p.x < -r || p.x > ARENA_WIDTH + r
    }

    /// Remove without a kill (no reward): timers cancelled, body disabled
    pub fn despawn(&mut self) {
        if self.health.kill() {
            self.die();
        }
    }

    /// Per-tick behaviour. Spawned projectiles are pushed to `out`.
    pub fn update(&mut self, ctx: &EnemyContext<'_>, out: &mut Vec<Projectile>) {
        if self.is_dead() {
            return;
        }
        let dt = ctx.dt;
        let id = self.id;
        let radius = self.body.radius;
        let speed = self.speed;

        match &mut self.behavior {
            EnemyBehavior::Drone => {
                self.body.vel = Vec2::new(0.0, speed);
                self.body.integrate(dt);
            }
            EnemyBehavior::Bouncer => {
                self.body.vel.y = speed;
                self.body.integrate(dt);
                if self.body.pos.x - radius < 0.0 {
                    self.body.pos.x = radius;
                    self.body.vel.x = self.body.vel.x.abs();
                } else if self.body.pos.x + radius > ARENA_WIDTH {
                    self.body.pos.x = ARENA_WIDTH - radius;
                    self.body.vel.x = -self.body.vel.x.abs();
                }
            }
            EnemyBehavior::Gunship(g) => {
                update_gunship(g, &mut self.body, id, speed, ctx, out);
            }
            EnemyBehavior::Kamikaze(k) => {
                if !k.dashing {
                    k.wobble_phase += dt * KAMIKAZE_WOBBLE_FREQ;
                    self.body.vel = Vec2::new(k.wobble_phase.sin() * KAMIKAZE_WOBBLE_SPEED, speed);
                    if self.body.pos.distance(ctx.player_pos) < KAMIKAZE_TRIGGER_RADIUS {
                        let aim = (ctx.player_pos - self.body.pos)
                            .try_normalize()
                            .unwrap_or(Vec2::Y);
                        k.dashing = true;
                        self.body.vel = aim * KAMIKAZE_DASH_SPEED;
                    }
                }
                self.body.integrate(dt);
            }
        }
    }
}

fn update_gunship(
    g: &mut GunshipState,
    body: &mut Body,
    id: EntityId,
    speed: f32,
    ctx: &EnemyContext<'_>,
    out: &mut Vec<Projectile>,
) {
    let dt = ctx.dt;

    if g.mode_timer.tick() {
        g.mode = match g.mode {
            GunshipMode::Moving => {
                g.mode_timer = Timer::once_ms(GUNSHIP_STOP_MS);
                GunshipMode::Stopped
            }
            GunshipMode::Stopped => {
                g.mode_timer = Timer::once_ms(GUNSHIP_MOVE_MS);
                GunshipMode::Moving
            }
        };
    }

    let target_angle = angle_between(body.pos, ctx.player_pos);
    g.facing = turn_toward(g.facing, target_angle, GUNSHIP_TURN_RATE * dt);

    // Anti-stacking: hold position while another enemy sits directly below
    g.blocked = ctx.occupancy.iter().any(|&(other_id, other_pos, other_r)| {
        if other_id == id {
            return false;
        }
        let dx = (other_pos.x - body.pos.x).abs();
        let dy = other_pos.y - body.pos.y;
        dx < body.radius + other_r && dy > 0.0 && dy < body.radius + other_r + GUNSHIP_CLEARANCE
    });

    let cruise = if g.mode == GunshipMode::Moving && !g.blocked { speed } else { 0.0 };
    body.vel = Vec2::new(0.0, cruise) + g.recoil;
    body.integrate(dt);
    body.pos.x = clamp_span(body.pos.x, body.radius, ARENA_WIDTH - body.radius);
    g.recoil *= 0.9;
    if g.recoil.length_squared() < 1.0 {
        g.recoil = Vec2::ZERO;
    }

    let on_screen = body.pos.y > 0.0;
    let aim = direction(g.facing);
    let muzzle = body.pos + aim * body.radius;

    if g.rapid_timer.tick() && on_screen {
        let side = Vec2::new(-aim.y, aim.x) * 12.0;
        for offset in [side, -side] {
            out.push(Projectile::bullet(
                muzzle + offset,
                aim * GUNSHIP_RAPID_SPEED,
                ENEMY_BULLET_RADIUS * 0.7,
                GUNSHIP_RAPID_DAMAGE,
                Owner::Enemy(id),
            ));
        }
    }

    if g.heavy_timer.tick() && on_screen && g.burst_left == 0 {
        g.burst_left = GUNSHIP_HEAVY_ROUNDS;
        g.burst_timer.reset();
    }
    if g.burst_timer.tick() {
        out.push(Projectile::bullet(
            muzzle,
            aim * GUNSHIP_HEAVY_SPEED,
            ENEMY_BULLET_RADIUS * 1.3,
            GUNSHIP_HEAVY_DAMAGE,
            Owner::Enemy(id),
        ));
        g.burst_left = g.burst_left.saturating_sub(1);
        if g.burst_left == 0 {
            g.burst_timer.cancel();
        }
    }

    if g.salvo_timer.tick() && on_screen {
        for spread in [-0.5f32, 0.5] {
            out.push(Projectile::seeker(
                muzzle,
                direction(g.facing + spread) * GUNSHIP_SALVO_SPEED,
                GUNSHIP_SALVO_DAMAGE,
                2.5,
                GUNSHIP_SALVO_FUEL_TICKS,
                Owner::Enemy(id),
            ));
        }
        g.recoil = -aim * GUNSHIP_RECOIL;
    }
}

impl Combatant for Enemy {
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
        if let EnemyBehavior::Gunship(g) = &mut self.behavior {
            g.cancel_timers();
        }
        self.body.enabled = false;
        self.body.vel = Vec2::ZERO;
    }
}
