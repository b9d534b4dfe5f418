//! Prism: a ring of emitters spun around a tilted axis
//!
//! Emitters are laid out on a circle and projected onto a flattened ellipse,
//! so the ring reads as a disc rotating in depth. Only emitters on the near
//! side of the ring fire, and nearer ones fire faster rounds.

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{BossContext, BossRig};
use crate::consts::*;
use crate::ms_to_ticks;
use crate::sim::projectile::{Owner, Projectile};
use crate::sim::timer::Timer;

pub const RING_RADIUS: f32 = 90.0;
/// Vertical squash of the projected ring
pub const RING_TILT: f32 = 0.35;
pub const SPIN: f32 = 1.2;
pub const EMITTERS: u32 = 6;
pub const RAGE_EMITTERS: u32 = 8;
pub const BURST_MS: u32 = 2800;
pub const RAGE_BURST_MS: u32 = 1800;
pub const VOLLEYS: u8 = 5;
pub const VOLLEY_GAP_MS: u32 = 90;
pub const VOLLEY_BASE_SPEED: f32 = 240.0;
pub const VOLLEY_DEPTH_SPEED: f32 = 120.0;
pub const VOLLEY_DAMAGE: f32 = 9.0;
/// Nova added once enraged
pub const RAGE_NOVA_MS: u32 = 3000;
pub const RAGE_NOVA_COUNT: u32 = 12;
pub const DRIFT_X: f32 = 160.0;
pub const DRIFT_Y: f32 = 40.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrismState {
    pub ring_angle: f32,
    spin: f32,
    emitters: u32,
    burst_cycle: Timer,
    volley_timer: Timer,
    volleys_left: u8,
    nova_timer: Timer,
}

/// A projected emitter: screen position and depth in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    pub pos: Vec2,
    pub depth: f32,
}

impl PrismState {
    pub fn new() -> Self {
        Self {
            ring_angle: 0.0,
            spin: SPIN,
            emitters: EMITTERS,
            burst_cycle: Timer::repeating_ms(BURST_MS).paused(),
            volley_timer: Timer::repeating_ms(VOLLEY_GAP_MS).paused(),
            volleys_left: 0,
            nova_timer: Timer::repeating_ms(RAGE_NOVA_MS).paused(),
        }
    }

    pub fn emitters(&self, center: Vec2) -> Vec<Emitter> {
        (0..self.emitters)
            .map(|i| {
                let a = self.ring_angle + i as f32 * TAU / self.emitters as f32;
                Emitter {
                    pos: center
                        + Vec2::new(a.cos() * RING_RADIUS, a.sin() * RING_RADIUS * RING_TILT),
                    depth: a.sin(),
                }
            })
            .collect()
    }

    pub(super) fn start(&mut self) {
        self.burst_cycle.reset();
    }

    pub(super) fn update(
        &mut self,
        rig: &mut BossRig,
        ctx: &mut BossContext<'_>,
        out: &mut Vec<Projectile>,
    ) {
        self.ring_angle = (self.ring_angle + self.spin * ctx.dt) % TAU;

        // Figure-eight drift around the hover point
        let drift = Vec2::new((rig.clock * 0.5).sin() * DRIFT_X, rig.clock.sin() * DRIFT_Y);
        let target = rig.home + drift;
        rig.body.pos += (target - rig.body.pos) * (4.0 * ctx.dt).min(1.0);

        if self.burst_cycle.tick() {
            self.volleys_left = VOLLEYS;
            self.volley_timer.reset();
        }
        if self.volley_timer.tick() {
            for emitter in self.emitters(rig.body.pos) {
                if emitter.depth <= 0.0 {
                    continue;
                }
                let outward =
                    Vec2::new(emitter.pos.x - rig.body.pos.x, RING_RADIUS).normalize_or_zero();
                let speed = VOLLEY_BASE_SPEED + VOLLEY_DEPTH_SPEED * emitter.depth;
                out.push(Projectile::bullet(
                    emitter.pos,
                    outward * speed,
                    ENEMY_BULLET_RADIUS,
                    VOLLEY_DAMAGE,
                    Owner::Boss,
                ));
            }
            self.volleys_left = self.volleys_left.saturating_sub(1);
            if self.volleys_left == 0 {
                self.volley_timer.cancel();
            }
        }

        if self.nova_timer.tick() {
            rig.nova(RAGE_NOVA_COUNT, self.ring_angle, out);
        }
    }

    pub(super) fn on_rage(&mut self) {
        self.spin *= 2.0;
        self.emitters = RAGE_EMITTERS;
        self.burst_cycle.set_period(ms_to_ticks(RAGE_BURST_MS));
        self.nova_timer.reset();
    }

    pub(super) fn cancel(&mut self) {
        self.burst_cycle.cancel();
        self.volley_timer.cancel();
        self.nova_timer.cancel();
        self.volleys_left = 0;
    }

    pub(super) fn has_active_timers(&self) -> bool {
        self.burst_cycle.is_active() || self.volley_timer.is_active() || self.nova_timer.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitters_lie_on_tilted_ring() {
        let s = PrismState::new();
        let center = Vec2::new(360.0, 220.0);
        let ring = s.emitters(center);
        assert_eq!(ring.len(), EMITTERS as usize);
        for e in &ring {
            let d = e.pos - center;
            assert!(d.x.abs() <= RING_RADIUS + 1e-3);
            assert!(d.y.abs() <= RING_RADIUS * RING_TILT + 1e-3);
        }
        assert!(ring.iter().any(|e| e.depth > 0.0));
        assert!(ring.iter().any(|e| e.depth < 0.0));
    }

    #[test]
    fn test_rage_adds_emitters_and_nova() {
        let mut s = PrismState::new();
        s.start();
        assert!(!s.nova_timer.is_active());
        s.on_rage();
        assert_eq!(s.emitters(Vec2::ZERO).len(), RAGE_EMITTERS as usize);
        assert!(s.nova_timer.is_active());
        assert_eq!(s.burst_cycle.period(), ms_to_ticks(RAGE_BURST_MS));
    }

    #[test]
    fn test_cancel_stops_everything() {
        let mut s = PrismState::new();
        s.start();
        s.on_rage();
        s.cancel();
        assert!(!s.has_active_timers());
    }
}
