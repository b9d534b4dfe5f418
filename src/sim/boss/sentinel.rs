//! Sentinel: bullet novas plus a teleport-dash into an aimed sniper volley

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{BossContext, BossRig};
use crate::consts::*;
use crate::sim::events::FrameEvent;
use crate::sim::projectile::{Owner, Projectile};
use crate::sim::timer::Timer;

pub const NOVA_MS: u32 = 3500;
pub const RAGE_NOVA_MS: u32 = 2200;
pub const NOVA_COUNT: u32 = 16;
pub const RAGE_NOVA_COUNT: u32 = 24;
pub const DASH_MS: u32 = 6000;
pub const RAGE_DASH_MS: u32 = 4000;
/// Telegraph shown at the dash destination before the jump
pub const DASH_TELEGRAPH_MS: u32 = 400;
pub const DASH_SPEED: f32 = 900.0;
pub const SNIPER_SHOTS: u8 = 3;
pub const RAGE_SNIPER_SHOTS: u8 = 5;
pub const SNIPER_GAP_MS: u32 = 200;
pub const SNIPER_SPEED: f32 = 600.0;
pub const SNIPER_DAMAGE: f32 = 14.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SentinelAction {
    Hover,
    Telegraph { target: Vec2, ticks_left: u32 },
    Dashing { target: Vec2 },
    Sniping { shots_left: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelState {
    pub action: SentinelAction,
    nova_timer: Timer,
    dash_timer: Timer,
    shot_timer: Timer,
    nova_count: u32,
    sniper_shots: u8,
    nova_spin: f32,
}

impl SentinelState {
    pub fn new() -> Self {
        Self {
            action: SentinelAction::Hover,
            nova_timer: Timer::repeating_ms(NOVA_MS).paused(),
            dash_timer: Timer::repeating_ms(DASH_MS).paused(),
            shot_timer: Timer::repeating_ms(SNIPER_GAP_MS).paused(),
            nova_count: NOVA_COUNT,
            sniper_shots: SNIPER_SHOTS,
            nova_spin: 0.0,
        }
    }

    pub(super) fn start(&mut self) {
        self.nova_timer.reset();
        self.dash_timer.reset();
    }

    pub(super) fn update(
        &mut self,
        rig: &mut BossRig,
        ctx: &mut BossContext<'_>,
        out: &mut Vec<Projectile>,
    ) {
        let dt = ctx.dt;
        match self.action {
            SentinelAction::Hover => rig.sway(140.0, 0.8, dt),
            SentinelAction::Telegraph {
                target,
                ref mut ticks_left,
            } => {
                *ticks_left = ticks_left.saturating_sub(1);
                if *ticks_left == 0 {
                    self.action = SentinelAction::Dashing { target };
                }
            }
            SentinelAction::Dashing { target } => {
                let to_target = target - rig.body.pos;
                let step = DASH_SPEED * dt;
                if to_target.length() <= step {
                    rig.body.pos = target;
                    rig.home.x = target.x;
                    self.action = SentinelAction::Sniping {
                        shots_left: self.sniper_shots,
                    };
                    self.shot_timer.reset();
                } else {
                    rig.body.pos += to_target.normalize_or_zero() * step;
                }
            }
            SentinelAction::Sniping { ref mut shots_left } => {
                if self.shot_timer.tick() {
                    let aim = (ctx.player_pos - rig.body.pos).try_normalize().unwrap_or(Vec2::Y);
                    out.push(Projectile::bullet(
                        rig.body.pos + aim * rig.body.radius,
                        aim * SNIPER_SPEED,
                        ENEMY_BULLET_RADIUS,
                        SNIPER_DAMAGE,
                        Owner::Boss,
                    ));
                    *shots_left = shots_left.saturating_sub(1);
                    if *shots_left == 0 {
                        self.shot_timer.cancel();
                        self.action = SentinelAction::Hover;
                    }
                }
            }
        }

        if self.dash_timer.tick() && self.action == SentinelAction::Hover {
            let margin = rig.body.radius + 50.0;
            let target = Vec2::new(
                crate::random_span(&mut *ctx.rng, margin, ARENA_WIDTH - margin),
                rig.home.y + ctx.rng.random_range(-40.0..60.0),
            );
            self.action = SentinelAction::Telegraph {
                target,
                ticks_left: crate::ms_to_ticks(DASH_TELEGRAPH_MS),
            };
            rig.emit(FrameEvent::BossTelegraph { pos: target });
        }

        if self.nova_timer.tick() {
            self.nova_spin += 0.2;
            rig.nova(self.nova_count, self.nova_spin, out);
        }
    }

    pub(super) fn on_rage(&mut self) {
        self.nova_timer.set_period(crate::ms_to_ticks(RAGE_NOVA_MS));
        self.dash_timer.set_period(crate::ms_to_ticks(RAGE_DASH_MS));
        self.nova_count = RAGE_NOVA_COUNT;
        self.sniper_shots = RAGE_SNIPER_SHOTS;
    }

    pub(super) fn cancel(&mut self) {
        self.nova_timer.cancel();
        self.dash_timer.cancel();
        self.shot_timer.cancel();
        self.action = SentinelAction::Hover;
    }

    pub(super) fn has_active_timers(&self) -> bool {
        self.nova_timer.is_active() || self.dash_timer.is_active() || self.shot_timer.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ms_to_ticks;
    use crate::sim::boss::{Boss, BossPattern};
    use crate::sim::entity::IdAllocator;
    use crate::tuning::{BossKind, BossTable, TurretStats};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn combat_boss() -> Boss {
        let stats = BossTable::default();
        let mut b = Boss::new(
            1,
            BossKind::Sentinel,
            stats.get(BossKind::Sentinel),
            &TurretStats::default(),
        );
        b.phase = crate::sim::boss::BossPhase::Combat;
        b.rig.body.pos = crate::sim::boss::BOSS_HOVER_POINT;
        if let BossPattern::Sentinel(s) = &mut b.pattern {
            s.start();
        }
        b
    }

    fn step(b: &mut Boss, ticks: u32, out: &mut Vec<Projectile>) {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut ids = IdAllocator::new();
        for _ in 0..ticks {
            let mut ctx = BossContext {
                dt: SIM_DT,
                player_pos: Vec2::new(360.0, 1100.0),
                rng: &mut rng,
                ids: &mut ids,
            };
            b.update(&mut ctx, out);
        }
    }

    #[test]
    fn test_nova_ring() {
        let mut b = combat_boss();
        let mut out = Vec::new();
        step(&mut b, ms_to_ticks(NOVA_MS), &mut out);
        assert_eq!(out.len(), NOVA_COUNT as usize);
    }

    #[test]
    fn test_dash_then_sniper_volley() {
        let mut b = combat_boss();
        let mut out = Vec::new();
        step(&mut b, ms_to_ticks(DASH_MS), &mut out);
        let BossPattern::Sentinel(s) = &b.pattern else {
            panic!("expected sentinel");
        };
        assert!(matches!(s.action, SentinelAction::Telegraph { .. }));
        let telegraphs = b
            .drain_events()
            .iter()
            .filter(|e| matches!(e, FrameEvent::BossTelegraph { .. }))
            .count();
        assert_eq!(telegraphs, 1);

        out.clear();
        // Telegraph, a full-width dash and the volley all fit in two seconds
        step(&mut b, 120, &mut out);
        let snipes = out.iter().filter(|p| p.damage == SNIPER_DAMAGE).count();
        assert_eq!(snipes, SNIPER_SHOTS as usize);
        let BossPattern::Sentinel(s) = &b.pattern else {
            panic!("expected sentinel");
        };
        assert_eq!(s.action, SentinelAction::Hover);
    }

    #[test]
    fn test_rage_hardens_pattern() {
        let mut b = combat_boss();
        let BossPattern::Sentinel(s) = &mut b.pattern else {
            panic!("expected sentinel");
        };
        s.on_rage();
        assert_eq!(s.nova_timer.period(), ms_to_ticks(RAGE_NOVA_MS));
        assert_eq!(s.nova_count, RAGE_NOVA_COUNT);
        assert_eq!(s.sniper_shots, RAGE_SNIPER_SHOTS);
    }
}
