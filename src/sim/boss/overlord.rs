//! Overlord: turret pairs, a telegraphed charge beam and inferno bursts
//!
//! Rage upgrades the turrets once (faster fire and movement, more hp) and
//! tightens both attack cycles. Destroyed turret pairs are redeployed after a
//! cooldown.

use std::f32::consts::FRAC_PI_2;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{BeamStrike, BossContext, BossRig};
use crate::consts::*;
use crate::direction;
use crate::ms_to_ticks;
use crate::sim::entity::{Combatant, IdAllocator};
use crate::sim::events::FrameEvent;
use crate::sim::projectile::{Owner, Projectile};
use crate::sim::timer::Timer;

pub const BEAM_CYCLE_MS: u32 = 7000;
pub const RAGE_BEAM_CYCLE_MS: u32 = 5000;
pub const BEAM_CHARGE_MS: u32 = 1200;
pub const BEAM_FIRE_MS: u32 = 1500;
/// Damage is applied to a player standing in the column every interval
pub const BEAM_TICK_MS: u32 = 150;
pub const BEAM_DAMAGE: f32 = 8.0;
pub const BEAM_WIDTH: f32 = 80.0;

pub const INFERNO_CYCLE_MS: u32 = 9000;
pub const RAGE_INFERNO_CYCLE_MS: u32 = 6000;
pub const INFERNO_MS: u32 = 2000;
pub const INFERNO_SHOT_MS: u32 = 100;
pub const INFERNO_SPREAD: f32 = 0.5;
pub const INFERNO_SPEED: f32 = 300.0;
pub const INFERNO_DAMAGE: f32 = 6.0;

pub const TURRET_REDEPLOY_MS: u32 = 8000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlordAction {
    Hover,
    Charging { ticks_left: u32 },
    Beaming { ticks_left: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlordState {
    pub action: OverlordAction,
    beam_cycle: Timer,
    beam_tick: Timer,
    inferno_cycle: Timer,
    inferno_shot: Timer,
    inferno_left: u32,
    redeploy: Timer,
}

impl OverlordState {
    pub fn new() -> Self {
        Self {
            action: OverlordAction::Hover,
            beam_cycle: Timer::repeating_ms(BEAM_CYCLE_MS).paused(),
            beam_tick: Timer::repeating_ms(BEAM_TICK_MS).paused(),
            inferno_cycle: Timer::repeating_ms(INFERNO_CYCLE_MS).paused(),
            inferno_shot: Timer::repeating_ms(INFERNO_SHOT_MS).paused(),
            inferno_left: 0,
            redeploy: Timer::once_ms(TURRET_REDEPLOY_MS).paused(),
        }
    }

    pub(super) fn start(&mut self, rig: &mut BossRig, ids: &mut IdAllocator) {
        self.beam_cycle.reset();
        self.inferno_cycle.reset();
        rig.deploy_turret_pair(ids);
    }

    /// Returns beam damage dealt to the player this tick
    pub(super) fn update(
        &mut self,
        rig: &mut BossRig,
        ctx: &mut BossContext<'_>,
        out: &mut Vec<Projectile>,
    ) -> f32 {
        let mut player_damage = 0.0;

        match self.action {
            OverlordAction::Hover => rig.sway(100.0, 0.5, ctx.dt),
            OverlordAction::Charging { ref mut ticks_left } => {
                *ticks_left = ticks_left.saturating_sub(1);
                if *ticks_left == 0 {
                    self.action = OverlordAction::Beaming {
                        ticks_left: ms_to_ticks(BEAM_FIRE_MS),
                    };
                    rig.beam = Some(BeamStrike {
                        x: rig.body.pos.x,
                        width: BEAM_WIDTH,
                    });
                    self.beam_tick.reset();
                }
            }
            OverlordAction::Beaming { ref mut ticks_left } => {
                if self.beam_tick.tick() {
                    if let Some(beam) = rig.beam {
                        let reach = beam.width / 2.0 + PLAYER_RADIUS;
                        let in_column = (ctx.player_pos.x - beam.x).abs() < reach;
                        if in_column && ctx.player_pos.y > rig.body.pos.y {
                            player_damage += BEAM_DAMAGE;
                        }
                    }
                }
                *ticks_left = ticks_left.saturating_sub(1);
                if *ticks_left == 0 {
                    self.beam_tick.cancel();
                    rig.beam = None;
                    self.action = OverlordAction::Hover;
                }
            }
        }

        if self.beam_cycle.tick() && self.action == OverlordAction::Hover {
            self.action = OverlordAction::Charging {
                ticks_left: ms_to_ticks(BEAM_CHARGE_MS),
            };
            let pos = glam::Vec2::new(rig.body.pos.x, ARENA_HEIGHT / 2.0);
            rig.emit(FrameEvent::BossTelegraph { pos });
        }

        if self.inferno_cycle.tick() {
            self.inferno_left = ms_to_ticks(INFERNO_MS);
            self.inferno_shot.reset();
        }
        if self.inferno_left > 0 {
            self.inferno_left -= 1;
            if self.inferno_shot.tick() {
                let angle = FRAC_PI_2 + ctx.rng.random_range(-INFERNO_SPREAD..INFERNO_SPREAD);
                let dir = direction(angle);
                out.push(Projectile::bullet(
                    rig.body.pos + dir * rig.body.radius,
                    dir * INFERNO_SPEED,
                    ENEMY_BULLET_RADIUS,
                    INFERNO_DAMAGE,
                    Owner::Boss,
                ));
            }
            if self.inferno_left == 0 {
                self.inferno_shot.cancel();
            }
        }

        if rig.turrets.iter().all(|t| t.is_dead()) && !self.redeploy.is_active() {
            self.redeploy.reset();
        }
        if self.redeploy.tick() {
            rig.deploy_turret_pair(ctx.ids);
        }

        player_damage
    }

    pub(super) fn on_rage(&mut self, rig: &mut BossRig) {
        rig.upgrade_turrets();
        self.beam_cycle.set_period(ms_to_ticks(RAGE_BEAM_CYCLE_MS));
        self.inferno_cycle.set_period(ms_to_ticks(RAGE_INFERNO_CYCLE_MS));
    }

    pub(super) fn cancel(&mut self, rig: &mut BossRig) {
        self.beam_cycle.cancel();
        self.beam_tick.cancel();
        self.inferno_cycle.cancel();
        self.inferno_shot.cancel();
        self.inferno_left = 0;
        self.redeploy.cancel();
        self.action = OverlordAction::Hover;
        rig.beam = None;
    }

    pub(super) fn has_active_timers(&self) -> bool {
        self.beam_cycle.is_active()
            || self.beam_tick.is_active()
            || self.inferno_cycle.is_active()
            || self.inferno_shot.is_active()
            || self.redeploy.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::boss::{BOSS_ENTRY_MS, Boss, BossPattern};
    use crate::tuning::{BossKind, BossTable, TurretStats};
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Rig {
        boss: Boss,
        rng: Pcg32,
        ids: IdAllocator,
        out: Vec<Projectile>,
    }

    impl Rig {
        fn new() -> Self {
            let stats = BossTable::default();
            let mut r = Self {
                boss: Boss::new(
                    1,
                    BossKind::Overlord,
                    stats.get(BossKind::Overlord),
                    &TurretStats::default(),
                ),
                rng: Pcg32::seed_from_u64(9),
                ids: IdAllocator::new(),
                out: Vec::new(),
            };
            r.step(ms_to_ticks(BOSS_ENTRY_MS), Vec2::new(100.0, 1100.0));
            r
        }

        fn step(&mut self, ticks: u32, player_pos: Vec2) -> f32 {
            let mut dealt = 0.0;
            for _ in 0..ticks {
                let mut ctx = BossContext {
                    dt: SIM_DT,
                    player_pos,
                    rng: &mut self.rng,
                    ids: &mut self.ids,
                };
                dealt += self.boss.update(&mut ctx, &mut self.out);
            }
            dealt
        }
    }

    #[test]
    fn test_turrets_deployed_on_engage() {
        let r = Rig::new();
        assert_eq!(r.boss.turrets().len(), 2);
        assert!(r.boss.turrets().iter().all(|t| !t.is_deployed()));
    }

    #[test]
    fn test_rage_upgrades_turrets_once() {
        let mut r = Rig::new();
        let base_delay = r.boss.rig.turret_profile.fire_delay_ticks;
        let hit = r.boss.health.max_hp * 0.7;
        let o = r.boss.take_damage(hit).expect("alive");
        assert!(o.enraged);
        r.boss.take_damage(1.0);
        r.boss.take_damage(1.0);
        assert_eq!(r.boss.rig.turret_upgrades, 1);
        let expected = (base_delay as f32 * super::super::TURRET_RAGE_FIRE_FACTOR).round() as u32;
        assert!(r.boss.turrets().iter().all(|t| t.fire_delay_ticks() == expected));
        let raged_hp = TurretStats::default().hp * 1.5;
        assert!(r.boss.turrets().iter().all(|t| t.health.max_hp == raged_hp));
    }

    #[test]
    fn test_beam_hits_player_in_column() {
        let mut r = Rig::new();
        let BossPattern::Overlord(s) = &mut r.boss.pattern else {
            panic!("expected overlord");
        };
        s.action = OverlordAction::Charging { ticks_left: 1 };
        r.step(1, Vec2::new(100.0, 1100.0));
        let beam = r.boss.beam().expect("beam live");
        let under = Vec2::new(beam.x, 1100.0);
        let dealt = r.step(ms_to_ticks(BEAM_FIRE_MS), under);
        let hits = ms_to_ticks(BEAM_FIRE_MS) / ms_to_ticks(BEAM_TICK_MS);
        assert_eq!(dealt, BEAM_DAMAGE * hits as f32);
        assert!(r.boss.beam().is_none());
    }

    #[test]
    fn test_beam_misses_outside_column() {
        let mut r = Rig::new();
        let BossPattern::Overlord(s) = &mut r.boss.pattern else {
            panic!("expected overlord");
        };
        s.action = OverlordAction::Charging { ticks_left: 1 };
        r.step(1, Vec2::ZERO);
        let beam = r.boss.beam().expect("beam live");
        let aside = Vec2::new(beam.x + BEAM_WIDTH + PLAYER_RADIUS, 1100.0);
        assert_eq!(r.step(ms_to_ticks(BEAM_FIRE_MS), aside), 0.0);
    }

    #[test]
    fn test_redeploy_after_pair_destroyed() {
        let mut r = Rig::new();
        for t in r.boss.turrets_mut() {
            t.take_damage(1e6);
        }
        r.step(1, Vec2::ZERO);
        assert!(r.boss.turrets().is_empty());
        r.step(ms_to_ticks(TURRET_REDEPLOY_MS), Vec2::ZERO);
        assert_eq!(r.boss.turrets().len(), 2);
        let deployed = r
            .boss
            .drain_events()
            .iter()
            .filter(|e| matches!(e, FrameEvent::TurretDeployed { .. }))
            .count();
        assert_eq!(deployed, 4);
    }
}
