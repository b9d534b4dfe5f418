//! Boss encounters
//!
//! A boss flies in from above the arena, fights through a per-kind attack
//! script, flips into a rage mode once when its hp drops under the rage
//! threshold, and after death plays an explosion sequence before reporting
//! itself defeated. Attack timers only exist in `Combat`; entering and dying
//! never fire.

mod overlord;
mod prism;
mod sentinel;
pub mod turret;

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

pub use overlord::{OverlordAction, OverlordState};
pub use prism::{Emitter, PrismState};
pub use sentinel::{SentinelAction, SentinelState};
pub use turret::{Turret, TurretProfile, TurretState};

use super::entity::{Body, Combatant, DamageOutcome, EntityId, Health, IdAllocator};
use super::events::FrameEvent;
use super::projectile::{Owner, Projectile};
use super::timer::Timer;
use crate::consts::*;
use crate::direction;
use crate::tuning::{BossKind, BossStats, TurretStats};
use rand::Rng;

/// Fly-in from above the arena to the hover point
pub const BOSS_ENTRY_FROM: Vec2 = Vec2::new(ARENA_WIDTH / 2.0, -200.0);
pub const BOSS_HOVER_POINT: Vec2 = Vec2::new(ARENA_WIDTH / 2.0, 220.0);
pub const BOSS_ENTRY_MS: u32 = 2000;
/// Explosion sequence between death and the defeat event
pub const BOSS_DYING_MS: u32 = 2000;
pub const BOSS_DYING_BLAST_MS: u32 = 250;

/// Rage upgrade for turrets: faster fire, faster movement, more hp
pub const TURRET_RAGE_FIRE_FACTOR: f32 = 0.6;
pub const TURRET_RAGE_SPEED_FACTOR: f32 = 1.5;
pub const TURRET_RAGE_HP_FACTOR: f32 = 1.5;
/// Turret deployment slots relative to the boss
pub const TURRET_SLOT_OFFSET: Vec2 = Vec2::new(200.0, 90.0);

pub const NOVA_BULLET_SPEED: f32 = 220.0;
pub const NOVA_BULLET_DAMAGE: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BossPhase {
    Entering { elapsed: u32 },
    Combat,
    Dying { sequence: Timer, blast: Timer },
    Defeated,
}

/// A vertical strike column, live while the Overlord's beam is firing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamStrike {
    pub x: f32,
    pub width: f32,
}

/// Per-tick inputs the boss reads
pub struct BossContext<'a> {
    pub dt: f32,
    pub player_pos: Vec2,
    pub rng: &'a mut Pcg32,
    pub ids: &'a mut IdAllocator,
}

/// Everything the attack scripts are allowed to touch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossRig {
    pub kind: BossKind,
    pub body: Body,
    /// Anchor for idle movement
    pub home: Vec2,
    pub enraged: bool,
    pub turrets: Vec<Turret>,
    pub turret_profile: TurretProfile,
    /// How many times the turret profile was upgraded
    pub turret_upgrades: u32,
    pub beam: Option<BeamStrike>,
    /// Seconds spent in combat; drives idle sway
    pub clock: f32,
    pub outbox: Vec<FrameEvent>,
}

impl BossRig {
    pub fn emit(&mut self, event: FrameEvent) {
        self.outbox.push(event);
    }

    pub fn live_turrets(&self) -> impl Iterator<Item = &Turret> {
        self.turrets.iter().filter(|t| !t.is_dead())
    }

    pub fn deploy_turret_pair(&mut self, ids: &mut IdAllocator) {
        let origin = self.body.pos;
        for side in [-1.0f32, 1.0] {
            let slot = origin + Vec2::new(side * TURRET_SLOT_OFFSET.x, TURRET_SLOT_OFFSET.y);
            let slot = crate::clamp_to_arena(slot, self.turret_profile.radius);
            let turret = Turret::deploy(ids.next_id(), origin, slot, &self.turret_profile);
            self.emit(FrameEvent::TurretDeployed { id: turret.id });
            self.turrets.push(turret);
        }
        log::info!("{} deployed turret pair", self.kind.as_str());
    }

    /// Upgrade the turret profile and every live turret
    pub fn upgrade_turrets(&mut self) {
        let p = &mut self.turret_profile;
        let delay = (p.fire_delay_ticks as f32 * TURRET_RAGE_FIRE_FACTOR).round() as u32;
        p.fire_delay_ticks = delay.max(1);
        p.move_speed *= TURRET_RAGE_SPEED_FACTOR;
        p.hp *= TURRET_RAGE_HP_FACTOR;
        let profile = self.turret_profile.clone();
        for turret in &mut self.turrets {
            turret.apply_profile(&profile, TURRET_RAGE_HP_FACTOR);
        }
        self.turret_upgrades += 1;
        self.emit(FrameEvent::TurretsUpgraded);
    }

    /// Ease toward `target` x around the home row
    pub fn sway(&mut self, amplitude: f32, freq: f32, dt: f32) {
        let target = Vec2::new(self.home.x + (self.clock * freq).sin() * amplitude, self.home.y);
        let target = crate::clamp_to_arena(target, self.body.radius);
        self.body.pos += (target - self.body.pos) * (4.0 * dt).min(1.0);
    }

    /// Ring of bullets around the boss
    pub fn nova(&self, count: u32, offset: f32, out: &mut Vec<Projectile>) {
        for i in 0..count {
            let angle = offset + i as f32 * std::f32::consts::TAU / count as f32;
            let dir = direction(angle);
            out.push(Projectile::bullet(
                self.body.pos + dir * self.body.radius,
                dir * NOVA_BULLET_SPEED,
                ENEMY_BULLET_RADIUS,
                NOVA_BULLET_DAMAGE,
                Owner::Boss,
            ));
        }
    }
}

/// Kind-specific attack script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BossPattern {
    Sentinel(SentinelState),
    Overlord(OverlordState),
    Prism(PrismState),
}

impl BossPattern {
    fn new(kind: BossKind) -> Self {
        match kind {
            BossKind::Sentinel => Self::Sentinel(SentinelState::new()),
            BossKind::Overlord => Self::Overlord(OverlordState::new()),
            BossKind::Prism => Self::Prism(PrismState::new()),
        }
    }

    fn start(&mut self, rig: &mut BossRig, ids: &mut IdAllocator) {
        match self {
            Self::Sentinel(s) => s.start(),
            Self::Overlord(s) => s.start(rig, ids),
            Self::Prism(s) => s.start(),
        }
    }

    fn update(
        &mut self,
        rig: &mut BossRig,
        ctx: &mut BossContext<'_>,
        out: &mut Vec<Projectile>,
    ) -> f32 {
        match self {
            Self::Sentinel(s) => {
                s.update(rig, ctx, out);
                0.0
            }
            Self::Overlord(s) => s.update(rig, ctx, out),
            Self::Prism(s) => {
                s.update(rig, ctx, out);
                0.0
            }
        }
    }

    fn on_rage(&mut self, rig: &mut BossRig) {
        match self {
            Self::Sentinel(s) => s.on_rage(),
            Self::Overlord(s) => s.on_rage(rig),
            Self::Prism(s) => s.on_rage(),
        }
    }

    fn cancel(&mut self, rig: &mut BossRig) {
        match self {
            Self::Sentinel(s) => s.cancel(),
            Self::Overlord(s) => s.cancel(rig),
            Self::Prism(s) => s.cancel(),
        }
    }

    fn has_active_timers(&self) -> bool {
        match self {
            Self::Sentinel(s) => s.has_active_timers(),
            Self::Overlord(s) => s.has_active_timers(),
            Self::Prism(s) => s.has_active_timers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub id: EntityId,
    pub health: Health,
    pub reward: u32,
    pub rage_threshold: f32,
    pub phase: BossPhase,
    pub rig: BossRig,
    pub pattern: BossPattern,
    /// Times the rage hook has run; never exceeds one
    pub rage_count: u32,
}

impl Boss {
    pub fn new(id: EntityId, kind: BossKind, stats: &BossStats, turret: &TurretStats) -> Self {
        Self {
            id,
            health: Health::new(stats.hp),
            reward: stats.reward,
            rage_threshold: stats.rage_threshold,
            phase: BossPhase::Entering { elapsed: 0 },
            rig: BossRig {
                kind,
                body: Body::new(BOSS_ENTRY_FROM, stats.radius),
                home: BOSS_HOVER_POINT,
                enraged: false,
                turrets: Vec::new(),
                turret_profile: TurretProfile::from(turret),
                turret_upgrades: 0,
                beam: None,
                clock: 0.0,
                outbox: Vec::new(),
            },
            pattern: BossPattern::new(kind),
            rage_count: 0,
        }
    }

    pub fn kind(&self) -> BossKind {
        self.rig.kind
    }

    pub fn is_enraged(&self) -> bool {
        self.rig.enraged
    }

    pub fn is_entering(&self) -> bool {
        matches!(self.phase, BossPhase::Entering { .. })
    }

    pub fn is_defeated(&self) -> bool {
        self.phase == BossPhase::Defeated
    }

    pub fn turrets(&self) -> &[Turret] {
        &self.rig.turrets
    }

    pub fn turrets_mut(&mut self) -> &mut [Turret] {
        &mut self.rig.turrets
    }

    pub fn beam(&self) -> Option<BeamStrike> {
        self.rig.beam
    }

    /// True if any attack timer, turret fire timer or beam is still live
    pub fn has_active_attacks(&self) -> bool {
        self.pattern.has_active_timers()
            || self.rig.beam.is_some()
            || self.rig.turrets.iter().any(|t| t.is_firing())
    }

    /// Remove without a defeat: used when the match ends under a live boss
    pub fn dismiss(&mut self) {
        if self.health.kill() {
            self.die();
        }
        self.phase = BossPhase::Defeated;
        self.rig.outbox.clear();
    }

    pub fn drain_events(&mut self) -> Vec<FrameEvent> {
        std::mem::take(&mut self.rig.outbox)
    }

    /// Advance one tick. Returns beam damage dealt to the player this tick.
    pub fn update(&mut self, ctx: &mut BossContext<'_>, out: &mut Vec<Projectile>) -> f32 {
        match self.phase {
            BossPhase::Entering { ref mut elapsed } => {
                *elapsed += 1;
                let t = (*elapsed as f32 / crate::ms_to_ticks(BOSS_ENTRY_MS) as f32).min(1.0);
                let eased = 1.0 - (1.0 - t).powi(3);
                self.rig.body.pos = BOSS_ENTRY_FROM.lerp(BOSS_HOVER_POINT, eased);
                if t >= 1.0 {
                    self.phase = BossPhase::Combat;
                    self.pattern.start(&mut self.rig, ctx.ids);
                    log::info!("{} engaged", self.rig.kind.as_str());
                }
                0.0
            }
            BossPhase::Combat => {
                self.rig.clock += ctx.dt;
                self.rig.turrets.retain(|t| !t.is_dead());
                for turret in &mut self.rig.turrets {
                    turret.update(ctx.player_pos, ctx.dt, &mut *ctx.rng, out);
                }
                self.pattern.update(&mut self.rig, ctx, out)
            }
            BossPhase::Dying {
                ref mut sequence,
                ref mut blast,
            } => {
                if blast.tick() {
                    let jitter = Vec2::new(
                        ctx.rng.random_range(-1.0..1.0),
                        ctx.rng.random_range(-1.0..1.0),
                    );
                    let pos = self.rig.body.pos + jitter * self.rig.body.radius;
                    self.rig.outbox.push(FrameEvent::Explosion { pos, radius: 60.0 });
                }
                if sequence.tick() {
                    blast.cancel();
                    self.phase = BossPhase::Defeated;
                    self.rig.emit(FrameEvent::BossDefeated { kind: self.rig.kind });
                    log::info!("{} defeated", self.rig.kind.as_str());
                }
                0.0
            }
            BossPhase::Defeated => 0.0,
        }
    }

    fn enter_rage(&mut self) {
        self.rig.enraged = true;
        self.rage_count += 1;
        self.rig.emit(FrameEvent::BossEnraged { kind: self.rig.kind });
        self.pattern.on_rage(&mut self.rig);
        log::info!(
            "{} enraged at {:.0}/{:.0} hp",
            self.rig.kind.as_str(),
            self.health.hp,
            self.health.max_hp
        );
    }
}

impl Combatant for Boss {
    fn id(&self) -> EntityId {
        self.id
    }

    fn body(&self) -> &Body {
        &self.rig.body
    }

    fn health(&self) -> &Health {
        &self.health
    }

    fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    fn die(&mut self) {
        self.rig.body.enabled = false;
        self.rig.body.vel = Vec2::ZERO;
        self.pattern.cancel(&mut self.rig);
        self.rig.beam = None;
        let mut destroyed = Vec::new();
        for turret in &mut self.rig.turrets {
            if turret.destroy() {
                destroyed.push((turret.id, turret.body.pos));
            }
        }
        for (id, pos) in destroyed {
            self.rig.emit(FrameEvent::TurretDestroyed { id, pos });
            self.rig.emit(FrameEvent::Explosion { pos, radius: 40.0 });
        }
        self.phase = BossPhase::Dying {
            sequence: Timer::once_ms(BOSS_DYING_MS),
            blast: Timer::repeating_ms(BOSS_DYING_BLAST_MS),
        };
    }

    fn take_damage(&mut self, amount: f32) -> Option<DamageOutcome> {
        let mut outcome = self.health.apply(amount)?;
        if outcome.killed {
            self.die();
            return Some(outcome);
        }
        if !self.rig.enraged && self.health.hp <= self.health.max_hp * self.rage_threshold {
            outcome.enraged = true;
            self.enter_rage();
        }
        Some(outcome)
    }
}
