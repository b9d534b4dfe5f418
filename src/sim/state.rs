//! Match state
//!
//! Everything a single match owns. A fresh `MatchState` is built for every
//! match and torn down when it ends; nothing carries over between matches.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ability::LockOnTable;
use super::boss::Boss;
use super::collision::{CollisionLayer, Relation};
use super::director::WaveDirector;
use super::enemy::Enemy;
use super::entity::{Combatant, DamageOutcome, EntityId, IdAllocator};
use super::events::{FrameEvent, ShellNotification};
use super::follow::{FollowKind, Followers};
use super::player::Player;
use super::projectile::Projectile;
use crate::outcome::{MatchResult, StarRating};
use crate::tuning::{
    BossKind, BossStats, CombatTuning, EnemyKind, EnemyTable, GameConfig, TurretStats,
};

/// Health bars float this far above their subject
pub const HEALTH_BAR_OFFSET: Vec2 = Vec2::new(0.0, -34.0);

/// Current phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Scripted waves are running
    Waves,
    /// Waves exhausted; the boss is in the arena
    BossFight,
    Paused,
    Victory,
    Defeat,
}

impl MatchPhase {
    pub fn is_over(&self) -> bool {
        matches!(self, MatchPhase::Victory | MatchPhase::Defeat)
    }
}

/// What the shell hands over at match start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchSetup {
    /// Equipped craft; unknown or missing falls back to the default craft
    pub craft: Option<String>,
    /// Selected level; unknown or missing falls back to the first level
    pub level: Option<String>,
    pub seed: u64,
}

/// Who a hostile hit lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Enemy(EntityId),
    Boss,
    Turret(EntityId),
}

/// What caused a hostile to take damage; drives the side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    /// Player autofire: grants ultimate charge
    Bullet,
    Missile,
    Beam,
    /// Body contact with the player
    Contact,
}

/// Serializable summary of a running match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub time_ticks: u64,
    pub phase: MatchPhase,
    pub level: String,
    pub wave: u32,
    pub gold: u64,
    pub player_pos: Vec2,
    pub player_hp: f32,
    pub player_max_hp: f32,
    pub ult_charge: f32,
    pub ult_ready: bool,
    pub enemies: usize,
    pub player_bullets: usize,
    pub enemy_bullets: usize,
    pub boss: Option<BossSnapshot>,
    pub followers: usize,
    pub locked_targets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossSnapshot {
    pub kind: BossKind,
    pub hp: f32,
    pub max_hp: f32,
    pub enraged: bool,
    pub turrets: usize,
}

#[derive(Debug, Clone)]
pub struct MatchState {
    pub seed: u64,
    pub rng: Pcg32,
    pub time_ticks: u64,
    pub phase: MatchPhase,
    /// Phase to return to when unpausing
    pub resume_phase: MatchPhase,
    pub level_id: String,
    pub boss_kind: BossKind,
    pub player: Player,
    /// Live enemies (sorted by id)
    pub enemies: Vec<Enemy>,
    /// Player-owned projectiles
    pub bullets: Vec<Projectile>,
    /// Enemy, turret and boss projectiles
    pub enemy_bullets: Vec<Projectile>,
    pub boss: Option<Boss>,
    pub director: WaveDirector,
    pub collisions: CollisionLayer,
    pub followers: Followers,
    pub lock_on: LockOnTable,
    pub gold: u64,
    /// Screen shake intensity (decays each tick)
    pub screen_shake: f32,
    /// What happened during the last tick
    pub events: Vec<FrameEvent>,
    pub result: Option<MatchResult>,
    notifications: Vec<ShellNotification>,
    pub ids: IdAllocator,
    pub enemy_table: EnemyTable,
    pub boss_stats: BossStats,
    pub turret_stats: TurretStats,
    pub combat: CombatTuning,
}

impl MatchState {
    /// Build a match from the shell's selection. Never fails: unknown
    /// identifiers fall back to defaults.
    pub fn start(setup: &MatchSetup, config: &GameConfig) -> Self {
        let craft = config.craft(setup.craft.as_deref());
        let level = config.level(setup.level.as_deref());
        let boss_kind = BossKind::from_tag_or_default(&level.boss);
        log::info!(
            "Match start: craft `{}`, level `{}`, boss {}, seed {}",
            craft.id,
            level.id,
            boss_kind.as_str(),
            setup.seed
        );

        let mut collisions = CollisionLayer::default();
        collisions.register(Relation::BulletEnemy);
        collisions.register(Relation::PlayerEnemy);
        collisions.register(Relation::PlayerEnemyBullet);

        let mut state = Self {
            seed: setup.seed,
            rng: Pcg32::seed_from_u64(setup.seed),
            time_ticks: 0,
            phase: MatchPhase::Waves,
            resume_phase: MatchPhase::Waves,
            level_id: level.id.clone(),
            boss_kind,
            player: Player::new(craft),
            enemies: Vec::new(),
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            boss: None,
            director: WaveDirector::new(level.waves),
            collisions,
            followers: Followers::default(),
            lock_on: LockOnTable::default(),
            gold: 0,
            screen_shake: 0.0,
            events: Vec::new(),
            result: None,
            notifications: Vec::new(),
            ids: IdAllocator::new(),
            enemy_table: config.enemies.clone(),
            boss_stats: config.bosses.get(boss_kind).clone(),
            turret_stats: config.turret.clone(),
            combat: config.combat.clone(),
        };

        let opening = state.director.start();
        state.events.extend(opening.events);
        if opening.boss_start {
            state.spawn_boss();
        }
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    /// Enemy factory: build the variant, register it and give it a health bar
    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let enemy = Enemy::new(id, kind, pos, self.enemy_table.get(kind), &mut self.rng);
        self.enemies.push(enemy);
        self.followers.attach(id, FollowKind::HealthBar, HEALTH_BAR_OFFSET);
        self.events.push(FrameEvent::EnemySpawned { id, kind });
        id
    }

    /// Bring in the level's boss and open the boss collision relation
    pub fn spawn_boss(&mut self) {
        if self.boss.is_some() {
            return;
        }
        let id = self.next_entity_id();
        let boss = Boss::new(id, self.boss_kind, &self.boss_stats, &self.turret_stats);
        self.boss = Some(boss);
        self.collisions.register(Relation::BulletBoss);
        self.followers.attach(id, FollowKind::HealthBar, HEALTH_BAR_OFFSET * 3.0);
        self.events.push(FrameEvent::BossSpawned { kind: self.boss_kind });
        if self.phase == MatchPhase::Waves {
            self.phase = MatchPhase::BossFight;
        }
        log::info!("Boss {} entering", self.boss_kind.as_str());
    }

    /// Take ownership of a freshly fired projectile
    pub fn push_projectile(&mut self, mut projectile: Projectile) {
        projectile.id = self.next_entity_id();
        if projectile.owner == super::projectile::Owner::Player {
            self.bullets.push(projectile);
        } else {
            self.enemy_bullets.push(projectile);
        }
    }

    /// The only path that changes player hp
    pub fn hurt_player(&mut self, amount: f32) -> Option<DamageOutcome> {
        let outcome = self.player.take_damage(amount)?;
        if outcome.applied > 0.0 {
            self.notifications.push(ShellNotification::PlayerHpChanged {
                hp: self.player.health.hp,
            });
        }
        Some(outcome)
    }

    /// The only path that changes hostile hp. Rewards, charge and effects
    /// follow from the outcome of this one call.
    pub fn damage_hostile(
        &mut self,
        target: Target,
        amount: f32,
        source: DamageSource,
    ) -> Option<DamageOutcome> {
        let outcome = match target {
            Target::Enemy(id) => {
                let enemy = self.enemies.iter_mut().find(|e| e.id == id)?;
                let outcome = enemy.take_damage(amount)?;
                if outcome.killed {
                    let (kind, pos, reward) = (enemy.kind, enemy.body.pos, enemy.reward);
                    self.events.push(FrameEvent::EnemyKilled { id, kind, pos });
                    self.grant_reward(pos, reward);
                }
                outcome
            }
            Target::Turret(id) => {
                let boss = self.boss.as_mut()?;
                let turret = boss.turrets_mut().iter_mut().find(|t| t.id == id)?;
                let outcome = turret.take_damage(amount)?;
                if outcome.killed {
                    let (pos, reward) = (turret.body.pos, turret.reward);
                    self.events.push(FrameEvent::TurretDestroyed { id, pos });
                    self.events.push(FrameEvent::Explosion { pos, radius: 40.0 });
                    self.grant_reward(pos, reward);
                }
                outcome
            }
            Target::Boss => {
                let boss = self.boss.as_mut()?;
                let outcome = boss.take_damage(amount)?;
                let (pos, reward) = (boss.pos(), boss.reward);
                self.events.push(FrameEvent::DamageNumber {
                    pos,
                    amount: outcome.applied,
                });
                if source == DamageSource::Bullet {
                    self.add_shake(self.combat.boss_hit_shake);
                }
                if outcome.killed {
                    self.grant_reward(pos, reward);
                }
                outcome
            }
        };

        if source == DamageSource::Bullet && self.player.add_charge(self.combat.charge_per_hit) {
            self.events.push(FrameEvent::UltimateReady);
        }
        Some(outcome)
    }

    fn grant_reward(&mut self, pos: Vec2, amount: u32) {
        self.gold += amount as u64;
        self.events.push(FrameEvent::RewardPopup { pos, amount });
    }

    pub fn add_shake(&mut self, intensity: f32) {
        self.screen_shake = (self.screen_shake + intensity).min(1.0);
        self.events.push(FrameEvent::CameraShake { intensity });
    }

    /// Live hostiles a homing weapon may chase: (id, position)
    pub fn hostile_positions(&self) -> Vec<(EntityId, Vec2)> {
        let mut out: Vec<(EntityId, Vec2)> = self
            .enemies
            .iter()
            .filter(|e| !e.is_dead())
            .map(|e| (e.id, e.body.pos))
            .collect();
        if let Some(boss) = self.boss.as_ref().filter(|b| !b.is_dead()) {
            out.push((boss.id, boss.pos()));
            out.extend(boss.turrets().iter().filter(|t| !t.is_dead()).map(|t| (t.id, t.body.pos)));
        }
        out
    }

    /// Resolve an id from `hostile_positions` back to a damage target
    pub fn target_for(&self, id: EntityId) -> Option<Target> {
        if self.enemies.iter().any(|e| e.id == id) {
            return Some(Target::Enemy(id));
        }
        let boss = self.boss.as_ref()?;
        if boss.id == id {
            return Some(Target::Boss);
        }
        boss.turrets().iter().any(|t| t.id == id).then_some(Target::Turret(id))
    }

    /// Finish the match once. Later calls are ignored.
    pub fn end_match(&mut self, victory: bool) {
        if self.phase.is_over() {
            return;
        }
        let result = MatchResult {
            gold: self.gold,
            victory,
            player_hp: self.player.health.hp,
            player_max_hp: self.player.health.max_hp,
            ticks: self.time_ticks,
        };
        self.phase = if victory { MatchPhase::Victory } else { MatchPhase::Defeat };
        log::info!(
            "Match over: {} with {} gold, {:?}",
            if victory { "victory" } else { "defeat" },
            result.gold,
            result.rating()
        );
        self.notifications.push(ShellNotification::MatchEnded(result.clone()));
        self.result = Some(result);
        self.teardown();
    }

    /// Cancel everything that could still act: enemy and boss timers, the
    /// beam, projectiles and followers
    fn teardown(&mut self) {
        for enemy in &mut self.enemies {
            enemy.despawn();
        }
        self.enemies.clear();
        if let Some(boss) = self.boss.as_mut() {
            boss.dismiss();
        }
        self.player.beam = None;
        self.bullets.clear();
        self.enemy_bullets.clear();
        self.followers = Followers::default();
        self.lock_on = LockOnTable::default();
    }

    /// Drain shell notifications raised since the last call
    pub fn take_notifications(&mut self) -> Vec<ShellNotification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn rating(&self) -> Option<StarRating> {
        self.result.as_ref().map(|r| r.rating())
    }

    /// Ensure deterministic iteration order
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.bullets.sort_by_key(|b| b.id);
        self.enemy_bullets.sort_by_key(|b| b.id);
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            time_ticks: self.time_ticks,
            phase: self.phase,
            level: self.level_id.clone(),
            wave: self.director.wave_number(),
            gold: self.gold,
            player_pos: self.player.body.pos,
            player_hp: self.player.health.hp,
            player_max_hp: self.player.health.max_hp,
            ult_charge: self.player.charge(),
            ult_ready: self.player.is_ult_ready(),
            enemies: self.enemies.len(),
            player_bullets: self.bullets.len(),
            enemy_bullets: self.enemy_bullets.len(),
            boss: self.boss.as_ref().map(|b| BossSnapshot {
                kind: b.kind(),
                hp: b.health.hp,
                max_hp: b.health.max_hp,
                enraged: b.is_enraged(),
                turrets: b.turrets().iter().filter(|t| !t.is_dead()).count(),
            }),
            followers: self.followers.len(),
            locked_targets: self.lock_on.targets().count(),
        }
    }
}
