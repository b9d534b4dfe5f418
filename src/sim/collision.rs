//! Collision detection and resolution
//!
//! Detection walks every registered relation and records overlaps in a
//! stable order; resolution then applies them one by one through the shared
//! damage paths on `MatchState`. An overlap whose entity died or whose bullet
//! was spent earlier in the same pass resolves to nothing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ability::resolve_missile;
use super::entity::{Combatant, EntityId};
use super::events::FrameEvent;
use super::state::{DamageSource, MatchState, Target};
use crate::tuning::EnemyKind;

/// Pairs of entity groups that can collide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// Player bullets and missiles against enemies
    BulletEnemy,
    /// Player body against enemy bodies
    PlayerEnemy,
    /// Player body against hostile projectiles
    PlayerEnemyBullet,
    /// Player bullets and missiles against the boss and its turrets
    BulletBoss,
}

/// Registered relations for the current match
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollisionLayer {
    relations: Vec<Relation>,
}

impl CollisionLayer {
    /// Register a relation. Returns false if it was already registered.
    pub fn register(&mut self, relation: Relation) -> bool {
        if self.is_registered(relation) {
            return false;
        }
        self.relations.push(relation);
        true
    }

    pub fn is_registered(&self, relation: Relation) -> bool {
        self.relations.contains(&relation)
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }
}

/// One overlap found during detection. Projectiles are referenced by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    BulletEnemy { bullet: EntityId, enemy: EntityId },
    PlayerEnemy { enemy: EntityId },
    PlayerEnemyBullet { bullet: EntityId },
    BulletBoss { bullet: EntityId, target: Target },
}

/// Find every overlap for the registered relations
pub fn detect(state: &MatchState) -> Vec<Overlap> {
    let mut found = Vec::new();
    let layer = &state.collisions;
    let player = &state.player.body;

    if layer.is_registered(Relation::BulletEnemy) {
        for bullet in state.bullets.iter().filter(|b| b.alive) {
            for enemy in &state.enemies {
                if bullet.body.overlaps(&enemy.body) {
                    found.push(Overlap::BulletEnemy {
                        bullet: bullet.id,
                        enemy: enemy.id,
                    });
                }
            }
        }
    }

    if layer.is_registered(Relation::BulletBoss) {
        if let Some(boss) = &state.boss {
            for bullet in state.bullets.iter().filter(|b| b.alive) {
                for turret in boss.turrets() {
                    if bullet.body.overlaps(&turret.body) {
                        found.push(Overlap::BulletBoss {
                            bullet: bullet.id,
                            target: Target::Turret(turret.id),
                        });
                    }
                }
                if bullet.body.overlaps(boss.body()) {
                    found.push(Overlap::BulletBoss {
                        bullet: bullet.id,
                        target: Target::Boss,
                    });
                }
            }
        }
    }

    if layer.is_registered(Relation::PlayerEnemy) {
        for enemy in &state.enemies {
            if player.overlaps(&enemy.body) {
                found.push(Overlap::PlayerEnemy { enemy: enemy.id });
            }
        }
    }

    if layer.is_registered(Relation::PlayerEnemyBullet) {
        for bullet in state.enemy_bullets.iter().filter(|b| b.alive) {
            if player.overlaps(&bullet.body) {
                found.push(Overlap::PlayerEnemyBullet { bullet: bullet.id });
            }
        }
    }

    found
}

/// Apply overlaps in order
pub fn resolve(state: &mut MatchState, overlaps: &[Overlap]) {
    for overlap in overlaps {
        match *overlap {
            Overlap::BulletEnemy { bullet, enemy } => {
                if !hostile_alive(state, Target::Enemy(enemy)) {
                    continue;
                }
                player_projectile_hit(state, bullet, Target::Enemy(enemy));
            }
            Overlap::BulletBoss { bullet, target } => {
                if !hostile_alive(state, target) {
                    continue;
                }
                player_projectile_hit(state, bullet, target);
            }
            Overlap::PlayerEnemy { enemy } => enemy_contact(state, enemy),
            Overlap::PlayerEnemyBullet { bullet } => {
                if state.player.is_dead() {
                    continue;
                }
                let Some(b) = state.enemy_bullets.iter_mut().find(|b| b.id == bullet) else {
                    continue;
                };
                if !b.consume() {
                    continue;
                }
                let damage = b.damage;
                state.hurt_player(damage);
            }
        }
    }
}

fn hostile_alive(state: &MatchState, target: Target) -> bool {
    match target {
        Target::Enemy(id) => state.enemies.iter().any(|e| e.id == id && !e.is_dead()),
        Target::Boss => state.boss.as_ref().is_some_and(|b| !b.is_dead()),
        Target::Turret(id) => state
            .boss
            .as_ref()
            .is_some_and(|b| b.turrets().iter().any(|t| t.id == id && !t.is_dead())),
    }
}

/// Spend a player projectile on `target`. Missiles burst over an area;
/// bullets hit the one target.
fn player_projectile_hit(state: &mut MatchState, bullet: EntityId, target: Target) {
    let Some(b) = state.bullets.iter_mut().find(|b| b.id == bullet) else {
        return;
    };
    if !b.consume() {
        return;
    }
    let (pos, damage) = (b.body.pos, b.damage);

    if b.is_missile() {
        resolve_missile(b, &mut state.lock_on);
        missile_blast(state, pos, damage);
    } else {
        state.damage_hostile(target, damage, DamageSource::Bullet);
    }
}

/// Area damage around a missile impact
pub fn missile_blast(state: &mut MatchState, pos: Vec2, damage: f32) {
    let radius = state.combat.missile_blast_radius;
    state.events.push(FrameEvent::Explosion { pos, radius });
    let caught: Vec<EntityId> = state
        .hostile_positions()
        .into_iter()
        .filter(|(_, p)| p.distance(pos) <= radius)
        .map(|(id, _)| id)
        .collect();
    for id in caught {
        if let Some(target) = state.target_for(id) {
            state.damage_hostile(target, damage, DamageSource::Missile);
        }
    }
}

/// Body contact: the enemy is destroyed (with its reward) and the player
/// takes the variant's contact damage
fn enemy_contact(state: &mut MatchState, enemy: EntityId) {
    if state.player.is_dead() {
        return;
    }
    let Some(e) = state.enemies.iter().find(|e| e.id == enemy && !e.is_dead()) else {
        return;
    };
    let (kind, damage, pos) = (e.kind, e.contact_damage, e.body.pos);

    state.damage_hostile(Target::Enemy(enemy), f32::MAX, DamageSource::Contact);
    if kind == EnemyKind::Kamikaze {
        state.add_shake(state.combat.kamikaze_shake);
        state.events.push(FrameEvent::ImpactFlash { pos });
    } else {
        state.add_shake(state.combat.contact_shake);
    }
    state.hurt_player(damage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::projectile::{Owner, Projectile};
    use crate::sim::state::MatchSetup;
    use crate::tuning::GameConfig;

    fn state() -> MatchState {
        MatchState::start(&MatchSetup::default(), &GameConfig::default())
    }

    fn bullet_at(pos: Vec2, damage: f32) -> Projectile {
        Projectile::bullet(pos, Vec2::new(0.0, -900.0), PLAYER_BULLET_RADIUS, damage, Owner::Player)
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut layer = CollisionLayer::default();
        assert!(layer.register(Relation::BulletBoss));
        assert!(!layer.register(Relation::BulletBoss));
        assert_eq!(layer.relations().len(), 1);
    }

    #[test]
    fn test_bullet_enemy_hit() {
        let mut s = state();
        let id = s.spawn_enemy(EnemyKind::Drone, Vec2::new(300.0, 300.0));
        s.push_projectile(bullet_at(Vec2::new(300.0, 310.0), 5.0));
        let overlaps = detect(&s);
        assert_eq!(overlaps.len(), 1);
        resolve(&mut s, &overlaps);
        assert!(!s.bullets[0].alive);
        let enemy = s.enemies.iter().find(|e| e.id == id).expect("enemy");
        assert_eq!(enemy.health.hp, enemy.health.max_hp - 5.0);
        assert_eq!(s.player.charge(), s.combat.charge_per_hit);
    }

    #[test]
    fn test_second_bullet_on_dead_enemy_is_noop() {
        let mut s = state();
        s.spawn_enemy(EnemyKind::Drone, Vec2::new(300.0, 300.0));
        s.push_projectile(bullet_at(Vec2::new(300.0, 310.0), 500.0));
        s.push_projectile(bullet_at(Vec2::new(302.0, 305.0), 500.0));
        let overlaps = detect(&s);
        assert_eq!(overlaps.len(), 2);
        resolve(&mut s, &overlaps);
        assert_eq!(s.gold, s.enemy_table.drone.reward as u64);
        // The second bullet was never spent on the corpse
        assert_eq!(s.bullets.iter().filter(|b| b.alive).count(), 1);
        let kills = s.events.iter().filter(|e| matches!(e, FrameEvent::EnemyKilled { .. })).count();
        assert_eq!(kills, 1);
    }

    #[test]
    fn test_kamikaze_contact_shakes_harder() {
        let mut s = state();
        let pos = s.player.body.pos;
        s.spawn_enemy(EnemyKind::Kamikaze, pos);
        let overlaps = detect(&s);
        resolve(&mut s, &overlaps);
        assert!(s.enemies[0].is_dead());
        assert_eq!(
            s.player.health.hp,
            s.player.health.max_hp - s.enemy_table.kamikaze.contact_damage
        );
        assert!(s.events.iter().any(|e| matches!(e, FrameEvent::ImpactFlash { .. })));
        assert_eq!(s.screen_shake, s.combat.kamikaze_shake);
        assert_eq!(s.gold, s.enemy_table.kamikaze.reward as u64);
    }

    #[test]
    fn test_enemy_bullet_consumed_once() {
        let mut s = state();
        let pos = s.player.body.pos;
        let shot = Projectile::bullet(pos, Vec2::ZERO, ENEMY_BULLET_RADIUS, 7.0, Owner::Boss);
        s.push_projectile(shot);
        let overlaps = detect(&s);
        resolve(&mut s, &overlaps);
        resolve(&mut s, &overlaps);
        assert_eq!(s.player.health.hp, s.player.health.max_hp - 7.0);
    }

    #[test]
    fn test_missile_blast_hits_area() {
        let mut s = state();
        let a = s.spawn_enemy(EnemyKind::Gunship, Vec2::new(300.0, 300.0));
        let b = s.spawn_enemy(EnemyKind::Gunship, Vec2::new(340.0, 300.0));
        let far = s.spawn_enemy(EnemyKind::Gunship, Vec2::new(600.0, 300.0));
        let m = Projectile::missile(
            Vec2::new(300.0, 330.0),
            Vec2::new(0.0, -500.0),
            40.0,
            6.0,
            Some(a),
        );
        s.lock_on.acquire(a);
        s.push_projectile(m);
        let overlaps = detect(&s);
        resolve(&mut s, &overlaps);
        let hp = |id: EntityId| s.enemies.iter().find(|e| e.id == id).map(|e| e.health.hp);
        let full = s.enemy_table.gunship.hp;
        assert_eq!(hp(a), Some(full - 40.0));
        assert_eq!(hp(b), Some(full - 40.0));
        assert_eq!(hp(far), Some(full));
        assert!(!s.lock_on.is_locked(a));
        // Missiles do not feed the gauge
        assert_eq!(s.player.charge(), 0.0);
    }

    #[test]
    fn test_boss_relation_only_after_spawn() {
        let mut s = state();
        s.spawn_boss();
        let boss_pos = s.boss.as_ref().map(|b| b.pos()).expect("boss");
        s.push_projectile(bullet_at(boss_pos, 10.0));
        let overlaps = detect(&s);
        assert!(
            overlaps
                .iter()
                .any(|o| matches!(o, Overlap::BulletBoss { target: Target::Boss, .. }))
        );
        resolve(&mut s, &overlaps);
        assert!(s.events.iter().any(|e| matches!(e, FrameEvent::DamageNumber { .. })));
        assert_eq!(s.boss.as_ref().map(|b| b.health.hp), Some(s.boss_stats.hp - 10.0));
    }

    /// Boss with 1000 hp that enrages at half, hit by one volley in a single pass
    fn boss_volley(hits: &[f32]) -> (MatchState, usize) {
        let mut s = state();
        s.boss_stats.hp = 1000.0;
        s.boss_stats.rage_threshold = 0.5;
        s.spawn_boss();
        let boss_pos = s.boss.as_ref().map(|b| b.pos()).expect("boss");
        for (i, &damage) in hits.iter().enumerate() {
            s.push_projectile(bullet_at(boss_pos + Vec2::new(i as f32 * 2.0, 0.0), damage));
        }
        let overlaps = detect(&s);
        assert_eq!(overlaps.len(), hits.len());
        resolve(&mut s, &overlaps);
        let mut events = std::mem::take(&mut s.events);
        if let Some(boss) = s.boss.as_mut() {
            events.extend(boss.drain_events());
        }
        let raged = events.iter().filter(|e| matches!(e, FrameEvent::BossEnraged { .. })).count();
        (s, raged)
    }

    #[test]
    fn test_rage_once_when_volley_crosses_threshold() {
        let (s, raged) = boss_volley(&[600.0, 100.0]);
        let boss = s.boss.as_ref().expect("boss");
        assert_eq!(boss.health.hp, 300.0);
        assert!(boss.is_enraged());
        assert_eq!(boss.rage_count, 1);
        assert_eq!(raged, 1);
    }

    #[test]
    fn test_no_rage_on_killing_volley() {
        let (s, raged) = boss_volley(&[400.0, 600.0]);
        let boss = s.boss.as_ref().expect("boss");
        assert!(boss.is_dead());
        assert!(!boss.is_enraged());
        assert_eq!(boss.rage_count, 0);
        assert_eq!(raged, 0);
    }
}
