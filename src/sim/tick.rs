//! Fixed timestep simulation tick
//!
//! Core loop that advances a match deterministically. Within one tick:
//! spawning, then movement and behaviour, then collision resolution, then
//! cleanup and terminal checks.

use glam::Vec2;

use super::ability::{BeamState, launch_missile_swarm, resolve_missile, steer_missiles};
use super::boss::BossContext;
use super::collision;
use super::enemy::EnemyContext;
use super::entity::Combatant;
use super::events::FrameEvent;
use super::follow::{Anchor, FollowKind};
use super::player::PLAYER_ID;
use super::state::{DamageSource, HEALTH_BAR_OFFSET, MatchPhase, MatchState, Target};
use crate::consts::*;
use crate::tuning::UltimateSpec;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Where the craft should fly (pointer/touch position)
    pub move_to: Option<Vec2>,
    /// Fire the ultimate if the gauge is full
    pub fire_ultimate: bool,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - the craft flies itself
    pub autopilot: bool,
}

/// Advance the match by one fixed timestep
pub fn tick(state: &mut MatchState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            MatchPhase::Waves | MatchPhase::BossFight => {
                state.resume_phase = state.phase;
                state.phase = MatchPhase::Paused;
                return;
            }
            MatchPhase::Paused => state.phase = state.resume_phase,
            _ => {}
        }
    }

    // Don't tick if paused or over
    if matches!(state.phase, MatchPhase::Paused) || state.phase.is_over() {
        return;
    }

    state.events.clear();
    state.time_ticks += 1;

    // Decay screen shake
    state.screen_shake *= 0.9;
    if state.screen_shake < 0.01 {
        state.screen_shake = 0.0;
    }

    let input = if input.autopilot { autopilot(state) } else { input.clone() };

    run_director(state);
    update_player(state, &input, dt);
    update_beam(state);
    update_enemies(state, dt);
    update_boss(state, dt);
    update_projectiles(state, dt);

    let overlaps = collision::detect(state);
    collision::resolve(state, &overlaps);

    cleanup(state);
    sync_followers(state);
    check_terminal(state);

    // Ensure deterministic ordering
    state.normalize_order();
}

fn run_director(state: &mut MatchState) {
    if state.phase != MatchPhase::Waves {
        return;
    }
    let step = state.director.step(&mut state.rng);
    state.events.extend(step.events);
    for order in step.spawns {
        state.spawn_enemy(order.kind, order.pos);
    }
    if step.boss_start {
        state.spawn_boss();
    }
}

fn update_player(state: &mut MatchState, input: &TickInput, dt: f32) {
    if state.player.is_dead() {
        return;
    }
    if let Some(target) = input.move_to {
        state.player.steer(target, dt);
    }

    let mut shots = Vec::new();
    state.player.autofire(&mut shots);
    for shot in shots {
        state.push_projectile(shot);
    }

    if input.fire_ultimate && state.player.beam.is_none() && state.player.take_ultimate() {
        activate_ultimate(state);
    }
}

/// Run the equipped craft's ultimate. The gauge has already been consumed.
fn activate_ultimate(state: &mut MatchState) {
    state.events.push(FrameEvent::UltimateFired);
    match state.player.craft.ultimate.clone() {
        UltimateSpec::MissileSwarm {
            missiles,
            damage,
            speed,
            turn_rate,
        } => {
            let hostiles = state.hostile_positions();
            let origin = state.player.body.pos;
            let swarm = launch_missile_swarm(
                origin,
                missiles,
                damage,
                speed,
                turn_rate,
                &hostiles,
                &mut state.lock_on,
            );
            log::debug!("Missile swarm: {} missiles", swarm.len());
            for missile in swarm {
                state.push_projectile(missile);
            }
        }
        UltimateSpec::Beam {
            duration_ms,
            width,
            damage,
            interval_ms,
        } => {
            state.player.beam = Some(BeamState::new(duration_ms, width, damage, interval_ms));
            state.followers.attach(PLAYER_ID, FollowKind::Beam, Vec2::ZERO);
            state.events.push(FrameEvent::BeamStarted);
        }
    }
}

fn update_beam(state: &mut MatchState) {
    let origin = state.player.body.pos;
    let Some(beam) = state.player.beam.as_mut() else {
        return;
    };
    let tick = beam.tick();
    if tick.ended {
        state.player.beam = None;
        state.events.push(FrameEvent::BeamEnded);
        return;
    }
    if !tick.strike {
        return;
    }
    let column = beam.clone();

    let mut struck: Vec<Target> = state
        .enemies
        .iter()
        .filter(|e| !e.is_dead() && column.covers(origin, e.body.pos, e.body.radius))
        .map(|e| Target::Enemy(e.id))
        .collect();
    if let Some(boss) = state.boss.as_ref() {
        if !boss.is_dead() && column.covers(origin, boss.pos(), boss.body().radius) {
            struck.push(Target::Boss);
        }
        struck.extend(
            boss.turrets()
                .iter()
                .filter(|t| !t.is_dead() && column.covers(origin, t.body.pos, t.body.radius))
                .map(|t| Target::Turret(t.id)),
        );
    }
    for target in struck {
        state.damage_hostile(target, column.damage, DamageSource::Beam);
    }
}

fn update_enemies(state: &mut MatchState, dt: f32) {
    let occupancy: Vec<_> = state
        .enemies
        .iter()
        .filter(|e| !e.is_dead())
        .map(|e| (e.id, e.body.pos, e.body.radius))
        .collect();
    let ctx = EnemyContext {
        dt,
        player_pos: state.player.body.pos,
        occupancy: &occupancy,
    };
    let mut fired = Vec::new();
    for enemy in &mut state.enemies {
        enemy.update(&ctx, &mut fired);
    }
    for projectile in fired {
        state.push_projectile(projectile);
    }
}

fn update_boss(state: &mut MatchState, dt: f32) {
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    let mut fired = Vec::new();
    let mut ctx = BossContext {
        dt,
        player_pos: state.player.body.pos,
        rng: &mut state.rng,
        ids: &mut state.ids,
    };
    let beam_damage = boss.update(&mut ctx, &mut fired);
    forward_boss_events(state);
    for projectile in fired {
        state.push_projectile(projectile);
    }
    if beam_damage > 0.0 {
        state.hurt_player(beam_damage);
    }
}

fn update_projectiles(state: &mut MatchState, dt: f32) {
    let hostiles = state.hostile_positions();
    steer_missiles(&mut state.bullets, &hostiles, &mut state.lock_on, dt);
    for bullet in &mut state.bullets {
        bullet.advance(dt);
    }

    let player_pos = state.player.body.pos;
    for bullet in &mut state.enemy_bullets {
        bullet.update_seeker(player_pos, dt);
        bullet.advance(dt);
    }
}

/// Drop spent projectiles and dead or escaped enemies
fn cleanup(state: &mut MatchState) {
    for bullet in state.bullets.iter_mut().filter(|b| !b.alive) {
        resolve_missile(bullet, &mut state.lock_on);
    }
    state.bullets.retain(|b| b.alive);
    state.enemy_bullets.retain(|b| b.alive);

    for enemy in state.enemies.iter_mut().filter(|e| e.escaped()) {
        enemy.despawn();
    }
    state.enemies.retain(|e| !e.is_dead());

    forward_boss_events(state);
}

/// Move the boss's queued events onto the frame; new turrets get health bars
fn forward_boss_events(state: &mut MatchState) {
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    for event in boss.drain_events() {
        if let FrameEvent::TurretDeployed { id } = event {
            state.followers.attach(id, FollowKind::HealthBar, HEALTH_BAR_OFFSET);
        }
        state.events.push(event);
    }
}

/// Move followers onto their subjects; followers of gone subjects drop out
fn sync_followers(state: &mut MatchState) {
    for target in state.lock_on.targets().collect::<Vec<_>>() {
        state.followers.attach(target, FollowKind::LockOn, Vec2::ZERO);
    }

    let enemies = &state.enemies;
    let boss = state.boss.as_ref();
    let player = &state.player;
    let lock_on = &state.lock_on;
    state.followers.sync(|subject, kind| {
        let (pos, fraction) = if subject == PLAYER_ID {
            (!player.is_dead()).then_some((player.body.pos, player.health.fraction()))?
        } else if let Some(e) = enemies.iter().find(|e| e.id == subject) {
            (!e.is_dead()).then_some((e.body.pos, e.health.fraction()))?
        } else {
            let boss = boss?;
            if boss.id == subject {
                (!boss.is_dead()).then_some((boss.pos(), boss.health.fraction()))?
            } else {
                let t = boss.turrets().iter().find(|t| t.id == subject && !t.is_dead())?;
                (t.body.pos, t.health.fraction())
            }
        };
        match kind {
            FollowKind::HealthBar => Some(Anchor { pos, value: fraction }),
            FollowKind::LockOn => lock_on.is_locked(subject).then_some(Anchor {
                pos,
                value: lock_on.count(subject) as f32,
            }),
            FollowKind::Beam => player.beam.as_ref().map(|_| Anchor { pos, value: 1.0 }),
        }
    });
}

fn check_terminal(state: &mut MatchState) {
    if state.player.is_dead() {
        state.end_match(false);
        return;
    }
    if state.boss.as_ref().is_some_and(|b| b.is_defeated()) {
        state.boss = None;
        state.end_match(true);
    }
}

/// Simple AI for demo mode: shadow the nearest hostile from below, keep
/// clear of anything about to ram the craft, fire the ultimate when ready
pub fn autopilot(state: &MatchState) -> TickInput {
    let me = state.player.body.pos;
    let cruise_y = PLAYER_START_Y;
    let target_x = state
        .hostile_positions()
        .into_iter()
        .filter(|(_, p)| crate::in_arena(*p, 0.0))
        .min_by(|a, b| {
            a.1.distance_squared(me)
                .partial_cmp(&b.1.distance_squared(me))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(_, p)| p.x)
        .unwrap_or(ARENA_WIDTH / 2.0);

    let mut goal = Vec2::new(target_x, cruise_y);
    let threat = state
        .enemy_bullets
        .iter()
        .map(|b| b.body.pos)
        .chain(state.enemies.iter().map(|e| e.body.pos))
        .filter(|p| p.y > me.y - 220.0 && p.y < me.y + 20.0 && (p.x - me.x).abs() < 60.0)
        .min_by(|a, b| {
            a.distance_squared(me)
                .partial_cmp(&b.distance_squared(me))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    if let Some(p) = threat {
        let away = if p.x <= me.x { 1.0 } else { -1.0 };
        goal.x = me.x + away * 140.0;
    }

    TickInput {
        move_to: Some(goal),
        fire_ultimate: state.player.is_ult_ready(),
        pause: false,
        autopilot: false,
    }
}
