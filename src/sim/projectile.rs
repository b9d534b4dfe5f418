//! Bullets and missiles

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, EntityId};
use crate::consts::*;
use crate::{in_arena, turn_toward};

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy(EntityId),
    Boss,
    Turret(EntityId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Straight-flying round
    Bullet,
    /// Player homing missile; explodes on impact
    Missile {
        target: Option<EntityId>,
        /// Max heading change in radians per second
        turn_rate: f32,
    },
    /// Enemy missile that tracks the player until its fuel runs out
    Seeker { turn_rate: f32, fuel_ticks: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub body: Body,
    pub damage: f32,
    pub owner: Owner,
    pub kind: ProjectileKind,
    pub alive: bool,
}

impl Projectile {
    /// A straight bullet. The id is assigned when the state takes ownership.
    pub fn bullet(pos: Vec2, vel: Vec2, radius: f32, damage: f32, owner: Owner) -> Self {
        let mut body = Body::new(pos, radius);
        body.vel = vel;
        Self {
            id: 0,
            body,
            damage,
            owner,
            kind: ProjectileKind::Bullet,
            alive: true,
        }
    }

    pub fn missile(
        pos: Vec2,
        vel: Vec2,
        damage: f32,
        turn_rate: f32,
        target: Option<EntityId>,
    ) -> Self {
        let mut p = Self::bullet(pos, vel, MISSILE_RADIUS, damage, Owner::Player);
        p.kind = ProjectileKind::Missile { target, turn_rate };
        p
    }

    pub fn seeker(
        pos: Vec2,
        vel: Vec2,
        damage: f32,
        turn_rate: f32,
        fuel_ticks: u32,
        owner: Owner,
    ) -> Self {
        let mut p = Self::bullet(pos, vel, MISSILE_RADIUS, damage, owner);
        p.kind = ProjectileKind::Seeker { turn_rate, fuel_ticks };
        p
    }

    pub fn is_missile(&self) -> bool {
        matches!(self.kind, ProjectileKind::Missile { .. })
    }

    /// Current lock for a player missile
    pub fn target(&self) -> Option<EntityId> {
        match self.kind {
            ProjectileKind::Missile { target, .. } => target,
            _ => None,
        }
    }

    pub fn set_target(&mut self, new_target: Option<EntityId>) {
        if let ProjectileKind::Missile { ref mut target, .. } = self.kind {
            *target = new_target;
        }
    }

    /// Mark spent. Returns false if it was already spent this tick.
    pub fn consume(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.body.enabled = false;
        true
    }

    pub fn out_of_bounds(&self) -> bool {
        !in_arena(self.body.pos, OUT_OF_BOUNDS_MARGIN)
    }

    /// Rotate velocity toward `aim` by at most `max_turn` radians, keeping speed
    pub fn steer_toward(&mut self, aim: Vec2, max_turn: f32) {
        let speed = self.body.vel.length();
        if speed <= f32::EPSILON {
            return;
        }
        let to_aim = aim - self.body.pos;
        if to_aim.length_squared() <= f32::EPSILON {
            return;
        }
        let heading = self.body.vel.y.atan2(self.body.vel.x);
        let desired = to_aim.y.atan2(to_aim.x);
        let new_heading = turn_toward(heading, desired, max_turn);
        self.body.vel = crate::direction(new_heading) * speed;
    }

    /// Enemy seekers home on `player_pos` while fuelled
    pub fn update_seeker(&mut self, player_pos: Vec2, dt: f32) {
        if let ProjectileKind::Seeker {
            turn_rate,
            ref mut fuel_ticks,
        } = self.kind
        {
            if *fuel_ticks > 0 {
                *fuel_ticks -= 1;
                self.steer_toward(player_pos, turn_rate * dt);
            }
        }
    }

    /// Move and expire when leaving the arena
    pub fn advance(&mut self, dt: f32) {
        if !self.alive {
            return;
        }
        self.body.integrate(dt);
        if self.out_of_bounds() {
            self.consume();
        }
    }
}

/// Nearest candidate to `from` that is inside the arena
pub fn nearest_in_bounds(from: Vec2, candidates: &[(EntityId, Vec2)]) -> Option<EntityId> {
    candidates
        .iter()
        .filter(|(_, pos)| in_arena(*pos, 0.0))
        .min_by(|a, b| {
            a.1.distance_squared(from)
                .partial_cmp(&b.1.distance_squared(from))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(id, _)| *id)
}
