//! Shared entity contract
//!
//! Anything that can take damage and die: the player craft, enemies, turrets
//! and bosses. Variants are plain structs that implement [`Combatant`]; the
//! damage and death bookkeeping lives in [`Health`] so every variant gets the
//! same once-only death transition.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Per-match unique id, allocated monotonically
pub type EntityId = u32;

/// Hands out entity ids in spawn order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: EntityId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Position, velocity and circular collision shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Disabled bodies take no part in overlap tests
    pub enabled: bool,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            enabled: true,
        }
    }

    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    /// Circle-circle overlap; false if either body is disabled
    pub fn overlaps(&self, other: &Body) -> bool {
        self.enabled && other.enabled && self.overlaps_circle(other.pos, other.radius)
    }

    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        let reach = self.radius + radius;
        self.pos.distance_squared(center) < reach * reach
    }
}

/// Result of one damage application
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    /// Hp actually removed
    pub applied: f32,
    /// True only on the application that crossed hp to zero
    pub killed: bool,
    /// True only on the application that tripped a boss rage threshold
    pub enraged: bool,
}

/// Hit points with a latched death flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub hp: f32,
    pub max_hp: f32,
    dead: bool,
}

impl Health {
    pub fn new(max_hp: f32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            dead: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn fraction(&self) -> f32 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        (self.hp / self.max_hp).clamp(0.0, 1.0)
    }

    /// Remove hp. Returns `None` once dead, so repeated hits are no-ops.
    pub fn apply(&mut self, amount: f32) -> Option<DamageOutcome> {
        if self.dead {
            return None;
        }
        let applied = amount.max(0.0).min(self.hp);
        self.hp -= applied;
        let killed = self.hp <= 0.0;
        if killed {
            self.hp = 0.0;
            self.dead = true;
        }
        Some(DamageOutcome {
            applied,
            killed,
            enraged: false,
        })
    }

    /// Mark dead without going through damage (teardown by an owner)
    pub fn kill(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.hp = 0.0;
        true
    }

    /// Raise max hp, scaling current hp by the same factor
    pub fn scale_max(&mut self, factor: f32) {
        if self.dead {
            return;
        }
        self.max_hp *= factor;
        self.hp *= factor;
    }
}

/// Capability set shared by every damageable entity
pub trait Combatant {
    fn id(&self) -> EntityId;
    fn body(&self) -> &Body;
    fn health(&self) -> &Health;
    fn health_mut(&mut self) -> &mut Health;

    /// Teardown run exactly once, on the damage application that kills.
    /// Must cancel every timer the entity owns and disable its body.
    fn die(&mut self);

    fn is_dead(&self) -> bool {
        self.health().is_dead()
    }

    fn pos(&self) -> Vec2 {
        self.body().pos
    }

    fn take_damage(&mut self, amount: f32) -> Option<DamageOutcome> {
        let outcome = self.health_mut().apply(amount)?;
        if outcome.killed {
            self.die();
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_death_latches() {
        let mut h = Health::new(30.0);
        let first = h.apply(20.0).expect("alive");
        assert!(!first.killed);
        let second = h.apply(50.0).expect("alive");
        assert!(second.killed);
        assert_eq!(second.applied, 10.0);
        assert!(h.apply(5.0).is_none());
        assert_eq!(h.hp, 0.0);
    }

    #[test]
    fn test_negative_damage_ignored() {
        let mut h = Health::new(10.0);
        let o = h.apply(-5.0).expect("alive");
        assert_eq!(o.applied, 0.0);
        assert_eq!(h.hp, 10.0);
    }

    #[test]
    fn test_disabled_body_never_overlaps() {
        let a = Body::new(Vec2::ZERO, 10.0);
        let mut b = Body::new(Vec2::new(5.0, 0.0), 10.0);
        assert!(a.overlaps(&b));
        b.enabled = false;
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_scale_max_keeps_fraction() {
        let mut h = Health::new(100.0);
        h.apply(50.0);
        h.scale_max(1.5);
        assert_eq!(h.max_hp, 150.0);
        assert_eq!(h.hp, 75.0);
    }
}
