//! Per-tick followers
//!
//! Health bars, lock-on markers and the beam visual track a subject entity.
//! Each tick they are synced against the live world; a follower whose subject
//! is gone (or whose condition no longer holds) is dropped on that same sync.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowKind {
    HealthBar,
    LockOn,
    Beam,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follower {
    pub subject: EntityId,
    pub kind: FollowKind,
    pub offset: Vec2,
    pub pos: Vec2,
    /// Kind-specific reading: health fraction for bars, missile count for lock-ons
    pub value: f32,
}

/// What the world reports about a follower's subject this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub pos: Vec2,
    pub value: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Followers {
    list: Vec<Follower>,
}

impl Followers {
    /// Attach a follower unless one of the same kind already tracks `subject`
    pub fn attach(&mut self, subject: EntityId, kind: FollowKind, offset: Vec2) {
        if self.has(subject, kind) {
            return;
        }
        self.list.push(Follower {
            subject,
            kind,
            offset,
            pos: Vec2::ZERO,
            value: 0.0,
        });
    }

    pub fn has(&self, subject: EntityId, kind: FollowKind) -> bool {
        self.list.iter().any(|f| f.subject == subject && f.kind == kind)
    }

    /// Move every follower onto its subject. Followers whose lookup returns
    /// `None` are removed. Returns how many were removed.
    pub fn sync(
        &mut self,
        mut lookup: impl FnMut(EntityId, FollowKind) -> Option<Anchor>,
    ) -> usize {
        let before = self.list.len();
        self.list.retain_mut(|f| match lookup(f.subject, f.kind) {
            Some(anchor) => {
                f.pos = anchor.pos + f.offset;
                f.value = anchor.value;
                true
            }
            None => false,
        });
        before - self.list.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Follower> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}
