//! Events raised during a tick
//!
//! `FrameEvent`s describe what happened this frame for whoever renders or
//! plays sounds; they are cleared at the start of every tick. The two
//! `ShellNotification`s are the only things the shell is expected to react to.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use crate::outcome::MatchResult;
use crate::tuning::{BossKind, EnemyKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameEvent {
    WaveStarted { wave: u32 },
    PhaseStarted { wave: u32, phase: String },
    BossStageStarted,
    EnemySpawned { id: EntityId, kind: EnemyKind },
    EnemyKilled { id: EntityId, kind: EnemyKind, pos: Vec2 },
    /// Floating "+gold" text at the kill position
    RewardPopup { pos: Vec2, amount: u32 },
    /// Floating damage number over the boss
    DamageNumber { pos: Vec2, amount: f32 },
    CameraShake { intensity: f32 },
    /// Body-contact flash on the player
    ImpactFlash { pos: Vec2 },
    Explosion { pos: Vec2, radius: f32 },
    BossSpawned { kind: BossKind },
    BossEnraged { kind: BossKind },
    BossDefeated { kind: BossKind },
    TurretDeployed { id: EntityId },
    TurretDestroyed { id: EntityId, pos: Vec2 },
    TurretsUpgraded,
    /// Telegraph for a charge-up attack (beam, dash)
    BossTelegraph { pos: Vec2 },
    UltimateReady,
    UltimateFired,
    BeamStarted,
    BeamEnded,
}

/// Outbound messages for the shell, each sent exactly once per occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShellNotification {
    PlayerHpChanged { hp: f32 },
    MatchEnded(MatchResult),
}
