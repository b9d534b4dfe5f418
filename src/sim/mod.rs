//! Deterministic simulation module
//!
//! All combat logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod ability;
pub mod boss;
pub mod collision;
pub mod director;
pub mod enemy;
pub mod entity;
pub mod events;
pub mod follow;
pub mod player;
pub mod projectile;
pub mod state;
pub mod tick;
pub mod timer;

pub use ability::{BeamState, LockOnTable};
pub use boss::{Boss, BossPhase, Turret};
pub use collision::{CollisionLayer, Overlap, Relation};
pub use director::{SpawnOrder, WaveDirector};
pub use enemy::Enemy;
pub use entity::{Body, Combatant, DamageOutcome, EntityId, Health};
pub use events::{FrameEvent, ShellNotification};
pub use follow::{FollowKind, Followers};
pub use player::{PLAYER_ID, Player};
pub use projectile::{Owner, Projectile, ProjectileKind};
pub use state::{DamageSource, MatchPhase, MatchSetup, MatchSnapshot, MatchState, Target};
pub use tick::{TickInput, autopilot, tick};
pub use timer::Timer;
