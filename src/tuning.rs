//! Data-driven game balance
//!
//! Everything the simulation reads but never writes: craft stats, enemy and boss
//! base stats, turret stats, wave scripts and combat constants. The shell owns
//! these tables; the core only looks things up, falling back to defaults when an
//! identifier is unknown.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_BODY_RADIUS;

/// Errors raised while loading a config table from JSON
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config defines no crafts")]
    NoCrafts,
    #[error("config defines no levels")]
    NoLevels,
    #[error("level `{0}` has no waves, or a wave with no phases")]
    EmptyLevel(String),
    #[error("phase `{phase}` in level `{level}` has a zero duration or spawn interval")]
    InvalidPhase { level: String, phase: String },
    #[error("{what} radius {radius} must be positive and at most {max}", max = MAX_BODY_RADIUS)]
    InvalidRadius { what: String, radius: f32 },
}

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    /// Falls straight down
    #[default]
    Drone,
    /// Falls while bouncing between the side walls
    Bouncer,
    /// Heavy stationary gunship
    Gunship,
    /// Wobbles down, then dashes at the player
    Kamikaze,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [
        EnemyKind::Drone,
        EnemyKind::Bouncer,
        EnemyKind::Gunship,
        EnemyKind::Kamikaze,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Drone => "drone",
            EnemyKind::Bouncer => "bouncer",
            EnemyKind::Gunship => "gunship",
            EnemyKind::Kamikaze => "kamikaze",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "drone" | "straight" => Some(EnemyKind::Drone),
            "bouncer" | "bounce" => Some(EnemyKind::Bouncer),
            "gunship" | "heavy" => Some(EnemyKind::Gunship),
            "kamikaze" | "dasher" => Some(EnemyKind::Kamikaze),
            _ => None,
        }
    }

    /// Resolve a wave-table tag, falling back to the default variant
    pub fn from_tag_or_default(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_else(|| {
            log::warn!("Unknown enemy tag `{}`, falling back to {:?}", tag, Self::default());
            Self::default()
        })
    }
}

/// Boss variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BossKind {
    /// Radial novas plus dash-then-snipe combos
    #[default]
    Sentinel,
    /// Charge beam, turret pair and inferno cycle
    Overlord,
    /// Rotating emitter ring with depth-faked burst fire
    Prism,
}

impl BossKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BossKind::Sentinel => "sentinel",
            BossKind::Overlord => "overlord",
            BossKind::Prism => "prism",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "sentinel" => Some(BossKind::Sentinel),
            "overlord" => Some(BossKind::Overlord),
            "prism" => Some(BossKind::Prism),
            _ => None,
        }
    }

    pub fn from_tag_or_default(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_else(|| {
            log::warn!("Unknown boss tag `{}`, falling back to {:?}", tag, Self::default());
            Self::default()
        })
    }
}

/// How a phase places its primary spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpawnPattern {
    #[default]
    Solo,
    Swarm,
    Paired,
}

/// Per-variant enemy stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyStats {
    pub hp: f32,
    /// Gold credited on kill
    pub reward: u32,
    /// Vertical fall speed (px/s)
    pub speed: f32,
    pub radius: f32,
    /// Damage dealt to the player on body contact
    pub contact_damage: f32,
}

/// Enemy stats keyed by variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyTable {
    pub drone: EnemyStats,
    pub bouncer: EnemyStats,
    pub gunship: EnemyStats,
    pub kamikaze: EnemyStats,
}

impl EnemyTable {
    pub fn get(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Drone => &self.drone,
            EnemyKind::Bouncer => &self.bouncer,
            EnemyKind::Gunship => &self.gunship,
            EnemyKind::Kamikaze => &self.kamikaze,
        }
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            drone: EnemyStats {
                hp: 20.0,
                reward: 10,
                speed: 140.0,
                radius: 18.0,
                contact_damage: 15.0,
            },
            bouncer: EnemyStats {
                hp: 30.0,
                reward: 15,
                speed: 110.0,
                radius: 20.0,
                contact_damage: 15.0,
            },
            gunship: EnemyStats {
                hp: 160.0,
                reward: 60,
                speed: 40.0,
                radius: 36.0,
                contact_damage: 25.0,
            },
            kamikaze: EnemyStats {
                hp: 15.0,
                reward: 20,
                speed: 120.0,
                radius: 16.0,
                contact_damage: 30.0,
            },
        }
    }
}

/// Per-boss stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossStats {
    pub hp: f32,
    pub reward: u32,
    pub radius: f32,
    /// Fraction of max hp at or below which the boss enrages (0-1)
    pub rage_threshold: f32,
}

/// Boss stats keyed by variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossTable {
    pub sentinel: BossStats,
    pub overlord: BossStats,
    pub prism: BossStats,
}

impl BossTable {
    pub fn get(&self, kind: BossKind) -> &BossStats {
        match kind {
            BossKind::Sentinel => &self.sentinel,
            BossKind::Overlord => &self.overlord,
            BossKind::Prism => &self.prism,
        }
    }
}

impl Default for BossTable {
    fn default() -> Self {
        Self {
            sentinel: BossStats {
                hp: 1500.0,
                reward: 500,
                radius: 70.0,
                rage_threshold: 0.5,
            },
            overlord: BossStats {
                hp: 2000.0,
                reward: 800,
                radius: 80.0,
                rage_threshold: 0.4,
            },
            prism: BossStats {
                hp: 2500.0,
                reward: 1000,
                radius: 75.0,
                rage_threshold: 0.5,
            },
        }
    }
}

/// Base stats for boss-deployed turrets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurretStats {
    pub hp: f32,
    pub radius: f32,
    /// Delay between shots once deployed
    pub fire_delay_ms: u32,
    /// Wander speed (px/s)
    pub move_speed: f32,
    pub bullet_damage: f32,
    pub reward: u32,
}

impl Default for TurretStats {
    fn default() -> Self {
        Self {
            hp: 120.0,
            radius: 24.0,
            fire_delay_ms: 1400,
            move_speed: 90.0,
            bullet_damage: 8.0,
            reward: 40,
        }
    }
}

/// Autofire layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotPattern {
    /// Bullets per volley
    pub count: u32,
    /// Total fan angle in degrees (0 = parallel lanes)
    #[serde(default)]
    pub spread_deg: f32,
    /// Horizontal lane spacing for parallel volleys
    #[serde(default = "default_lane_spacing")]
    pub lane_spacing: f32,
}

fn default_lane_spacing() -> f32 {
    14.0
}

/// Ultimate ability selected by the craft
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UltimateSpec {
    /// A wave of homing missiles that explode on impact
    MissileSwarm {
        missiles: u32,
        damage: f32,
        speed: f32,
        /// Max heading change in radians per second
        turn_rate: f32,
    },
    /// A sustained forward beam
    Beam {
        duration_ms: u32,
        width: f32,
        damage: f32,
        interval_ms: u32,
    },
}

/// Per-craft stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftStats {
    pub id: String,
    pub hp: f32,
    /// Movement speed (px/s)
    pub speed: f32,
    /// Delay between autofire volleys
    pub fire_rate_ms: u32,
    pub bullet_speed: f32,
    /// Visual scale of bullets; also scales their hit radius
    pub bullet_scale: f32,
    pub bullet_damage: f32,
    pub shot: ShotPattern,
    pub ultimate: UltimateSpec,
}

impl Default for CraftStats {
    fn default() -> Self {
        Self {
            id: "falcon".to_string(),
            hp: 100.0,
            speed: 380.0,
            fire_rate_ms: 180,
            bullet_speed: 900.0,
            bullet_scale: 1.0,
            bullet_damage: 10.0,
            shot: ShotPattern {
                count: 1,
                spread_deg: 0.0,
                lane_spacing: default_lane_spacing(),
            },
            ultimate: UltimateSpec::MissileSwarm {
                missiles: 12,
                damage: 40.0,
                speed: 520.0,
                turn_rate: 6.0,
            },
        }
    }
}

/// One timed segment of a wave with a single spawn rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WavePhase {
    pub name: String,
    pub duration_ms: u32,
    pub spawn_interval_ms: u32,
    /// Primary enemy tag
    pub enemy: String,
    /// Optional staggered "disturbance" enemy tag
    #[serde(default)]
    pub support: Option<String>,
    #[serde(default)]
    pub pattern: SpawnPattern,
}

impl WavePhase {
    pub fn new(name: &str, duration_ms: u32, spawn_interval_ms: u32, enemy: &str) -> Self {
        Self {
            name: name.to_string(),
            duration_ms,
            spawn_interval_ms,
            enemy: enemy.to_string(),
            support: None,
            pattern: SpawnPattern::Solo,
        }
    }

    pub fn with_support(mut self, support: &str) -> Self {
        self.support = Some(support.to_string());
        self
    }

    pub fn with_pattern(mut self, pattern: SpawnPattern) -> Self {
        self.pattern = pattern;
        self
    }
}

/// An ordered list of phases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveScript {
    pub number: u32,
    pub phases: Vec<WavePhase>,
}

/// A level: its waves, then its boss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelScript {
    pub id: String,
    pub waves: Vec<WaveScript>,
    pub boss: String,
}

impl Default for LevelScript {
    fn default() -> Self {
        builtin_levels().remove(0)
    }
}

/// Combat constants shared by the collision layer and abilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatTuning {
    /// Ultimate charge gained per player bullet hit
    pub charge_per_hit: f32,
    /// Area damage radius of homing missiles
    pub missile_blast_radius: f32,
    /// Camera shake for a kamikaze body hit
    pub kamikaze_shake: f32,
    /// Camera shake for any other body hit
    pub contact_shake: f32,
    /// Camera shake for a bullet hitting the boss
    pub boss_hit_shake: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            charge_per_hit: 2.0,
            missile_blast_radius: 70.0,
            kamikaze_shake: 0.6,
            contact_shake: 0.3,
            boss_hit_shake: 0.05,
        }
    }
}

/// Every table the core consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub crafts: Vec<CraftStats>,
    pub enemies: EnemyTable,
    pub bosses: BossTable,
    pub turret: TurretStats,
    pub levels: Vec<LevelScript>,
    pub combat: CombatTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            crafts: builtin_crafts(),
            enemies: EnemyTable::default(),
            bosses: BossTable::default(),
            turret: TurretStats::default(),
            levels: builtin_levels(),
            combat: CombatTuning::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::info!(
            "Loaded config: {} crafts, {} levels",
            config.crafts.len(),
            config.levels.len()
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the structural rules the director and factory rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crafts.is_empty() {
            return Err(ConfigError::NoCrafts);
        }
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        for level in &self.levels {
            if level.waves.is_empty() || level.waves.iter().any(|w| w.phases.is_empty()) {
                return Err(ConfigError::EmptyLevel(level.id.clone()));
            }
            for phase in level.waves.iter().flat_map(|w| w.phases.iter()) {
                if phase.duration_ms == 0 || phase.spawn_interval_ms == 0 {
                    return Err(ConfigError::InvalidPhase {
                        level: level.id.clone(),
                        phase: phase.name.clone(),
                    });
                }
            }
        }

        let bodies = [
            (EnemyKind::Drone.as_str(), self.enemies.drone.radius),
            (EnemyKind::Bouncer.as_str(), self.enemies.bouncer.radius),
            (EnemyKind::Gunship.as_str(), self.enemies.gunship.radius),
            (EnemyKind::Kamikaze.as_str(), self.enemies.kamikaze.radius),
            (BossKind::Sentinel.as_str(), self.bosses.sentinel.radius),
            (BossKind::Overlord.as_str(), self.bosses.overlord.radius),
            (BossKind::Prism.as_str(), self.bosses.prism.radius),
            ("turret", self.turret.radius),
        ];
        for (what, radius) in bodies {
            // Written to reject NaN as well
            if !(radius > 0.0 && radius <= MAX_BODY_RADIUS) {
                return Err(ConfigError::InvalidRadius {
                    what: what.to_string(),
                    radius,
                });
            }
        }
        Ok(())
    }

    /// Craft by id; unknown or missing ids fall back to the first craft
    pub fn craft(&self, id: Option<&str>) -> CraftStats {
        if let Some(id) = id {
            if let Some(craft) = self.crafts.iter().find(|c| c.id == id) {
                return craft.clone();
            }
            log::warn!("Unknown craft `{}`, using default craft", id);
        }
        self.crafts.first().cloned().unwrap_or_default()
    }

    /// Level by id; unknown or missing ids fall back to the first level
    pub fn level(&self, id: Option<&str>) -> LevelScript {
        if let Some(id) = id {
            if let Some(level) = self.levels.iter().find(|l| l.id == id) {
                return level.clone();
            }
            log::warn!("Unknown level `{}`, using first wave set", id);
        }
        self.levels.first().cloned().unwrap_or_default()
    }
}

fn builtin_crafts() -> Vec<CraftStats> {
    vec![
        CraftStats::default(),
        CraftStats {
            id: "hornet".to_string(),
            hp: 80.0,
            speed: 420.0,
            fire_rate_ms: 220,
            bullet_speed: 820.0,
            bullet_scale: 0.8,
            bullet_damage: 8.0,
            shot: ShotPattern {
                count: 3,
                spread_deg: 24.0,
                lane_spacing: default_lane_spacing(),
            },
            ultimate: UltimateSpec::MissileSwarm {
                missiles: 8,
                damage: 50.0,
                speed: 560.0,
                turn_rate: 7.0,
            },
        },
        CraftStats {
            id: "lancer".to_string(),
            hp: 120.0,
            speed: 340.0,
            fire_rate_ms: 260,
            bullet_speed: 980.0,
            bullet_scale: 1.4,
            bullet_damage: 9.0,
            shot: ShotPattern {
                count: 2,
                spread_deg: 0.0,
                lane_spacing: 18.0,
            },
            ultimate: UltimateSpec::Beam {
                duration_ms: 3000,
                width: 90.0,
                damage: 12.0,
                interval_ms: 100,
            },
        },
    ]
}

fn builtin_levels() -> Vec<LevelScript> {
    vec![
        LevelScript {
            id: "sector-1".to_string(),
            waves: vec![
                WaveScript {
                    number: 1,
                    phases: vec![
                        WavePhase::new("opening", 12_000, 1500, "drone"),
                        WavePhase::new("crossfire", 12_000, 1800, "bouncer").with_support("drone"),
                        WavePhase::new("swarm", 10_000, 3000, "drone")
                            .with_pattern(SpawnPattern::Swarm),
                    ],
                },
                WaveScript {
                    number: 2,
                    phases: vec![
                        WavePhase::new("heavy-arrival", 14_000, 7000, "gunship")
                            .with_support("kamikaze"),
                        WavePhase::new("dive", 10_000, 1200, "kamikaze")
                            .with_pattern(SpawnPattern::Paired),
                    ],
                },
            ],
            boss: BossKind::Sentinel.as_str().to_string(),
        },
        LevelScript {
            id: "sector-2".to_string(),
            waves: vec![
                WaveScript {
                    number: 1,
                    phases: vec![
                        WavePhase::new("screen", 10_000, 1200, "bouncer").with_support("kamikaze"),
                        WavePhase::new("wedge", 12_000, 2500, "drone")
                            .with_pattern(SpawnPattern::Swarm),
                    ],
                },
                WaveScript {
                    number: 2,
                    phases: vec![
                        WavePhase::new("gun-line", 16_000, 6000, "gunship").with_support("drone"),
                        WavePhase::new("rush", 10_000, 1000, "kamikaze")
                            .with_pattern(SpawnPattern::Paired),
                    ],
                },
            ],
            boss: BossKind::Overlord.as_str().to_string(),
        },
        LevelScript {
            id: "sector-3".to_string(),
            waves: vec![
                WaveScript {
                    number: 1,
                    phases: vec![
                        WavePhase::new("storm", 12_000, 2000, "drone")
                            .with_pattern(SpawnPattern::Swarm)
                            .with_support("bouncer"),
                        WavePhase::new("siege", 16_000, 5000, "gunship").with_support("kamikaze"),
                    ],
                },
                WaveScript {
                    number: 2,
                    phases: vec![
                        WavePhase::new("gauntlet", 12_000, 900, "kamikaze")
                            .with_pattern(SpawnPattern::Paired)
                            .with_support("bouncer"),
                        WavePhase::new("wall", 14_000, 4500, "gunship"),
                    ],
                },
            ],
            boss: BossKind::Prism.as_str().to_string(),
        },
    ]
}
