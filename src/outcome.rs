//! Match result reported to the shell
//!
//! The shell turns this into its end screen and persists whatever it wants;
//! the core only computes the rating tier.

use serde::{Deserialize, Serialize};

/// Minimum hp fraction for the top rating tier
pub const TOP_TIER_HP: f32 = 0.8;
/// Minimum hp fraction for the middle rating tier
pub const MID_TIER_HP: f32 = 0.4;

/// Performance rating derived from remaining hp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StarRating {
    None,
    One,
    Two,
    Three,
}

impl StarRating {
    pub fn stars(&self) -> u8 {
        match self {
            StarRating::None => 0,
            StarRating::One => 1,
            StarRating::Two => 2,
            StarRating::Three => 3,
        }
    }
}

/// Final state of a match, sent once when it ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Gold earned during this match
    pub gold: u64,
    pub victory: bool,
    pub player_hp: f32,
    pub player_max_hp: f32,
    /// Simulation ticks elapsed
    pub ticks: u64,
}

impl MatchResult {
    /// Remaining hp as a fraction of max (0-1)
    pub fn hp_fraction(&self) -> f32 {
        if self.player_max_hp <= 0.0 {
            return 0.0;
        }
        (self.player_hp / self.player_max_hp).clamp(0.0, 1.0)
    }

    /// Star tier: ≥80% hp → three, ≥40% → two, otherwise one. Defeats earn none.
    pub fn rating(&self) -> StarRating {
        if !self.victory {
            return StarRating::None;
        }
        let fraction = self.hp_fraction();
        if fraction >= TOP_TIER_HP {
            StarRating::Three
        } else if fraction >= MID_TIER_HP {
            StarRating::Two
        } else {
            StarRating::One
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(hp: f32, victory: bool) -> MatchResult {
        MatchResult {
            gold: 120,
            victory,
            player_hp: hp,
            player_max_hp: 100.0,
            ticks: 600,
        }
    }

    #[test]
    fn test_rating_tiers() {
        assert_eq!(result(100.0, true).rating(), StarRating::Three);
        assert_eq!(result(80.0, true).rating(), StarRating::Three);
        assert_eq!(result(79.0, true).rating(), StarRating::Two);
        assert_eq!(result(40.0, true).rating(), StarRating::Two);
        assert_eq!(result(39.9, true).rating(), StarRating::One);
        assert_eq!(result(1.0, true).rating(), StarRating::One);
    }

    #[test]
    fn test_defeat_has_no_stars() {
        assert_eq!(result(0.0, false).rating(), StarRating::None);
        assert_eq!(result(0.0, false).rating().stars(), 0);
    }

    #[test]
    fn test_zero_max_hp_is_safe() {
        let mut r = result(10.0, true);
        r.player_max_hp = 0.0;
        assert_eq!(r.hp_fraction(), 0.0);
        assert_eq!(r.rating(), StarRating::One);
    }
}
