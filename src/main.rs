//! Star Siege headless runner
//!
//! Plays one full match with the autopilot and prints the result as JSON.
//!
//! Usage: `star-siege [craft] [level] [seed] [--config file.json] [--max-ticks N]`

#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
#[cfg(not(target_arch = "wasm32"))]
use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use star_siege::GameConfig;
#[cfg(not(target_arch = "wasm32"))]
use star_siege::consts::*;
#[cfg(not(target_arch = "wasm32"))]
use star_siege::sim::{MatchSetup, MatchState, ShellNotification, TickInput, tick};

/// Twenty minutes of simulated play
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_MAX_TICKS: u64 = 20 * 60 * TICK_RATE as u64;

/// Play one autopiloted match and print the result
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Parser)]
#[command(name = "star-siege", version, about)]
struct Cli {
    /// Craft id; the first configured craft when omitted
    craft: Option<String>,
    /// Level id; the first configured level when omitted
    level: Option<String>,
    /// Match seed
    #[arg(default_value_t = 42)]
    seed: u64,
    /// JSON game config replacing the built-in tables
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Stop after this many ticks even if the match is still running
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,
}

#[cfg(not(target_arch = "wasm32"))]
fn load_config(path: Option<&Path>) -> Result<GameConfig, String> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    GameConfig::from_json(&json).map_err(|e| e.to_string())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let setup = MatchSetup {
        craft: cli.craft,
        level: cli.level,
        seed: cli.seed,
    };
    let mut state = MatchState::start(&setup, &config);
    log::info!("Star Siege (headless) running level `{}`", state.level_id);

    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut hp_changes = 0usize;
    while !state.phase.is_over() && state.time_ticks < cli.max_ticks {
        tick(&mut state, &input, SIM_DT);
        for note in state.take_notifications() {
            match note {
                ShellNotification::PlayerHpChanged { hp } => {
                    hp_changes += 1;
                    log::debug!("Player hp: {hp:.1}");
                }
                ShellNotification::MatchEnded(result) => {
                    log::info!("Match ended after {} ticks", result.ticks);
                }
            }
        }
    }

    let report = serde_json::json!({
        "result": state.result,
        "stars": state.rating().map(|r| r.stars()),
        "hp_changes": hp_changes,
        "snapshot": state.snapshot(),
    });
    match serde_json::to_string_pretty(&report) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("failed to encode report: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is driven by the embedding shell on the web
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["star-siege"]).expect("no args is valid");
        assert_eq!(cli.craft, None);
        assert_eq!(cli.level, None);
        assert_eq!(cli.seed, 42);
        assert_eq!(cli.config, None);
        assert_eq!(cli.max_ticks, DEFAULT_MAX_TICKS);
    }

    #[test]
    fn test_full_invocation() {
        let cli = Cli::try_parse_from([
            "star-siege",
            "lancer",
            "sector-2",
            "7",
            "--config",
            "tables.json",
            "--max-ticks",
            "600",
        ])
        .expect("valid args");
        assert_eq!(cli.craft.as_deref(), Some("lancer"));
        assert_eq!(cli.level.as_deref(), Some("sector-2"));
        assert_eq!(cli.seed, 7);
        assert_eq!(cli.config, Some(PathBuf::from("tables.json")));
        assert_eq!(cli.max_ticks, 600);
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(Cli::try_parse_from(["star-siege", "--max-ticks", "soon"]).is_err());
        assert!(Cli::try_parse_from(["star-siege", "--config"]).is_err());
        assert!(Cli::try_parse_from(["star-siege", "falcon", "trial", "seven"]).is_err());
        assert!(Cli::try_parse_from(["star-siege", "a", "b", "1", "extra"]).is_err());
    }

    #[test]
    fn test_missing_config_file_fails() {
        assert!(load_config(Some(Path::new("does/not/exist.json"))).is_err());
        assert!(load_config(None).is_ok());
    }
}
