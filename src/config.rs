//! Game configuration: timing windows, player limits, and point values.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Configuration for a game session.
///
/// Every field has a default matching the reference rules, so an empty TOML
/// file (or `GameConfig::default()`) yields a fully playable setup.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct GameConfig {
    /// Minimum players required for a game to start.
    #[serde(default = "default_min_players")]
    min_players: usize,

    /// Maximum players admitted to a lobby.
    #[serde(default = "default_max_players")]
    max_players: usize,

    /// Seconds the lobby stays open for joins.
    #[serde(default = "default_join_window_secs")]
    join_window_secs: u64,

    /// Seconds granted for each question or answer during a round.
    #[serde(default = "default_round_duration_secs")]
    round_duration_secs: u64,

    /// Seconds the imposter vote stays open.
    #[serde(default = "default_vote_timeout_secs")]
    vote_timeout_secs: u64,

    /// Seconds the extra-round mini-vote stays open.
    #[serde(default = "default_extra_round_vote_secs")]
    extra_round_vote_secs: u64,

    /// Seconds the imposters get for the word guess.
    #[serde(default = "default_guess_timeout_secs")]
    guess_timeout_secs: u64,

    /// Points granted to each surviving crew member on a crew win.
    #[serde(default = "default_crew_win_points")]
    crew_win_points: i64,

    /// Points granted to each original imposter on an imposter win.
    #[serde(default = "default_imposter_win_points")]
    imposter_win_points: i64,

    /// Bonus granted to each original imposter for a correct word guess.
    #[serde(default = "default_guess_bonus_points")]
    guess_bonus_points: i64,
}

fn default_min_players() -> usize {
    3
}

fn default_max_players() -> usize {
    20
}

fn default_join_window_secs() -> u64 {
    40
}

fn default_round_duration_secs() -> u64 {
    40
}

fn default_vote_timeout_secs() -> u64 {
    40
}

fn default_extra_round_vote_secs() -> u64 {
    20
}

fn default_guess_timeout_secs() -> u64 {
    20
}

fn default_crew_win_points() -> i64 {
    10
}

fn default_imposter_win_points() -> i64 {
    15
}

fn default_guess_bonus_points() -> i64 {
    5
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: default_min_players(),
            max_players: default_max_players(),
            join_window_secs: default_join_window_secs(),
            round_duration_secs: default_round_duration_secs(),
            vote_timeout_secs: default_vote_timeout_secs(),
            extra_round_vote_secs: default_extra_round_vote_secs(),
            guess_timeout_secs: default_guess_timeout_secs(),
            crew_win_points: default_crew_win_points(),
            imposter_win_points: default_imposter_win_points(),
            guess_bonus_points: default_guess_bonus_points(),
        }
    }
}

impl GameConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading game config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(
            min_players = config.min_players,
            max_players = config.max_players,
            "Game config loaded"
        );
        Ok(config)
    }

    /// How many imposters a game with `player_count` players gets.
    ///
    /// Fixed tiers: 1 for fewer than 6 players, 2 for 6-10, 3 for 11-15,
    /// 4 for 16 and up.
    pub fn imposter_count(&self, player_count: usize) -> usize {
        match player_count {
            0..=5 => 1,
            6..=10 => 2,
            11..=15 => 3,
            _ => 4,
        }
    }

    /// Join window as a [`Duration`].
    pub fn join_window(&self) -> Duration {
        Duration::from_secs(self.join_window_secs)
    }

    /// Per-message round wait as a [`Duration`].
    pub fn round_duration(&self) -> Duration {
        Duration::from_secs(self.round_duration_secs)
    }

    /// Vote window as a [`Duration`].
    pub fn vote_timeout(&self) -> Duration {
        Duration::from_secs(self.vote_timeout_secs)
    }

    /// Extra-round mini-vote window as a [`Duration`].
    pub fn extra_round_vote_timeout(&self) -> Duration {
        Duration::from_secs(self.extra_round_vote_secs)
    }

    /// Guess-phase window as a [`Duration`].
    pub fn guess_timeout(&self) -> Duration {
        Duration::from_secs(self.guess_timeout_secs)
    }
}

/// Configuration error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
