//! Session settings loaded from TOML.

use crate::games::chess::{
    Difficulty, GameMode, MatchConfig, Side, StandardRules, TimeControl,
};
use crate::session::SessionController;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable naming the settings file.
pub const CONFIG_ENV_VAR: &str = "STRICTLY_CHESS_CONFIG";

/// Everything needed to set up a session.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct SessionSettings {
    /// Who is playing.
    #[serde(default)]
    mode: GameMode,

    /// Computer opponent tier.
    #[serde(default)]
    difficulty: Difficulty,

    /// Clock allotment: a preset name or a number of seconds.
    #[serde(default)]
    time_control: TimeControl,

    /// Side the computer plays.
    #[serde(default = "default_computer_side")]
    computer_side: Side,

    /// Computer thinking delay in milliseconds.
    #[serde(default = "default_think_delay_ms")]
    think_delay_ms: u64,

    /// Seed for reproducible computer play.
    #[serde(default)]
    #[setters(strip_option)]
    seed: Option<u64>,

    /// Remaining seconds below which a running clock is shown as low.
    #[serde(default = "default_low_time_threshold_secs")]
    low_time_threshold_secs: u32,

    /// Custom start position in FEN.
    #[serde(default)]
    #[setters(strip_option)]
    start_fen: Option<String>,
}

#[instrument]
fn default_computer_side() -> Side {
    Side::Black
}

#[instrument]
fn default_think_delay_ms() -> u64 {
    800
}

#[instrument]
fn default_low_time_threshold_secs() -> u32 {
    30
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            difficulty: Difficulty::default(),
            time_control: TimeControl::default(),
            computer_side: default_computer_side(),
            think_delay_ms: default_think_delay_ms(),
            seed: None,
            low_time_threshold_secs: default_low_time_threshold_secs(),
            start_fen: None,
        }
    }
}

impl SessionSettings {
    /// Loads settings from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading settings from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let settings: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(mode = %settings.mode, time_control = %settings.time_control, "Settings loaded");
        Ok(settings)
    }

    /// Loads from `path`, else from the file named by
    /// [`CONFIG_ENV_VAR`], else returns defaults.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Match configuration described by these settings.
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            mode: self.mode,
            difficulty: self.difficulty,
            time_control: self.time_control,
            computer_side: self.computer_side,
        }
    }

    /// Computer thinking delay.
    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }

    /// Rules oracle, honouring a custom start position.
    #[instrument(skip(self))]
    pub fn rules(&self) -> Result<StandardRules, ConfigError> {
        match &self.start_fen {
            Some(fen) => StandardRules::from_fen(fen)
                .map_err(|e| ConfigError::new(format!("Bad start_fen: {}", e))),
            None => Ok(StandardRules::new()),
        }
    }

    /// Builds an idle controller from these settings.
    #[instrument(skip(self))]
    pub fn build_controller(&self) -> Result<SessionController<StandardRules>, ConfigError> {
        let controller = SessionController::new(self.rules()?, self.match_config())
            .with_think_delay(self.think_delay());
        Ok(match self.seed {
            Some(seed) => controller.with_seed(seed),
            None => controller,
        })
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
