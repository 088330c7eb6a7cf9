//! Server configuration loaded from TOML.

use std::{fs, path::Path, path::PathBuf, time::Duration};

use pit_defence_core::{MAX_PLAYERS, STARTING_OVERFLOW};
use pit_defence_world::WorldConfig;
use serde::Deserialize;
use thiserror::Error;

/// Slowest supported simulation rate.
pub const MIN_TICK_RATE_HZ: u32 = 30;
/// Fastest supported simulation rate.
pub const MAX_TICK_RATE_HZ: u32 = 60;

/// Failures while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`ServerConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings shared by every session hosted by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Fixed simulation rate, clamped to 30–60 Hz.
    pub tick_rate_hz: u32,
    /// Seed every session seed is derived from.
    pub global_seed: u64,
    /// Players admitted per session.
    pub max_players: usize,
    /// Capacity of each session's command inbox.
    pub command_buffer: usize,
    /// Minimum time between two placements of one player.
    pub placement_cooldown_ms: u64,
    /// Shared health pool at session start.
    pub starting_overflow: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: MIN_TICK_RATE_HZ,
            global_seed: 0,
            max_players: MAX_PLAYERS,
            command_buffer: 256,
            placement_cooldown_ms: 1000,
            starting_overflow: STARTING_OVERFLOW,
        }
    }
}

impl ServerConfig {
    /// Reads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML configuration text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        Ok(config.validated())
    }

    /// Clamps every setting into its supported range.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.tick_rate_hz = self.tick_rate_hz.clamp(MIN_TICK_RATE_HZ, MAX_TICK_RATE_HZ);
        self.max_players = self.max_players.clamp(1, MAX_PLAYERS);
        self.command_buffer = self.command_buffer.max(1);
        self
    }

    /// Duration of one simulation step.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate_hz.max(1)
    }

    /// World rules derived from the server settings.
    #[must_use]
    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            starting_overflow: self.starting_overflow,
            placement_cooldown: Duration::from_millis(self.placement_cooldown_ms),
            max_players: self.max_players,
            ..WorldConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = ServerConfig::from_toml_str("global_seed = 99\n").expect("valid toml");
        assert_eq!(config.global_seed, 99);
        assert_eq!(config.tick_rate_hz, 30);
        assert_eq!(config.max_players, 4);
        assert_eq!(config.starting_overflow, 1000);
    }

    #[test]
    fn tick_rate_is_clamped_to_the_supported_range() {
        let fast = ServerConfig::from_toml_str("tick_rate_hz = 240").expect("valid toml");
        assert_eq!(fast.tick_rate_hz, 60);
        let slow = ServerConfig::from_toml_str("tick_rate_hz = 1").expect("valid toml");
        assert_eq!(slow.tick_rate_hz, 30);
        assert_eq!(slow.tick_interval(), Duration::from_secs(1) / 30);
    }

    #[test]
    fn malformed_files_report_parse_errors() {
        let error = ServerConfig::from_toml_str("tick_rate_hz = \"fast\"").unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_files_report_their_path() {
        let error = ServerConfig::load(Path::new("/nonexistent/pit-defence.toml")).unwrap_err();
        assert!(error.to_string().contains("/nonexistent/pit-defence.toml"));
    }

    #[test]
    fn world_rules_follow_the_server_settings() {
        let config = ServerConfig {
            placement_cooldown_ms: 250,
            starting_overflow: 40,
            max_players: 2,
            ..ServerConfig::default()
        };
        let world = config.world_config();
        assert_eq!(world.placement_cooldown, Duration::from_millis(250));
        assert_eq!(world.starting_overflow, 40);
        assert_eq!(world.max_players, 2);
    }
}
