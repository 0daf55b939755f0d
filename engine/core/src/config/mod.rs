//! TOML Configuration File Support
//!
//! Centralized configuration for a spiral session, loaded from
//! `~/.config/spiral/spiral.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables (`SPIRAL_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/spiral/spiral.toml` (typically `~/.config/spiral/spiral.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [timers]
//! spiral_period_secs = 60
//! glitch_chance = 0.3
//! phase_gate_period_secs = 10
//! badge_check_period_secs = 15
//!
//! [narrator]
//! helpful_period_secs = 45
//! unhinged_period_secs = 10
//! skip_chance = 0.3
//! typing_delay_min_ms = 500
//! typing_delay_max_ms = 1500
//!
//! [badges]
//! award_chance = 0.3
//!
//! [scrambler]
//! multiplier = 1.5
//!
//! [runtime]
//! tick_interval_ms = 100
//! seed = 42
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::phase::NarratorPhase;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Timers section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimersToml {
    /// Spiral ticker period in seconds
    pub spiral_period_secs: Option<u64>,

    /// Frustration added per spiral tick
    pub frustration_per_tick: Option<f64>,

    /// Chance of a glitch per spiral tick
    pub glitch_chance: Option<f64>,

    /// Glitch overlay duration in milliseconds
    pub glitch_duration_ms: Option<u64>,

    /// Phase gate period in seconds
    pub phase_gate_period_secs: Option<u64>,

    /// Existential prompt period in seconds
    pub prompt_period_secs: Option<u64>,

    /// How long a prompt stays up, in seconds
    pub prompt_duration_secs: Option<u64>,

    /// Badge check period in seconds
    pub badge_check_period_secs: Option<u64>,
}

/// Narrator section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NarratorToml {
    /// Ambient line period while helpful, in seconds
    pub helpful_period_secs: Option<u64>,

    /// Ambient line period while passive-aggressive, in seconds
    pub passive_aggressive_period_secs: Option<u64>,

    /// Ambient line period while existential, in seconds
    pub existential_period_secs: Option<u64>,

    /// Ambient line period while unhinged, in seconds
    pub unhinged_period_secs: Option<u64>,

    /// Chance an ambient tick says nothing
    pub skip_chance: Option<f64>,

    /// Shortest typing delay in milliseconds
    pub typing_delay_min_ms: Option<u64>,

    /// Longest typing delay in milliseconds
    pub typing_delay_max_ms: Option<u64>,

    /// Scrollback lines kept
    pub scrollback_capacity: Option<usize>,
}

/// Badges section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgesToml {
    /// Award chance per check while no badge is held
    pub award_chance: Option<f64>,

    /// Toast lifetime in seconds
    pub toast_duration_secs: Option<u64>,
}

/// Scrambler section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScramblerToml {
    /// Chaos multiplier for narrator text scrambling
    pub multiplier: Option<f64>,
}

/// Runtime section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeToml {
    /// Heartbeat interval in milliseconds
    pub tick_interval_ms: Option<u64>,

    /// Fixed RNG seed (random when absent)
    pub seed: Option<u64>,

    /// Surface event inbox size
    pub event_buffer: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralToml {
    /// Timers configuration section
    pub timers: TimersToml,

    /// Narrator configuration section
    pub narrator: NarratorToml,

    /// Badges configuration section
    pub badges: BadgesToml,

    /// Scrambler configuration section
    pub scrambler: ScramblerToml,

    /// Runtime configuration section
    pub runtime: RuntimeToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Timer periods and probabilities
#[derive(Clone, Debug, PartialEq)]
pub struct TimerConfig {
    /// Spiral ticker period
    pub spiral_period: Duration,
    /// Frustration added per spiral tick
    pub frustration_per_tick: f64,
    /// Glitch chance per spiral tick
    pub glitch_chance: f64,
    /// Glitch overlay duration
    pub glitch_duration: Duration,
    /// Phase gate period
    pub phase_gate_period: Duration,
    /// Existential prompt period
    pub prompt_period: Duration,
    /// Prompt lifetime
    pub prompt_duration: Duration,
    /// Spiral depth required before prompts appear
    pub prompt_min_spiral_depth: u32,
    /// Chaos required before prompts appear
    pub prompt_min_chaos: u8,
    /// Badge check period
    pub badge_check_period: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            spiral_period: Duration::from_secs(60),
            frustration_per_tick: 0.3,
            glitch_chance: 0.3,
            glitch_duration: Duration::from_millis(500),
            phase_gate_period: Duration::from_secs(10),
            prompt_period: Duration::from_secs(90),
            prompt_duration: Duration::from_secs(10),
            prompt_min_spiral_depth: 2,
            prompt_min_chaos: 2,
            badge_check_period: Duration::from_secs(15),
        }
    }
}

/// Narrator cadence and channel settings
#[derive(Clone, Debug, PartialEq)]
pub struct NarratorConfig {
    /// Ambient period while helpful
    pub helpful_period: Duration,
    /// Ambient period while passive-aggressive
    pub passive_aggressive_period: Duration,
    /// Ambient period while existential
    pub existential_period: Duration,
    /// Ambient period while unhinged
    pub unhinged_period: Duration,
    /// Chance an ambient tick stays silent
    pub skip_chance: f64,
    /// Shortest typing delay
    pub typing_delay_min: Duration,
    /// Longest typing delay
    pub typing_delay_max: Duration,
    /// Scrollback lines kept
    pub scrollback_capacity: usize,
}

impl NarratorConfig {
    /// Ambient line period for a narrator phase
    #[must_use]
    pub fn period_for(&self, phase: NarratorPhase) -> Duration {
        match phase {
            NarratorPhase::Helpful => self.helpful_period,
            NarratorPhase::PassiveAggressive => self.passive_aggressive_period,
            NarratorPhase::Existential => self.existential_period,
            NarratorPhase::Unhinged => self.unhinged_period,
        }
    }
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            helpful_period: Duration::from_secs(45),
            passive_aggressive_period: Duration::from_secs(30),
            existential_period: Duration::from_secs(20),
            unhinged_period: Duration::from_secs(10),
            skip_chance: 0.3,
            typing_delay_min: crate::narrator::TYPING_DELAY_MIN,
            typing_delay_max: crate::narrator::TYPING_DELAY_MAX,
            scrollback_capacity: crate::narrator::SCROLLBACK_CAPACITY,
        }
    }
}

/// Badge award settings
#[derive(Clone, Debug, PartialEq)]
pub struct BadgeConfig {
    /// Award chance per check while no badge is held
    pub award_chance: f64,
    /// Toast lifetime
    pub toast_duration: Duration,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            award_chance: crate::badges::BADGE_AWARD_CHANCE,
            toast_duration: crate::badges::TOAST_DURATION,
        }
    }
}

/// Runtime driver settings
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    /// Heartbeat interval
    pub tick_interval: Duration,
    /// Fixed RNG seed
    pub seed: Option<u64>,
    /// Surface event inbox size
    pub event_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            seed: None,
            event_buffer: 64,
        }
    }
}

/// Centralized configuration for a session
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Timers
    pub timers: TimerConfig,

    /// Narrator
    pub narrator: NarratorConfig,

    /// Badges
    pub badges: BadgeConfig,

    /// Chaos multiplier for narrator text scrambling
    pub scramble_multiplier: f64,

    /// Runtime driver
    pub runtime: RuntimeConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timers: TimerConfig::default(),
            narrator: NarratorConfig::default(),
            badges: BadgeConfig::default(),
            scramble_multiplier: 1.0,
            runtime: RuntimeConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check the configuration for values the engine cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("timers.spiral_period", self.timers.spiral_period),
            ("timers.glitch_duration", self.timers.glitch_duration),
            ("timers.phase_gate_period", self.timers.phase_gate_period),
            ("timers.prompt_period", self.timers.prompt_period),
            ("timers.prompt_duration", self.timers.prompt_duration),
            ("timers.badge_check_period", self.timers.badge_check_period),
            ("narrator.helpful_period", self.narrator.helpful_period),
            (
                "narrator.passive_aggressive_period",
                self.narrator.passive_aggressive_period,
            ),
            ("narrator.existential_period", self.narrator.existential_period),
            ("narrator.unhinged_period", self.narrator.unhinged_period),
            ("badges.toast_duration", self.badges.toast_duration),
            ("runtime.tick_interval", self.runtime.tick_interval),
        ];
        for (name, period) in periods {
            if period.is_zero() {
                return Err(ConfigError::ValidationError(format!("{name} must be > 0")));
            }
        }

        let probabilities = [
            ("timers.glitch_chance", self.timers.glitch_chance),
            ("narrator.skip_chance", self.narrator.skip_chance),
            ("badges.award_chance", self.badges.award_chance),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }

        if self.narrator.typing_delay_min > self.narrator.typing_delay_max {
            return Err(ConfigError::ValidationError(format!(
                "narrator typing delay range is inverted ({:?} > {:?})",
                self.narrator.typing_delay_min, self.narrator.typing_delay_max
            )));
        }
        if self.narrator.scrollback_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "narrator.scrollback_capacity must be > 0".to_string(),
            ));
        }
        if !self.timers.frustration_per_tick.is_finite() || self.timers.frustration_per_tick < 0.0
        {
            return Err(ConfigError::ValidationError(
                "timers.frustration_per_tick must be a non-negative number".to_string(),
            ));
        }
        if !self.scramble_multiplier.is_finite() || self.scramble_multiplier < 0.0 {
            return Err(ConfigError::ValidationError(
                "scrambler.multiplier must be a non-negative number".to_string(),
            ));
        }
        if self.runtime.event_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "runtime.event_buffer must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/spiral/spiral.toml` or
/// `~/.config/spiral/spiral.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("spiral").join("spiral.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or the
/// merged configuration does not validate. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<SessionConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed, or
/// the merged configuration does not validate.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<SessionConfig, ConfigError> {
    let mut config = SessionConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: SpiralToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, |key| std::env::var(key).ok());

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut SessionConfig, toml: &SpiralToml) {
    // Timers
    if let Some(secs) = toml.timers.spiral_period_secs {
        config.timers.spiral_period = Duration::from_secs(secs);
    }
    if let Some(delta) = toml.timers.frustration_per_tick {
        config.timers.frustration_per_tick = delta;
    }
    if let Some(p) = toml.timers.glitch_chance {
        config.timers.glitch_chance = p;
    }
    if let Some(ms) = toml.timers.glitch_duration_ms {
        config.timers.glitch_duration = Duration::from_millis(ms);
    }
    if let Some(secs) = toml.timers.phase_gate_period_secs {
        config.timers.phase_gate_period = Duration::from_secs(secs);
    }
    if let Some(secs) = toml.timers.prompt_period_secs {
        config.timers.prompt_period = Duration::from_secs(secs);
    }
    if let Some(secs) = toml.timers.prompt_duration_secs {
        config.timers.prompt_duration = Duration::from_secs(secs);
    }
    if let Some(secs) = toml.timers.badge_check_period_secs {
        config.timers.badge_check_period = Duration::from_secs(secs);
    }

    // Narrator
    if let Some(secs) = toml.narrator.helpful_period_secs {
        config.narrator.helpful_period = Duration::from_secs(secs);
    }
    if let Some(secs) = toml.narrator.passive_aggressive_period_secs {
        config.narrator.passive_aggressive_period = Duration::from_secs(secs);
    }
    if let Some(secs) = toml.narrator.existential_period_secs {
        config.narrator.existential_period = Duration::from_secs(secs);
    }
    if let Some(secs) = toml.narrator.unhinged_period_secs {
        config.narrator.unhinged_period = Duration::from_secs(secs);
    }
    if let Some(p) = toml.narrator.skip_chance {
        config.narrator.skip_chance = p;
    }
    if let Some(ms) = toml.narrator.typing_delay_min_ms {
        config.narrator.typing_delay_min = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.narrator.typing_delay_max_ms {
        config.narrator.typing_delay_max = Duration::from_millis(ms);
    }
    if let Some(capacity) = toml.narrator.scrollback_capacity {
        config.narrator.scrollback_capacity = capacity;
    }

    // Badges
    if let Some(p) = toml.badges.award_chance {
        config.badges.award_chance = p;
    }
    if let Some(secs) = toml.badges.toast_duration_secs {
        config.badges.toast_duration = Duration::from_secs(secs);
    }

    // Scrambler
    if let Some(multiplier) = toml.scrambler.multiplier {
        config.scramble_multiplier = multiplier;
    }

    // Runtime
    if let Some(ms) = toml.runtime.tick_interval_ms {
        config.runtime.tick_interval = Duration::from_millis(ms);
    }
    if toml.runtime.seed.is_some() {
        config.runtime.seed = toml.runtime.seed;
    }
    if let Some(size) = toml.runtime.event_buffer {
        config.runtime.event_buffer = size;
    }
}

/// Apply environment variable overrides to the config
///
/// `lookup` resolves a variable name; the loader passes `std::env::var`.
/// Unparseable values are ignored.
fn apply_env_config(config: &mut SessionConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(seed) = lookup("SPIRAL_SEED").and_then(|v| v.parse::<u64>().ok()) {
        config.runtime.seed = Some(seed);
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = lookup("SPIRAL_TICK_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.runtime.tick_interval = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(secs) = lookup("SPIRAL_SPIRAL_PERIOD_SECS").and_then(|v| v.parse::<u64>().ok()) {
        config.timers.spiral_period = Duration::from_secs(secs);
        config.source = ConfigSource::Env;
    }
    if let Some(secs) = lookup("SPIRAL_PHASE_GATE_SECS").and_then(|v| v.parse::<u64>().ok()) {
        config.timers.phase_gate_period = Duration::from_secs(secs);
        config.source = ConfigSource::Env;
    }
    if let Some(p) = lookup("SPIRAL_BADGE_CHANCE").and_then(|v| v.parse::<f64>().ok()) {
        config.badges.award_chance = p;
        config.source = ConfigSource::Env;
    }
    if let Some(p) = lookup("SPIRAL_NARRATOR_SKIP_CHANCE").and_then(|v| v.parse::<f64>().ok()) {
        config.narrator.skip_chance = p;
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = lookup("SPIRAL_TYPING_MIN_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.narrator.typing_delay_min = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = lookup("SPIRAL_TYPING_MAX_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.narrator.typing_delay_max = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(m) = lookup("SPIRAL_SCRAMBLE_MULTIPLIER").and_then(|v| v.parse::<f64>().ok()) {
        config.scramble_multiplier = m;
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// RNG seed override
    pub seed: Option<u64>,

    /// Heartbeat interval override (milliseconds)
    pub tick_interval_ms: Option<u64>,

    /// Typing delay range override (milliseconds)
    pub typing_delay_ms: Option<(u64, u64)>,

    /// Spiral ticker period override (seconds)
    pub spiral_period_secs: Option<u64>,

    /// Scramble multiplier override
    pub scramble_multiplier: Option<f64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set RNG seed override
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set heartbeat interval override
    #[must_use]
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = Some(ms);
        self
    }

    /// Set typing delay range override
    #[must_use]
    pub fn with_typing_delay_ms(mut self, min: u64, max: u64) -> Self {
        self.typing_delay_ms = Some((min, max));
        self
    }

    /// Set spiral ticker period override
    #[must_use]
    pub fn with_spiral_period_secs(mut self, secs: u64) -> Self {
        self.spiral_period_secs = Some(secs);
        self
    }

    /// Set scramble multiplier override
    #[must_use]
    pub fn with_scramble_multiplier(mut self, multiplier: f64) -> Self {
        self.scramble_multiplier = Some(multiplier);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut SessionConfig) {
        if self.seed.is_some()
            || self.tick_interval_ms.is_some()
            || self.typing_delay_ms.is_some()
            || self.spiral_period_secs.is_some()
            || self.scramble_multiplier.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(seed) = self.seed {
            config.runtime.seed = Some(seed);
        }
        if let Some(ms) = self.tick_interval_ms {
            config.runtime.tick_interval = Duration::from_millis(ms);
        }
        if let Some((min, max)) = self.typing_delay_ms {
            config.narrator.typing_delay_min = Duration::from_millis(min);
            config.narrator.typing_delay_max = Duration::from_millis(max);
        }
        if let Some(secs) = self.spiral_period_secs {
            config.timers.spiral_period = Duration::from_secs(secs);
        }
        if let Some(multiplier) = self.scramble_multiplier {
            config.scramble_multiplier = multiplier;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.timers.spiral_period, Duration::from_secs(60));
        assert_eq!(config.timers.phase_gate_period, Duration::from_secs(10));
        assert_eq!(config.timers.prompt_period, Duration::from_secs(90));
        assert_eq!(config.timers.badge_check_period, Duration::from_secs(15));
        assert_eq!(config.narrator.scrollback_capacity, 20);
        assert_eq!(config.runtime.tick_interval, Duration::from_millis(100));
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_narrator_period_by_phase() {
        let narrator = NarratorConfig::default();
        assert_eq!(
            narrator.period_for(NarratorPhase::Helpful),
            Duration::from_secs(45)
        );
        assert_eq!(
            narrator.period_for(NarratorPhase::PassiveAggressive),
            Duration::from_secs(30)
        );
        assert_eq!(
            narrator.period_for(NarratorPhase::Existential),
            Duration::from_secs(20)
        );
        assert_eq!(
            narrator.period_for(NarratorPhase::Unhinged),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("spiral/spiral.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_full_toml() {
        let file = write_toml(
            r#"
[timers]
spiral_period_secs = 30
glitch_chance = 0.5
glitch_duration_ms = 250
phase_gate_period_secs = 5

[narrator]
unhinged_period_secs = 3
skip_chance = 0.0
typing_delay_min_ms = 100
typing_delay_max_ms = 200
scrollback_capacity = 5

[badges]
award_chance = 1.0
toast_duration_secs = 2

[scrambler]
multiplier = 2.5

[runtime]
tick_interval_ms = 50
seed = 7
"#,
        );

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.timers.spiral_period, Duration::from_secs(30));
        assert!((config.timers.glitch_chance - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.timers.glitch_duration, Duration::from_millis(250));
        assert_eq!(config.timers.phase_gate_period, Duration::from_secs(5));
        assert_eq!(config.narrator.unhinged_period, Duration::from_secs(3));
        assert_eq!(config.narrator.typing_delay_max, Duration::from_millis(200));
        assert_eq!(config.narrator.scrollback_capacity, 5);
        assert!((config.badges.award_chance - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.badges.toast_duration, Duration::from_secs(2));
        assert!((config.scramble_multiplier - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.runtime.tick_interval, Duration::from_millis(50));
        assert_eq!(config.runtime.seed, Some(7));
        assert_eq!(
            config.config_file_path.as_deref(),
            Some(file.path())
        );
    }

    #[test]
    fn test_parse_partial_toml() {
        let file = write_toml(
            r#"
[narrator]
helpful_period_secs = 90
"#,
        );

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.narrator.helpful_period, Duration::from_secs(90));
        // Untouched values keep their defaults
        assert_eq!(config.narrator.unhinged_period, Duration::from_secs(10));
        assert_eq!(config.timers.badge_check_period, Duration::from_secs(15));
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/spiral.toml");
        let config = load_config_from_path(Some(path)).unwrap();
        assert!(config.config_file_path.is_none());
        assert_ne!(config.source(), ConfigSource::File);
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml(
            r#"
[timers
spiral_period_secs = "soon"
"#,
        );

        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_file_value_rejected() {
        let file = write_toml(
            r#"
[badges]
award_chance = 1.5
"#,
        );

        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    // =========================================================================
    // Priority Ordering Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let mut config = SessionConfig::default();
        let toml: SpiralToml = toml::from_str(
            r#"
[runtime]
seed = 1
tick_interval_ms = 250
"#,
        )
        .unwrap();
        apply_toml_config(&mut config, &toml);
        config.set_source(ConfigSource::File);

        apply_env_config(&mut config, env_from(&[("SPIRAL_SEED", "99")]));

        assert_eq!(config.runtime.seed, Some(99));
        assert_eq!(config.runtime.tick_interval, Duration::from_millis(250));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_is_ignored() {
        let mut config = SessionConfig::default();
        apply_env_config(
            &mut config,
            env_from(&[("SPIRAL_TICK_MS", "fast"), ("SPIRAL_BADGE_CHANCE", "")]),
        );
        assert_eq!(config.runtime.tick_interval, Duration::from_millis(100));
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = SessionConfig::default();
        apply_env_config(&mut config, env_from(&[("SPIRAL_SEED", "5")]));

        let overrides = ConfigOverrides::new().with_seed(6);
        overrides.apply(&mut config);

        assert_eq!(config.runtime.seed, Some(6));
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    // =========================================================================
    // ConfigOverrides Tests
    // =========================================================================

    #[test]
    fn test_config_overrides_apply() {
        let mut config = SessionConfig::default();
        ConfigOverrides::new()
            .with_tick_interval_ms(20)
            .with_typing_delay_ms(0, 0)
            .with_spiral_period_secs(1)
            .with_scramble_multiplier(3.0)
            .apply(&mut config);

        assert_eq!(config.runtime.tick_interval, Duration::from_millis(20));
        assert_eq!(config.narrator.typing_delay_min, Duration::ZERO);
        assert_eq!(config.timers.spiral_period, Duration::from_secs(1));
        assert!((config.scramble_multiplier - 3.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_overrides_empty_no_change() {
        let mut config = SessionConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn test_validate_rejects_zero_period() {
        let mut config = SessionConfig::default();
        config.timers.phase_gate_period = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timers.phase_gate_period"));
    }

    #[test]
    fn test_validate_rejects_inverted_typing_range() {
        let mut config = SessionConfig::default();
        config.narrator.typing_delay_min = Duration::from_secs(3);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_nan_probability() {
        let mut config = SessionConfig::default();
        config.narrator.skip_chance = f64::NAN;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Error Type Tests
    // =========================================================================

    #[test]
    fn test_config_error_display() {
        let read_err = ConfigError::ReadError {
            path: PathBuf::from("/test/path"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = read_err.to_string();
        assert!(msg.contains("/test/path"));
        assert!(msg.contains("Failed to read"));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
