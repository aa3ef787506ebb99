//! Configuration loading for mathce1.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. User config (`~/.mathce1/config.toml`)
//! 3. Defaults (lowest priority)
//!
//! All configuration is optional. The pedagogical constants (80% mastery over
//! batches of 10, a hint after 2 errors) are the defaults, and a family never
//! needs to touch a file to get them.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MathError, Result};

/// Main configuration struct for mathce1.
///
/// Built once at startup and handed to each service; nothing reads it
/// through a global.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Mastery and level-up policy.
    pub progression: ProgressionConfig,
    /// Hint escalation policy.
    pub hints: HintConfig,
    /// Keyboard input behaviour.
    pub input: InputConfig,
    /// Star rewards.
    pub rewards: RewardsConfig,
    /// Session length and history.
    pub session: SessionConfig,
}

/// Mastery and level-up policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Accuracy percentage required within a batch to advance.
    pub mastery_threshold: u32,
    /// Exercises in a batch before a level-up is evaluated.
    pub exercises_to_advance: u32,
    /// Highest reachable level.
    pub max_level: u8,
}

impl ProgressionConfig {
    /// Check if a mastery threshold value is a valid percentage.
    pub fn is_valid_threshold(value: u32) -> bool {
        (1..=100).contains(&value)
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: 80,
            exercises_to_advance: 10,
            max_level: 10,
        }
    }
}

/// Hint escalation policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HintConfig {
    /// Consecutive errors before the first hint is offered.
    pub errors_before_hint: u32,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            errors_before_hint: 2,
        }
    }
}

/// Keyboard input behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Milliseconds of inactivity on a partial answer before encouraging.
    pub keyboard_timeout_ms: u64,
    /// Grade automatically once enough digits are typed.
    pub auto_validate: bool,
    /// Allow backspace.
    pub allow_correction: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            keyboard_timeout_ms: 10_000,
            auto_validate: true,
            allow_correction: true,
        }
    }
}

/// Star rewards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewardsConfig {
    /// Stars per correct answer.
    pub stars_per_exercise: u32,
    /// Bonus stars each time the streak hits a multiple of `streak_length_for_bonus`.
    pub streak_bonus_stars: u32,
    /// Streak length that earns the bonus.
    pub streak_length_for_bonus: u32,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            stars_per_exercise: 1,
            streak_bonus_stars: 3,
            streak_length_for_bonus: 5,
        }
    }
}

/// Session length and history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Exercises per session when the caller does not say.
    pub default_exercise_count: u32,
    /// Sessions kept in each child's history.
    pub max_sessions_stored: usize,
    /// Minutes before the session reminds the child to take a break.
    pub max_duration_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_exercise_count: 5,
            max_sessions_stored: 20,
            max_duration_minutes: 15,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = user_config;
        }

        config.apply_env_overrides();
        config
    }

    /// Load user config from `<home>/config.toml`.
    fn load_user_config() -> Option<Config> {
        let path = mathce1_home()?.join("config.toml");
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| MathError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| MathError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // MATHCE1_MASTERY_THRESHOLD
        if let Ok(val) = env::var("MATHCE1_MASTERY_THRESHOLD") {
            match val.parse::<u32>() {
                Ok(n) if ProgressionConfig::is_valid_threshold(n) => {
                    self.progression.mastery_threshold = n;
                }
                _ => tracing::warn!(
                    "Invalid MATHCE1_MASTERY_THRESHOLD value '{}'. Expected 1-100. Using '{}'.",
                    val,
                    self.progression.mastery_threshold
                ),
            }
        }

        // MATHCE1_EXERCISES_TO_ADVANCE
        if let Ok(val) = env::var("MATHCE1_EXERCISES_TO_ADVANCE") {
            match val.parse::<u32>() {
                Ok(n) if n >= 1 => self.progression.exercises_to_advance = n,
                _ => tracing::warn!(
                    "Invalid MATHCE1_EXERCISES_TO_ADVANCE value '{}'. Using '{}'.",
                    val,
                    self.progression.exercises_to_advance
                ),
            }
        }

        // MATHCE1_ERRORS_BEFORE_HINT
        if let Ok(val) = env::var("MATHCE1_ERRORS_BEFORE_HINT") {
            match val.parse::<u32>() {
                Ok(n) if n >= 1 => self.hints.errors_before_hint = n,
                _ => tracing::warn!(
                    "Invalid MATHCE1_ERRORS_BEFORE_HINT value '{}'. Using '{}'.",
                    val,
                    self.hints.errors_before_hint
                ),
            }
        }

        // MATHCE1_KEYBOARD_TIMEOUT_MS
        if let Ok(val) = env::var("MATHCE1_KEYBOARD_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(n) => self.input.keyboard_timeout_ms = n,
                Err(_) => tracing::warn!(
                    "Invalid MATHCE1_KEYBOARD_TIMEOUT_MS value '{}'. Using '{}'.",
                    val,
                    self.input.keyboard_timeout_ms
                ),
            }
        }

        // MATHCE1_EXERCISE_COUNT
        if let Ok(val) = env::var("MATHCE1_EXERCISE_COUNT") {
            match val.parse::<u32>() {
                Ok(n) if n >= 1 => self.session.default_exercise_count = n,
                _ => tracing::warn!(
                    "Invalid MATHCE1_EXERCISE_COUNT value '{}'. Using '{}'.",
                    val,
                    self.session.default_exercise_count
                ),
            }
        }
    }
}

/// Get the mathce1 home directory.
///
/// Checks `MATHCE1_HOME` first, then falls back to `~/.mathce1`, then to a
/// temp directory for environments without HOME.
pub fn mathce1_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("MATHCE1_HOME") {
        if home.is_empty() {
            tracing::warn!("MATHCE1_HOME is empty, using default");
        } else {
            return Some(PathBuf::from(home));
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".mathce1"));
    }

    let fallback = env::temp_dir().join("mathce1");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback.display()
    );
    Some(fallback)
}

/// Get the data directory holding the JSON blobs.
///
/// Returns `<mathce1_home>/data/`.
pub fn data_dir() -> Option<PathBuf> {
    mathce1_home().map(|h| h.join("data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.progression.mastery_threshold, 80);
        assert_eq!(config.progression.exercises_to_advance, 10);
        assert_eq!(config.progression.max_level, 10);
        assert_eq!(config.hints.errors_before_hint, 2);
        assert_eq!(config.input.keyboard_timeout_ms, 10_000);
        assert!(config.input.auto_validate);
        assert!(config.input.allow_correction);
        assert_eq!(config.rewards.stars_per_exercise, 1);
        assert_eq!(config.rewards.streak_bonus_stars, 3);
        assert_eq!(config.rewards.streak_length_for_bonus, 5);
        assert_eq!(config.session.default_exercise_count, 5);
        assert_eq!(config.session.max_sessions_stored, 20);
        assert_eq!(config.session.max_duration_minutes, 15);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[progression]
mastery_threshold = 90

[hints]
errors_before_hint = 3
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.progression.mastery_threshold, 90);
        // Unspecified fields keep their defaults
        assert_eq!(config.progression.exercises_to_advance, 10);
        assert_eq!(config.hints.errors_before_hint, 3);
        assert_eq!(config.rewards, RewardsConfig::default());
    }

    #[test]
    fn test_load_from_file_missing() {
        let dir = TempDir::new().unwrap();
        let result = Config::load_from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(MathError::Storage { .. })));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "progression = [not toml").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(MathError::Config { .. })
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.session.default_exercise_count = 12;
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_is_valid_threshold() {
        assert!(ProgressionConfig::is_valid_threshold(1));
        assert!(ProgressionConfig::is_valid_threshold(100));
        assert!(!ProgressionConfig::is_valid_threshold(0));
        assert!(!ProgressionConfig::is_valid_threshold(101));
    }

    #[test]
    #[serial]
    fn test_env_var_overrides() {
        env::set_var("MATHCE1_MASTERY_THRESHOLD", "70");
        env::set_var("MATHCE1_EXERCISES_TO_ADVANCE", "5");
        env::set_var("MATHCE1_ERRORS_BEFORE_HINT", "1");
        env::set_var("MATHCE1_KEYBOARD_TIMEOUT_MS", "3000");
        env::set_var("MATHCE1_EXERCISE_COUNT", "8");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.progression.mastery_threshold, 70);
        assert_eq!(config.progression.exercises_to_advance, 5);
        assert_eq!(config.hints.errors_before_hint, 1);
        assert_eq!(config.input.keyboard_timeout_ms, 3000);
        assert_eq!(config.session.default_exercise_count, 8);

        env::remove_var("MATHCE1_MASTERY_THRESHOLD");
        env::remove_var("MATHCE1_EXERCISES_TO_ADVANCE");
        env::remove_var("MATHCE1_ERRORS_BEFORE_HINT");
        env::remove_var("MATHCE1_KEYBOARD_TIMEOUT_MS");
        env::remove_var("MATHCE1_EXERCISE_COUNT");
    }

    #[test]
    #[serial]
    fn test_env_var_invalid_values_ignored() {
        env::set_var("MATHCE1_MASTERY_THRESHOLD", "250");
        env::set_var("MATHCE1_ERRORS_BEFORE_HINT", "zero");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.progression.mastery_threshold, 80);
        assert_eq!(config.hints.errors_before_hint, 2);

        env::remove_var("MATHCE1_MASTERY_THRESHOLD");
        env::remove_var("MATHCE1_ERRORS_BEFORE_HINT");
    }

    #[test]
    #[serial]
    fn test_home_with_env() {
        let dir = TempDir::new().unwrap();
        env::set_var("MATHCE1_HOME", dir.path());

        assert_eq!(mathce1_home(), Some(dir.path().to_path_buf()));
        assert_eq!(data_dir(), Some(dir.path().join("data")));

        env::remove_var("MATHCE1_HOME");
    }

    #[test]
    #[serial]
    fn test_home_empty_env_falls_back() {
        env::set_var("MATHCE1_HOME", "");
        let home = mathce1_home().unwrap();
        assert!(home.ends_with(".mathce1") || home.ends_with("mathce1"));
        env::remove_var("MATHCE1_HOME");
    }

    #[test]
    #[serial]
    fn test_load_reads_user_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "[session]\ndefault_exercise_count = 10\n",
        )
        .unwrap();
        env::set_var("MATHCE1_HOME", dir.path());

        let config = Config::load();
        assert_eq!(config.session.default_exercise_count, 10);

        env::remove_var("MATHCE1_HOME");
    }
}
