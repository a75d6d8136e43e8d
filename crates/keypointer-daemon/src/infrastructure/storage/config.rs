//! TOML-based configuration for the daemon.
//!
//! The config file lives in the platform-appropriate directory:
//! - Windows:  `%APPDATA%\KeyPointer\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/keypointer/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/KeyPointer/config.toml`
//!
//! ```toml
//! [daemon]
//! log_level = "info"
//!
//! [motion]
//! base_speed = 8.0
//! speed_up_multiplier = 3.0
//! speed_down_multiplier = 0.3
//! tick_interval_ms = 10
//! carry_subpixel_remainder = false
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section, or
//! a missing key all fall back to the built-in values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use keypointer_core::motion::{
    MotionParams, BASE_SPEED, SPEED_DOWN_MULTIPLIER, SPEED_UP_MULTIPLIER, TICK_INTERVAL,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is outside its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub motion: MotionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Motion loop tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MotionConfig {
    /// Pixels per tick with no speed modifier held.
    #[serde(default = "default_base_speed")]
    pub base_speed: f64,
    #[serde(default = "default_speed_up")]
    pub speed_up_multiplier: f64,
    #[serde(default = "default_speed_down")]
    pub speed_down_multiplier: f64,
    #[serde(default = "default_tick_ms")]
    pub tick_interval_ms: u64,
    /// Keep fractional pixels between moves instead of dropping them.
    #[serde(default)]
    pub carry_subpixel_remainder: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_base_speed() -> f64 {
    BASE_SPEED
}
fn default_speed_up() -> f64 {
    SPEED_UP_MULTIPLIER
}
fn default_speed_down() -> f64 {
    SPEED_DOWN_MULTIPLIER
}
fn default_tick_ms() -> u64 {
    TICK_INTERVAL.as_millis() as u64
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            base_speed: default_base_speed(),
            speed_up_multiplier: default_speed_up(),
            speed_down_multiplier: default_speed_down(),
            tick_interval_ms: default_tick_ms(),
            carry_subpixel_remainder: false,
        }
    }
}

impl MotionConfig {
    /// Converts to the parameters the motion driver runs with.
    pub fn to_params(&self) -> MotionParams {
        MotionParams {
            base_speed: self.base_speed,
            speed_up_multiplier: self.speed_up_multiplier,
            speed_down_multiplier: self.speed_down_multiplier,
            tick: Duration::from_millis(self.tick_interval_ms),
            carry_subpixel_remainder: self.carry_subpixel_remainder,
        }
    }
}

impl AppConfig {
    /// Rejects values the motion loop cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.motion;
        for (key, value) in [
            ("motion.base_speed", m.base_speed),
            ("motion.speed_up_multiplier", m.speed_up_multiplier),
            ("motion.speed_down_multiplier", m.speed_down_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be a positive finite number, got {value}"
                )));
            }
        }
        if m.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "motion.tick_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory cannot
/// be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("KeyPointer"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keypointer"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("KeyPointer")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn scratch_dir() -> PathBuf {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        std::env::temp_dir().join(format!(
            "keypointer_test_{}_{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[test]
    fn test_default_config_matches_built_in_motion_params() {
        // Arrange / Act
        let params = AppConfig::default().motion.to_params();

        // Assert
        assert_eq!(params, MotionParams::default());
    }

    #[test]
    fn test_daemon_default_log_level_is_info() {
        assert_eq!(DaemonConfig::default().log_level, "info");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_motion_section_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[motion]
base_speed = 12.5
carry_subpixel_remainder = true
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("partial");

        // Assert
        assert_eq!(cfg.motion.base_speed, 12.5);
        assert!(cfg.motion.carry_subpixel_remainder);
        assert_eq!(cfg.motion.tick_interval_ms, 10);
        assert_eq!(cfg.motion.speed_up_multiplier, 3.0);
        assert_eq!(cfg.daemon.log_level, "info");
    }

    #[test]
    fn test_to_params_converts_tick_to_duration() {
        let motion = MotionConfig {
            tick_interval_ms: 16,
            ..MotionConfig::default()
        };
        assert_eq!(motion.to_params().tick, Duration::from_millis(16));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_speed() {
        let mut cfg = AppConfig::default();
        cfg.motion.speed_down_multiplier = 0.0;

        let err = cfg.validate().unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("speed_down_multiplier")));
    }

    #[test]
    fn test_validate_rejects_non_finite_speed() {
        let mut cfg = AppConfig::default();
        cfg.motion.base_speed = f64::NAN;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_tick() {
        let mut cfg = AppConfig::default();
        cfg.motion.tick_interval_ms = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        // Arrange
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        // Act
        let result = load_config_from(&path);

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let path = scratch_dir().join("absent.toml");
        assert_eq!(load_config_from(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip_creates_parent_dirs() {
        // Arrange
        let dir = scratch_dir();
        let path = dir.join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.daemon.log_level = "debug".to_string();
        cfg.motion.tick_interval_ms = 5;

        // Act
        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("config.toml"), "got {path:?}");
        }
    }
}
