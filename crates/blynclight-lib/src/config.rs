//! TOML configuration at a platform-aware path.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{Color, parse_color};
use crate::protocol::{FlashSpeed, MAX_VOLUME};

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# blync configuration. Changes made outside `blync` may be overwritten.\n\n";

/// Smallest accepted `cycle_interval_ms`.
pub const MIN_CYCLE_INTERVAL_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Which attached light to use (0-based enumeration order). Default: 0.
    #[serde(default)]
    pub light_index: usize,

    /// Color used by `blync on` (hex or name). Default: "green".
    #[serde(default = "default_color")]
    pub color: String,

    /// Turn on dimmed.
    #[serde(default)]
    pub dim: bool,

    /// Turn on flashing.
    #[serde(default)]
    pub flash: bool,

    /// Flash speed: "slow", "medium" or "fast". Default: "slow".
    #[serde(default = "default_flash_speed")]
    pub flash_speed: String,

    /// Volume for `blync play`, 0 to 15.
    #[serde(default)]
    pub volume: u8,

    /// Delay between color steps in `blync cycle`. Default: 100.
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,
}

fn default_color() -> String {
    "green".into()
}
fn default_flash_speed() -> String {
    "slow".into()
}
fn default_cycle_interval_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Config {
            light_index: 0,
            color: default_color(),
            dim: false,
            flash: false,
            flash_speed: default_flash_speed(),
            volume: 0,
            cycle_interval_ms: default_cycle_interval_ms(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The `color` field could not be parsed.
    InvalidColor(String),
    /// The `flash_speed` field is not a known speed.
    InvalidFlashSpeed(String),
    /// `volume` exceeds the 4-bit field.
    VolumeOutOfRange(u8),
    /// `cycle_interval_ms` is below [`MIN_CYCLE_INTERVAL_MS`].
    IntervalTooShort(u64),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidColor(e) => write!(f, "Invalid color: {e}"),
            ValidationError::InvalidFlashSpeed(e) => write!(f, "Invalid flash_speed: {e}"),
            ValidationError::VolumeOutOfRange(v) => {
                write!(f, "Invalid volume: {v} (max {MAX_VOLUME})")
            }
            ValidationError::IntervalTooShort(ms) => write!(
                f,
                "Invalid cycle_interval_ms: {ms} (min {MIN_CYCLE_INTERVAL_MS})"
            ),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("blynclight"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Save config to an arbitrary path atomically (write to temp file, then rename).
    ///
    /// A header comment is prepended to warn that manual edits may be overwritten.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Save config to the default platform path.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory",
            ));
        };
        self.save_to(&path)
    }

    /// The configured color.
    pub fn color(&self) -> crate::error::Result<Color> {
        parse_color(&self.color)
    }

    /// The configured flash speed.
    pub fn flash_speed(&self) -> crate::error::Result<FlashSpeed> {
        self.flash_speed.parse().map_err(crate::BlyncError::Config)
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = parse_color(&self.color) {
            errors.push(ValidationError::InvalidColor(e.to_string()));
        }
        if let Err(e) = self.flash_speed.parse::<FlashSpeed>() {
            errors.push(ValidationError::InvalidFlashSpeed(e));
        }
        if self.volume > MAX_VOLUME {
            errors.push(ValidationError::VolumeOutOfRange(self.volume));
        }
        if self.cycle_interval_ms < MIN_CYCLE_INTERVAL_MS {
            errors.push(ValidationError::IntervalTooShort(self.cycle_interval_ms));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.light_index, 0);
        assert_eq!(c.color, "green");
        assert!(!c.dim);
        assert!(!c.flash);
        assert_eq!(c.flash_speed, "slow");
        assert_eq!(c.volume, 0);
        assert_eq!(c.cycle_interval_ms, 100);
    }

    #[test]
    fn serialize_roundtrip() {
        let c = Config {
            light_index: 2,
            color: "#FF8000".into(),
            dim: true,
            flash: true,
            flash_speed: "fast".into(),
            volume: 7,
            cycle_interval_ms: 250,
        };
        let s = toml::to_string_pretty(&c).unwrap();
        let c2: Config = toml::from_str(&s).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str("color = \"red\"\n").unwrap();
        assert_eq!(c.color, "red");
        assert_eq!(c.flash_speed, "slow");
        assert_eq!(c.cycle_interval_ms, 100);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(toml::from_str::<Config>("this is not [valid toml").is_err());
    }

    #[test]
    fn wrong_type_toml_is_an_error() {
        assert!(toml::from_str::<Config>("light_index = \"first\"").is_err());
    }

    #[test]
    fn config_path_ends_with_toml() {
        if let Some(p) = Config::path() {
            assert!(p.ends_with("blynclight/config.toml"));
        }
    }

    // ── typed accessors ──

    #[test]
    fn color_accessor() {
        let c = Config::default();
        assert_eq!(c.color().unwrap(), Color::rgb(0, 0xFF, 0));
    }

    #[test]
    fn flash_speed_accessor() {
        let c = Config {
            flash_speed: "Medium".into(),
            ..Config::default()
        };
        assert_eq!(c.flash_speed().unwrap(), FlashSpeed::Medium);
    }

    #[test]
    fn flash_speed_accessor_error() {
        let c = Config {
            flash_speed: "warp".into(),
            ..Config::default()
        };
        assert!(matches!(c.flash_speed(), Err(crate::BlyncError::Config(_))));
    }

    // ── validate ──

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_invalid_color() {
        let c = Config {
            color: "chartreuse".into(),
            ..Config::default()
        };
        let errs = c.validate().unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], ValidationError::InvalidColor(_)));
    }

    #[test]
    fn validate_volume_out_of_range() {
        let c = Config {
            volume: 16,
            ..Config::default()
        };
        assert_eq!(
            c.validate().unwrap_err(),
            vec![ValidationError::VolumeOutOfRange(16)]
        );
    }

    #[test]
    fn validate_max_volume_ok() {
        let c = Config {
            volume: MAX_VOLUME,
            ..Config::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let c = Config {
            color: "nope".into(),
            flash_speed: "warp".into(),
            volume: 99,
            cycle_interval_ms: 1,
            ..Config::default()
        };
        let errs = c.validate().unwrap_err();
        assert_eq!(errs.len(), 4);
        assert!(errs.contains(&ValidationError::IntervalTooShort(1)));
    }

    #[test]
    fn validation_error_display() {
        assert_eq!(
            ValidationError::VolumeOutOfRange(20).to_string(),
            "Invalid volume: 20 (max 15)"
        );
        assert_eq!(
            ValidationError::IntervalTooShort(5).to_string(),
            "Invalid cycle_interval_ms: 5 (min 10)"
        );
    }

    // ── persistence ──

    #[test]
    fn save_to_load_from_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let c = Config {
            light_index: 1,
            color: "cyan".into(),
            volume: 3,
            ..Config::default()
        };
        c.save_to(&path).unwrap();
        let (loaded, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded, c);
    }

    #[test]
    fn save_to_includes_header_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::default().save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# blync configuration"));
    }

    #[test]
    fn save_to_cleans_up_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::default().save_to(&path).unwrap();
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (c, warnings) = Config::load_from(&dir.path().join("absent.toml"));
        assert_eq!(c, Config::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn load_from_invalid_toml_returns_defaults_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "volume = [").unwrap();
        let (c, warnings) = Config::load_from(&path);
        assert_eq!(c, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config parse error"));
    }
}
