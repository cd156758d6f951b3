//src/config.rs
use comfy_table::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_CONFIG_DIR: &str = "gofit";
const CONFIG_ENV_VAR: &str = "GOFIT_CONFIG_DIR"; // Environment variable name

const KG_TO_LBS: f64 = 2.204_62;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not determine configuration directory.")]
    CannotDetermineConfigDir,
    #[error("I/O error accessing config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file (TOML): {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config data (TOML): {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid color name: {0}")]
    InvalidColor(String),
    #[error("Streak interval must be at least 1 day (got {0}).")]
    InvalidStreakInterval(u32),
    #[error("Invalid default for new workouts: {0}")]
    InvalidPlanDefault(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric, // kg
    Imperial, // lbs
}

impl Units {
    pub const fn weight_label(self) -> &'static str {
        match self {
            Self::Metric => "kg",
            Self::Imperial => "lbs",
        }
    }

    /// Converts a stored kg value for display.
    pub fn weight_from_kg(self, kg: f64) -> f64 {
        match self {
            Self::Metric => kg,
            Self::Imperial => kg * KG_TO_LBS,
        }
    }

    /// Converts user input in these units to kg for storage.
    pub fn weight_to_kg(self, value: f64) -> f64 {
        match self {
            Self::Metric => value,
            Self::Imperial => value / KG_TO_LBS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

// Define standard colors using strum for easy iteration/parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum StandardColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    DarkGrey,
    DarkRed,
    DarkGreen,
    DarkYellow,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    Grey,
}

impl From<StandardColor> for Color {
    fn from(value: StandardColor) -> Self {
        match value {
            StandardColor::Black => Self::Black,
            StandardColor::Red => Self::Red,
            StandardColor::Green => Self::Green,
            StandardColor::Yellow => Self::Yellow,
            StandardColor::Blue => Self::Blue,
            StandardColor::Magenta => Self::Magenta,
            StandardColor::Cyan => Self::Cyan,
            StandardColor::White => Self::White,
            StandardColor::DarkGrey => Self::DarkGrey,
            StandardColor::DarkRed => Self::DarkRed,
            StandardColor::DarkGreen => Self::DarkGreen,
            StandardColor::DarkYellow => Self::DarkYellow,
            StandardColor::DarkBlue => Self::DarkBlue,
            StandardColor::DarkMagenta => Self::DarkMagenta,
            StandardColor::DarkCyan => Self::DarkCyan,
            StandardColor::Grey => Self::Grey,
        }
    }
}

/// Parses a colour name case-insensitively.
/// # Errors
/// Returns `Error::InvalidColor` for unknown names.
pub fn parse_color(color_str: &str) -> Result<StandardColor, Error> {
    StandardColor::iter()
        .find(|color| format!("{color:?}").eq_ignore_ascii_case(color_str.trim()))
        .ok_or_else(|| Error::InvalidColor(color_str.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Theme {
    pub mode: ThemeMode,
    pub header_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            mode: ThemeMode::Light,
            header_color: "Red".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub units: Units,
    pub theme: Theme,
    pub language: String,

    // Reminders
    pub notifications: bool,
    pub workout_reminders: bool,
    pub rest_time_reminders: bool,

    pub streak_interval_days: u32, // Default 1

    // Defaults for exercises added to a new workout
    pub default_sets: u32,
    pub default_reps: u32,
    pub default_rest_seconds: u32,

    /// Seed the sample catalog when the exercise list is empty after load.
    pub seed_sample_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            units: Units::default(),
            theme: Theme::default(),
            language: "en".to_string(),
            notifications: true,
            workout_reminders: true,
            rest_time_reminders: true,
            streak_interval_days: 1,
            default_sets: 3,
            default_reps: 10,
            default_rest_seconds: 60,
            seed_sample_data: true,
        }
    }
}

impl Config {
    /// Checks values a hand-edited file could get wrong.
    /// # Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.streak_interval_days == 0 {
            return Err(Error::InvalidStreakInterval(0));
        }
        if self.default_sets == 0 {
            return Err(Error::InvalidPlanDefault(
                "default_sets must be at least 1".to_string(),
            ));
        }
        if self.default_reps == 0 {
            return Err(Error::InvalidPlanDefault(
                "default_reps must be at least 1".to_string(),
            ));
        }
        parse_color(&self.theme.header_color)?;
        Ok(())
    }

    pub fn header_color(&self) -> Color {
        parse_color(&self.theme.header_color).map_or(Color::Red, Color::from)
    }
}

/// Determines the path to the configuration file.
/// Exposed at crate root as `get_config_path_util`
/// # Errors
/// Returns `Error` if no config directory can be found or created.
pub fn get_config_path() -> Result<PathBuf, Error> {
    let config_dir_override = std::env::var(CONFIG_ENV_VAR).ok();

    let config_dir_path = if let Some(path_str) = config_dir_override {
        let path = PathBuf::from(path_str);
        if !path.is_dir() {
            log::warn!(
                "{CONFIG_ENV_VAR} points to '{}', which is not a directory. Trying to create it.",
                path.display()
            );
            fs::create_dir_all(&path)?;
        }
        path
    } else {
        let base_config_dir = dirs::config_dir().ok_or(Error::CannotDetermineConfigDir)?;
        base_config_dir.join(APP_CONFIG_DIR)
    };

    if !config_dir_path.exists() {
        fs::create_dir_all(&config_dir_path)?;
    }

    Ok(config_dir_path.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from the TOML file at the given path.
/// A missing file is created with defaults.
/// Exposed at crate root as `load_config_util`
/// # Errors
/// Returns `Error` on I/O, parse or validation failures.
pub fn load(config_path: &Path) -> Result<Config, Error> {
    if config_path.exists() {
        let config_content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    } else {
        let default_config = Config::default();
        save(config_path, &default_config)?;
        Ok(default_config)
    }
}

/// Saves the configuration to the TOML file.
/// Exposed at crate root as `save_config_util`
/// # Errors
/// Returns `Error` on I/O or serialization failures.
pub fn save(config_path: &Path, config: &Config) -> Result<(), Error> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }
    let config_content = toml::to_string_pretty(config)?;
    fs::write(config_path, config_content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "units = \"imperial\"\ndefault_rest_seconds = 90\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.units, Units::Imperial);
        assert_eq!(config.default_rest_seconds, 90);
        assert_eq!(config.default_sets, 3);
        assert_eq!(config.theme, Theme::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        fs::write(&path, "streak_interval_days = 0\n").unwrap();
        assert!(matches!(load(&path), Err(Error::InvalidStreakInterval(0))));

        fs::write(&path, "[theme]\nheader_color = \"Chartreuse\"\n").unwrap();
        assert!(matches!(load(&path), Err(Error::InvalidColor(_))));
    }

    #[test]
    fn test_save_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        let config = Config {
            units: Units::Imperial,
            theme: Theme {
                mode: ThemeMode::Dark,
                header_color: "cyan".to_string(),
            },
            rest_time_reminders: false,
            ..Default::default()
        };

        save(&path, &config).unwrap();
        assert_eq!(load(&path).unwrap(), config);
    }

    #[test]
    fn test_units_conversion() {
        assert_eq!(Units::Metric.weight_from_kg(80.0), 80.0);
        let lbs = Units::Imperial.weight_from_kg(100.0);
        assert!((lbs - 220.462).abs() < 1e-9);
        assert!((Units::Imperial.weight_to_kg(lbs) - 100.0).abs() < 1e-9);
    }
}
