//! Application configuration.
//!
//! Loaded from `config.toml` in the platform data directory. Every section
//! falls back to defaults so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What happens to a still-pending award when a completed badge regresses to
/// in-progress because a leader unticked a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionPolicy {
    /// Leave the pending award in place for a leader to review
    #[default]
    KeepPendingAward,
    /// Delete the pending award; awarded badges are never touched
    RetractPendingAward,
}

impl std::fmt::Display for RegressionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegressionPolicy::KeepPendingAward => write!(f, "keep pending award"),
            RegressionPolicy::RetractPendingAward => write!(f, "retract pending award"),
        }
    }
}

/// Member counter that drives a staged badge family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagedCounter {
    NightsAway,
    HikesAway,
}

/// A staged family and the cumulative thresholds that unlock its stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFamily {
    /// Matches `BadgeDefinition::badge_family_id`
    pub family_id: String,
    pub counter: StagedCounter,
    /// Strictly ascending; a stage badge's `stage_number` equals its threshold
    pub thresholds: Vec<u32>,
}

/// Badge engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeSettings {
    pub regression_policy: RegressionPolicy,
    pub staged_families: Vec<StagedFamily>,
}

impl Default for BadgeSettings {
    fn default() -> Self {
        Self {
            regression_policy: RegressionPolicy::default(),
            staged_families: vec![
                StagedFamily {
                    family_id: "nights_away".to_string(),
                    counter: StagedCounter::NightsAway,
                    thresholds: vec![1, 5, 10, 20, 35, 50, 75, 100, 125, 150, 175, 200],
                },
                StagedFamily {
                    family_id: "hikes_away".to_string(),
                    counter: StagedCounter::HikesAway,
                    thresholds: vec![1, 5, 10, 20, 35, 50],
                },
            ],
        }
    }
}

/// Chief Scout Award eligibility settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChiefScoutSettings {
    /// Activity or staged badges needed alongside every challenge badge
    pub activity_badges_required: u32,
}

impl Default for ChiefScoutSettings {
    fn default() -> Self {
        Self {
            activity_badges_required: 6,
        }
    }
}

/// Badge stock settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StockSettings {
    /// Reorder threshold given to stock rows created implicitly
    pub default_minimum_threshold: i64,
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            default_minimum_threshold: 2,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Database file name inside the data directory
    pub database_file: String,
    pub badges: BadgeSettings,
    pub chief_scout: ChiefScoutSettings,
    pub stock: StockSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            database_file: "scoutbadge.db".to_string(),
            badges: BadgeSettings::default(),
            chief_scout: ChiefScoutSettings::default(),
            stock: StockSettings::default(),
        }
    }
}

impl AppConfig {
    /// Full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Staged family settings for a family id.
    pub fn staged_family(&self, family_id: &str) -> Option<&StagedFamily> {
        self.badges
            .staged_families
            .iter()
            .find(|f| f.family_id == family_id)
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_file.trim().is_empty() {
            return Err(ConfigError::Invalid("database_file must not be empty".to_string()));
        }

        for family in &self.badges.staged_families {
            if family.thresholds.first() == Some(&0) {
                return Err(ConfigError::Invalid(format!(
                    "staged family {} has a zero threshold",
                    family.family_id
                )));
            }
            if family.thresholds.windows(2).any(|w| w[0] >= w[1]) {
                return Err(ConfigError::Invalid(format!(
                    "staged family {} thresholds must be strictly ascending",
                    family.family_id
                )));
            }
        }

        Ok(())
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "scoutbadge", "ScoutBadge")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    config.data_dir = get_data_dir();
    Ok(config)
}

/// Load configuration from a specific file; a missing file yields defaults.
///
/// `data_dir` is set to the file's parent directory.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let data_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    if !path.exists() {
        return Ok(AppConfig {
            data_dir,
            ..Default::default()
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;
    config.data_dir = data_dir;

    Ok(config)
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to a specific file.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    config.validate()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
