//! Configuration structures for exam block processing.
//!
//! This module provides configuration types for every layer of the workspace:
//!
//! - [`DatasetConfig`] - Defaults for a freshly created dataset
//! - [`AllocationConfig`] - Desk allocation behaviour
//! - [`LayoutConfig`] - Desk map rendering
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`]. Configuration files are
//! JSON; any missing section or field falls back to its default.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Defaults applied to a new, empty dataset.
///
/// # Examples
///
/// ```
/// use eb_core::DatasetConfig;
///
/// let config = DatasetConfig::default();
/// assert_eq!(config.default_title, "Exam Block Model");
/// assert!((config.default_version - 1.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Title given to a dataset that has not been loaded from a file.
    pub default_title: String,

    /// Version given to a dataset that has not been loaded from a file.
    pub default_version: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            default_title: "Exam Block Model".to_owned(),
            default_version: 1.0,
        }
    }
}

/// Configuration for desk allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Clear every desk before allocating a session.
    ///
    /// When `false`, desks that the new layout does not reach keep their
    /// previous occupants.
    pub reset_desks: bool,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self { reset_desks: true }
    }
}

/// Configuration for rendering desk maps.
///
/// # Examples
///
/// ```
/// use eb_core::LayoutConfig;
///
/// assert_eq!(LayoutConfig::default().column_width, 15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of one desk cell in characters.
    pub column_width: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { column_width: 15 }
    }
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use eb_core::Config;
///
/// let config = Config::from_json_str(r#"{ "allocation": { "reset_desks": false } }"#).unwrap();
/// assert!(!config.allocation.reset_desks);
/// assert_eq!(config.layout.column_width, 15);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// New dataset defaults.
    pub dataset: DatasetConfig,

    /// Allocation behaviour.
    pub allocation: AllocationConfig,

    /// Desk map rendering.
    pub layout: LayoutConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON configuration file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        debug!(path = %path, "Loading configuration");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks option values that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.column_width == 0 {
            return Err(ConfigError::InvalidOption {
                option: "layout.column_width".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        if !(self.dataset.default_version > 0.0 && self.dataset.default_version.is_finite()) {
            return Err(ConfigError::InvalidOption {
                option: "dataset.default_version".to_owned(),
                reason: "must be a positive number".to_owned(),
            });
        }
        Ok(())
    }
}
