// SPDX-License-Identifier: GPL-3.0-only

//! Tuning parameters for letter fitting and the touch keyboard panel.
//!
//! Every timing and spacing constant used by the fitter and the panel lives
//! in [`Tuning`]. Values can be loaded from JSON; missing fields fall back to
//! the defaults in [`crate::app_settings`].
//!
//! ```rust,ignore
//! use letterkeys::config::Tuning;
//!
//! let tuning = Tuning::from_json_str(r#"{ "flash_duration_ms": 120 }"#)?;
//! assert_eq!(tuning.flash_duration_ms, 120);
//! assert_eq!(tuning.hide_delay_ms, 360);
//! ```

use crate::app_settings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Timing and spacing parameters shared by the fitter and the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Floor of a reduced letter gap, as a fraction of the base gap.
    pub min_gap_ratio: f64,
    /// Delay before the panel DOM is fully hidden after a hide.
    pub hide_delay_ms: u32,
    /// How long a flashed key stays highlighted.
    pub flash_duration_ms: u32,
    /// Delay after reveal before padding, visibility and fitting are re-run.
    pub settle_delay_ms: u32,
    /// Bottom padding reserved beyond the panel height.
    pub padding_margin_px: f64,
    /// Covering tolerance between an anchor's bottom and the panel top.
    pub cover_threshold_px: f64,
    /// Extra scroll distance when uncovering an anchor.
    pub scroll_extra_px: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_gap_ratio: app_settings::MIN_GAP_RATIO,
            hide_delay_ms: app_settings::HIDE_DELAY_MS,
            flash_duration_ms: app_settings::FLASH_DURATION_MS,
            settle_delay_ms: app_settings::SETTLE_DELAY_MS,
            padding_margin_px: app_settings::PADDING_MARGIN_PX,
            cover_threshold_px: app_settings::COVER_THRESHOLD_PX,
            scroll_extra_px: app_settings::SCROLL_EXTRA_PX,
        }
    }
}

impl Tuning {
    /// Parses tuning from a JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Loads tuning from a JSON file.
    ///
    /// A missing file is not an error: defaults are returned.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let tuning = Self::from_json_str(&contents).map_err(|e| e.with_path(path))?;
                tracing::info!("Loaded tuning from {}", path.display());
                Ok(tuning)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No tuning file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io {
                source: e,
                file_path: Some(path.display().to_string()),
            }),
        }
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_gap_ratio) {
            return Err(ConfigError::invalid(
                "min_gap_ratio",
                format!("must be between 0 and 1, got {}", self.min_gap_ratio),
            ));
        }

        let pixels = [
            ("padding_margin_px", self.padding_margin_px),
            ("cover_threshold_px", self.cover_threshold_px),
            ("scroll_extra_px", self.scroll_extra_px),
        ];
        for (field, value) in pixels {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be a non-negative number, got {}", value),
                ));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Error Handling Types
// ============================================================================

/// Error type for tuning configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        /// The underlying I/O error
        source: std::io::Error,
        /// File that failed to load
        file_path: Option<String>,
    },

    /// The configuration was not valid JSON for [`Tuning`].
    Json {
        /// The underlying JSON error
        source: serde_json::Error,
        /// File being parsed, if any
        file_path: Option<String>,
    },

    /// A value was out of range.
    Invalid {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl ConfigError {
    /// Creates an out-of-range error.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }

    /// Attaches a file path to I/O and JSON errors.
    pub fn with_path(self, path: &Path) -> Self {
        let file_path = Some(path.display().to_string());
        match self {
            Self::Io { source, .. } => Self::Io { source, file_path },
            Self::Json { source, .. } => Self::Json { source, file_path },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { source, file_path } => {
                write!(f, "I/O error")?;
                if let Some(path) = file_path {
                    write!(f, " reading file '{}'", path)?;
                }
                write!(f, ": {}", source)
            }
            ConfigError::Json { source, file_path } => {
                write!(f, "JSON parsing error")?;
                if let Some(path) = file_path {
                    write!(f, " in file '{}'", path)?;
                }
                write!(f, " at line {}: {}", source.line(), source)
            }
            ConfigError::Invalid { field, message } => {
                write!(f, "Invalid tuning value '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            source: err,
            file_path: None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            source: err,
            file_path: None,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Test 1: Defaults match the application constants
    #[test]
    fn test_default_tuning() {
        let tuning = Tuning::default();
        assert_eq!(tuning.min_gap_ratio, 0.4);
        assert_eq!(tuning.hide_delay_ms, 360);
        assert_eq!(tuning.flash_duration_ms, 180);
        assert_eq!(tuning.settle_delay_ms, 200);
        assert_eq!(tuning.padding_margin_px, 36.0);
        assert!(tuning.validate().is_ok());
    }

    /// Test 2: Partial JSON keeps defaults for missing fields
    #[test]
    fn test_partial_json() {
        let tuning = Tuning::from_json_str(r#"{ "flash_duration_ms": 120 }"#).unwrap();
        assert_eq!(tuning.flash_duration_ms, 120);
        assert_eq!(tuning.hide_delay_ms, 360);
        assert_eq!(tuning.min_gap_ratio, 0.4);
    }

    /// Test 3: Out-of-range gap ratio is rejected
    #[test]
    fn test_invalid_gap_ratio() {
        let err = Tuning::from_json_str(r#"{ "min_gap_ratio": 1.5 }"#).unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "min_gap_ratio"),
            other => panic!("unexpected error: {}", other),
        }
    }

    /// Test 4: Negative pixel values are rejected
    #[test]
    fn test_negative_padding_rejected() {
        let err = Tuning::from_json_str(r#"{ "padding_margin_px": -4 }"#).unwrap_err();
        assert!(err.to_string().contains("padding_margin_px"));
    }

    /// Test 5: Malformed JSON reports a JSON error
    #[test]
    fn test_malformed_json() {
        let err = Tuning::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    /// Test 6: Loading from a file
    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "hide_delay_ms": 500, "scroll_extra_px": 10 }}"#).unwrap();

        let tuning = Tuning::load(file.path()).unwrap();
        assert_eq!(tuning.hide_delay_ms, 500);
        assert_eq!(tuning.scroll_extra_px, 10.0);
    }

    /// Test 7: Missing file yields defaults
    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let tuning = Tuning::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(tuning, Tuning::default());
    }

    /// Test 8: File errors carry the path
    #[test]
    fn test_file_error_has_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2").unwrap();

        let err = Tuning::load(file.path()).unwrap_err();
        match &err {
            ConfigError::Json { file_path, .. } => assert!(file_path.is_some()),
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.to_string().contains("in file"));
    }
}
