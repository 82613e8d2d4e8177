#![forbid(unsafe_code)]

//! Controller configuration as data.
//!
//! Options and geometry can be loaded from TOML or JSON so a host can tune
//! paging without recompiling.
//!
//! ```toml
//! # vscroll.toml
//! [options]
//! page_size = 40
//! segment_size = 10
//!
//! [geometry]
//! viewport = 600
//! top_trigger = 120
//! bottom_trigger = 120
//! ```
//!
//! ```rust,ignore
//! let config = ControllerConfig::load_validated_toml_file("vscroll.toml")?;
//! let controller = RangeController::from_config(&config);
//! ```
//!
//! Missing sections and fields take their `Default` values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::{ContainerGeometry, RangeOptions};

/// Everything needed to construct a [`RangeController`](crate::RangeController).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub options: RangeOptions,
    pub geometry: ContainerGeometry,
}

impl ControllerConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load a TOML file and reject it unless [`validate`](Self::validate)
    /// passes.
    pub fn load_validated_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_toml_file(path)?;
        config.into_validated()
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSerialize)
    }

    /// `Ok(self)` if valid, otherwise every problem found.
    pub fn into_validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Check parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let options = &self.options;
        let geometry = &self.geometry;

        if options.page_size == Some(0) {
            errors.push("options.page_size must be > 0 when set".to_string());
        }
        if options.segment_size == 0 {
            errors.push("options.segment_size must be > 0".to_string());
        }
        if let Some(page_size) = options.page_size
            && page_size > 0
            && options.segment_size > page_size
        {
            errors.push(format!(
                "options.segment_size ({}) must not exceed options.page_size ({page_size})",
                options.segment_size
            ));
        }
        if geometry.viewport > 0 {
            if geometry.top_trigger > geometry.viewport {
                errors.push(format!(
                    "geometry.top_trigger ({}) must not exceed geometry.viewport ({})",
                    geometry.top_trigger, geometry.viewport
                ));
            }
            if geometry.bottom_trigger > geometry.viewport {
                errors.push(format!(
                    "geometry.bottom_trigger ({}) must not exceed geometry.viewport ({})",
                    geometry.bottom_trigger, geometry.viewport
                ));
            }
        }
        errors
    }
}

/// Errors from loading or validating a [`ControllerConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// TOML serialization error.
    TomlSerialize(toml::ser::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::TomlSerialize(e) => write!(f, "TOML serialize error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::TomlSerialize(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ControllerConfig::default().validate().is_empty());
    }

    #[test]
    fn toml_partial_sections_use_defaults() {
        let config = ControllerConfig::from_toml_str(
            r#"
            [options]
            page_size = 40

            [geometry]
            viewport = 600
            "#,
        )
        .unwrap();
        assert_eq!(config.options.page_size, Some(40));
        assert_eq!(config.options.segment_size, 1);
        assert_eq!(config.geometry.viewport, 600);
        assert_eq!(config.geometry.top_trigger, 0);
    }

    #[test]
    fn json_round_trip_through_toml() {
        let json = concat!(
            r#"{"options":{"page_size":20,"segment_size":5},"#,
            r#""geometry":{"viewport":300,"scroll":900}}"#,
        );
        let config = ControllerConfig::from_json_str(json).unwrap();
        let toml = config.to_toml_string().unwrap();
        assert_eq!(ControllerConfig::from_toml_str(&toml).unwrap(), config);
    }

    #[test]
    fn validation_collects_every_problem() {
        let config = ControllerConfig {
            options: RangeOptions {
                page_size: Some(0),
                segment_size: 0,
                insert_overflow: 0,
            },
            geometry: ContainerGeometry::new(100, 0).with_triggers(150, 10),
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(matches!(config.into_validated(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn segment_larger_than_page_is_rejected() {
        let config = ControllerConfig {
            options: RangeOptions::paged(5).with_segment_size(8),
            geometry: ContainerGeometry::default(),
        };
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn bad_toml_reports_parse_error() {
        let err = ControllerConfig::from_toml_str("[options\npage_size = 1").unwrap_err();
        assert!(err.to_string().starts_with("TOML parse error"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ControllerConfig::from_toml_file("/nonexistent/vscroll.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn loads_validated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vscroll.toml");
        std::fs::write(&path, "[options]\npage_size = 30\nsegment_size = 10\n").unwrap();
        let config = ControllerConfig::load_validated_toml_file(&path).unwrap();
        assert_eq!(config.options.page_size, Some(30));

        std::fs::write(&path, "[options]\npage_size = 0\n").unwrap();
        assert!(matches!(
            ControllerConfig::load_validated_toml_file(&path),
            Err(ConfigError::Validation(_))
        ));
    }
}
