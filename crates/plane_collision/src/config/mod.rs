//! Configuration system

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        match extension(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value was read but is not usable
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Tunables for the collision core
///
/// The pass structure of a frame is fixed and is not part of this struct;
/// only numeric thresholds and diagnostics live here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Smallest non-zero displacement a resolution may produce
    pub resolve_epsilon: f32,

    /// Below this, axes, footprints and centre offsets count as zero
    pub degenerate_epsilon: f32,

    /// Initial capacity for registries and scratch buffers
    pub registry_capacity: usize,

    /// Log every resolved pair at trace level
    pub trace_pairs: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            resolve_epsilon: 0.001,
            degenerate_epsilon: 1e-6,
            registry_capacity: 64,
            trace_pairs: false,
        }
    }
}

impl Config for CollisionConfig {}

impl CollisionConfig {
    /// Reject thresholds the resolver cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("resolve_epsilon", self.resolve_epsilon)?;
        check_positive("degenerate_epsilon", self.degenerate_epsilon)?;
        if self.degenerate_epsilon >= self.resolve_epsilon {
            return Err(ConfigError::Invalid {
                field: "degenerate_epsilon",
                reason: format!(
                    "must be smaller than resolve_epsilon ({})",
                    self.resolve_epsilon
                ),
            });
        }
        Ok(())
    }

    /// Load from file and validate in one step
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite positive number, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("plane_collision_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_default_is_valid() {
        assert!(CollisionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_epsilon() {
        let config = CollisionConfig {
            resolve_epsilon: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "resolve_epsilon", .. })
        ));

        let config = CollisionConfig {
            degenerate_epsilon: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_degenerate_above_resolve() {
        let config = CollisionConfig {
            degenerate_epsilon: 0.01,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CollisionConfig = toml::from_str("trace_pairs = true").unwrap();
        assert!(config.trace_pairs);
        assert_eq!(config.resolve_epsilon, 0.001);
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let path = temp_path("collision.toml");
        let config = CollisionConfig {
            registry_capacity: 8,
            ..Default::default()
        };

        config.save_to_file(&path).unwrap();
        let loaded = CollisionConfig::load_validated(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_file_loads() {
        let path = temp_path("collision.ron");
        std::fs::write(&path, "(resolve_epsilon: 0.002, trace_pairs: true)").unwrap();
        let loaded = CollisionConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.resolve_epsilon, 0.002);
        assert!(loaded.trace_pairs);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = CollisionConfig::default().save_to_file(temp_path("collision.json"));
        assert!(matches!(err, Err(ConfigError::UnsupportedFormat(_))));
    }
}
