//! Render configuration
//!
//! Defaults for everything the CLI and timeline need that is not part of an
//! individual effect's settings. Loadable from a JSON file; missing fields
//! take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::EncodingAlgorithm;
use crate::error::{DatabendError, Result};

/// Configuration shared by rendering commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Companding table used to reinterpret image bytes
    pub encoding: EncodingAlgorithm,
    /// Frames rendered for each transition
    pub frames_per_transition: usize,
    /// Animation frame rate, also the envelope's target rate
    pub frame_rate: f64,
    /// Moving-average window for envelope extraction, in samples
    pub smoothing_window: usize,
    /// Requests the render worker will queue before `submit` blocks
    pub queue_capacity: usize,
    /// Default scale applied to an audio link's envelope
    pub link_amount: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            encoding: EncodingAlgorithm::MuLaw,
            frames_per_transition: 10,
            frame_rate: 30.0,
            smoothing_window: 1024,
            queue_capacity: 4,
            link_amount: 1.0,
        }
    }
}

impl RenderConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| DatabendError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        let config: RenderConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.frames_per_transition == 0 {
            return Err(DatabendError::InvalidConfig {
                reason: "frames_per_transition must be at least 1".to_string(),
            });
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(DatabendError::InvalidConfig {
                reason: format!("frame_rate must be positive, got {}", self.frame_rate),
            });
        }
        if self.queue_capacity == 0 {
            return Err(DatabendError::InvalidConfig {
                reason: "queue_capacity must be at least 1".to_string(),
            });
        }
        if !self.link_amount.is_finite() {
            return Err(DatabendError::InvalidConfig {
                reason: "link_amount must be finite".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"encoding":"a-law","frames_per_transition":24}"#).unwrap();

        let config = RenderConfig::load(&path).unwrap();
        assert_eq!(config.encoding, EncodingAlgorithm::ALaw);
        assert_eq!(config.frames_per_transition, 24);
        assert_eq!(config.frame_rate, 30.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"frame_rate":0}"#).unwrap();

        let err = RenderConfig::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_missing_file() {
        let err = RenderConfig::load(Path::new("/no/such/config.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }
}
