use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use invigilate_core::detection::infrastructure::onnx_face_detector::DEFAULT_CONFIDENCE;
use invigilate_core::session::domain::session_config::{DisplayMode, SessionConfig};
use invigilate_core::shared::constants::{
    DEFAULT_CAMERA, DEFAULT_EVIDENCE_DIR, DEFAULT_EVIDENCE_INTERVAL_SECS, DEFAULT_LOGS_DIR,
    DEFAULT_TOLERANCE,
};

/// Operator settings persisted between runs. Missing fields take their
/// defaults so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: String,
    pub tolerance: u32,
    pub evidence_interval_secs: f64,
    pub display_mode: DisplayMode,
    pub confidence: f64,
    pub logs_dir: PathBuf,
    pub evidence_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: DEFAULT_CAMERA.to_string(),
            tolerance: DEFAULT_TOLERANCE,
            evidence_interval_secs: DEFAULT_EVIDENCE_INTERVAL_SECS,
            display_mode: DisplayMode::Exam,
            confidence: DEFAULT_CONFIDENCE,
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
            evidence_dir: PathBuf::from(DEFAULT_EVIDENCE_DIR),
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("InvigilateAI").join("settings.json"))
    }

    /// Loads settings from `path`. A missing file yields the defaults; an
    /// unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid settings file {}: {e}", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Checks the merged settings and returns the session configuration
    /// they describe. Nothing is saved or used before this passes.
    pub fn validate(&self) -> Result<SessionConfig, Box<dyn std::error::Error>> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )
            .into());
        }
        let config = self.session_config();
        config.validate()?;
        Ok(config)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tolerance: self.tolerance,
            evidence_interval_secs: self.evidence_interval_secs,
            display_mode: self.display_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.session_config(), SessionConfig::default());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            tolerance: 25,
            evidence_interval_secs: 10.0,
            display_mode: DisplayMode::Debug,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"tolerance": 15, "display_mode": "debug"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.tolerance, 15);
        assert_eq!(settings.display_mode, DisplayMode::Debug);
        assert_eq!(settings.evidence_interval_secs, DEFAULT_EVIDENCE_INTERVAL_SECS);
        assert_eq!(settings.logs_dir, PathBuf::from(DEFAULT_LOGS_DIR));
    }

    #[test]
    fn test_validate_rejects_bad_merged_values() {
        let zero_tolerance = Settings {
            tolerance: 0,
            ..Settings::default()
        };
        assert!(zero_tolerance.validate().is_err());

        let huge_interval = Settings {
            evidence_interval_secs: 1e20,
            ..Settings::default()
        };
        assert!(huge_interval.validate().is_err());

        assert_eq!(Settings::default().validate().unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_confidence_from_file_is_range_checked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"confidence": 1.7}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("Confidence"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }
}
