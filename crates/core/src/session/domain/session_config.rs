use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_EVIDENCE_INTERVAL_SECS, DEFAULT_TOLERANCE, RECOMMENDED_EVIDENCE_INTERVAL_SECS,
    RECOMMENDED_TOLERANCE,
};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("absence tolerance must be a positive number of ticks, got {0}")]
    NonPositiveTolerance(u32),
    #[error("evidence interval must be a positive number of seconds, got {0}")]
    NonPositiveInterval(f64),
    #[error("evidence interval of {0} seconds is too large")]
    IntervalOutOfRange(f64),
    #[error("unknown display mode '{0}', expected 'exam' or 'debug'")]
    UnknownDisplayMode(String),
}

/// What the display overlay shows. Never affects classification or capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Status indicator and face boxes only.
    #[default]
    Exam,
    /// Adds detection count and absence counter.
    Debug,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Exam => write!(f, "exam"),
            DisplayMode::Debug => write!(f, "debug"),
        }
    }
}

impl FromStr for DisplayMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exam" => Ok(DisplayMode::Exam),
            "debug" => Ok(DisplayMode::Debug),
            _ => Err(ConfigError::UnknownDisplayMode(s.to_string())),
        }
    }
}

/// Operator-tunable parameters, fixed for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Consecutive empty ticks tolerated before `Absent`.
    pub tolerance: u32,
    /// Minimum seconds between two evidence captures.
    pub evidence_interval_secs: f64,
    #[serde(default)]
    pub display_mode: DisplayMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            evidence_interval_secs: DEFAULT_EVIDENCE_INTERVAL_SECS,
            display_mode: DisplayMode::Exam,
        }
    }
}

impl SessionConfig {
    /// Rejects unusable values. Out-of-range but usable values are
    /// accepted as given, with a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tolerance == 0 {
            return Err(ConfigError::NonPositiveTolerance(self.tolerance));
        }
        self.evidence_interval()?;

        let (lo, hi) = RECOMMENDED_TOLERANCE;
        if !(lo..=hi).contains(&self.tolerance) {
            log::warn!(
                "Absence tolerance {} is outside the recommended range {lo}-{hi}",
                self.tolerance
            );
        }
        let (lo, hi) = RECOMMENDED_EVIDENCE_INTERVAL_SECS;
        if !(lo..=hi).contains(&self.evidence_interval_secs) {
            log::warn!(
                "Evidence interval {}s is outside the recommended range {lo}-{hi}s",
                self.evidence_interval_secs
            );
        }
        Ok(())
    }

    /// The interval as a `Duration`; fails for values `validate` rejects.
    pub fn evidence_interval(&self) -> Result<Duration, ConfigError> {
        let secs = self.evidence_interval_secs;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ConfigError::NonPositiveInterval(secs));
        }
        Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::IntervalOutOfRange(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config(tolerance: u32, interval: f64) -> SessionConfig {
        SessionConfig {
            tolerance,
            evidence_interval_secs: interval,
            display_mode: DisplayMode::Exam,
        }
    }

    #[test]
    fn test_default_is_valid() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.tolerance, 40);
        assert_eq!(cfg.evidence_interval(), Ok(Duration::from_secs(6)));
        assert!(cfg.validate().is_ok());
    }

    #[rstest]
    #[case::zero_tolerance(config(0, 6.0), ConfigError::NonPositiveTolerance(0))]
    #[case::zero_interval(config(40, 0.0), ConfigError::NonPositiveInterval(0.0))]
    #[case::negative_interval(config(40, -2.0), ConfigError::NonPositiveInterval(-2.0))]
    #[case::infinite_interval(
        config(40, f64::INFINITY),
        ConfigError::NonPositiveInterval(f64::INFINITY)
    )]
    #[case::unrepresentable_interval(config(40, 1e20), ConfigError::IntervalOutOfRange(1e20))]
    fn test_invalid_values_rejected(#[case] cfg: SessionConfig, #[case] expected: ConfigError) {
        assert_eq!(cfg.validate().unwrap_err(), expected);
    }

    #[test]
    fn test_unrepresentable_interval_has_no_duration() {
        assert_eq!(
            config(40, 1e20).evidence_interval(),
            Err(ConfigError::IntervalOutOfRange(1e20))
        );
    }

    #[test]
    fn test_nan_interval_rejected() {
        assert!(matches!(
            config(40, f64::NAN).validate(),
            Err(ConfigError::NonPositiveInterval(_))
        ));
    }

    #[rstest]
    #[case::tiny_tolerance(config(1, 6.0))]
    #[case::huge_tolerance(config(500, 6.0))]
    #[case::short_interval(config(40, 0.5))]
    fn test_out_of_range_values_are_kept_not_clamped(#[case] cfg: SessionConfig) {
        let before = cfg.clone();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg, before);
    }

    #[test]
    fn test_display_mode_parsing() {
        assert_eq!("exam".parse::<DisplayMode>().unwrap(), DisplayMode::Exam);
        assert_eq!("Debug".parse::<DisplayMode>().unwrap(), DisplayMode::Debug);
        assert!(matches!(
            "kiosk".parse::<DisplayMode>(),
            Err(ConfigError::UnknownDisplayMode(_))
        ));
    }

    #[test]
    fn test_json_without_mode_defaults_to_exam() {
        let cfg: SessionConfig =
            serde_json::from_str(r#"{"tolerance": 25, "evidence_interval_secs": 4.5}"#).unwrap();
        assert_eq!(cfg.tolerance, 25);
        assert_eq!(cfg.display_mode, DisplayMode::Exam);
    }
}
