//! Configuration for Janitor operations
//!
//! Defines inactivity thresholds per policy and the sweep interval.

use crate::JanitorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Janitor service
///
/// Controls the warn/abandon window, dormancy, the stale listing, sweep
/// interval, and dry-run mode.
///
/// # Examples
///
/// ```
/// use solvr_janitor::JanitorConfig;
///
/// // Default configuration: warn at 23 days, abandon at 30
/// let config = JanitorConfig::default();
/// assert_eq!(config.abandon_threshold_hours, 30 * 24);
///
/// // Aggressive cleanup
/// let config = JanitorConfig::aggressive();
/// assert_eq!(config.abandon_threshold_hours, 7 * 24);
///
/// // Lenient cleanup
/// let config = JanitorConfig::lenient();
/// assert_eq!(config.abandon_threshold_hours, 60 * 24);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JanitorConfig {
    /// Inactivity after which the author is warned (in hours)
    /// Default: 23 days, one week before abandonment
    pub warning_threshold_hours: u64,

    /// Inactivity after which a working/starting approach is abandoned (in hours)
    /// Default: 30 days
    pub abandon_threshold_hours: u64,

    /// Age after which an open problem with no approaches goes dormant (in days)
    /// Default: 60 days
    pub dormant_threshold_days: u64,

    /// Failed approaches idle this long are listed as stale (in days)
    /// Default: 90 days
    pub failed_after_days: u32,

    /// Superseded approaches idle this long are listed as stale (in days)
    /// Default: 180 days
    pub superseded_after_days: u32,

    /// How often to run the sweep cycle (in minutes)
    /// Default: once a day
    pub sweep_interval_minutes: u64,

    /// Dry-run mode: count candidates without changing anything
    /// Default: false
    pub dry_run: bool,
}

impl Default for JanitorConfig {
    /// Create default configuration
    ///
    /// - Warning: 23 days
    /// - Abandon: 30 days
    /// - Dormant: 60 days
    /// - Stale listing: 90 days failed, 180 days superseded
    /// - Sweep interval: 24 hours
    fn default() -> Self {
        Self {
            warning_threshold_hours: 23 * 24,
            abandon_threshold_hours: 30 * 24,
            dormant_threshold_days: 60,
            failed_after_days: 90,
            superseded_after_days: 180,
            sweep_interval_minutes: 24 * 60,
            dry_run: false,
        }
    }
}

impl JanitorConfig {
    /// Aggressive cleanup configuration (short windows, hourly sweeps)
    ///
    /// Suitable for busy deployments where abandoned work piles up quickly.
    ///
    /// - Warning: 5 days
    /// - Abandon: 7 days
    /// - Dormant: 30 days
    /// - Sweep interval: 60 minutes
    pub fn aggressive() -> Self {
        Self {
            warning_threshold_hours: 5 * 24,
            abandon_threshold_hours: 7 * 24,
            dormant_threshold_days: 30,
            failed_after_days: 30,
            superseded_after_days: 60,
            sweep_interval_minutes: 60,
            dry_run: false,
        }
    }

    /// Lenient cleanup configuration (long windows)
    ///
    /// Suitable for small communities where approaches move slowly.
    ///
    /// - Warning: 53 days
    /// - Abandon: 60 days
    /// - Dormant: 120 days
    /// - Sweep interval: 24 hours
    pub fn lenient() -> Self {
        Self {
            warning_threshold_hours: 53 * 24,
            abandon_threshold_hours: 60 * 24,
            dormant_threshold_days: 120,
            failed_after_days: 180,
            superseded_after_days: 365,
            sweep_interval_minutes: 24 * 60,
            dry_run: false,
        }
    }

    /// Look up a preset by name (`default`, `aggressive`, `lenient`)
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "aggressive" => Some(Self::aggressive()),
            "lenient" => Some(Self::lenient()),
            _ => None,
        }
    }

    /// Check that the thresholds make sense together
    pub fn validate(&self) -> Result<(), JanitorError> {
        if self.warning_threshold_hours == 0 {
            return Err(JanitorError::Config("warning_threshold_hours must be positive".to_string()));
        }
        if self.warning_threshold_hours >= self.abandon_threshold_hours {
            return Err(JanitorError::Config(format!(
                "warning_threshold_hours ({}) must be less than abandon_threshold_hours ({})",
                self.warning_threshold_hours, self.abandon_threshold_hours
            )));
        }
        if self.dormant_threshold_days == 0 {
            return Err(JanitorError::Config("dormant_threshold_days must be positive".to_string()));
        }
        if self.sweep_interval_minutes == 0 {
            return Err(JanitorError::Config("sweep_interval_minutes must be positive".to_string()));
        }
        Ok(())
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes * 60)
    }

    /// Get warning threshold as Duration
    pub fn warning_threshold(&self) -> Duration {
        Duration::from_secs(self.warning_threshold_hours * 3600)
    }

    /// Get abandon threshold as Duration
    pub fn abandon_threshold(&self) -> Duration {
        Duration::from_secs(self.abandon_threshold_hours * 3600)
    }

    /// Get dormant threshold as Duration
    pub fn dormant_threshold(&self) -> Duration {
        Duration::from_secs(self.dormant_threshold_days * 86400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JanitorConfig::default();
        assert_eq!(config.warning_threshold_hours, 552);
        assert_eq!(config.abandon_threshold_hours, 720);
        assert_eq!(config.dormant_threshold_days, 60);
        assert_eq!(config.failed_after_days, 90);
        assert_eq!(config.superseded_after_days, 180);
        assert_eq!(config.sweep_interval_minutes, 1440);
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        for name in ["default", "aggressive", "lenient"] {
            let config = JanitorConfig::preset(name).unwrap();
            assert!(config.validate().is_ok(), "{} preset should validate", name);
        }
        assert!(JanitorConfig::preset("reckless").is_none());
        assert!(
            JanitorConfig::aggressive().abandon_threshold_hours
                < JanitorConfig::default().abandon_threshold_hours
        );
        assert!(
            JanitorConfig::lenient().abandon_threshold_hours
                > JanitorConfig::default().abandon_threshold_hours
        );
    }

    #[test]
    fn test_warning_must_precede_abandon() {
        let config = JanitorConfig {
            warning_threshold_hours: 720,
            abandon_threshold_hours: 720,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(JanitorError::Config(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = JanitorConfig {
            sweep_interval_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_conversions() {
        let config = JanitorConfig::default();

        assert_eq!(config.sweep_interval(), Duration::from_secs(24 * 3600));
        assert_eq!(config.warning_threshold(), Duration::from_secs(23 * 86400));
        assert_eq!(config.abandon_threshold(), Duration::from_secs(30 * 86400));
        assert_eq!(config.dormant_threshold(), Duration::from_secs(60 * 86400));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: JanitorConfig = toml::from_str("dry_run = true\nabandon_threshold_hours = 48").unwrap();
        assert!(config.dry_run);
        assert_eq!(config.abandon_threshold_hours, 48);
        assert_eq!(config.warning_threshold_hours, 552);
        // Valid TOML, invalid policy
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = JanitorConfig::lenient();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: JanitorConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
