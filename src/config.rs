//! Scenario configuration with YAML schema and validation.
//!
//! This is the interface-layer contract with the external parameter
//! collector: percent magnitudes and month offsets arrive here and are
//! converted to fractional magnitudes (/100) and fractional years (/12)
//! before reaching the model. Schema-level constraints are enforced with
//! `validator` derives; cross-field consistency is checked separately in
//! [`ScenarioConfig::validate_semantic`].
//!
//! The reference UI caps shocks and stimuli at five sectors each; that is
//! a presentation-layer constraint, so no entry limit exists here.

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::ModelResult;
use crate::forcing::Pulse;
use crate::matrix::Direction;
use crate::model::RecoveryMode;

/// One sector's shock or stimulus as collected from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SectorPulseConfig {
    /// Sector label, resolved against the model's economy at run time.
    #[validate(length(min = 1))]
    pub sector: String,
    /// Relative magnitude as a percentage, -100 to 100.
    #[validate(range(min = -100.0, max = 100.0))]
    pub magnitude_percent: f64,
    /// First active month (offset from simulation start).
    pub start_month: u32,
    /// Last active month.
    pub end_month: u32,
}

impl SectorPulseConfig {
    /// Convert to core units: months / 12, percent / 100.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ModelError::Config`] on an inverted interval.
    pub fn pulse(&self) -> ModelResult<Pulse> {
        Pulse::new(
            f64::from(self.start_month) / 12.0,
            f64::from(self.end_month) / 12.0,
            self.magnitude_percent / 100.0,
        )
    }
}

/// An economy-wide shock or stimulus as collected from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PulseConfig {
    /// Relative magnitude as a percentage, -100 to 100.
    #[validate(range(min = -100.0, max = 100.0))]
    pub magnitude_percent: f64,
    /// First active month.
    pub start_month: u32,
    /// Last active month.
    pub end_month: u32,
}

impl PulseConfig {
    /// Convert to core units: months / 12, percent / 100.
    ///
    /// The additional economy-wide magnitude / 12 convention is applied by
    /// the model's spec builders, not here.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ModelError::Config`] on an inverted interval.
    pub fn pulse(&self) -> ModelResult<Pulse> {
        Pulse::new(
            f64::from(self.start_month) / 12.0,
            f64::from(self.end_month) / 12.0,
            self.magnitude_percent / 100.0,
        )
    }
}

/// Recovery strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RecoveryConfig {
    /// Targeted per-sector stimuli or an evenly spread stimulus.
    pub mode: RecoveryMode,
    /// Targeted stimuli; required non-empty in targeted mode.
    #[validate(nested)]
    #[serde(default)]
    pub sectors: Vec<SectorPulseConfig>,
    /// Spread stimulus; required in spread mode.
    #[validate(nested)]
    #[serde(default)]
    pub stimulus: Option<PulseConfig>,
}

/// Full per-run scenario parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation horizon in whole years, 1 to 8 inclusive.
    #[validate(range(min = 1, max = 8))]
    pub years: u32,

    /// Propagation direction through the supply chain.
    #[serde(default)]
    pub direction: Direction,

    /// Explicit per-sector shocks; later entries override earlier ones for
    /// the same sector.
    #[validate(nested)]
    #[serde(default)]
    pub sector_shocks: Vec<SectorPulseConfig>,

    /// Optional economy-wide shock applied to every sector by default.
    #[validate(nested)]
    #[serde(default)]
    pub economy_wide_shock: Option<PulseConfig>,

    /// Optional recovery stimulus configuration.
    #[validate(nested)]
    #[serde(default)]
    pub recovery: Option<RecoveryConfig>,
}

impl ScenarioConfig {
    /// Load a scenario from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, YAML parsing fails, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> ModelResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a scenario from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> ModelResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        config.validate_semantic()?;
        Ok(config)
    }

    /// Simulation horizon in months (one trajectory sample per month).
    #[must_use]
    pub fn months(&self) -> u32 {
        self.years * 12
    }

    /// Validate cross-field constraints beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ModelError::Config`] on an inverted or
    /// out-of-horizon interval, a targeted recovery without sectors, or a
    /// spread recovery without a stimulus.
    pub fn validate_semantic(&self) -> ModelResult<()> {
        use crate::error::ModelError;

        let months = self.months();
        let check_interval = |what: &str, start: u32, end: u32| -> ModelResult<()> {
            if start > end {
                return Err(ModelError::config(format!(
                    "{what}: start month {start} after end month {end}"
                )));
            }
            if end > months {
                return Err(ModelError::config(format!(
                    "{what}: end month {end} beyond the {months}-month horizon"
                )));
            }
            Ok(())
        };

        for shock in &self.sector_shocks {
            check_interval(
                &format!("shock on '{}'", shock.sector),
                shock.start_month,
                shock.end_month,
            )?;
        }
        if let Some(shock) = &self.economy_wide_shock {
            check_interval("economy-wide shock", shock.start_month, shock.end_month)?;
        }

        if let Some(recovery) = &self.recovery {
            match recovery.mode {
                RecoveryMode::Targeted if recovery.sectors.is_empty() => {
                    return Err(ModelError::config(
                        "targeted recovery requires at least one sector entry",
                    ));
                }
                RecoveryMode::Spread if recovery.stimulus.is_none() => {
                    return Err(ModelError::config(
                        "spread recovery requires a stimulus entry",
                    ));
                }
                _ => {}
            }
            for stimulus in &recovery.sectors {
                check_interval(
                    &format!("stimulus on '{}'", stimulus.sector),
                    stimulus.start_month,
                    stimulus.end_month,
                )?;
            }
            if let Some(stimulus) = &recovery.stimulus {
                check_interval("spread stimulus", stimulus.start_month, stimulus.end_month)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_SCENARIO: &str = r"
years: 2
direction: upstream
sector_shocks:
  - sector: Energy
    magnitude_percent: -20.0
    start_month: 0
    end_month: 6
economy_wide_shock:
  magnitude_percent: -5.0
  start_month: 0
  end_month: 12
recovery:
  mode: spread
  stimulus:
    magnitude_percent: 10.0
    start_month: 0
    end_month: 12
";

    #[test]
    fn test_from_yaml_full_scenario() {
        let config = ScenarioConfig::from_yaml(FULL_SCENARIO).unwrap();

        assert_eq!(config.years, 2);
        assert_eq!(config.months(), 24);
        assert_eq!(config.direction, Direction::Upstream);
        assert_eq!(config.sector_shocks.len(), 1);
        assert!(config.economy_wide_shock.is_some());
        let recovery = config.recovery.unwrap();
        assert_eq!(recovery.mode, RecoveryMode::Spread);
        assert!(recovery.stimulus.is_some());
    }

    #[test]
    fn test_minimal_scenario_defaults() {
        let config = ScenarioConfig::from_yaml("years: 1").unwrap();

        assert_eq!(config.direction, Direction::Upstream);
        assert!(config.sector_shocks.is_empty());
        assert!(config.economy_wide_shock.is_none());
        assert!(config.recovery.is_none());
    }

    #[test]
    fn test_unit_conversions() {
        let shock = SectorPulseConfig {
            sector: "Energy".to_string(),
            magnitude_percent: -20.0,
            start_month: 0,
            end_month: 6,
        };
        let pulse = shock.pulse().unwrap();

        assert!((pulse.start - 0.0).abs() < f64::EPSILON);
        assert!((pulse.end - 0.5).abs() < f64::EPSILON);
        assert!((pulse.magnitude - (-0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_horizon_out_of_range() {
        assert!(ScenarioConfig::from_yaml("years: 0").is_err());
        assert!(ScenarioConfig::from_yaml("years: 9").is_err());
        assert!(ScenarioConfig::from_yaml("years: 8").is_ok());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(ScenarioConfig::from_yaml("years: 2\nhorizon: 3").is_err());
    }

    #[test]
    fn test_rejects_magnitude_out_of_range() {
        let yaml = r"
years: 2
sector_shocks:
  - sector: Energy
    magnitude_percent: -150.0
    start_month: 0
    end_month: 6
";
        assert!(ScenarioConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_rejects_inverted_months() {
        let yaml = r"
years: 2
sector_shocks:
  - sector: Energy
    magnitude_percent: -20.0
    start_month: 8
    end_month: 4
";
        let err = ScenarioConfig::from_yaml(yaml).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("start month"));
    }

    #[test]
    fn test_rejects_months_beyond_horizon() {
        let yaml = r"
years: 1
sector_shocks:
  - sector: Energy
    magnitude_percent: -20.0
    start_month: 0
    end_month: 18
";
        let err = ScenarioConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("beyond"));
    }

    #[test]
    fn test_rejects_targeted_recovery_without_sectors() {
        let yaml = r"
years: 2
recovery:
  mode: targeted
";
        let err = ScenarioConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("targeted recovery"));
    }

    #[test]
    fn test_rejects_spread_recovery_without_stimulus() {
        let yaml = r"
years: 2
recovery:
  mode: spread
";
        let err = ScenarioConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("spread recovery"));
    }

    #[test]
    fn test_targeted_recovery_accepted() {
        let yaml = r"
years: 2
recovery:
  mode: targeted
  sectors:
    - sector: Transport
      magnitude_percent: 10.0
      start_month: 3
      end_month: 12
";
        let config = ScenarioConfig::from_yaml(yaml).unwrap();
        let recovery = config.recovery.unwrap();
        assert_eq!(recovery.mode, RecoveryMode::Targeted);
        assert_eq!(recovery.sectors.len(), 1);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = ScenarioConfig::from_yaml(FULL_SCENARIO).unwrap();
        let dumped = serde_yaml::to_string(&config).unwrap();
        let reparsed = ScenarioConfig::from_yaml(&dumped).unwrap();
        assert_eq!(config, reparsed);
    }
}
