//! Scenario runner: from caller parameters to trajectories and losses.
//!
//! Ties the model, integrator, and loss aggregation together for one
//! simulation request. The shock-only run always executes; the
//! shock-plus-recovery run executes only when a recovery is configured,
//! on the identical monthly grid so the two scalar loss figures compare
//! directly. Each invocation is independent and side-effect free; a
//! read-only model may serve concurrent runs.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::{PulseConfig, ScenarioConfig};
use crate::error::ModelResult;
use crate::forcing::Pulse;
use crate::integrator::{PropagationIntegrator, TimeGrid, Trajectory};
use crate::loss::{sector_losses, total_loss};
use crate::model::InterdependencyModel;

/// Everything the presentation layer needs from one simulation request.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    /// Baseline output per sector, for display alongside deviations.
    pub baseline: IndexMap<String, f64>,
    /// Shock-only trajectory.
    pub shock: Trajectory,
    /// Shock-plus-recovery trajectory, when a recovery was configured.
    pub intervention: Option<Trajectory>,
    /// Per-sector loss figures for the shock-only run.
    pub sector_losses: IndexMap<String, f64>,
    /// Scalar total loss without intervention.
    pub total_loss_no_intervention: f64,
    /// Scalar total loss with the configured intervention.
    pub total_loss_intervention: Option<f64>,
}

impl ScenarioOutcome {
    /// Relative improvement of the intervention over doing nothing,
    /// `None` when no recovery was configured or the baseline loss is
    /// zero.
    #[must_use]
    pub fn intervention_improvement(&self) -> Option<f64> {
        let with = self.total_loss_intervention?;
        let without = self.total_loss_no_intervention;
        if without == 0.0 {
            return None;
        }
        Some((with - without) / without.abs())
    }
}

/// Run one full scenario against a model.
///
/// Builds the forcing specs from the configured parameters, integrates the
/// shock-only dynamics, and, when a recovery is configured, integrates the
/// combined dynamics on the same grid and reduces both to comparable
/// scalar losses.
///
/// # Errors
///
/// Propagates configuration errors from spec construction (unknown
/// sectors, missing targeted overrides), dimension errors, and simulation
/// errors from the integrator. Failures abort the whole request.
pub fn run_scenario(
    model: &InterdependencyModel,
    config: &ScenarioConfig,
) -> ModelResult<ScenarioOutcome> {
    let mut overrides: IndexMap<String, Pulse> = IndexMap::new();
    for shock in &config.sector_shocks {
        overrides.insert(shock.sector.clone(), shock.pulse()?);
    }
    let economy_wide = config
        .economy_wide_shock
        .as_ref()
        .map(PulseConfig::pulse)
        .transpose()?;
    let shock_spec = model.build_shock_spec(&overrides, economy_wide)?;

    let recovery_spec = match &config.recovery {
        None => None,
        Some(recovery) => {
            let mut stimuli: IndexMap<String, Pulse> = IndexMap::new();
            for entry in &recovery.sectors {
                stimuli.insert(entry.sector.clone(), entry.pulse()?);
            }
            let spread = recovery
                .stimulus
                .as_ref()
                .map(PulseConfig::pulse)
                .transpose()?;
            let overrides = if stimuli.is_empty() {
                None
            } else {
                Some(&stimuli)
            };
            Some(model.build_recovery_spec(overrides, spread, recovery.mode)?)
        }
    };

    let grid = TimeGrid::monthly(config.years)?;
    let integrator = PropagationIntegrator::default();

    let shock_trajectory = integrator.integrate(model, &shock_spec, None, &grid)?;
    let losses = sector_losses(&shock_trajectory);
    let total_without = total_loss(&shock_trajectory);

    let (intervention, total_with) = match &recovery_spec {
        None => (None, None),
        Some(spec) => {
            let trajectory = integrator.integrate(model, &shock_spec, Some(spec), &grid)?;
            let total = total_loss(&trajectory);
            (Some(trajectory), Some(total))
        }
    };

    let baseline = model
        .sectors()
        .iter()
        .cloned()
        .zip(model.baseline_output().iter().copied())
        .collect();

    Ok(ScenarioOutcome {
        baseline,
        shock: shock_trajectory,
        intervention,
        sector_losses: losses,
        total_loss_no_intervention: total_without,
        total_loss_intervention: total_with,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Direction, InterdependencyMatrix};
    use crate::model::Demand;

    fn two_sector_model() -> InterdependencyModel {
        let matrix = InterdependencyMatrix::new(
            vec!["Energy".to_string(), "Transport".to_string()],
            vec![0.3, 0.1, 0.2, 0.3],
        )
        .unwrap();
        InterdependencyModel::new(matrix, Demand::Unit, Direction::Upstream).unwrap()
    }

    #[test]
    fn test_shock_only_run() {
        let model = two_sector_model();
        let config = ScenarioConfig::from_yaml(
            r"
years: 2
sector_shocks:
  - sector: Energy
    magnitude_percent: -20.0
    start_month: 0
    end_month: 6
",
        )
        .unwrap();

        let outcome = run_scenario(&model, &config).unwrap();

        assert_eq!(outcome.shock.len(), 24);
        assert!(outcome.intervention.is_none());
        assert!(outcome.total_loss_intervention.is_none());
        assert!(outcome.intervention_improvement().is_none());
        assert!(outcome.total_loss_no_intervention < 0.0);
        assert_eq!(outcome.baseline.len(), 2);
        assert!((outcome.baseline["Energy"] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_recovery_run_shares_grid() {
        let model = two_sector_model();
        let config = ScenarioConfig::from_yaml(
            r"
years: 2
sector_shocks:
  - sector: Energy
    magnitude_percent: -20.0
    start_month: 0
    end_month: 6
recovery:
  mode: spread
  stimulus:
    magnitude_percent: 10.0
    start_month: 0
    end_month: 12
",
        )
        .unwrap();

        let outcome = run_scenario(&model, &config).unwrap();

        let intervention = outcome.intervention.as_ref().unwrap();
        assert_eq!(intervention.times(), outcome.shock.times());
        assert!(outcome.total_loss_intervention.is_some());
        // A positive stimulus improves the loss.
        assert!(outcome.intervention_improvement().unwrap() > 0.0);
    }

    #[test]
    fn test_unknown_sector_rejected_before_integration() {
        let model = two_sector_model();
        let config = ScenarioConfig::from_yaml(
            r"
years: 1
sector_shocks:
  - sector: Aerospace
    magnitude_percent: -20.0
    start_month: 0
    end_month: 6
",
        )
        .unwrap();

        let err = run_scenario(&model, &config).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Aerospace"));
    }

    #[test]
    fn test_later_shock_entry_overrides_earlier() {
        let model = two_sector_model();
        let config = ScenarioConfig::from_yaml(
            r"
years: 1
sector_shocks:
  - sector: Energy
    magnitude_percent: -20.0
    start_month: 0
    end_month: 6
  - sector: Energy
    magnitude_percent: -5.0
    start_month: 0
    end_month: 6
",
        )
        .unwrap();

        let outcome = run_scenario(&model, &config).unwrap();
        // Milder override applied: trajectory min stays above the -20% case.
        let energy = outcome.shock.sector_column("Energy").unwrap();
        let deepest = energy.iter().copied().fold(f64::INFINITY, f64::min);
        // A -20% shock would dip below -0.08 here; the -5% override stays
        // well above -0.04.
        assert!(deepest > -0.04, "override not applied, min {deepest}");
    }
}
