//! Aggregate output-loss figures via numerical quadrature.
//!
//! Reduces a [`Trajectory`] to the time-integral of each sector column
//! (per-sector figure) or of the economy-wide row sums (scalar figure)
//! using composite Simpson quadrature over the trajectory's own grid. The
//! identical rule is applied to every trajectory, so shock-only and
//! shock-plus-recovery figures compare directly as percentage changes.
//! Pure reductions with no failure path for a valid trajectory.

use indexmap::IndexMap;
use serde::Serialize;

use crate::integrator::Trajectory;

/// A reduced loss figure handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LossFigure {
    /// Time-integral of each sector's deviation, canonical order.
    PerSector(IndexMap<String, f64>),
    /// Time-integral of the economy-wide deviation.
    Total(f64),
}

/// Composite Simpson quadrature of sampled values against sample times.
///
/// Pairs of intervals are integrated with the unequal-interval Simpson
/// rule; an odd interval count closes with a trapezoid tail. Fewer than
/// two samples integrate to zero.
#[must_use]
pub fn simpson(values: &[f64], times: &[f64]) -> f64 {
    debug_assert_eq!(values.len(), times.len());
    let n = values.len().min(times.len());
    if n < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut i = 0;
    while i + 2 < n {
        let h0 = times[i + 1] - times[i];
        let h1 = times[i + 2] - times[i + 1];
        total += (h0 + h1) / 6.0
            * ((2.0 - h1 / h0) * values[i]
                + (h0 + h1).powi(2) / (h0 * h1) * values[i + 1]
                + (2.0 - h0 / h1) * values[i + 2]);
        i += 2;
    }
    if i + 1 < n {
        total += 0.5 * (times[i + 1] - times[i]) * (values[i] + values[i + 1]);
    }
    total
}

/// Per-sector loss figures: the time-integral of each trajectory column.
#[must_use]
pub fn sector_losses(trajectory: &Trajectory) -> IndexMap<String, f64> {
    trajectory
        .sectors()
        .iter()
        .enumerate()
        .map(|(index, sector)| {
            let column = trajectory.column(index);
            (sector.clone(), simpson(&column, trajectory.times()))
        })
        .collect()
}

/// Scalar loss figure: the time-integral of the economy-wide row sums.
#[must_use]
pub fn total_loss(trajectory: &Trajectory) -> f64 {
    simpson(&trajectory.row_sums(), trajectory.times())
}

/// Loss reduction selected by shape, for callers that branch on display.
#[must_use]
pub fn output_loss(trajectory: &Trajectory, per_sector: bool) -> LossFigure {
    if per_sector {
        LossFigure::PerSector(sector_losses(trajectory))
    } else {
        LossFigure::Total(total_loss(trajectory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcing::Pulse;
    use crate::integrator::{PropagationIntegrator, TimeGrid};
    use crate::matrix::{Direction, InterdependencyMatrix};
    use crate::model::{Demand, InterdependencyModel};
    use indexmap::IndexMap;

    fn uniform_times(n: usize, span: f64) -> Vec<f64> {
        (0..n).map(|i| span * i as f64 / (n - 1) as f64).collect()
    }

    fn sample_trajectory() -> Trajectory {
        let matrix = InterdependencyMatrix::new(
            vec!["A".to_string(), "B".to_string()],
            vec![0.3, 0.1, 0.1, 0.3],
        )
        .unwrap();
        let model = InterdependencyModel::new(matrix, Demand::Unit, Direction::Upstream).unwrap();
        let mut overrides = IndexMap::new();
        overrides.insert("A".to_string(), Pulse::new(0.0, 0.5, -0.2).unwrap());
        let spec = model.build_shock_spec(&overrides, None).unwrap();
        let grid = TimeGrid::monthly(2).unwrap();
        PropagationIntegrator::default()
            .integrate(&model, &spec, None, &grid)
            .unwrap()
    }

    #[test]
    fn test_simpson_constant() {
        let times = uniform_times(25, 2.0);
        let values = vec![3.0; 25];
        assert!((simpson(&values, &times) - 6.0).abs() < 1e-12);

        // Odd interval count exercises the trapezoid tail; constants stay
        // exact.
        let times = uniform_times(24, 2.0);
        let values = vec![3.0; 24];
        assert!((simpson(&values, &times) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_simpson_exact_for_cubics() {
        // Simpson integrates cubics exactly on paired uniform intervals.
        let times = uniform_times(25, 2.0);
        let values: Vec<f64> = times.iter().map(|t| t.powi(3) - 2.0 * t).collect();
        // ∫0..2 (t³ - 2t) dt = 4 - 4 = 0
        assert!(simpson(&values, &times).abs() < 1e-12);
    }

    #[test]
    fn test_simpson_unequal_intervals() {
        // Quadratic on a non-uniform grid stays exact for paired intervals.
        let times = vec![0.0, 0.3, 1.0, 1.4, 2.0];
        let values: Vec<f64> = times.iter().map(|t| t * t).collect();
        // ∫0..2 t² dt = 8/3
        assert!((simpson(&values, &times) - 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_simpson_degenerate_inputs() {
        assert!(simpson(&[], &[]).abs() < f64::EPSILON);
        assert!(simpson(&[1.0], &[0.0]).abs() < f64::EPSILON);
        // Two samples fall back to a single trapezoid.
        assert!((simpson(&[1.0, 3.0], &[0.0, 1.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_loss_idempotent() {
        let trajectory = sample_trajectory();

        let first = total_loss(&trajectory);
        let second = total_loss(&trajectory);
        assert!(first.to_bits() == second.to_bits(), "quadrature not pure");

        let a = sector_losses(&trajectory);
        let b = sector_losses(&trajectory);
        assert_eq!(a, b);
    }

    #[test]
    fn test_total_equals_sum_of_sector_losses() {
        let trajectory = sample_trajectory();

        let total = total_loss(&trajectory);
        let by_sector: f64 = sector_losses(&trajectory).values().sum();
        assert!((total - by_sector).abs() < 1e-12);
    }

    #[test]
    fn test_negative_shock_yields_negative_loss() {
        let trajectory = sample_trajectory();

        let losses = sector_losses(&trajectory);
        assert!(losses["A"] < 0.0);
        assert!(total_loss(&trajectory) < 0.0);
    }

    #[test]
    fn test_output_loss_shapes() {
        let trajectory = sample_trajectory();

        match output_loss(&trajectory, true) {
            LossFigure::PerSector(map) => assert_eq!(map.len(), 2),
            LossFigure::Total(_) => panic!("expected per-sector figure"),
        }
        match output_loss(&trajectory, false) {
            LossFigure::Total(value) => {
                assert!((value - total_loss(&trajectory)).abs() < f64::EPSILON);
            }
            LossFigure::PerSector(_) => panic!("expected scalar figure"),
        }
    }
}
