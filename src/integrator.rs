//! Numerical integration of the propagation dynamics.
//!
//! Integrates the linear relaxation law
//!
//! ```text
//! dy/dt = (A - I)·y + shock(t) [+ recovery(t)],    y(0) = 0
//! ```
//!
//! over a shared, strictly increasing time grid using an embedded
//! Cash-Karp 4(5) Runge-Kutta pair with classic step-size control. The
//! forcing is piecewise constant; the solver evaluates it pointwise and
//! relies on its error estimate to step through interval boundaries, so
//! discontinuities shrink the local step rather than being detected
//! explicitly. Integration restarts at every grid sample, which keeps the
//! shock-only and shock-plus-recovery runs on the identical grid.

use serde::Serialize;

use crate::error::{ModelError, ModelResult};
use crate::forcing::ForcingSpec;
use crate::model::InterdependencyModel;

// Cash-Karp 4(5) tableau (Numerical Recipes coefficients).
const STAGES: usize = 6;
const C: [f64; STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 3.0 / 5.0, 1.0, 7.0 / 8.0];
const A2: [f64; 1] = [1.0 / 5.0];
const A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
const A4: [f64; 3] = [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0];
const A5: [f64; 4] = [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0];
const A6: [f64; 5] = [
    1631.0 / 55296.0,
    175.0 / 512.0,
    575.0 / 13824.0,
    44275.0 / 110592.0,
    253.0 / 4096.0,
];
const A: [&[f64]; STAGES] = [&[], &A2, &A3, &A4, &A5, &A6];
/// Fifth-order solution weights.
const B5: [f64; STAGES] = [
    37.0 / 378.0,
    0.0,
    250.0 / 621.0,
    125.0 / 594.0,
    0.0,
    512.0 / 1771.0,
];
/// Embedded fourth-order weights, for the error estimate.
const B4: [f64; STAGES] = [
    2825.0 / 27648.0,
    0.0,
    18575.0 / 48384.0,
    13525.0 / 55296.0,
    277.0 / 14336.0,
    1.0 / 4.0,
];

const SAFETY: f64 = 0.9;
const GROW_EXPONENT: f64 = -0.2;
const SHRINK_EXPONENT: f64 = -0.25;
const MAX_GROW: f64 = 5.0;
const MIN_SHRINK: f64 = 0.1;

/// Strictly increasing sequence of sample times (fractional years).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeGrid {
    points: Vec<f64>,
}

impl TimeGrid {
    /// Monthly grid over a horizon of whole years: `years * 12` samples,
    /// evenly spaced over `[0, years]` with both endpoints included.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if `years` is zero.
    pub fn monthly(years: u32) -> ModelResult<Self> {
        if years == 0 {
            return Err(ModelError::config("horizon must be at least one year"));
        }
        let samples = (years * 12) as usize;
        let span = f64::from(years);
        let step = span / (samples - 1) as f64;
        let mut points: Vec<f64> = (0..samples).map(|i| i as f64 * step).collect();
        points[samples - 1] = span;
        Ok(Self { points })
    }

    /// Build a grid from explicit sample times.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if fewer than two samples are given,
    /// any sample is non-finite, or the sequence is not strictly
    /// increasing.
    pub fn from_points(points: Vec<f64>) -> ModelResult<Self> {
        if points.len() < 2 {
            return Err(ModelError::config("time grid needs at least two samples"));
        }
        for pair in points.windows(2) {
            if !pair[0].is_finite() || !pair[1].is_finite() {
                return Err(ModelError::config("time grid samples must be finite"));
            }
            if pair[1] <= pair[0] {
                return Err(ModelError::config(format!(
                    "time grid must be strictly increasing: {} then {}",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(Self { points })
    }

    /// Sample times.
    #[must_use]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the grid is empty (never true for a constructed grid).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total horizon covered by the grid.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.points[self.points.len() - 1] - self.points[0]
    }
}

/// Ordered sequence of state vectors, one per grid sample.
///
/// Immutable after creation; carries the grid it was sampled on so loss
/// aggregation always integrates against the matching times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    sectors: Vec<String>,
    times: Vec<f64>,
    states: Vec<Vec<f64>>,
}

impl Trajectory {
    /// Sector labels, canonical order.
    #[must_use]
    pub fn sectors(&self) -> &[String] {
        &self.sectors
    }

    /// Sample times, identical to the integration grid.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// State vectors, one per sample.
    #[must_use]
    pub fn states(&self) -> &[Vec<f64>] {
        &self.states
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the trajectory holds no samples (never true once built).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of sectors per state vector.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.sectors.len()
    }

    /// Column of one sector across all samples, by position.
    #[must_use]
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.states.iter().map(|s| s[index]).collect()
    }

    /// Column of one sector across all samples, by label.
    #[must_use]
    pub fn sector_column(&self, sector: &str) -> Option<Vec<f64>> {
        let index = self.sectors.iter().position(|s| s == sector)?;
        Some(self.column(index))
    }

    /// Economy-wide deviation: per-sample sum over all sectors.
    #[must_use]
    pub fn row_sums(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.iter().sum()).collect()
    }
}

/// Adaptive embedded Runge-Kutta integrator for the propagation ODE.
#[derive(Debug, Clone)]
pub struct PropagationIntegrator {
    /// Relative error tolerance per step.
    pub rel_tol: f64,
    /// Absolute error tolerance per step.
    pub abs_tol: f64,
    /// Step budget per grid interval before the run is declared stalled.
    pub max_steps: usize,
}

impl Default for PropagationIntegrator {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            abs_tol: 1e-9,
            max_steps: 10_000,
        }
    }
}

/// Preallocated stage workspace, reused across steps.
struct Stages {
    k: Vec<Vec<f64>>,
    y_stage: Vec<f64>,
    y_next: Vec<f64>,
}

impl Stages {
    fn new(n: usize) -> Self {
        Self {
            k: (0..STAGES).map(|_| vec![0.0; n]).collect(),
            y_stage: vec![0.0; n],
            y_next: vec![0.0; n],
        }
    }
}

impl PropagationIntegrator {
    /// Create an integrator with explicit tolerances.
    #[must_use]
    pub fn new(rel_tol: f64, abs_tol: f64) -> Self {
        Self {
            rel_tol,
            abs_tol,
            ..Self::default()
        }
    }

    /// Integrate the relaxation dynamics from `y(0) = 0` over the grid.
    ///
    /// One trajectory sample is recorded per grid point; the first sample
    /// is the zero initial condition. When `recovery` is supplied its
    /// forcing is summed with the shock forcing at every evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Dimension`] if a forcing spec does not cover
    /// exactly the model's sector count, [`ModelError::NonConvergence`] if
    /// the step budget is exhausted or the step size underflows, and
    /// [`ModelError::NonFinite`] if the state leaves the finite range. No
    /// partial trajectory is ever returned.
    pub fn integrate(
        &self,
        model: &InterdependencyModel,
        shock: &ForcingSpec,
        recovery: Option<&ForcingSpec>,
        grid: &TimeGrid,
    ) -> ModelResult<Trajectory> {
        let n = model.dim();
        if shock.len() != n {
            return Err(ModelError::dimension("shock forcing spec", n, shock.len()));
        }
        if let Some(spec) = recovery {
            if spec.len() != n {
                return Err(ModelError::dimension(
                    "recovery forcing spec",
                    n,
                    spec.len(),
                ));
            }
        }

        let mut y = vec![0.0; n];
        let mut stages = Stages::new(n);
        let mut states = Vec::with_capacity(grid.len());
        states.push(y.clone());

        for window in grid.points().windows(2) {
            self.advance(model, shock, recovery, window[0], window[1], &mut y, &mut stages)?;
            states.push(y.clone());
        }

        Ok(Trajectory {
            sectors: model.sectors().to_vec(),
            times: grid.points().to_vec(),
            states,
        })
    }

    /// Dynamics right-hand side: `(A - I)·y` plus the active forcing.
    fn rhs(
        model: &InterdependencyModel,
        shock: &ForcingSpec,
        recovery: Option<&ForcingSpec>,
        t: f64,
        y: &[f64],
        out: &mut [f64],
    ) {
        model.relaxation_mul(y, out);
        shock.accumulate_into(t, out);
        if let Some(spec) = recovery {
            spec.accumulate_into(t, out);
        }
    }

    /// Advance `y` from `t0` to `t1` with adaptive Cash-Karp steps.
    #[allow(clippy::too_many_arguments)]
    fn advance(
        &self,
        model: &InterdependencyModel,
        shock: &ForcingSpec,
        recovery: Option<&ForcingSpec>,
        t0: f64,
        t1: f64,
        y: &mut Vec<f64>,
        stages: &mut Stages,
    ) -> ModelResult<()> {
        let n = y.len();
        let span = t1 - t0;
        let mut t = t0;
        let mut h = span;
        let mut steps = 0usize;

        loop {
            let remaining = t1 - t;
            if remaining <= span * 1e-12 {
                return Ok(());
            }
            if steps >= self.max_steps {
                return Err(ModelError::NonConvergence {
                    reason: format!("step budget of {} exhausted", self.max_steps),
                    time: t,
                });
            }
            steps += 1;

            if h < span * 1e-14 {
                return Err(ModelError::NonConvergence {
                    reason: "step size underflow".to_string(),
                    time: t,
                });
            }
            let hits_end = h >= remaining;
            if hits_end {
                h = remaining;
            }

            // Stage evaluations.
            Self::rhs(model, shock, recovery, t, y, &mut stages.k[0]);
            for s in 1..STAGES {
                for i in 0..n {
                    let mut acc = y[i];
                    for (j, &a) in A[s].iter().enumerate() {
                        acc += h * a * stages.k[j][i];
                    }
                    stages.y_stage[i] = acc;
                }
                let (_, rest) = stages.k.split_at_mut(s);
                Self::rhs(
                    model,
                    shock,
                    recovery,
                    t + C[s] * h,
                    &stages.y_stage,
                    &mut rest[0],
                );
            }

            // Fifth-order candidate and embedded error estimate.
            let mut err_norm: f64 = 0.0;
            for i in 0..n {
                let mut high = 0.0;
                let mut err = 0.0;
                for s in 0..STAGES {
                    high += B5[s] * stages.k[s][i];
                    err += (B5[s] - B4[s]) * stages.k[s][i];
                }
                let candidate = y[i] + h * high;
                stages.y_next[i] = candidate;
                let scale = self.abs_tol + self.rel_tol * y[i].abs().max(candidate.abs());
                err_norm = err_norm.max((h * err).abs() / scale);
            }

            if !err_norm.is_finite() {
                return Err(ModelError::NonFinite {
                    location: "error estimate".to_string(),
                    time: t,
                });
            }

            if err_norm <= 1.0 {
                // Accept.
                for (slot, &value) in y.iter_mut().zip(&stages.y_next) {
                    if !value.is_finite() {
                        return Err(ModelError::NonFinite {
                            location: "state vector".to_string(),
                            time: t,
                        });
                    }
                    *slot = value;
                }
                t = if hits_end { t1 } else { t + h };
                let grow = if err_norm > 0.0 {
                    (SAFETY * err_norm.powf(GROW_EXPONENT)).min(MAX_GROW)
                } else {
                    MAX_GROW
                };
                h *= grow;
            } else {
                // Reject and shrink.
                h *= (SAFETY * err_norm.powf(SHRINK_EXPONENT)).max(MIN_SHRINK);
            }
        }
    }
}
