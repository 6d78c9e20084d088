//! Interdependency model: baseline output and forcing-spec construction.
//!
//! Wraps the static [`InterdependencyMatrix`], derives the baseline output
//! vector once at construction, and builds shock/recovery forcing
//! specifications from sparse per-sector overrides plus an optional
//! economy-wide default.
//!
//! Spec construction is an explicit two-phase build: every sector first
//! receives the default entry, then explicit overrides replace entries
//! verbatim. Economy-wide magnitudes are divided by 12 (annual share at
//! monthly granularity); targeted magnitudes are stored as given.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::forcing::{ForcingSpec, Pulse};
use crate::matrix::{Direction, InterdependencyMatrix};

/// Final demand vector used to derive the baseline output.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Demand {
    /// All-ones unit demand.
    #[default]
    Unit,
    /// Caller-supplied demand, one entry per sector.
    Vector(Vec<f64>),
}

/// How a recovery stimulus is distributed across the economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryMode {
    /// Stimulate only the explicitly named sectors.
    Targeted,
    /// Spread the economy-wide stimulus evenly over all sectors.
    Spread,
}

/// Immutable model instance: matrix, orientation, demand, baseline.
///
/// Safe to share read-only across threads; each simulation run derives
/// fresh forcing specs and trajectories from it without mutation.
#[derive(Debug, Clone)]
pub struct InterdependencyModel {
    matrix: InterdependencyMatrix,
    direction: Direction,
    /// Row-major oriented coefficients (transposed when downstream).
    oriented: Vec<f64>,
    demand: Vec<f64>,
    baseline: Vec<f64>,
}

impl InterdependencyModel {
    /// Construct a model and compute its baseline output.
    ///
    /// The baseline is `oriented_matrix · demand`, computed once and
    /// immutable thereafter.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Dimension`] if an explicit demand vector does
    /// not match the sector count.
    pub fn new(
        matrix: InterdependencyMatrix,
        demand: Demand,
        direction: Direction,
    ) -> ModelResult<Self> {
        let n = matrix.dim();
        let demand = match demand {
            Demand::Unit => vec![1.0; n],
            Demand::Vector(v) => {
                if v.len() != n {
                    return Err(ModelError::dimension("demand vector", n, v.len()));
                }
                v
            }
        };

        let oriented = matrix.oriented_values(direction);
        let mut baseline = vec![0.0; n];
        for i in 0..n {
            let row = &oriented[i * n..(i + 1) * n];
            baseline[i] = row.iter().zip(&demand).map(|(a, d)| a * d).sum();
        }

        Ok(Self {
            matrix,
            direction,
            oriented,
            demand,
            baseline,
        })
    }

    /// The wrapped matrix (as given, un-transposed).
    #[must_use]
    pub fn matrix(&self) -> &InterdependencyMatrix {
        &self.matrix
    }

    /// Propagation direction selected at construction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Sector labels in canonical order.
    #[must_use]
    pub fn sectors(&self) -> &[String] {
        self.matrix.sectors()
    }

    /// Number of sectors.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.matrix.dim()
    }

    /// Demand vector resolved at construction.
    #[must_use]
    pub fn demand(&self) -> &[f64] {
        &self.demand
    }

    /// Baseline output vector, one entry per sector.
    #[must_use]
    pub fn baseline_output(&self) -> &[f64] {
        &self.baseline
    }

    /// Build the shock forcing spec.
    ///
    /// Phase one seeds every sector with the economy-wide pulse (magnitude
    /// divided by 12) or the zero triple when none is given; phase two
    /// replaces the entries of explicitly named sectors verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownSector`] if an override names a sector
    /// absent from the economy.
    pub fn build_shock_spec(
        &self,
        overrides: &IndexMap<String, Pulse>,
        economy_wide: Option<Pulse>,
    ) -> ModelResult<ForcingSpec> {
        let default = economy_wide.map_or(Pulse::ZERO, |p| p.monthly_rate());
        let mut entries: IndexMap<String, Pulse> = self
            .sectors()
            .iter()
            .map(|s| (s.clone(), default))
            .collect();
        Self::overlay(&mut entries, overrides)?;
        Ok(ForcingSpec::new(entries))
    }

    /// Build the recovery forcing spec for the selected mode.
    ///
    /// `Spread` applies the economy-wide stimulus (magnitude divided by 12)
    /// identically to all sectors and ignores overrides. `Targeted` ignores
    /// the economy-wide stimulus and applies only the named overrides;
    /// unnamed sectors receive the zero triple.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if the mode is `Targeted` and no
    /// overrides are supplied, and [`ModelError::UnknownSector`] if an
    /// override names a sector absent from the economy.
    pub fn build_recovery_spec(
        &self,
        overrides: Option<&IndexMap<String, Pulse>>,
        economy_wide: Option<Pulse>,
        mode: RecoveryMode,
    ) -> ModelResult<ForcingSpec> {
        match mode {
            RecoveryMode::Spread => {
                let default = economy_wide.map_or(Pulse::ZERO, |p| p.monthly_rate());
                let entries = self
                    .sectors()
                    .iter()
                    .map(|s| (s.clone(), default))
                    .collect();
                Ok(ForcingSpec::new(entries))
            }
            RecoveryMode::Targeted => {
                let overrides = overrides.filter(|o| !o.is_empty()).ok_or_else(|| {
                    ModelError::config(
                        "targeted recovery requires at least one sector override",
                    )
                })?;
                let mut entries: IndexMap<String, Pulse> = self
                    .sectors()
                    .iter()
                    .map(|s| (s.clone(), Pulse::ZERO))
                    .collect();
                Self::overlay(&mut entries, overrides)?;
                Ok(ForcingSpec::new(entries))
            }
        }
    }

    fn overlay(
        entries: &mut IndexMap<String, Pulse>,
        overrides: &IndexMap<String, Pulse>,
    ) -> ModelResult<()> {
        for (sector, pulse) in overrides {
            let slot = entries
                .get_mut(sector)
                .ok_or_else(|| ModelError::UnknownSector(sector.clone()))?;
            *slot = *pulse;
        }
        Ok(())
    }

    /// Apply the relaxation operator: `out = (A - I)·y`.
    ///
    /// `A` is the oriented matrix; this is the fixed part of the dynamics
    /// right-hand side.
    pub(crate) fn relaxation_mul(&self, y: &[f64], out: &mut [f64]) {
        let n = self.dim();
        for i in 0..n {
            let row = &self.oriented[i * n..(i + 1) * n];
            let mut acc = -y[i];
            for j in 0..n {
                acc += row[j] * y[j];
            }
            out[i] = acc;
        }
    }
}
