//! Labeled square interdependency matrix.
//!
//! Entry `(i, j)` expresses how much sector `i`'s output depends on sector
//! `j`'s output. The matrix is immutable once constructed; row and column
//! label sets are identical and their order is the canonical sector order
//! used by every downstream vector in the crate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ModelError, ModelResult};

/// Which way a shock is traced through the supply chain.
///
/// `Upstream` uses the matrix as given, `Downstream` its transpose. The
/// naming follows the reference convention rather than textbook
/// input-output terminology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Trace the shock to the sectors the shocked sector depends on.
    #[default]
    Upstream,
    /// Trace the shock to the sectors that depend on the shocked sector.
    Downstream,
}

/// Square, labeled, immutable interdependency matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterdependencyMatrix {
    sectors: Vec<String>,
    /// Row-major coefficients, as given (un-transposed).
    values: Vec<f64>,
}

impl InterdependencyMatrix {
    /// Build a matrix from sector labels and row-major coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Dimension`] if the value count is not the
    /// square of the label count, and [`ModelError::Config`] if labels are
    /// empty or duplicated.
    pub fn new(sectors: Vec<String>, values: Vec<f64>) -> ModelResult<Self> {
        let n = sectors.len();
        if n == 0 {
            return Err(ModelError::config("matrix must have at least one sector"));
        }
        let mut seen = HashSet::with_capacity(n);
        for label in &sectors {
            if !seen.insert(label.as_str()) {
                return Err(ModelError::config(format!(
                    "duplicate sector label '{label}'"
                )));
            }
        }
        if values.len() != n * n {
            return Err(ModelError::dimension("matrix values", n * n, values.len()));
        }
        Ok(Self { sectors, values })
    }

    /// Build a matrix from labeled rows (sector → sector → coefficient).
    ///
    /// Row order fixes the canonical sector order; every row must carry a
    /// coefficient for every sector.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Dimension`] on a short or long row and
    /// [`ModelError::UnknownSector`] if a row references a column label
    /// that is not itself a row.
    pub fn from_rows(rows: &IndexMap<String, IndexMap<String, f64>>) -> ModelResult<Self> {
        let sectors: Vec<String> = rows.keys().cloned().collect();
        let n = sectors.len();
        let mut values = Vec::with_capacity(n * n);
        for (label, row) in rows {
            if row.len() != n {
                return Err(ModelError::dimension(
                    format!("row '{label}'"),
                    n,
                    row.len(),
                ));
            }
            for key in row.keys() {
                if !rows.contains_key(key) {
                    return Err(ModelError::UnknownSector(key.clone()));
                }
            }
            for column in &sectors {
                // Presence is guaranteed by the length + membership checks.
                values.push(row.get(column).copied().unwrap_or_default());
            }
        }
        Self::new(sectors, values)
    }

    /// Number of sectors (matrix dimension).
    #[must_use]
    pub fn dim(&self) -> usize {
        self.sectors.len()
    }

    /// Sector labels in canonical order.
    #[must_use]
    pub fn sectors(&self) -> &[String] {
        &self.sectors
    }

    /// Position of a sector label in the canonical order.
    #[must_use]
    pub fn index_of(&self, sector: &str) -> Option<usize> {
        self.sectors.iter().position(|s| s == sector)
    }

    /// Coefficient at `(row, column)` of the matrix as given.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.dim() + column]
    }

    /// Coefficient by sector labels, `None` if either label is unknown.
    #[must_use]
    pub fn coefficient(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.index_of(row)?;
        let j = self.index_of(column)?;
        Some(self.get(i, j))
    }

    /// Row-major coefficients oriented for the given propagation direction.
    #[must_use]
    pub fn oriented_values(&self, direction: Direction) -> Vec<f64> {
        let n = self.dim();
        match direction {
            Direction::Upstream => self.values.clone(),
            Direction::Downstream => {
                let mut t = vec![0.0; n * n];
                for i in 0..n {
                    for j in 0..n {
                        t[j * n + i] = self.values[i * n + j];
                    }
                }
                t
            }
        }
    }
}
