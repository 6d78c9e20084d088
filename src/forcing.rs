//! Piecewise-constant forcing specifications.
//!
//! A [`ForcingSpec`] maps every sector of the economy to a [`Pulse`]: a
//! magnitude held constant over a closed interval of fractional years.
//! Evaluation is a pure rule with no hidden state, so the adaptive
//! integrator may re-evaluate trial steps out of monotonic order and
//! always observe identical output for identical `t`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// A constant forcing magnitude active over `[start, end]`.
///
/// Both boundary instants are active (closed interval on both ends).
/// Times are fractional-year offsets from the start of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    /// Start of the active interval, fractional years.
    pub start: f64,
    /// End of the active interval, fractional years.
    pub end: f64,
    /// Relative (fractional) forcing magnitude while active.
    pub magnitude: f64,
}

impl Pulse {
    /// The inert pulse: zero magnitude over the empty instant `[0, 0]`.
    pub const ZERO: Self = Self {
        start: 0.0,
        end: 0.0,
        magnitude: 0.0,
    };

    /// Create a pulse, rejecting inverted or non-finite intervals.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if `start > end` or any field is
    /// not finite.
    pub fn new(start: f64, end: f64, magnitude: f64) -> ModelResult<Self> {
        if !start.is_finite() || !end.is_finite() || !magnitude.is_finite() {
            return Err(ModelError::config(format!(
                "pulse fields must be finite, got [{start}, {end}] × {magnitude}"
            )));
        }
        if start > end {
            return Err(ModelError::config(format!(
                "pulse interval inverted: start {start} > end {end}"
            )));
        }
        Ok(Self {
            start,
            end,
            magnitude,
        })
    }

    /// Whether the pulse is active at time `t` (boundaries inclusive).
    #[must_use]
    pub fn active_at(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Instantaneous forcing value at time `t`.
    #[must_use]
    pub fn value_at(&self, t: f64) -> f64 {
        if self.active_at(t) {
            self.magnitude
        } else {
            0.0
        }
    }

    /// Copy of this pulse with the magnitude divided by 12, the monthly-rate
    /// convention for economy-wide pulses.
    #[must_use]
    pub(crate) fn monthly_rate(&self) -> Self {
        Self {
            start: self.start,
            end: self.end,
            magnitude: self.magnitude / 12.0,
        }
    }
}

/// One pulse per sector, in canonical sector order.
///
/// Built only through [`InterdependencyModel`](crate::model::InterdependencyModel)'s
/// two-phase builders, which guarantee an entry for every sector of the
/// economy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForcingSpec {
    entries: IndexMap<String, Pulse>,
}

impl ForcingSpec {
    pub(crate) fn new(entries: IndexMap<String, Pulse>) -> Self {
        Self { entries }
    }

    /// Number of sectors covered (always the full economy).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the spec covers no sectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pulse for a sector, `None` if the label is unknown.
    #[must_use]
    pub fn get(&self, sector: &str) -> Option<&Pulse> {
        self.entries.get(sector)
    }

    /// Iterate entries in canonical sector order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pulse)> {
        self.entries.iter().map(|(s, p)| (s.as_str(), p))
    }

    /// Instantaneous forcing vector at time `t`, canonical sector order.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> Vec<f64> {
        self.entries.values().map(|p| p.value_at(t)).collect()
    }

    /// Add the instantaneous forcing at `t` onto `out`.
    ///
    /// Used by the integrator's right-hand side so shock and recovery
    /// specs sum without an intermediate allocation. Entries beyond
    /// `out.len()` are ignored; the integrator checks dimensions up front.
    pub(crate) fn accumulate_into(&self, t: f64, out: &mut [f64]) {
        for (value, slot) in self.entries.values().zip(out.iter_mut()) {
            *slot += value.value_at(t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(pulses: &[(&str, Pulse)]) -> ForcingSpec {
        ForcingSpec::new(
            pulses
                .iter()
                .map(|(s, p)| ((*s).to_string(), *p))
                .collect(),
        )
    }

    #[test]
    fn test_pulse_rejects_inverted_interval() {
        let err = Pulse::new(0.5, 0.25, 1.0).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_pulse_rejects_non_finite() {
        assert!(Pulse::new(0.0, f64::NAN, 1.0).is_err());
        assert!(Pulse::new(0.0, 1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_boundary_instants_are_active() {
        let p = Pulse::new(0.25, 0.5, -0.2).unwrap();

        assert!((p.value_at(0.25) - (-0.2)).abs() < f64::EPSILON);
        assert!((p.value_at(0.5) - (-0.2)).abs() < f64::EPSILON);
        assert!((p.value_at(0.375) - (-0.2)).abs() < f64::EPSILON);
        assert!(p.value_at(0.25 - 1e-12).abs() < f64::EPSILON);
        assert!(p.value_at(0.5 + 1e-12).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_pulse_inert() {
        assert!(Pulse::ZERO.value_at(0.0).abs() < f64::EPSILON);
        assert!(Pulse::ZERO.value_at(1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_evaluate_vector_order() {
        let s = spec(&[
            ("A", Pulse::new(0.0, 1.0, 0.3).unwrap()),
            ("B", Pulse::ZERO),
            ("C", Pulse::new(0.5, 1.0, -0.1).unwrap()),
        ]);

        assert_eq!(s.evaluate(0.25), vec![0.3, 0.0, 0.0]);
        assert_eq!(s.evaluate(0.75), vec![0.3, 0.0, -0.1]);
    }

    #[test]
    fn test_revisited_times_deterministic() {
        let s = spec(&[("A", Pulse::new(0.1, 0.4, 0.7).unwrap())]);

        // Out-of-order and repeated queries, as an adaptive solver issues.
        let first = s.evaluate(0.3);
        let _ = s.evaluate(0.9);
        let _ = s.evaluate(0.05);
        let again = s.evaluate(0.3);
        assert_eq!(first, again);
    }

    #[test]
    fn test_accumulate_sums_specs() {
        let shock = spec(&[("A", Pulse::new(0.0, 1.0, -0.2).unwrap()), ("B", Pulse::ZERO)]);
        let recovery = spec(&[
            ("A", Pulse::new(0.0, 1.0, 0.05).unwrap()),
            ("B", Pulse::new(0.0, 1.0, 0.05).unwrap()),
        ]);

        let mut out = vec![0.0; 2];
        shock.accumulate_into(0.5, &mut out);
        recovery.accumulate_into(0.5, &mut out);

        assert!((out[0] - (-0.15)).abs() < 1e-12);
        assert!((out[1] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_monthly_rate_scaling() {
        let p = Pulse::new(0.0, 1.0, 0.12).unwrap();
        let scaled = p.monthly_rate();
        assert!((scaled.magnitude - 0.01).abs() < 1e-12);
        assert!((scaled.start - p.start).abs() < f64::EPSILON);
        assert!((scaled.end - p.end).abs() < f64::EPSILON);
    }
}
