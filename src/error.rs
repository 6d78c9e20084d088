//! Error types for econodyn.
//!
//! All fallible operations return `Result<T, ModelError>` instead of
//! panicking. Errors fall into three families, detected at three distinct
//! stages:
//!
//! - dimension errors at model construction,
//! - configuration errors at forcing-spec construction,
//! - simulation errors during numerical integration.
//!
//! None are recoverable automatically; they propagate to the caller as
//! fatal-to-the-run failures.

use thiserror::Error;

/// Result type alias for econodyn operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Unified error type for all econodyn operations.
#[derive(Debug, Error)]
pub enum ModelError {
    // ===== Dimension Errors (model construction) =====
    /// Matrix, demand vector, or sector-label count mismatch.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    Dimension {
        /// What was being checked (e.g. "demand vector").
        what: String,
        /// Expected length or dimension.
        expected: usize,
        /// Actual length or dimension.
        actual: usize,
    },

    // ===== Configuration Errors (spec construction) =====
    /// A forcing override names a sector absent from the economy.
    #[error("unknown sector '{0}'")]
    UnknownSector(String),

    /// Malformed or inconsistent forcing/scenario configuration.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Schema validation error.
    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== Simulation Errors (integration) =====
    /// Integrator produced a NaN or Inf state component.
    #[error("simulation error: non-finite value in {location} at t={time:.6}")]
    NonFinite {
        /// State component or stage where the value was detected.
        location: String,
        /// Simulation time of the failed step.
        time: f64,
    },

    /// Integrator exhausted its step budget or underflowed the step size.
    #[error("simulation error: failed to converge at t={time:.6}: {reason}")]
    NonConvergence {
        /// Why the integration was aborted.
        reason: String,
        /// Simulation time of the failed step.
        time: f64,
    },

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a dimension-mismatch error.
    #[must_use]
    pub fn dimension(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::Dimension {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Check if this error was detected before integration started
    /// (rejectable by fixing the supplied parameters).
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownSector(_)
                | Self::Config { .. }
                | Self::YamlParse(_)
                | Self::Validation(_)
        )
    }

    /// Check if this error aborted a numerical integration run.
    #[must_use]
    pub const fn is_simulation(&self) -> bool {
        matches!(self, Self::NonFinite { .. } | Self::NonConvergence { .. })
    }
}
