//! # econodyn
//!
//! Dynamic propagation of economic shocks through an interdependent
//! sector network.
//!
//! The model wraps a square input-output interdependency matrix, builds
//! piecewise-constant forcing vectors for a shock and an optional recovery
//! stimulus, integrates the linear relaxation law
//! `dy/dt = (A - I)·y + forcing(t)` over a monthly time grid, and reduces
//! the resulting trajectories to per-sector or economy-wide output-loss
//! figures.
//!
//! Matrix acquisition, parameter collection, and rendering are external
//! collaborators: the crate takes a labeled matrix plus scenario parameters
//! and hands trajectories and loss figures back.
//!
//! ## Example
//!
//! ```rust
//! use econodyn::prelude::*;
//! use indexmap::IndexMap;
//!
//! let matrix = InterdependencyMatrix::new(
//!     vec!["Energy".into(), "Transport".into()],
//!     vec![0.5, 0.1, 0.2, 0.4],
//! )?;
//! let model = InterdependencyModel::new(matrix, Demand::Unit, Direction::Upstream)?;
//!
//! let mut shocks = IndexMap::new();
//! shocks.insert("Energy".to_string(), Pulse::new(0.0, 0.5, -0.2)?);
//! let spec = model.build_shock_spec(&shocks, None)?;
//!
//! let grid = TimeGrid::monthly(2)?;
//! let trajectory = PropagationIntegrator::default()
//!     .integrate(&model, &spec, None, &grid)?;
//! let loss = total_loss(&trajectory);
//! assert!(loss < 0.0);
//! # Ok::<(), econodyn::ModelError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::suboptimal_flops, // Numerical code choices are intentional
    clippy::imprecise_flops,
    clippy::needless_range_loop, // Sometimes range loops are clearer
    clippy::missing_const_for_fn
)]

pub mod config;
pub mod error;
pub mod forcing;
pub mod integrator;
pub mod loss;
pub mod matrix;
pub mod model;
pub mod scenario;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{PulseConfig, RecoveryConfig, ScenarioConfig, SectorPulseConfig};
    pub use crate::error::{ModelError, ModelResult};
    pub use crate::forcing::{ForcingSpec, Pulse};
    pub use crate::integrator::{PropagationIntegrator, TimeGrid, Trajectory};
    pub use crate::loss::{output_loss, sector_losses, total_loss, LossFigure};
    pub use crate::matrix::{Direction, InterdependencyMatrix};
    pub use crate::model::{Demand, InterdependencyModel, RecoveryMode};
    pub use crate::scenario::{run_scenario, ScenarioOutcome};
}

/// Re-export for public API
pub use error::{ModelError, ModelResult};
