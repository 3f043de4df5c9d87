//! Cardiosim - cardiac electrophysiology simulation engine
//!
//! Reaction-diffusion simulation of action potential propagation in single
//! cells, 1D fibers and 2D tissue sheets, with pacing protocols, restitution
//! analysis and structural heterogeneity (fibrosis, transmural zones).

pub mod analysis;
pub mod config;
pub mod error;
pub mod membrane;
pub mod runtime;
pub mod solver;
pub mod state;
pub mod tissue;

pub use analysis::{measure_apd90, RestitutionCurve, RestitutionPoint};
pub use config::{Geometry, SimulationParameters, StimulusSpec};
pub use error::{SimResult, SimulationError};
pub use membrane::{CellKernel, ModelConfig};
pub use runtime::{CancelToken, SimulationHost};
pub use solver::Driver;
pub use state::{CableRun, CellTrace, TissueRun};
