//! Time stepping: the simulation Driver and the operators it composes.

mod diffusion;
mod driver;
mod integrator;
mod stimulus;

pub use diffusion::SpatialOperator;
pub use driver::Driver;
pub use integrator::Rk4Integrator;
pub use stimulus::{StimulusMap, StimulusWindow};
