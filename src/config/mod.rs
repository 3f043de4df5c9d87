//! Run configuration: parameter structures and pacing protocol builders.
//!
//! Biological defaults include citations to their source publications.

mod parameters;
mod protocols;

pub use parameters::{
    Conductivity, FibrosisConfig, FibrosisPattern, Geometry, IntegrationMethod, Region,
    SimulationParameters, StimulusShape, StimulusSpec, TransmuralAxis, TransmuralConfig,
};
pub use protocols::{
    periodic_train, s1s2_schedule, BclSeriesProtocol, DynamicRestitutionProtocol,
    S1S2RestitutionProtocol,
};
