//! Post-run trace analysis: APD measurement and restitution curves.

mod apd;
mod restitution;

pub use apd::{
    activation_map, activation_time_ms, measure_apd90, measure_apd90_in, MIN_AMPLITUDE,
};
pub use restitution::{accept_point, BclSeriesEntry, RestitutionCurve, RestitutionPoint};
