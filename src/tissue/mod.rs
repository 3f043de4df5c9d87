//! Tissue structure: grid math, diffusion tensors and heterogeneity maps.
//!
//! Everything here is built once during Driver initialization and read-only
//! from step 0 onward, so the stepping loop never consults configuration.

mod fibrosis;
mod grid;
mod transmural;

pub use fibrosis::{generate_fibrosis_map, Lcg};
pub use grid::{cable_cfl_limit_ms, DiffusionMap, DiffusionTensor, Grid};
pub use transmural::generate_zone_map;
