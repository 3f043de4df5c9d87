//! Transmural zone maps.
//!
//! Partitions a tissue sheet into endocardial, midmyocardial and epicardial
//! bands along one axis. Band membership is decided by the node center's
//! normalized position across the extent, so band sizes follow the requested
//! fractions to within one node row.

use crate::config::{TransmuralAxis, TransmuralConfig};
use crate::tissue::grid::Grid;

/// Zone indices match `CellType::zone`: 0 endo, 1 mid, 2 epi.
pub fn generate_zone_map(config: &TransmuralConfig, grid: &Grid) -> Vec<u8> {
    let n = grid.n;
    let mut zones = vec![0u8; grid.node_count()];
    for row in 0..n {
        for col in 0..n {
            let along = match config.axis {
                TransmuralAxis::Y => row,
                TransmuralAxis::X => col,
            };
            let ratio = (along as f64 + 0.5) / n as f64;
            let zone = if ratio < config.endo_fraction {
                0
            } else if ratio < config.endo_fraction + config.mid_fraction {
                1
            } else {
                2
            };
            zones[grid.index(col, row)] = zone;
        }
    }
    zones
}
