//! Discrete spatial operators and no-flux boundaries.
//!
//! The operator evaluates the diffusion term on the committed voltage field;
//! boundary nodes return 0 and are overwritten after every step by copying
//! the adjacent interior value inward, which realizes the Neumann (no-flux)
//! condition on the staggered edge.
//!
//! The 2D operator applies the full anisotropic tensor: axis terms from the
//! standard 5-point stencil, the mixed derivative from a 4-point diagonal
//! average over the 3x3 neighborhood.

use crate::tissue::{cable_cfl_limit_ms, DiffusionMap, Grid};

/// Spatial coupling of a run: none (0D), scalar cable (1D) or full
/// anisotropic tensor (2D).
#[derive(Debug, Clone)]
pub enum SpatialOperator {
    None,
    Cable {
        diffusivity: f64,
        nodes: usize,
        dx_mm: f64,
        inv_dx2: f64,
    },
    Tissue {
        map: DiffusionMap,
        grid: Grid,
        inv_dx2: f64,
    },
}

impl SpatialOperator {
    pub fn none() -> Self {
        SpatialOperator::None
    }

    pub fn cable(nodes: usize, dx_mm: f64, diffusivity: f64) -> Self {
        SpatialOperator::Cable {
            diffusivity,
            nodes,
            dx_mm,
            inv_dx2: 1.0 / (dx_mm * dx_mm),
        }
    }

    pub fn tissue(grid: Grid, map: DiffusionMap) -> Self {
        SpatialOperator::Tissue {
            map,
            inv_dx2: 1.0 / (grid.dx_mm * grid.dx_mm),
            grid,
        }
    }

    /// Largest stable explicit step for this operator (ms)
    pub fn cfl_limit_ms(&self) -> f64 {
        match self {
            SpatialOperator::None => f64::INFINITY,
            SpatialOperator::Cable {
                diffusivity, dx_mm, ..
            } => cable_cfl_limit_ms(*dx_mm, *diffusivity),
            SpatialOperator::Tissue { map, grid, .. } => map.cfl_limit_ms(grid.dx_mm),
        }
    }

    /// Diffusion term at `index` over the committed voltage field.
    ///
    /// Returns 0 at boundary nodes; those are overwritten by
    /// `apply_boundary` after the step.
    #[inline]
    pub fn term(&self, v: &[f64], index: usize) -> f64 {
        match self {
            SpatialOperator::None => 0.0,
            SpatialOperator::Cable {
                diffusivity,
                nodes,
                inv_dx2,
                ..
            } => {
                if index == 0 || index + 1 >= *nodes {
                    return 0.0;
                }
                diffusivity * (v[index + 1] - 2.0 * v[index] + v[index - 1]) * inv_dx2
            }
            SpatialOperator::Tissue { map, grid, inv_dx2 } => {
                let n = grid.n;
                let (col, row) = grid.coords(index);
                if col == 0 || row == 0 || col + 1 >= n || row + 1 >= n {
                    return 0.0;
                }
                let center = v[index];
                let east = v[index + 1];
                let west = v[index - 1];
                let north = v[index - n];
                let south = v[index + n];
                let ne = v[index - n + 1];
                let nw = v[index - n - 1];
                let se = v[index + n + 1];
                let sw = v[index + n - 1];
                let tensor = map.tensor(index);
                let axis = tensor.dxx * (east - 2.0 * center + west)
                    + tensor.dyy * (south - 2.0 * center + north);
                let mixed = 2.0 * tensor.dxy * 0.25 * (se - sw - ne + nw);
                (axis + mixed) * inv_dx2
            }
        }
    }

    /// Copy adjacent interior values into the boundary nodes (no-flux).
    ///
    /// For tissue the row copies run first and the column copies second, so
    /// corners end up holding their diagonal interior neighbor.
    pub fn apply_boundary(&self, v: &mut [f64]) {
        match self {
            SpatialOperator::None => {}
            SpatialOperator::Cable { nodes, .. } => {
                let n = *nodes;
                v[0] = v[1];
                v[n - 1] = v[n - 2];
            }
            SpatialOperator::Tissue { grid, .. } => {
                let n = grid.n;
                for col in 0..n {
                    v[col] = v[n + col];
                    v[(n - 1) * n + col] = v[(n - 2) * n + col];
                }
                for row in 0..n {
                    v[row * n] = v[row * n + 1];
                    v[row * n + n - 1] = v[row * n + n - 2];
                }
            }
        }
    }
}
