//! Square-grid index math and the per-node diffusion tensor map.
//!
//! The tensor is derived once per run from the longitudinal/transverse
//! conductivities and the fiber angle, then scaled node-by-node by the
//! fibrosis map. It is read-only once stepping begins, which is why the
//! stability limit can be computed a single time up front.

use crate::config::Conductivity;

/// Row-major square grid of `n` x `n` nodes spaced `dx_mm` apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub n: usize,
    pub dx_mm: f64,
}

impl Grid {
    pub fn new(n: usize, dx_mm: f64) -> Self {
        Self { n, dx_mm }
    }

    pub fn node_count(&self) -> usize {
        self.n * self.n
    }

    #[inline]
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.n + col
    }

    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.n, index / self.n)
    }
}

/// Anisotropic diffusion tensor of one node (mm²/ms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionTensor {
    pub dxx: f64,
    pub dyy: f64,
    pub dxy: f64,
}

impl DiffusionTensor {
    /// Rotate the principal conductivities into grid axes.
    ///
    /// Dxx = σl·cos²θ + σt·sin²θ, Dyy = σl·sin²θ + σt·cos²θ,
    /// Dxy = (σl − σt)·sinθ·cosθ.
    pub fn from_conductivity(conductivity: &Conductivity) -> Self {
        let theta = conductivity.fiber_angle_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        let (sl, st) = (conductivity.sigma_l, conductivity.sigma_t);
        Self {
            dxx: sl * cos * cos + st * sin * sin,
            dyy: sl * sin * sin + st * cos * cos,
            dxy: (sl - st) * sin * cos,
        }
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            dxx: self.dxx * factor,
            dyy: self.dyy * factor,
            dxy: self.dxy * factor,
        }
    }
}

/// Per-node diffusion tensors for a tissue run.
#[derive(Debug, Clone)]
pub struct DiffusionMap {
    tensors: Vec<DiffusionTensor>,
}

impl DiffusionMap {
    /// Uniform map from one conductivity over the whole grid
    pub fn uniform(grid: &Grid, conductivity: &Conductivity) -> Self {
        let tensor = DiffusionTensor::from_conductivity(conductivity);
        Self {
            tensors: vec![tensor; grid.node_count()],
        }
    }

    #[inline]
    pub fn tensor(&self, index: usize) -> &DiffusionTensor {
        &self.tensors[index]
    }

    /// Scale every tensor by the matching per-node conductivity factor
    pub fn apply_factors(&mut self, factors: &[f64]) {
        for (tensor, &factor) in self.tensors.iter_mut().zip(factors) {
            *tensor = tensor.scaled(factor);
        }
    }

    /// Largest stable explicit time step over this map.
    ///
    /// dt_max = dx² / (4·max(Dxx, Dyy) + 2·|Dxy|), evaluated at the worst
    /// node. Fibrosis only lowers conductivity, but the bound is taken over
    /// the final scaled map regardless.
    /// Reference: Courant, Friedrichs & Lewy, Math Ann 1928
    pub fn cfl_limit_ms(&self, dx_mm: f64) -> f64 {
        let mut worst_denominator: f64 = 0.0;
        for tensor in &self.tensors {
            let denominator = 4.0 * tensor.dxx.max(tensor.dyy) + 2.0 * tensor.dxy.abs();
            worst_denominator = worst_denominator.max(denominator);
        }
        if worst_denominator <= 0.0 {
            f64::INFINITY
        } else {
            dx_mm * dx_mm / worst_denominator
        }
    }
}

/// Largest stable explicit time step of the 1D cable: dt_max = dx² / (2·D)
pub fn cable_cfl_limit_ms(dx_mm: f64, diffusivity: f64) -> f64 {
    if diffusivity <= 0.0 {
        f64::INFINITY
    } else {
        dx_mm * dx_mm / (2.0 * diffusivity)
    }
}
