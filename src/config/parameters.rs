//! Run parameter structures.
//!
//! A run is fully described by one immutable `SimulationParameters` value:
//! cell model, geometry, time step, stimulation schedule and tissue
//! heterogeneity. The Driver copies the parameters at run start, so callers
//! can reuse or mutate their own copy while a run is in flight.
//!
//! Biological defaults carry their source citation. All structures serialize
//! with serde; `load_or_default` reads a JSON file and falls back to defaults
//! when the file is absent or malformed.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigurationError;
use crate::membrane::ModelConfig;

/// Geometry class of a run.
///
/// Node counts: 1 (single cell), `nodes` (cable), `n * n` (tissue, row-major
/// flattened).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Isolated cell, no diffusion
    SingleCell,
    /// 1D strand of cells
    Cable {
        /// Number of nodes along the cable
        nodes: usize,
        /// Node spacing (mm)
        dx_mm: f64,
    },
    /// Square 2D sheet, row-major flattened
    Tissue {
        /// Nodes per side
        n: usize,
        /// Node spacing (mm)
        dx_mm: f64,
    },
}

impl Geometry {
    /// Total number of nodes in the state vector
    pub fn node_count(&self) -> usize {
        match *self {
            Geometry::SingleCell => 1,
            Geometry::Cable { nodes, .. } => nodes,
            Geometry::Tissue { n, .. } => n * n,
        }
    }

    /// Node spacing, if the geometry has a spatial extent
    pub fn dx_mm(&self) -> Option<f64> {
        match *self {
            Geometry::SingleCell => None,
            Geometry::Cable { dx_mm, .. } | Geometry::Tissue { dx_mm, .. } => Some(dx_mm),
        }
    }
}

/// Tissue conductivity along and across the fiber direction.
///
/// The 2D diffusion tensor is derived from these once per run; the cable
/// geometry uses `sigma_l` as its scalar diffusion coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conductivity {
    /// Longitudinal diffusivity (mm²/ms)
    /// Reference: 1.171 cm²/s for human ventricular tissue
    /// Source: Bueno-Orovio, Cherry & Fenton, J Theor Biol 2008
    pub sigma_l: f64,

    /// Transverse diffusivity (mm²/ms)
    /// Reference: ~4:1 longitudinal:transverse anisotropy
    /// Source: Clerc, J Physiol 1976
    pub sigma_t: f64,

    /// Fiber angle relative to the grid x-axis (degrees)
    pub fiber_angle_deg: f64,
}

impl Default for Conductivity {
    fn default() -> Self {
        Self {
            // Bueno-Orovio et al. 2008: 1.171 cm²/s
            sigma_l: 0.1171,

            // Clerc 1976 anisotropy ratio
            sigma_t: 0.0293,

            fiber_angle_deg: 0.0,
        }
    }
}

/// Axis-aligned node region used by stimulus footprints and fibrosis patches.
///
/// Coordinates are node indices (column = x, row = y); the circle accepts
/// fractional centers and radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Region {
    Rect {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
    },
}

impl Region {
    /// Membership test for the node at (col, row)
    pub fn contains(&self, col: usize, row: usize) -> bool {
        match *self {
            Region::Rect {
                x,
                y,
                width,
                height,
            } => col >= x && col < x + width && row >= y && row < y + height,
            Region::Circle { cx, cy, radius } => {
                let dx = col as f64 - cx;
                let dy = row as f64 - cy;
                dx * dx + dy * dy <= radius * radius
            }
        }
    }

    /// Distance from the node at (col, row) to the region boundary in node
    /// units, 0 inside the region. Used for fibrosis border blending.
    pub fn distance_outside(&self, col: usize, row: usize) -> f64 {
        match *self {
            Region::Rect {
                x,
                y,
                width,
                height,
            } => {
                let dx = if col < x {
                    (x - col) as f64
                } else if col >= x + width {
                    (col - (x + width - 1)) as f64
                } else {
                    0.0
                };
                let dy = if row < y {
                    (y - row) as f64
                } else if row >= y + height {
                    (row - (y + height - 1)) as f64
                } else {
                    0.0
                };
                (dx * dx + dy * dy).sqrt()
            }
            Region::Circle { cx, cy, radius } => {
                let dx = col as f64 - cx;
                let dy = row as f64 - cy;
                ((dx * dx + dy * dy).sqrt() - radius).max(0.0)
            }
        }
    }

    /// Human-readable label used in error messages
    pub fn describe(&self) -> String {
        match *self {
            Region::Rect {
                x,
                y,
                width,
                height,
            } => format!("rect {}x{} at ({}, {})", width, height, x, y),
            Region::Circle { cx, cy, radius } => {
                format!("circle r={} at ({}, {})", radius, cx, cy)
            }
        }
    }
}

/// Spatial footprint of one stimulus electrode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StimulusShape {
    /// The single cell of a 0D run, or node 0 of a cable
    Point,
    /// First `width` nodes of a cable, or first `width` columns of a sheet
    Edge { width: usize },
    /// Node region of a tissue sheet
    Area(Region),
}

/// One stimulus: a footprint plus chained timing.
///
/// Timing chains sequentially: the first stimulus starts `delay_ms` after
/// t=0, every subsequent one starts `delay_ms` after the previous stimulus
/// *ends*. The scheduler resolves the chain into absolute windows once, at
/// Driver initialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StimulusSpec {
    pub shape: StimulusShape,
    /// Offset from t=0 (first stimulus) or from the previous end (ms)
    pub delay_ms: f64,
    /// Active window length (ms)
    pub duration_ms: f64,
    /// Current added to dv/dt while active (1/ms, normalized units)
    pub amplitude: f64,
}

impl StimulusSpec {
    /// Point stimulus with the given timing
    pub fn point(delay_ms: f64, duration_ms: f64, amplitude: f64) -> Self {
        Self {
            shape: StimulusShape::Point,
            delay_ms,
            duration_ms,
            amplitude,
        }
    }
}

/// Fibrosis deposition pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FibrosisPattern {
    /// One contiguous patch, optionally with a border zone over which the
    /// conductivity blends linearly back to the healthy baseline
    Compact {
        region: Region,
        /// Border zone width in node units (0 = sharp edge)
        border_width: f64,
    },
    /// Single-node patches scattered over the whole sheet until
    /// `area * density` nodes are fibrotic
    Scattered { density: f64 },
    /// Single-node patches scattered inside an explicit sub-region
    Diffuse { region: Region, density: f64 },
}

/// Fibrosis configuration for a tissue run.
///
/// Map generation is deterministic: identical seed, geometry and pattern
/// always reproduce the same map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibrosisConfig {
    pub pattern: FibrosisPattern,
    /// Conductivity multiplier inside fibrotic nodes (0 = non-conducting)
    pub conductivity_factor: f64,
    /// Seed for the placement generator
    pub seed: u32,
}

/// Axis along which transmural bands are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TransmuralAxis {
    /// Bands vary with the row index (endo at row 0)
    #[default]
    Y,
    /// Bands vary with the column index (endo at column 0)
    X,
}

/// Transmural zonation: endo/mid/epi bands across the tissue extent.
///
/// Band edges are fractions of the extent; the epicardial band takes the
/// remainder. Only the minimal ventricular model distinguishes cell types;
/// the two-variable models accept and ignore the zone index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransmuralConfig {
    /// Endocardial band as a fraction of the extent
    /// Reference: ~30% endo / 40% mid / 30% epi across the LV wall
    /// Source: Glukhov et al., Circ Res 2010
    pub endo_fraction: f64,

    /// Midmyocardial band as a fraction of the extent
    pub mid_fraction: f64,

    pub axis: TransmuralAxis,
}

impl Default for TransmuralConfig {
    fn default() -> Self {
        Self {
            // Glukhov et al. 2010
            endo_fraction: 0.3,
            mid_fraction: 0.4,
            axis: TransmuralAxis::Y,
        }
    }
}

/// Time integration strategy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IntegrationMethod {
    /// Explicit Euler for the voltage plus Rush-Larsen exponential updates
    /// for every eligible gate; the only choice for spatial runs.
    /// Reference: Rush & Larsen, IEEE Trans Biomed Eng 1978
    #[default]
    EulerRushLarsen,
    /// Classical RK4 over the full state vector; single-cell runs only
    Rk4,
}

/// Complete description of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Cell model and its parameter set
    pub model: ModelConfig,
    /// Geometry class
    pub geometry: Geometry,
    /// Requested time step (ms); may be reduced once by the stability clamp
    pub dt_ms: f64,
    /// Total simulated time (ms)
    pub duration_ms: f64,
    /// Downsampling stride: one snapshot every `stride` steps
    pub stride: usize,
    /// Stimulation schedule (chained timing, see `StimulusSpec`)
    pub stimuli: Vec<StimulusSpec>,
    /// Tissue conductivity (ignored for single-cell runs)
    pub conductivity: Conductivity,
    /// Optional fibrosis map generation (tissue only)
    pub fibrosis: Option<FibrosisConfig>,
    /// Optional transmural zonation (tissue only)
    pub transmural: Option<TransmuralConfig>,
    /// Time integration strategy
    pub method: IntegrationMethod,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        let mut params = Self::single_cell(ModelConfig::default(), 0.01, 500.0);
        params.stimuli.push(StimulusSpec::point(10.0, 1.0, 0.3));
        params
    }
}

impl SimulationParameters {
    /// Single-cell run scaffold; add stimuli before running
    pub fn single_cell(model: ModelConfig, dt_ms: f64, duration_ms: f64) -> Self {
        Self {
            model,
            geometry: Geometry::SingleCell,
            dt_ms,
            duration_ms,
            stride: 1,
            stimuli: Vec::new(),
            conductivity: Conductivity::default(),
            fibrosis: None,
            transmural: None,
            method: IntegrationMethod::default(),
        }
    }

    /// Cable run scaffold
    pub fn cable(
        model: ModelConfig,
        nodes: usize,
        dx_mm: f64,
        dt_ms: f64,
        duration_ms: f64,
    ) -> Self {
        Self {
            geometry: Geometry::Cable { nodes, dx_mm },
            ..Self::single_cell(model, dt_ms, duration_ms)
        }
    }

    /// Tissue run scaffold
    pub fn tissue(model: ModelConfig, n: usize, dx_mm: f64, dt_ms: f64, duration_ms: f64) -> Self {
        Self {
            geometry: Geometry::Tissue { n, dx_mm },
            ..Self::single_cell(model, dt_ms, duration_ms)
        }
    }

    /// Number of integration steps implied by `dt_ms` (before any clamp)
    pub fn step_count(&self) -> usize {
        (self.duration_ms / self.dt_ms).round() as usize
    }

    /// Static validation of everything that does not depend on built maps.
    ///
    /// The Driver calls this during initialization; callers may also use it
    /// for early feedback before submitting a run.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.dt_ms <= 0.0 {
            return Err(ConfigurationError::NonPositiveDt { dt_ms: self.dt_ms });
        }
        if self.step_count() == 0 {
            return Err(ConfigurationError::ZeroSteps {
                dt_ms: self.dt_ms,
                duration_ms: self.duration_ms,
            });
        }
        if self.stride == 0 {
            return Err(ConfigurationError::ZeroStride);
        }
        match self.geometry {
            Geometry::SingleCell => {}
            Geometry::Cable { nodes, dx_mm } => {
                if nodes < 3 {
                    return Err(ConfigurationError::GridTooSmall {
                        min: 3,
                        actual: nodes,
                    });
                }
                if dx_mm <= 0.0 {
                    return Err(ConfigurationError::NonPositiveDx { dx_mm });
                }
            }
            Geometry::Tissue { n, dx_mm } => {
                if n < 3 {
                    return Err(ConfigurationError::GridTooSmall { min: 3, actual: n });
                }
                if dx_mm <= 0.0 {
                    return Err(ConfigurationError::NonPositiveDx { dx_mm });
                }
            }
        }
        if self.conductivity.sigma_l < 0.0 || self.conductivity.sigma_t < 0.0 {
            return Err(ConfigurationError::NegativeConductivity {
                sigma_l: self.conductivity.sigma_l,
                sigma_t: self.conductivity.sigma_t,
            });
        }
        if self.method == IntegrationMethod::Rk4 && self.geometry != Geometry::SingleCell {
            return Err(ConfigurationError::Rk4RequiresSingleCell);
        }
        for (index, stim) in self.stimuli.iter().enumerate() {
            if stim.duration_ms <= 0.0 {
                return Err(ConfigurationError::NonPositiveStimulusDuration {
                    index,
                    duration_ms: stim.duration_ms,
                });
            }
        }
        if let Some(fib) = &self.fibrosis {
            let density = match fib.pattern {
                FibrosisPattern::Scattered { density }
                | FibrosisPattern::Diffuse { density, .. } => density,
                FibrosisPattern::Compact { .. } => 0.0,
            };
            if !(0.0..=1.0).contains(&density) {
                return Err(ConfigurationError::DensityOutOfRange { density });
            }
        }
        if let Some(tm) = &self.transmural {
            let valid = tm.endo_fraction > 0.0
                && tm.mid_fraction > 0.0
                && tm.endo_fraction + tm.mid_fraction < 1.0;
            if !valid {
                return Err(ConfigurationError::InvalidBandFractions {
                    endo: tm.endo_fraction,
                    mid: tm.mid_fraction,
                });
            }
        }
        Ok(())
    }

    /// Parse parameters from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize parameters to a JSON string
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(params) => {
                    log::info!("Loaded run parameters from {:?}", path.as_ref());
                    params
                }
                Err(e) => {
                    log::warn!("Failed to parse run parameters: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Run parameters file not found, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params() -> SimulationParameters {
        SimulationParameters::single_cell(ModelConfig::default(), 0.01, 500.0)
    }

    #[test]
    fn test_node_counts() {
        assert_eq!(Geometry::SingleCell.node_count(), 1);
        assert_eq!(
            Geometry::Cable {
                nodes: 100,
                dx_mm: 0.1
            }
            .node_count(),
            100
        );
        assert_eq!(
            Geometry::Tissue {
                n: 50,
                dx_mm: 0.25
            }
            .node_count(),
            2500
        );
    }

    #[test]
    fn test_step_count_rounds() {
        let params = base_params();
        assert_eq!(params.step_count(), 50_000);
    }

    #[test]
    fn test_validate_rejects_zero_steps() {
        let mut params = base_params();
        params.duration_ms = 0.0;
        assert!(matches!(
            params.validate(),
            Err(ConfigurationError::ZeroSteps { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_rk4_on_tissue() {
        let mut params =
            SimulationParameters::tissue(ModelConfig::default(), 50, 0.25, 0.02, 100.0);
        params.method = IntegrationMethod::Rk4;
        assert!(matches!(
            params.validate(),
            Err(ConfigurationError::Rk4RequiresSingleCell)
        ));
    }

    #[test]
    fn test_validate_rejects_bad_bands() {
        let mut params =
            SimulationParameters::tissue(ModelConfig::default(), 50, 0.25, 0.02, 100.0);
        params.transmural = Some(TransmuralConfig {
            endo_fraction: 0.7,
            mid_fraction: 0.5,
            axis: TransmuralAxis::Y,
        });
        assert!(matches!(
            params.validate(),
            Err(ConfigurationError::InvalidBandFractions { .. })
        ));
    }

    #[test]
    fn test_region_membership() {
        let rect = Region::Rect {
            x: 2,
            y: 3,
            width: 4,
            height: 2,
        };
        assert!(rect.contains(2, 3));
        assert!(rect.contains(5, 4));
        assert!(!rect.contains(6, 4));
        assert!(!rect.contains(2, 5));

        let circle = Region::Circle {
            cx: 10.0,
            cy: 10.0,
            radius: 2.5,
        };
        assert!(circle.contains(10, 10));
        assert!(circle.contains(12, 10));
        assert!(!circle.contains(13, 10));
    }

    #[test]
    fn test_region_distance_outside() {
        let rect = Region::Rect {
            x: 5,
            y: 5,
            width: 3,
            height: 3,
        };
        assert_eq!(rect.distance_outside(6, 6), 0.0);
        assert_eq!(rect.distance_outside(3, 6), 2.0);

        let circle = Region::Circle {
            cx: 0.0,
            cy: 0.0,
            radius: 1.0,
        };
        assert!((circle.distance_outside(3, 0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_json_round_trip() {
        let params = base_params();
        let json = params.to_json_string().unwrap();
        let parsed = SimulationParameters::from_json_str(&json).unwrap();
        assert_eq!(parsed.dt_ms, params.dt_ms);
        assert_eq!(parsed.geometry, params.geometry);
    }
}
