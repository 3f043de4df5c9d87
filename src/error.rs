//! Error types for the simulation engine.
//!
//! All fallible paths return strongly typed errors so callers can pattern
//! match on the specific failure. Numerical instability is intentionally not
//! an error category: the CFL clamp prevents it proactively and per-step
//! state clamping bounds the damage.

use thiserror::Error;

/// Validation errors raised while a run request is turned into a Driver.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    #[error("Time step {dt_ms} ms and duration {duration_ms} ms imply zero steps")]
    ZeroSteps { dt_ms: f64, duration_ms: f64 },

    #[error("Time step must be positive, got {dt_ms} ms")]
    NonPositiveDt { dt_ms: f64 },

    #[error("Grid dimension must be at least {min}, got {actual}")]
    GridTooSmall { min: usize, actual: usize },

    #[error("Spatial resolution must be positive, got {dx_mm} mm")]
    NonPositiveDx { dx_mm: f64 },

    #[error("Downsampling stride must be at least 1")]
    ZeroStride,

    #[error("Conductivity must be non-negative: sigma_l={sigma_l}, sigma_t={sigma_t}")]
    NegativeConductivity { sigma_l: f64, sigma_t: f64 },

    #[error("Fibrosis density {density} is outside [0, 1]")]
    DensityOutOfRange { density: f64 },

    #[error("Transmural band fractions must be in (0, 1) and sum below 1: endo={endo}, mid={mid}")]
    InvalidBandFractions { endo: f64, mid: f64 },

    #[error("Stimulus {index} has non-positive duration {duration_ms} ms")]
    NonPositiveStimulusDuration { index: usize, duration_ms: f64 },

    #[error("RK4 integration is only available for single-cell runs")]
    Rk4RequiresSingleCell,

    #[error("Region {region} does not intersect the {n}x{n} grid")]
    RegionOutsideGrid { region: String, n: usize },

    #[error("Restitution sweep bounds are empty: from {from_ms} to {to_ms} step {step_ms}")]
    EmptySweep {
        from_ms: f64,
        to_ms: f64,
        step_ms: f64,
    },

    #[error("Pacing protocol requires at least one beat per level")]
    ZeroBeats,

    #[error("BCL series requires at least one cycle length")]
    EmptyBclList,

    #[error("Stimulus duration {duration_ms} ms does not fit inside cycle length {cycle_ms} ms")]
    StimulusExceedsCycle { duration_ms: f64, cycle_ms: f64 },

    #[error("Run entry point expects a {expected} geometry")]
    GeometryMismatch { expected: &'static str },
}

/// Errors raised while an isolated simulation unit executes.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("Run was cancelled before completion")]
    Cancelled,

    #[error("Simulation unit '{unit}' terminated abnormally")]
    UnitFailed { unit: String },

    #[error("Simulation unit '{unit}' disconnected before replying")]
    Disconnected { unit: String },
}

/// Top-level error type for the engine.
#[derive(Debug, Clone, Error)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

/// Result alias used across the crate.
pub type SimResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_rolls_up() {
        let err: SimulationError = ConfigurationError::ZeroStride.into();
        assert!(matches!(err, SimulationError::Configuration(_)));
        assert!(err.to_string().contains("stride"));
    }

    #[test]
    fn test_cancelled_is_execution_error() {
        let err: SimulationError = ExecutionError::Cancelled.into();
        assert!(matches!(
            err,
            SimulationError::Execution(ExecutionError::Cancelled)
        ));
    }
}
