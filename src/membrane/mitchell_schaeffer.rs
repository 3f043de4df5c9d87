//! Mitchell-Schaeffer two-current membrane model.
//!
//! dv/dt = h·v²·(1−v)/τ_in − v/τ_out + I_stim
//! dh/dt = (1−h)/τ_open for v < v_gate, −h/τ_close otherwise
//!
//! The gate switch at `v_gate` is discontinuous in the derivative. That is
//! part of the published model and is kept as-is, in contrast to the
//! tanh-blended time constants of the minimal ventricular model.
//!
//! Reference: Mitchell & Schaeffer, Bull Math Biol 2003.

use serde::{Deserialize, Serialize};

use crate::membrane::GateLaw;

/// Mitchell-Schaeffer parameters, normalized voltage units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MsParameters {
    /// Fast inward current time scale (ms)
    /// Source: Mitchell & Schaeffer, Bull Math Biol 2003, Table 1
    pub tau_in: f64,

    /// Slow outward current time scale (ms)
    pub tau_out: f64,

    /// Gate recovery time scale below threshold (ms)
    pub tau_open: f64,

    /// Gate inactivation time scale above threshold (ms)
    pub tau_close: f64,

    /// Gate switching threshold (normalized voltage)
    pub v_gate: f64,
}

impl Default for MsParameters {
    fn default() -> Self {
        Self {
            // Mitchell & Schaeffer 2003, Table 1
            tau_in: 0.3,
            tau_out: 6.0,
            tau_open: 120.0,
            tau_close: 150.0,
            v_gate: 0.13,
        }
    }
}

impl MsParameters {
    /// Voltage reaction term
    pub(crate) fn dv_dt(&self, v: f64, h: f64, i_stim: f64) -> f64 {
        h * v * v * (1.0 - v) / self.tau_in - v / self.tau_out + i_stim
    }

    /// Relaxation law of the h gate; hard switch at `v_gate`
    pub(crate) fn h_law(&self, v: f64) -> GateLaw {
        if v < self.v_gate {
            GateLaw {
                target: 1.0,
                tau_ms: self.tau_open,
            }
        } else {
            GateLaw {
                target: 0.0,
                tau_ms: self.tau_close,
            }
        }
    }
}
