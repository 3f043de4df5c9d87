//! FitzHugh-Nagumo excitable-cell model, normalized cubic form.
//!
//! dv/dt = A·v·(1−v)·(v−α) − w + I_stim
//! dw/dt = ε·(v − γ·w)
//!
//! Cubic bistable kinetics: below α a perturbation decays, above it the
//! voltage runs to the excited branch until the recovery variable w pulls it
//! back.
//!
//! References: FitzHugh, Biophys J 1961; Nagumo et al., Proc IRE 1962.
//! Normalized form after Rogers & McCulloch, IEEE Trans Biomed Eng 1994.

use serde::{Deserialize, Serialize};

use crate::membrane::GateLaw;

/// FitzHugh-Nagumo parameters, normalized voltage units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FhnParameters {
    /// Excitation rate A (1/ms)
    /// Source: Rogers & McCulloch, IEEE Trans Biomed Eng 1994
    pub excitation_rate: f64,

    /// Excitation threshold α (normalized voltage)
    pub threshold: f64,

    /// Recovery rate ε (1/ms); small value separates the time scales
    pub epsilon: f64,

    /// Recovery coupling γ; must be positive
    pub gamma: f64,
}

impl Default for FhnParameters {
    fn default() -> Self {
        Self {
            // Rogers & McCulloch 1994 scaling
            excitation_rate: 3.0,
            threshold: 0.13,
            epsilon: 0.01,
            gamma: 1.0,
        }
    }
}

impl FhnParameters {
    /// Voltage reaction term
    pub(crate) fn dv_dt(&self, v: f64, w: f64, i_stim: f64) -> f64 {
        self.excitation_rate * v * (1.0 - v) * (v - self.threshold) - w + i_stim
    }

    /// Relaxation law of the recovery variable: dw/dt = ε(v − γw) is
    /// (v/γ − w) / (1/(εγ)) for γ > 0
    pub(crate) fn w_law(&self, v: f64) -> GateLaw {
        GateLaw {
            target: v / self.gamma,
            tau_ms: 1.0 / (self.epsilon * self.gamma),
        }
    }
}
