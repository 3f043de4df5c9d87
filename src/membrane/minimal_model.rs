//! Minimal ventricular membrane model (4 variables).
//!
//! Lumped-current reformulation of human ventricular kinetics: a fast
//! inward current J_fi (upstroke), a slow outward current J_so
//! (repolarization) and a slow inward current J_si (plateau), gated by v, w
//! and s. Every gate time constant is itself voltage-dependent, switched by
//! Heaviside thresholds or blended smoothly with tanh exactly as published.
//! Distinct parameter tables reproduce endocardial, midmyocardial and
//! epicardial action potentials.
//!
//! Reference: Bueno-Orovio, Cherry & Fenton, "Minimal model for human
//! ventricular action potentials in tissue", J Theor Biol 2008.

use serde::{Deserialize, Serialize};

use crate::membrane::GateLaw;

#[inline]
fn heaviside(x: f64) -> f64 {
    if x >= 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Transmural cell type; selects one of the published parameter tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CellType {
    Endocardial,
    Midmyocardial,
    #[default]
    Epicardial,
}

impl CellType {
    /// Zone index used by transmural maps (0 endo, 1 mid, 2 epi)
    pub fn zone(&self) -> u8 {
        match self {
            CellType::Endocardial => 0,
            CellType::Midmyocardial => 1,
            CellType::Epicardial => 2,
        }
    }
}

/// One parameter table of the minimal ventricular model.
///
/// All time constants in ms, voltages normalized. Values follow Table 1 of
/// Bueno-Orovio, Cherry & Fenton, J Theor Biol 2008.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimalParameters {
    /// Resting voltage offset
    pub u_o: f64,
    /// Peak voltage scale
    pub u_u: f64,
    /// Fast-inward activation threshold
    pub theta_v: f64,
    /// Slow-current activation threshold
    pub theta_w: f64,
    /// v-gate recovery threshold
    pub theta_v_minus: f64,
    /// w-steady-state switch threshold
    pub theta_o: f64,
    /// v-gate recovery time constant below theta_v_minus (ms)
    pub tau_v1_minus: f64,
    /// v-gate recovery time constant above theta_v_minus (ms)
    pub tau_v2_minus: f64,
    /// v-gate inactivation time constant (ms)
    pub tau_v_plus: f64,
    /// w-gate recovery time constant, lower blend limit (ms)
    pub tau_w1_minus: f64,
    /// w-gate recovery time constant, upper blend limit (ms)
    pub tau_w2_minus: f64,
    /// Slope of the w-gate recovery tanh blend
    pub k_w_minus: f64,
    /// Center of the w-gate recovery tanh blend
    pub u_w_minus: f64,
    /// w-gate inactivation time constant (ms)
    pub tau_w_plus: f64,
    /// Fast inward current time scale (ms)
    pub tau_fi: f64,
    /// Outward current time constant below theta_o (ms)
    pub tau_o1: f64,
    /// Outward current time constant above theta_o (ms)
    pub tau_o2: f64,
    /// Slow outward time constant, lower blend limit (ms)
    pub tau_so1: f64,
    /// Slow outward time constant, upper blend limit (ms)
    pub tau_so2: f64,
    /// Slope of the slow-outward tanh blend
    pub k_so: f64,
    /// Center of the slow-outward tanh blend
    pub u_so: f64,
    /// s-gate time constant below theta_w (ms)
    pub tau_s1: f64,
    /// s-gate time constant above theta_w (ms)
    pub tau_s2: f64,
    /// Slope of the s-gate steady-state tanh
    pub k_s: f64,
    /// Center of the s-gate steady-state tanh
    pub u_s: f64,
    /// Slow inward current time scale (ms)
    pub tau_si: f64,
    /// Slope of the sub-threshold w steady state (ms)
    pub tau_w_inf: f64,
    /// w steady state above theta_o
    pub w_inf_star: f64,
}

impl MinimalParameters {
    /// Epicardial table
    /// Source: Bueno-Orovio et al. 2008, Table 1 (EPI)
    pub fn epicardial() -> Self {
        Self {
            u_o: 0.0,
            u_u: 1.55,
            theta_v: 0.3,
            theta_w: 0.13,
            theta_v_minus: 0.006,
            theta_o: 0.006,
            tau_v1_minus: 60.0,
            tau_v2_minus: 1150.0,
            tau_v_plus: 1.4506,
            tau_w1_minus: 60.0,
            tau_w2_minus: 15.0,
            k_w_minus: 65.0,
            u_w_minus: 0.03,
            tau_w_plus: 200.0,
            tau_fi: 0.11,
            tau_o1: 400.0,
            tau_o2: 6.0,
            tau_so1: 30.0181,
            tau_so2: 0.9957,
            k_so: 2.0458,
            u_so: 0.65,
            tau_s1: 2.7342,
            tau_s2: 16.0,
            k_s: 2.0994,
            u_s: 0.9087,
            tau_si: 1.8875,
            tau_w_inf: 0.07,
            w_inf_star: 0.94,
        }
    }

    /// Endocardial table
    /// Source: Bueno-Orovio et al. 2008, Table 1 (ENDO)
    pub fn endocardial() -> Self {
        Self {
            u_o: 0.0,
            u_u: 1.56,
            theta_v: 0.3,
            theta_w: 0.13,
            theta_v_minus: 0.2,
            theta_o: 0.006,
            tau_v1_minus: 75.0,
            tau_v2_minus: 10.0,
            tau_v_plus: 1.4506,
            tau_w1_minus: 6.0,
            tau_w2_minus: 140.0,
            k_w_minus: 200.0,
            u_w_minus: 0.016,
            tau_w_plus: 280.0,
            tau_fi: 0.1,
            tau_o1: 470.0,
            tau_o2: 6.0,
            tau_so1: 40.0,
            tau_so2: 1.2,
            k_so: 2.0,
            u_so: 0.65,
            tau_s1: 2.7342,
            tau_s2: 2.0,
            k_s: 2.0994,
            u_s: 0.9087,
            tau_si: 2.9013,
            tau_w_inf: 0.0273,
            w_inf_star: 0.78,
        }
    }

    /// Midmyocardial table
    /// Source: Bueno-Orovio et al. 2008, Table 1 (M)
    pub fn midmyocardial() -> Self {
        Self {
            u_o: 0.0,
            u_u: 1.61,
            theta_v: 0.3,
            theta_w: 0.13,
            theta_v_minus: 0.1,
            theta_o: 0.005,
            tau_v1_minus: 80.0,
            tau_v2_minus: 1.4506,
            tau_v_plus: 1.4506,
            tau_w1_minus: 70.0,
            tau_w2_minus: 8.0,
            k_w_minus: 200.0,
            u_w_minus: 0.016,
            tau_w_plus: 280.0,
            tau_fi: 0.078,
            tau_o1: 410.0,
            tau_o2: 7.0,
            tau_so1: 91.0,
            tau_so2: 0.8,
            k_so: 2.1,
            u_so: 0.6,
            tau_s1: 2.7342,
            tau_s2: 4.0,
            k_s: 2.0994,
            u_s: 0.9087,
            tau_si: 3.3849,
            tau_w_inf: 0.01,
            w_inf_star: 0.5,
        }
    }

    /// Voltage-dependent slow-outward time constant (tanh blend)
    fn tau_so(&self, u: f64) -> f64 {
        self.tau_so1
            + (self.tau_so2 - self.tau_so1) * 0.5 * (1.0 + ((u - self.u_so) * self.k_so).tanh())
    }

    /// Voltage reaction term: du/dt = −(J_fi + J_so + J_si) + I_stim
    pub(crate) fn du_dt(&self, u: f64, v: f64, w: f64, s: f64, i_stim: f64) -> f64 {
        let h_v = heaviside(u - self.theta_v);
        let h_w = heaviside(u - self.theta_w);
        let h_o = heaviside(u - self.theta_o);

        let j_fi = -v * h_v * (u - self.theta_v) * (self.u_u - u) / self.tau_fi;

        let tau_o = (1.0 - h_o) * self.tau_o1 + h_o * self.tau_o2;
        let j_so = (u - self.u_o) * (1.0 - h_w) / tau_o + h_w / self.tau_so(u);

        let j_si = -h_w * w * s / self.tau_si;

        -(j_fi + j_so + j_si) + i_stim
    }

    /// Relaxation law of the v gate
    pub(crate) fn v_law(&self, u: f64) -> GateLaw {
        if u < self.theta_v {
            let below_recovery = u < self.theta_v_minus;
            GateLaw {
                target: if below_recovery { 1.0 } else { 0.0 },
                tau_ms: if below_recovery {
                    self.tau_v1_minus
                } else {
                    self.tau_v2_minus
                },
            }
        } else {
            GateLaw {
                target: 0.0,
                tau_ms: self.tau_v_plus,
            }
        }
    }

    /// Relaxation law of the w gate
    pub(crate) fn w_law(&self, u: f64) -> GateLaw {
        if u < self.theta_w {
            let tau_w_minus = self.tau_w1_minus
                + (self.tau_w2_minus - self.tau_w1_minus)
                    * 0.5
                    * (1.0 + ((u - self.u_w_minus) * self.k_w_minus).tanh());
            let w_inf = if u < self.theta_o {
                1.0 - u / self.tau_w_inf
            } else {
                self.w_inf_star
            };
            GateLaw {
                target: w_inf,
                tau_ms: tau_w_minus,
            }
        } else {
            GateLaw {
                target: 0.0,
                tau_ms: self.tau_w_plus,
            }
        }
    }

    /// Relaxation law of the s gate
    pub(crate) fn s_law(&self, u: f64) -> GateLaw {
        GateLaw {
            target: 0.5 * (1.0 + ((u - self.u_s) * self.k_s).tanh()),
            tau_ms: if u < self.theta_w {
                self.tau_s1
            } else {
                self.tau_s2
            },
        }
    }
}

/// The three published parameter tables, indexed by transmural zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimalTables {
    pub endo: MinimalParameters,
    pub mid: MinimalParameters,
    pub epi: MinimalParameters,
}

impl Default for MinimalTables {
    fn default() -> Self {
        Self {
            endo: MinimalParameters::endocardial(),
            mid: MinimalParameters::midmyocardial(),
            epi: MinimalParameters::epicardial(),
        }
    }
}

impl MinimalTables {
    /// Table lookup by zone index (0 endo, 1 mid, anything else epi)
    pub fn by_zone(&self, zone: u8) -> &MinimalParameters {
        match zone {
            0 => &self.endo,
            1 => &self.mid,
            _ => &self.epi,
        }
    }
}
