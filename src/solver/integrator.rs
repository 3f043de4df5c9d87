//! Time integration strategies.
//!
//! The engine pairs two explicit schemes. The workhorse is forward Euler for
//! the voltage combined with Rush-Larsen exponential updates for the gates
//! (`GateLaw::advance`), which stays stable at the stiff gate time constants
//! without shrinking the step. Classical RK4 over the full state vector is
//! available for single-cell accuracy studies.
//!
//! References:
//! - Rush & Larsen, IEEE Trans Biomed Eng 1978
//! - Press et al., Numerical Recipes, 3rd ed., Cambridge University Press 2007

/// 4th-order Runge-Kutta integrator over a flat state vector.
///
/// Scratch buffers are allocated once so the per-step path is allocation
/// free. Single-cell systems are small, but the sweep runners step this
/// millions of times.
#[derive(Debug, Clone)]
pub struct Rk4Integrator {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    y_temp: Vec<f64>,
}

impl Rk4Integrator {
    /// Create an integrator for a system of `n_variables`
    pub fn new(n_variables: usize) -> Self {
        Self {
            k1: vec![0.0; n_variables],
            k2: vec![0.0; n_variables],
            k3: vec![0.0; n_variables],
            k4: vec![0.0; n_variables],
            y_temp: vec![0.0; n_variables],
        }
    }

    /// One RK4 step of `dt_ms` over `y`, in place.
    ///
    /// k1 = f(y)
    /// k2 = f(y + dt/2·k1)
    /// k3 = f(y + dt/2·k2)
    /// k4 = f(y + dt·k3)
    /// y += dt/6·(k1 + 2k2 + 2k3 + k4)
    pub fn step<F>(&mut self, dt_ms: f64, y: &mut [f64], derivatives: F)
    where
        F: Fn(&[f64], &mut [f64]),
    {
        let n = y.len();
        debug_assert_eq!(n, self.k1.len());

        derivatives(y, &mut self.k1);

        for i in 0..n {
            self.y_temp[i] = y[i] + 0.5 * dt_ms * self.k1[i];
        }
        derivatives(&self.y_temp, &mut self.k2);

        for i in 0..n {
            self.y_temp[i] = y[i] + 0.5 * dt_ms * self.k2[i];
        }
        derivatives(&self.y_temp, &mut self.k3);

        for i in 0..n {
            self.y_temp[i] = y[i] + dt_ms * self.k3[i];
        }
        derivatives(&self.y_temp, &mut self.k4);

        let dt_6 = dt_ms / 6.0;
        for i in 0..n {
            y[i] += dt_6 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
    }
}
