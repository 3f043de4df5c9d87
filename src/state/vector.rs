//! Per-node membrane state, structure-of-arrays layout.
//!
//! The voltage is double-buffered: `current` holds the committed state every
//! step, `scratch` receives the next step before the two are swapped. Gates
//! are single-buffered because each gate update reads only the committed
//! voltage of its own node, so write order cannot alias.

use crate::membrane::{CellKernel, MAX_GATES};

/// Complete state of one run, exclusively owned by the Driver while stepping.
#[derive(Debug, Clone)]
pub struct StateVector {
    current: Vec<f64>,
    scratch: Vec<f64>,
    /// One voltage-sized vector per gating variable
    gates: Vec<Vec<f64>>,
}

impl StateVector {
    /// Allocate a state vector with every node at the kernel's resting state
    pub fn at_rest(kernel: &CellKernel, nodes: usize) -> Self {
        let resting = kernel.resting_gates();
        let gates = (0..kernel.n_gates())
            .map(|g| vec![resting[g]; nodes])
            .collect();
        Self {
            current: vec![kernel.resting_v(); nodes],
            scratch: vec![kernel.resting_v(); nodes],
            gates,
        }
    }

    pub fn nodes(&self) -> usize {
        self.current.len()
    }

    pub fn n_gates(&self) -> usize {
        self.gates.len()
    }

    /// Committed voltage, read side of the current step
    pub fn voltage(&self) -> &[f64] {
        &self.current
    }

    /// Next-step voltage, write side of the current step
    pub fn voltage_scratch(&mut self) -> &mut [f64] {
        &mut self.scratch
    }

    /// Commit the scratch buffer as the new current voltage
    pub fn swap_voltage(&mut self) {
        std::mem::swap(&mut self.current, &mut self.scratch);
    }

    pub fn gate(&self, g: usize) -> &[f64] {
        &self.gates[g]
    }

    pub fn gate_mut(&mut self, g: usize) -> &mut [f64] {
        &mut self.gates[g]
    }

    /// Gather the gate values of one node into a fixed-size array
    pub fn gates_at(&self, node: usize) -> [f64; MAX_GATES] {
        let mut out = [0.0; MAX_GATES];
        for (g, gate) in self.gates.iter().enumerate() {
            out[g] = gate[node];
        }
        out
    }

    /// Write the gate values of one node back from a fixed-size array
    pub fn set_gates_at(&mut self, node: usize, values: &[f64; MAX_GATES]) {
        for (g, gate) in self.gates.iter_mut().enumerate() {
            gate[node] = values[g];
        }
    }
}
