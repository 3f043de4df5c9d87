//! Output buffers returned to the caller at run completion.
//!
//! Buffers are append-only while the Driver owns them and are moved out,
//! never copied, when the run completes. Every buffer carries the effective
//! time step actually used, which can be smaller than the requested one when
//! the stability clamp engaged.
//!
//! Voltage snapshots of spatial runs are stored as f32: they feed displays
//! and coarse analysis, while scalar traces keep full f64 precision.

use serde::{Deserialize, Serialize};

/// Scalar time series of a single-cell run: voltage plus every gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellTrace {
    pub time_ms: Vec<f64>,
    pub v: Vec<f64>,
    /// One series per gating variable, in `gate_names` order
    pub gates: Vec<Vec<f64>>,
    pub gate_names: Vec<String>,
    /// Time step actually used by the Driver (ms)
    pub effective_dt_ms: f64,
}

impl CellTrace {
    pub(crate) fn with_capacity(
        samples: usize,
        gate_names: &[&str],
        effective_dt_ms: f64,
    ) -> Self {
        Self {
            time_ms: Vec::with_capacity(samples),
            v: Vec::with_capacity(samples),
            gates: gate_names
                .iter()
                .map(|_| Vec::with_capacity(samples))
                .collect(),
            gate_names: gate_names.iter().map(|s| s.to_string()).collect(),
            effective_dt_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.time_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_ms.is_empty()
    }

    /// Series of one gate by name
    pub fn gate(&self, name: &str) -> Option<&[f64]> {
        self.gate_names
            .iter()
            .position(|g| g == name)
            .map(|i| self.gates[i].as_slice())
    }

    /// Sampling interval between consecutive snapshots (ms)
    pub fn sample_dt_ms(&self) -> f64 {
        if self.time_ms.len() < 2 {
            self.effective_dt_ms
        } else {
            self.time_ms[1] - self.time_ms[0]
        }
    }
}

/// Frame sequence of a cable run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CableRun {
    pub time_ms: Vec<f64>,
    /// One voltage snapshot per sampled step
    pub frames: Vec<Vec<f32>>,
    pub nodes: usize,
    pub dx_mm: f64,
    /// Time step actually used by the Driver (ms)
    pub effective_dt_ms: f64,
}

impl CableRun {
    pub(crate) fn with_capacity(samples: usize, nodes: usize, dx_mm: f64, dt_ms: f64) -> Self {
        Self {
            time_ms: Vec::with_capacity(samples),
            frames: Vec::with_capacity(samples),
            nodes,
            dx_mm,
            effective_dt_ms: dt_ms,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Flat frame buffer of a tissue run plus the maps needed to interpret it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TissueRun {
    pub time_ms: Vec<f64>,
    /// frames × n × n voltages, row-major within each frame
    pub frames: Vec<f32>,
    /// Nodes per side
    pub n: usize,
    pub dx_mm: f64,
    /// Per-node conductivity factor after fibrosis generation (1 = healthy)
    pub fibrosis_map: Vec<f64>,
    /// Per-node transmural zone (0 endo, 1 mid, 2 epi), when zonation is on
    pub zone_map: Option<Vec<u8>>,
    /// Time step actually used by the Driver (ms)
    pub effective_dt_ms: f64,
}

impl TissueRun {
    pub(crate) fn with_capacity(samples: usize, n: usize, dx_mm: f64, dt_ms: f64) -> Self {
        Self {
            time_ms: Vec::with_capacity(samples),
            frames: Vec::with_capacity(samples * n * n),
            n,
            dx_mm,
            fibrosis_map: Vec::new(),
            zone_map: None,
            effective_dt_ms: dt_ms,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.time_ms.len()
    }

    /// Borrow frame `k` as an n*n slice
    pub fn frame(&self, k: usize) -> &[f32] {
        let size = self.n * self.n;
        &self.frames[k * size..(k + 1) * size]
    }

    /// Voltage of node (col, row) in frame `k`
    pub fn at(&self, k: usize, col: usize, row: usize) -> f32 {
        self.frame(k)[row * self.n + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_gate_lookup() {
        let mut trace = CellTrace::with_capacity(4, &["h"], 0.01);
        trace.time_ms.push(0.0);
        trace.v.push(0.0);
        trace.gates[0].push(1.0);
        assert_eq!(trace.gate("h").unwrap()[0], 1.0);
        assert!(trace.gate("s").is_none());
    }

    #[test]
    fn test_trace_sample_dt() {
        let mut trace = CellTrace::with_capacity(3, &["h"], 0.01);
        trace.time_ms.extend([0.0, 0.05, 0.1]);
        assert!((trace.sample_dt_ms() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_tissue_frame_indexing() {
        let mut run = TissueRun::with_capacity(2, 3, 0.25, 0.02);
        run.time_ms.extend([0.0, 1.0]);
        run.frames.extend((0..18).map(|i| i as f32));
        assert_eq!(run.frame_count(), 2);
        assert_eq!(run.frame(1)[0], 9.0);
        assert_eq!(run.at(0, 2, 1), 5.0);
    }
}
