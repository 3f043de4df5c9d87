//! Stimulus schedule resolution.
//!
//! Turns the chained stimulus list of a run request into absolute activation
//! windows with precomputed node masks. Built once during Driver
//! initialization and read-only afterward, so the per-step cost is one time
//! comparison per stimulus plus a mask lookup for the few active ones.

use crate::config::{Geometry, StimulusShape, StimulusSpec};

/// One resolved stimulus: absolute window plus node membership.
#[derive(Debug, Clone)]
pub struct StimulusWindow {
    pub start_ms: f64,
    pub end_ms: f64,
    pub amplitude: f64,
    mask: Vec<bool>,
}

impl StimulusWindow {
    #[inline]
    pub fn covers(&self, node: usize) -> bool {
        self.mask[node]
    }
}

/// All stimuli of a run, resolved to absolute time.
#[derive(Debug, Clone, Default)]
pub struct StimulusMap {
    windows: Vec<StimulusWindow>,
}

impl StimulusMap {
    /// Resolve chained timing and node membership.
    ///
    /// The first stimulus starts at its own delay, every later one at the
    /// previous *end* plus its delay. Single-cell runs ignore the footprint;
    /// on a cable the `Edge` shape covers the first `width` nodes and `Area`
    /// regions are evaluated at row 0; on tissue `Point` means the (0, 0)
    /// corner node and `Edge` the first `width` columns.
    pub fn build(stimuli: &[StimulusSpec], geometry: &Geometry) -> Self {
        let mut windows = Vec::with_capacity(stimuli.len());
        let mut cursor_ms = 0.0;
        for spec in stimuli {
            let start_ms = cursor_ms + spec.delay_ms;
            let end_ms = start_ms + spec.duration_ms;
            cursor_ms = end_ms;
            windows.push(StimulusWindow {
                start_ms,
                end_ms,
                amplitude: spec.amplitude,
                mask: node_mask(&spec.shape, geometry),
            });
        }
        Self { windows }
    }

    pub fn windows(&self) -> &[StimulusWindow] {
        &self.windows
    }

    /// Indices of the windows active at `t_ms`, appended to `out`.
    ///
    /// Activation is start-inclusive, end-exclusive.
    pub fn collect_active(&self, t_ms: f64, out: &mut Vec<usize>) {
        out.clear();
        for (index, window) in self.windows.iter().enumerate() {
            if t_ms >= window.start_ms && t_ms < window.end_ms {
                out.push(index);
            }
        }
    }

    /// Total stimulus current at one node, summed over the active windows
    #[inline]
    pub fn current_at(&self, active: &[usize], node: usize) -> f64 {
        let mut total = 0.0;
        for &index in active {
            let window = &self.windows[index];
            if window.covers(node) {
                total += window.amplitude;
            }
        }
        total
    }

    /// End of the last window (ms); 0 when the schedule is empty
    pub fn schedule_end_ms(&self) -> f64 {
        self.windows.last().map_or(0.0, |w| w.end_ms)
    }
}

fn node_mask(shape: &StimulusShape, geometry: &Geometry) -> Vec<bool> {
    match *geometry {
        Geometry::SingleCell => vec![true],
        Geometry::Cable { nodes, .. } => match *shape {
            StimulusShape::Point => {
                let mut mask = vec![false; nodes];
                mask[0] = true;
                mask
            }
            StimulusShape::Edge { width } => {
                (0..nodes).map(|i| i < width).collect()
            }
            StimulusShape::Area(region) => {
                (0..nodes).map(|i| region.contains(i, 0)).collect()
            }
        },
        Geometry::Tissue { n, .. } => {
            let mut mask = vec![false; n * n];
            match *shape {
                StimulusShape::Point => {
                    mask[0] = true;
                }
                StimulusShape::Edge { width } => {
                    for row in 0..n {
                        for col in 0..width.min(n) {
                            mask[row * n + col] = true;
                        }
                    }
                }
                StimulusShape::Area(region) => {
                    for row in 0..n {
                        for col in 0..n {
                            if region.contains(col, row) {
                                mask[row * n + col] = true;
                            }
                        }
                    }
                }
            }
            mask
        }
    }
}
