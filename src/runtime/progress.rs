//! Progress reporting for long tissue runs.
//!
//! Updates are emitted at roughly 1% granularity. The remaining-time
//! estimate uses a moving average over the most recent reports rather than
//! the whole run, so it tracks rate changes (cache warmup, host load)
//! instead of smearing them over the full history.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Reports kept in the moving-average window
const WINDOW_REPORTS: usize = 10;

/// One progress report of an in-flight tissue run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Completed fraction of the run, 0-100
    pub percent: f64,
    /// Moving-average estimate of the remaining wall time (ms)
    pub estimated_remaining_ms: f64,
}

/// Step-rate tracker owned by the Driver while a tissue run is stepping.
#[derive(Debug)]
pub struct ProgressTracker {
    total_steps: usize,
    started: Instant,
    window: VecDeque<(usize, Instant)>,
}

impl ProgressTracker {
    pub fn new(total_steps: usize) -> Self {
        let now = Instant::now();
        let mut window = VecDeque::with_capacity(WINDOW_REPORTS + 1);
        window.push_back((0, now));
        Self {
            total_steps,
            started: now,
            window,
        }
    }

    /// Record that `steps_done` steps have completed and build an update.
    pub fn update(&mut self, steps_done: usize) -> ProgressUpdate {
        let now = Instant::now();
        self.window.push_back((steps_done, now));
        while self.window.len() > WINDOW_REPORTS + 1 {
            self.window.pop_front();
        }

        let percent = 100.0 * steps_done as f64 / self.total_steps.max(1) as f64;
        let remaining_steps = self.total_steps.saturating_sub(steps_done);

        let (window_start_steps, window_start_at) = self.window[0];
        let window_steps = steps_done.saturating_sub(window_start_steps);
        let window_elapsed = now.duration_since(window_start_at).as_secs_f64() * 1000.0;

        let estimated_remaining_ms = if window_steps > 0 && window_elapsed > 0.0 {
            remaining_steps as f64 * window_elapsed / window_steps as f64
        } else {
            // Degenerate window (first report at full speed): fall back to
            // the overall average
            let overall_ms = now.duration_since(self.started).as_secs_f64() * 1000.0;
            if steps_done > 0 {
                remaining_steps as f64 * overall_ms / steps_done as f64
            } else {
                0.0
            }
        };

        ProgressUpdate {
            percent,
            estimated_remaining_ms,
        }
    }
}
