//! Action potential duration and activation-time measurement.
//!
//! APD90 is the interval between near-peak depolarization and 90%
//! repolarization. The detector is threshold-based and deliberately
//! simple: traces are clean model output, not noisy recordings, so peak
//! fractions work without filtering.
//!
//! Reference: normalized APD90 convention as in Mitchell & Schaeffer,
//! Bull Math Biol 65:767-793 (2003).

use crate::state::TissueRun;

/// Smallest max-min deflection treated as a real action potential.
/// Below this the trace is considered quiescent and APD is 0.
pub const MIN_AMPLITUDE: f64 = 0.2;

/// Fraction of the trace maximum that counts as depolarized
const DEPOLARIZATION_FRACTION: f64 = 0.98;

/// Fraction of the amplitude that must be recovered at repolarization
const REPOLARIZATION_FRACTION: f64 = 0.9;

/// APD90 of a voltage trace sampled at `sample_dt_ms`, in ms.
///
/// Returns 0 when no action potential is detectable: amplitude below
/// [`MIN_AMPLITUDE`], or no 90%-repolarization crossing after the
/// upstroke (a plateau running into the end of the trace).
pub fn measure_apd90(trace: &[f64], sample_dt_ms: f64) -> f64 {
    if trace.len() < 2 {
        return 0.0;
    }
    let max = trace.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = trace.iter().cloned().fold(f64::INFINITY, f64::min);
    let amplitude = max - min;
    if amplitude < MIN_AMPLITUDE {
        return 0.0;
    }

    let depol_level = DEPOLARIZATION_FRACTION * max;
    let repol_level = max - REPOLARIZATION_FRACTION * amplitude;

    let depol = match trace.iter().position(|&v| v >= depol_level) {
        Some(i) => i,
        None => return 0.0,
    };
    let repol = match trace[depol..].iter().position(|&v| v <= repol_level) {
        Some(offset) => depol + offset,
        None => return 0.0,
    };
    (repol - depol) as f64 * sample_dt_ms
}

/// APD90 restricted to the half-open sample window `[start, end)`.
///
/// Used to isolate one beat of a paced trace; indices are clamped to the
/// trace length.
pub fn measure_apd90_in(trace: &[f64], sample_dt_ms: f64, start: usize, end: usize) -> f64 {
    let end = end.min(trace.len());
    if start >= end {
        return 0.0;
    }
    measure_apd90(&trace[start..end], sample_dt_ms)
}

/// Time of the first sample at or above `threshold`, in ms from the
/// start of the trace. `None` when the node never activates.
pub fn activation_time_ms(trace: &[f64], sample_dt_ms: f64, threshold: f64) -> Option<f64> {
    trace
        .iter()
        .position(|&v| v >= threshold)
        .map(|i| i as f64 * sample_dt_ms)
}

/// Per-node activation times for a tissue run, in ms.
///
/// A node that never crosses `threshold` is reported as NaN. The sample
/// cadence is the run's own frame spacing.
pub fn activation_map(run: &TissueRun, threshold: f64) -> Vec<f64> {
    let nodes = run.n * run.n;
    let mut times = vec![f64::NAN; nodes];
    for node in 0..nodes {
        for (k, &t_ms) in run.time_ms.iter().enumerate() {
            if f64::from(run.frames[k * nodes + node]) >= threshold {
                times[node] = t_ms;
                break;
            }
        }
    }
    times
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rise linearly to 1.0 at index 10, then decay linearly to 0 over
    /// 100 indices.
    fn synthetic_ap() -> Vec<f64> {
        let mut trace = Vec::with_capacity(111);
        for i in 0..=10 {
            trace.push(i as f64 / 10.0);
        }
        for k in 1..=100 {
            trace.push(1.0 - k as f64 / 100.0);
        }
        trace
    }

    #[test]
    fn test_flat_trace_returns_zero() {
        let trace = vec![0.01; 500];
        assert_eq!(measure_apd90(&trace, 0.1), 0.0);
    }

    #[test]
    fn test_synthetic_trace_matches_manual_crossing() {
        // Depolarization at index 10 (first sample >= 0.98), 90%
        // repolarization at index 100 (first sample <= 0.1): 90 samples
        // at 0.1 ms each
        let apd = measure_apd90(&synthetic_ap(), 0.1);
        assert!((apd - 9.0).abs() < 1e-12, "APD90 = {}", apd);
    }

    #[test]
    fn test_plateau_without_repolarization_returns_zero() {
        let mut trace = vec![0.0; 10];
        trace.extend(std::iter::repeat(1.0).take(100));
        assert_eq!(measure_apd90(&trace, 0.1), 0.0);
    }

    #[test]
    fn test_window_isolates_second_beat() {
        let beat = synthetic_ap();
        let mut paced = beat.clone();
        paced.extend(std::iter::repeat(0.0).take(50));
        let second_start = paced.len();
        paced.extend(&beat);

        let single = measure_apd90(&beat, 0.1);
        let windowed = measure_apd90_in(&paced, 0.1, second_start, paced.len());
        assert!((single - windowed).abs() < 1e-12);
    }

    #[test]
    fn test_window_past_end_is_clamped() {
        let beat = synthetic_ap();
        assert_eq!(measure_apd90_in(&beat, 0.1, 0, usize::MAX), measure_apd90(&beat, 0.1));
        assert_eq!(measure_apd90_in(&beat, 0.1, 200, 300), 0.0);
    }

    #[test]
    fn test_activation_time_finds_first_crossing() {
        let trace = vec![0.0, 0.05, 0.2, 0.9, 1.0];
        assert_eq!(activation_time_ms(&trace, 0.5, 0.5), Some(1.5));
        assert_eq!(activation_time_ms(&trace, 0.5, 2.0), None);
    }
}
