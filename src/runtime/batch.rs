//! Protocol sweep runners.
//!
//! A sweep is a set of fully independent single-cell runs, one per swept
//! value, each starting from rest. The runners spawn every iteration as
//! its own unit, join them in sweep order and reduce the traces to the
//! protocol's aggregate. Joins are all-or-nothing: the first failed
//! iteration cancels the remaining ones and fails the whole sweep.
//!
//! Windowing happens on the sampled trace: beat onsets from the protocol
//! are converted to sample indices, and each APD is measured inside its
//! own beat window so a long action potential in one beat cannot leak
//! into the measurement of the next.

use crate::analysis::{accept_point, measure_apd90_in, BclSeriesEntry, RestitutionCurve};
use crate::config::{BclSeriesProtocol, DynamicRestitutionProtocol, S1S2RestitutionProtocol};
use crate::error::SimResult;
use crate::runtime::host::{join_all, SimulationHost};
use crate::state::CellTrace;

impl SimulationHost {
    /// Run an S1-S2 restitution sweep and assemble the (DI, APD) curve.
    ///
    /// The driving APD is measured between the last S1 onset and the S2
    /// onset, the probe APD from the S2 onset to the end of the trace.
    /// Rejected points are dropped silently; the curve is sorted
    /// ascending by diastolic interval.
    pub fn run_s1s2_restitution(
        &self,
        protocol: &S1S2RestitutionProtocol,
    ) -> SimResult<RestitutionCurve> {
        protocol.validate()?;
        let couplings = protocol.couplings();
        log::debug!("S1-S2 sweep: {} coupling intervals", couplings.len());

        let mut handles = Vec::with_capacity(couplings.len());
        for &coupling_ms in &couplings {
            let unit = format!("s1s2-ci{coupling_ms:.0}");
            handles.push(self.spawn_cell_as(unit, &protocol.run_parameters(coupling_ms))?);
        }
        let traces = join_all(handles)?;

        let mut curve = RestitutionCurve::default();
        for (&coupling_ms, trace) in couplings.iter().zip(&traces) {
            let drive_start = sample_index(protocol.last_s1_onset_ms(), trace);
            let probe_start = sample_index(protocol.s2_onset_ms(coupling_ms), trace);
            let dt = trace.sample_dt_ms();
            let apd_drive = measure_apd90_in(&trace.v, dt, drive_start, probe_start);
            let apd_probe = measure_apd90_in(&trace.v, dt, probe_start, trace.len());
            if let Some(point) = accept_point(coupling_ms, apd_drive, apd_probe) {
                curve.push(point);
            }
        }
        curve.sort_by_di();
        Ok(curve)
    }

    /// Run a dynamic restitution sweep and assemble the (DI, APD) curve.
    ///
    /// At each cycle length the last paced beat is the probe and the beat
    /// before it supplies the diastolic interval.
    pub fn run_dynamic_restitution(
        &self,
        protocol: &DynamicRestitutionProtocol,
    ) -> SimResult<RestitutionCurve> {
        protocol.validate()?;
        let bcls = protocol.bcls();
        log::debug!("Dynamic restitution sweep: {} cycle lengths", bcls.len());

        let mut handles = Vec::with_capacity(bcls.len());
        for &bcl_ms in &bcls {
            let unit = format!("dynamic-bcl{bcl_ms:.0}");
            handles.push(self.spawn_cell_as(unit, &protocol.run_parameters(bcl_ms))?);
        }
        let traces = join_all(handles)?;

        let mut curve = RestitutionCurve::default();
        for (&bcl_ms, trace) in bcls.iter().zip(&traces) {
            let (apd_drive, apd_probe) =
                last_two_beats(trace, protocol.onset_ms(bcl_ms, protocol.beats_per_level - 2), bcl_ms);
            if let Some(point) = accept_point(bcl_ms, apd_drive, apd_probe) {
                curve.push(point);
            }
        }
        curve.sort_by_di();
        Ok(curve)
    }

    /// Run every cycle length of a BCL series and aggregate per-BCL
    /// outcomes, sorted descending by cycle length.
    ///
    /// Unlike the restitution sweeps this keeps one entry per requested
    /// cycle length even when no action potential was detected.
    pub fn run_bcl_series(&self, protocol: &BclSeriesProtocol) -> SimResult<Vec<BclSeriesEntry>> {
        protocol.validate()?;
        log::debug!("BCL series: {} cycle lengths", protocol.bcls_ms.len());

        let mut handles = Vec::with_capacity(protocol.bcls_ms.len());
        for &bcl_ms in &protocol.bcls_ms {
            let unit = format!("series-bcl{bcl_ms:.0}");
            handles.push(self.spawn_cell_as(unit, &protocol.run_parameters(bcl_ms))?);
        }
        let traces = join_all(handles)?;

        let mut entries = Vec::with_capacity(traces.len());
        for (&bcl_ms, trace) in protocol.bcls_ms.iter().zip(traces.into_iter()) {
            let (apd_drive, apd_probe) =
                last_two_beats(&trace, protocol.onset_ms(bcl_ms, protocol.beats - 2), bcl_ms);
            let di_ms = (apd_drive > 0.0 && bcl_ms - apd_drive > 0.0).then(|| bcl_ms - apd_drive);
            entries.push(BclSeriesEntry {
                bcl_ms,
                apd90_ms: apd_probe,
                di_ms,
                trace: protocol.keep_traces.then_some(trace),
            });
        }
        entries.sort_by(|a, b| b.bcl_ms.total_cmp(&a.bcl_ms));
        Ok(entries)
    }
}

/// APDs of the final two beats of a paced trace: the beat starting at
/// `drive_onset_ms` (windowed to one cycle length) and the one after it
/// (windowed to the end of the trace).
fn last_two_beats(trace: &CellTrace, drive_onset_ms: f64, bcl_ms: f64) -> (f64, f64) {
    let dt = trace.sample_dt_ms();
    let drive_start = sample_index(drive_onset_ms, trace);
    let probe_start = sample_index(drive_onset_ms + bcl_ms, trace);
    let apd_drive = measure_apd90_in(&trace.v, dt, drive_start, probe_start);
    let apd_probe = measure_apd90_in(&trace.v, dt, probe_start, trace.len());
    (apd_drive, apd_probe)
}

/// Index of the sample at or just before `t_ms`
fn sample_index(t_ms: f64, trace: &CellTrace) -> usize {
    (t_ms / trace.sample_dt_ms()).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;

    fn quick_s1s2() -> S1S2RestitutionProtocol {
        S1S2RestitutionProtocol {
            dt_ms: 0.05,
            stride: 4,
            s1_count: 2,
            s1_bcl_ms: 500.0,
            coupling_max_ms: 450.0,
            coupling_min_ms: 400.0,
            coupling_step_ms: 50.0,
            tail_ms: 400.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_s1s2_sweep_builds_sorted_curve() {
        let host = SimulationHost::new();
        let curve = host.run_s1s2_restitution(&quick_s1s2()).unwrap();
        assert_eq!(curve.len(), 2);
        for pair in curve.points.windows(2) {
            assert!(pair[0].di_ms <= pair[1].di_ms);
        }
        for point in &curve.points {
            assert!(point.di_ms > 0.0);
            assert!(point.apd_ms > 0.0);
        }
    }

    #[test]
    fn test_dynamic_sweep_builds_curve() {
        let host = SimulationHost::new();
        let protocol = DynamicRestitutionProtocol {
            dt_ms: 0.05,
            stride: 4,
            bcl_max_ms: 500.0,
            bcl_min_ms: 450.0,
            bcl_step_ms: 50.0,
            beats_per_level: 3,
            tail_ms: 300.0,
            ..Default::default()
        };
        let curve = host.run_dynamic_restitution(&protocol).unwrap();
        assert_eq!(curve.len(), 2);
    }

    #[test]
    fn test_bcl_series_keeps_every_bcl_descending() {
        let host = SimulationHost::new();
        let protocol = BclSeriesProtocol {
            dt_ms: 0.05,
            stride: 4,
            bcls_ms: vec![500.0, 400.0, 450.0],
            beats: 2,
            tail_ms: 300.0,
            keep_traces: false,
            ..Default::default()
        };
        let entries = host.run_bcl_series(&protocol).unwrap();
        let bcls: Vec<f64> = entries.iter().map(|e| e.bcl_ms).collect();
        assert_eq!(bcls, vec![500.0, 450.0, 400.0]);
        for entry in &entries {
            assert!(entry.apd90_ms > 0.0, "no beat detected at {}", entry.bcl_ms);
            assert!(entry.trace.is_none());
        }
    }

    #[test]
    fn test_invalid_iteration_fails_whole_sweep() {
        let host = SimulationHost::new();
        let protocol = S1S2RestitutionProtocol {
            dt_ms: 0.0,
            ..quick_s1s2()
        };
        let result = host.run_s1s2_restitution(&protocol);
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
    }
}
