//! Restitution curve assembly.
//!
//! A restitution point pairs the diastolic interval preceding a beat with
//! the APD90 of that beat. The acceptance rule is shared by every pacing
//! protocol: both the driving and the probe action potential must be
//! detectable, and the diastolic interval must be positive, otherwise the
//! point is dropped without failing the sweep.

use serde::{Deserialize, Serialize};

use crate::state::CellTrace;

/// One (DI, APD) sample of the restitution relation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestitutionPoint {
    /// Diastolic interval preceding the measured beat (ms)
    pub di_ms: f64,
    /// APD90 of the measured beat (ms)
    pub apd_ms: f64,
}

/// Accepted restitution points, sorted ascending by diastolic interval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestitutionCurve {
    pub points: Vec<RestitutionPoint>,
}

impl RestitutionCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, point: RestitutionPoint) {
        self.points.push(point);
    }

    /// Restore the ascending-DI ordering after out-of-order inserts.
    pub fn sort_by_di(&mut self) {
        self.points.sort_by(|a, b| a.di_ms.total_cmp(&b.di_ms));
    }
}

/// Acceptance rule for one sweep iteration.
///
/// `interval_ms` is the onset-to-onset distance between the driving beat
/// and the probe beat (the coupling interval for S1-S2, the cycle length
/// for dynamic pacing). The diastolic interval is that distance minus the
/// driving APD.
pub fn accept_point(interval_ms: f64, apd_drive_ms: f64, apd_probe_ms: f64) -> Option<RestitutionPoint> {
    if apd_drive_ms <= 0.0 || apd_probe_ms <= 0.0 {
        return None;
    }
    let di_ms = interval_ms - apd_drive_ms;
    if di_ms <= 0.0 {
        return None;
    }
    Some(RestitutionPoint {
        di_ms,
        apd_ms: apd_probe_ms,
    })
}

/// Outcome of one cycle length of a BCL series.
///
/// Every requested cycle length yields exactly one entry; a beat without a
/// detectable action potential reports `apd90_ms` 0 and no diastolic
/// interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BclSeriesEntry {
    pub bcl_ms: f64,
    /// APD90 of the last paced beat, 0 when undetected (ms)
    pub apd90_ms: f64,
    /// Diastolic interval before the last beat, absent when the preceding
    /// beat had no detectable action potential (ms)
    pub di_ms: Option<f64>,
    /// Raw trace of the sub-run, kept only on request
    pub trace: Option<CellTrace>,
}
