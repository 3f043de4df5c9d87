//! Restitution protocol tests.
//!
//! Tests verify that:
//! - APD90 measurement follows the documented amplitude/threshold contract
//! - The S1-S2 sweep yields a DI-ordered curve with physiological slope
//! - Couplings too short for a valid diastolic interval are rejected
//! - The dynamic sweep produces one point per captured cycle length
//! - The BCL series aggregates descending entries with DI bookkeeping

use cardiosim::config::{BclSeriesProtocol, DynamicRestitutionProtocol, S1S2RestitutionProtocol};
use cardiosim::{measure_apd90, SimulationHost};

/// Sweep settings shared by the quick protocol tests: coarse but stable
/// stepping so a full sweep stays fast.
fn quick_s1s2(coupling_max: f64, coupling_min: f64, step: f64) -> S1S2RestitutionProtocol {
    S1S2RestitutionProtocol {
        dt_ms: 0.05,
        stride: 4,
        start_ms: 10.0,
        s1_count: 2,
        s1_bcl_ms: 500.0,
        coupling_max_ms: coupling_max,
        coupling_min_ms: coupling_min,
        coupling_step_ms: step,
        tail_ms: 400.0,
        ..Default::default()
    }
}

#[test]
fn test_apd90_follows_the_reference_contract() {
    // Rise to 1.0 at sample 10, linear fall to 0 over the next 100 samples:
    // depolarization at index 10, 90% repolarization at index 100
    let mut trace = vec![0.0; 10];
    trace.extend((0..=100).map(|i| 1.0 - i as f64 / 100.0));
    let apd = measure_apd90(&trace, 0.1);
    assert!(
        (apd - 9.0).abs() < 1e-9,
        "reference trace gave APD90 = {} ms, expected 9.0",
        apd
    );

    // Sub-threshold amplitude is noise, not an action potential
    let flat: Vec<f64> = (0..200).map(|i| 0.05 + 0.1 * (i as f64 / 200.0)).collect();
    assert_eq!(measure_apd90(&flat, 0.1), 0.0);
}

#[test]
fn test_s1s2_sweep_produces_ascending_curve() {
    let host = SimulationHost::new();
    let curve = host
        .run_s1s2_restitution(&quick_s1s2(500.0, 400.0, 50.0))
        .unwrap();

    assert_eq!(curve.len(), 3, "all three couplings should be accepted");
    for pair in curve.points.windows(2) {
        assert!(
            pair[1].di_ms > pair[0].di_ms,
            "curve not DI-ordered: {} ms after {} ms",
            pair[1].di_ms,
            pair[0].di_ms
        );
        // Restitution: longer recovery gives a longer action potential
        assert!(
            pair[1].apd_ms > pair[0].apd_ms,
            "APD did not grow with DI: {} ms at DI {} ms, {} ms at DI {} ms",
            pair[0].apd_ms,
            pair[0].di_ms,
            pair[1].apd_ms,
            pair[1].di_ms
        );
    }
    for point in &curve.points {
        assert!(point.di_ms > 0.0);
        assert!(
            (50.0..400.0).contains(&point.apd_ms),
            "APD {} ms outside the plausible range",
            point.apd_ms
        );
    }
}

#[test]
fn test_coupling_shorter_than_drive_apd_is_rejected() {
    // 200 ms truncates the drive action potential, so no valid DI exists
    // for the shortest coupling and the curve loses that point
    let host = SimulationHost::new();
    let curve = host
        .run_s1s2_restitution(&quick_s1s2(450.0, 200.0, 125.0))
        .unwrap();

    assert_eq!(curve.len(), 2, "the 200 ms coupling should be rejected");
    for point in &curve.points {
        assert!(point.di_ms > 0.0);
        assert!(point.apd_ms > 0.0);
    }
}

#[test]
fn test_dynamic_sweep_produces_one_point_per_level() {
    let protocol = DynamicRestitutionProtocol {
        dt_ms: 0.05,
        stride: 4,
        start_ms: 10.0,
        bcl_max_ms: 500.0,
        bcl_min_ms: 400.0,
        bcl_step_ms: 100.0,
        beats_per_level: 3,
        tail_ms: 400.0,
        ..Default::default()
    };
    let host = SimulationHost::new();
    let curve = host.run_dynamic_restitution(&protocol).unwrap();

    assert_eq!(curve.len(), 2);
    assert!(curve.points[0].di_ms < curve.points[1].di_ms);
    for point in &curve.points {
        assert!(point.di_ms > 0.0);
        assert!(point.apd_ms > 0.0);
    }
}

#[test]
fn test_bcl_series_aggregates_descending_entries() {
    let protocol = BclSeriesProtocol {
        dt_ms: 0.05,
        stride: 4,
        start_ms: 10.0,
        bcls_ms: vec![500.0, 350.0, 425.0],
        beats: 3,
        tail_ms: 400.0,
        keep_traces: true,
        ..Default::default()
    };
    let host = SimulationHost::new();
    let entries = host.run_bcl_series(&protocol).unwrap();

    let bcls: Vec<f64> = entries.iter().map(|e| e.bcl_ms).collect();
    assert_eq!(bcls, vec![500.0, 425.0, 350.0], "entries not BCL-descending");

    for entry in &entries {
        assert!(
            entry.apd90_ms > 50.0,
            "BCL {} ms: implausible APD90 {} ms",
            entry.bcl_ms,
            entry.apd90_ms
        );
        let di = entry.di_ms.expect("captured run should report a DI");
        assert!(di > 0.0);
        let trace = entry.trace.as_ref().expect("keep_traces was set");
        assert!(!trace.is_empty());
    }
}

#[test]
fn test_traces_are_dropped_unless_requested() {
    let protocol = BclSeriesProtocol {
        dt_ms: 0.05,
        stride: 4,
        start_ms: 10.0,
        bcls_ms: vec![450.0],
        beats: 2,
        tail_ms: 400.0,
        keep_traces: false,
        ..Default::default()
    };
    let host = SimulationHost::new();
    let entries = host.run_bcl_series(&protocol).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].trace.is_none());
}
