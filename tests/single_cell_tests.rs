//! Single-cell simulation tests.
//!
//! Tests verify that:
//! - A paced Mitchell-Schaeffer cell produces an action potential with a
//!   physiological APD90
//! - Each of the three membrane models fires and recovers
//! - Gate traces are exported alongside the voltage
//! - The RK4 integrator agrees with the default explicit stepper

use cardiosim::config::IntegrationMethod;
use cardiosim::membrane::{CellType, FhnParameters, MsParameters};
use cardiosim::{measure_apd90, CancelToken, Driver, ModelConfig, SimulationParameters, StimulusSpec};

/// Rising crossings of `threshold`, with hysteresis
fn count_upstrokes(v: &[f64], threshold: f64) -> usize {
    let mut count = 0;
    let mut above = false;
    for &x in v {
        if !above && x >= threshold {
            count += 1;
            above = true;
        } else if above && x < threshold {
            above = false;
        }
    }
    count
}

fn run_to_trace(params: &SimulationParameters) -> cardiosim::CellTrace {
    Driver::new(params)
        .unwrap()
        .run_cell(&CancelToken::new())
        .unwrap()
}

/// Test the reference Mitchell-Schaeffer beat: tau_close = 80 ms shortens
/// the plateau into the 150-200 ms APD90 window
///
/// Reference: Mitchell & Schaeffer, Bull Math Biol 2003; the plateau
/// duration scales with tau_close·ln(1/h_min)
#[test]
fn test_mitchell_schaeffer_apd90_range() {
    let model = ModelConfig::MitchellSchaeffer(MsParameters {
        tau_close: 80.0,
        ..Default::default()
    });
    let mut params = SimulationParameters::single_cell(model, 0.01, 500.0);
    params.stimuli.push(StimulusSpec::point(5.0, 1.0, 1.0));

    let trace = run_to_trace(&params);
    let apd = measure_apd90(&trace.v, trace.sample_dt_ms());
    assert!(
        (150.0..=200.0).contains(&apd),
        "APD90 should be 150-200 ms for tau_close = 80: got {} ms",
        apd
    );
}

/// Test that a single stimulus elicits exactly one action potential
#[test]
fn test_single_stimulus_single_beat() {
    let mut params = SimulationParameters::single_cell(ModelConfig::default(), 0.01, 500.0);
    params.stimuli.push(StimulusSpec::point(5.0, 1.0, 1.0));

    let trace = run_to_trace(&params);
    assert_eq!(
        count_upstrokes(&trace.v, 0.5),
        1,
        "one stimulus should produce one upstroke"
    );
}

/// Test that the default request is self-consistent: it paces one beat
/// without further setup
#[test]
fn test_default_parameters_fire_one_beat() {
    let trace = run_to_trace(&SimulationParameters::default());
    assert_eq!(count_upstrokes(&trace.v, 0.5), 1);
    let apd = measure_apd90(&trace.v, trace.sample_dt_ms());
    assert!(apd > 0.0, "default beat should be measurable");
}

/// Test FitzHugh-Nagumo excitability: one pulse, one spike, full recovery
///
/// Reference: Rogers & McCulloch, IEEE Trans Biomed Eng 1994 (normalized
/// cubic kinetics)
#[test]
fn test_fitzhugh_nagumo_fires_and_recovers() {
    let model = ModelConfig::FitzHughNagumo(FhnParameters::default());
    let mut params = SimulationParameters::single_cell(model, 0.01, 400.0);
    params.stimuli.push(StimulusSpec::point(5.0, 1.0, 1.0));

    let trace = run_to_trace(&params);
    let peak = trace.v.iter().cloned().fold(0.0_f64, f64::max);
    let last = *trace.v.last().unwrap();
    assert!(peak > 0.6, "spike should develop, peak = {}", peak);
    assert!(last < 0.1, "membrane should recover, final v = {}", last);
    assert_eq!(count_upstrokes(&trace.v, 0.5), 1);

    let apd = measure_apd90(&trace.v, trace.sample_dt_ms());
    assert!(
        apd > 10.0,
        "FitzHugh-Nagumo spike should be tens of ms wide: got {}",
        apd
    );
}

/// Test the minimal ventricular model's epicardial action potential
///
/// Reference: Bueno-Orovio, Cherry & Fenton, J Theor Biol 2008; epicardial
/// APD90 is roughly 270 ms and the upstroke overshoots u = 1
#[test]
fn test_minimal_model_epicardial_beat() {
    let model = ModelConfig::minimal(CellType::Epicardial);
    let mut params = SimulationParameters::single_cell(model, 0.01, 600.0);
    params.stimuli.push(StimulusSpec::point(5.0, 1.0, 1.0));

    let trace = run_to_trace(&params);
    let peak = trace.v.iter().cloned().fold(0.0_f64, f64::max);
    assert!(
        peak > 1.0 && peak <= 2.0,
        "minimal model upstroke should overshoot 1: peak = {}",
        peak
    );

    let apd = measure_apd90(&trace.v, trace.sample_dt_ms());
    assert!(
        (150.0..=400.0).contains(&apd),
        "epicardial APD90 should be a few hundred ms: got {}",
        apd
    );
}

/// Test that gate series are exported with the trace and follow the beat
#[test]
fn test_gate_trace_follows_action_potential() {
    let mut params = SimulationParameters::single_cell(ModelConfig::default(), 0.01, 500.0);
    params.stimuli.push(StimulusSpec::point(5.0, 1.0, 1.0));

    let trace = run_to_trace(&params);
    let h = trace.gate("h").expect("Mitchell-Schaeffer exports its h gate");
    assert_eq!(h.len(), trace.v.len());

    let h_min = h.iter().cloned().fold(f64::INFINITY, f64::min);
    let h_final = *h.last().unwrap();
    assert!(h_min < 0.3, "h should inactivate during the plateau: min = {}", h_min);
    assert!(h_final > 0.5, "h should reopen during diastole: final = {}", h_final);
}

/// Test that RK4 and the explicit stepper measure the same beat
#[test]
fn test_rk4_agrees_with_explicit_stepper() {
    let mut euler = SimulationParameters::single_cell(ModelConfig::default(), 0.01, 500.0);
    euler.stimuli.push(StimulusSpec::point(5.0, 1.0, 1.0));
    let mut rk4 = euler.clone();
    rk4.method = IntegrationMethod::Rk4;

    let apd_euler = {
        let trace = run_to_trace(&euler);
        measure_apd90(&trace.v, trace.sample_dt_ms())
    };
    let apd_rk4 = {
        let trace = run_to_trace(&rk4);
        measure_apd90(&trace.v, trace.sample_dt_ms())
    };
    assert!(apd_euler > 0.0 && apd_rk4 > 0.0);
    assert!(
        (apd_euler - apd_rk4).abs() < 5.0,
        "integrators should agree on APD90: {} vs {} ms",
        apd_euler,
        apd_rk4
    );
}
