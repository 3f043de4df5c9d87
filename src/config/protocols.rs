//! Pacing protocol builders.
//!
//! Protocols expand into plain stimulus schedules, so the Driver needs no
//! protocol awareness: chained delay/duration windows express every pacing
//! pattern here. The sweep protocols additionally derive the per-iteration
//! run parameters consumed by the batch runners in `runtime`.
//!
//! References:
//! - Nolasco & Dahlen, J Appl Physiol 1968 (restitution hypothesis)
//! - Koller, Riccio & Gilmour, Am J Physiol 1998 (dynamic restitution protocol)

use serde::{Deserialize, Serialize};

use crate::config::parameters::{SimulationParameters, StimulusShape, StimulusSpec};
use crate::error::ConfigurationError;
use crate::membrane::ModelConfig;

/// Periodic train: `count` stimuli with onsets `bcl_ms` apart.
///
/// Expressed through chained timing: the first stimulus starts at
/// `first_delay_ms`, each later one `bcl_ms - duration_ms` after the previous
/// end. Requires `bcl_ms > duration_ms`.
pub fn periodic_train(
    count: usize,
    bcl_ms: f64,
    first_delay_ms: f64,
    shape: StimulusShape,
    duration_ms: f64,
    amplitude: f64,
) -> Vec<StimulusSpec> {
    let mut train = Vec::with_capacity(count);
    for i in 0..count {
        let delay_ms = if i == 0 {
            first_delay_ms
        } else {
            bcl_ms - duration_ms
        };
        train.push(StimulusSpec {
            shape,
            delay_ms,
            duration_ms,
            amplitude,
        });
    }
    train
}

/// S1-S2: `s1_count` stimuli at `s1_bcl_ms`, then one premature S2 whose
/// onset follows the last S1 onset by `coupling_ms`.
pub fn s1s2_schedule(
    s1_count: usize,
    s1_bcl_ms: f64,
    coupling_ms: f64,
    first_delay_ms: f64,
    shape: StimulusShape,
    duration_ms: f64,
    amplitude: f64,
) -> Vec<StimulusSpec> {
    let mut schedule = periodic_train(s1_count, s1_bcl_ms, first_delay_ms, shape, duration_ms, amplitude);
    schedule.push(StimulusSpec {
        shape,
        delay_ms: coupling_ms - duration_ms,
        duration_ms,
        amplitude,
    });
    schedule
}

/// Descending arithmetic sweep from `max` to `min` (inclusive) in steps of
/// `step`. Empty when the bounds or step are degenerate.
fn descending_sweep(max: f64, min: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || max < min {
        return Vec::new();
    }
    let count = ((max - min) / step + 1e-9).floor() as usize + 1;
    (0..count).map(|i| max - i as f64 * step).collect()
}

/// S1-S2 restitution sweep: one single-cell run per coupling interval.
///
/// Each iteration paces `s1_count` S1 beats at `s1_bcl_ms`, delivers one S2
/// after the swept coupling interval, and records the trace long enough to
/// capture the S2 action potential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S1S2RestitutionProtocol {
    pub model: ModelConfig,
    pub dt_ms: f64,
    pub stride: usize,
    /// Onset of the first S1 after t=0 (ms)
    pub start_ms: f64,
    pub s1_count: usize,
    pub s1_bcl_ms: f64,
    /// Longest coupling interval; the sweep descends from here
    pub coupling_max_ms: f64,
    /// Shortest coupling interval
    pub coupling_min_ms: f64,
    pub coupling_step_ms: f64,
    pub stimulus_duration_ms: f64,
    pub stimulus_amplitude: f64,
    /// Recording time after the S2 onset (ms)
    pub tail_ms: f64,
}

impl Default for S1S2RestitutionProtocol {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            dt_ms: 0.02,
            stride: 5,
            start_ms: 10.0,
            s1_count: 5,
            s1_bcl_ms: 600.0,
            coupling_max_ms: 500.0,
            coupling_min_ms: 250.0,
            coupling_step_ms: 25.0,
            stimulus_duration_ms: 1.0,
            stimulus_amplitude: 1.0,
            tail_ms: 500.0,
        }
    }
}

impl S1S2RestitutionProtocol {
    /// Coupling intervals in sweep order (longest first)
    pub fn couplings(&self) -> Vec<f64> {
        descending_sweep(self.coupling_max_ms, self.coupling_min_ms, self.coupling_step_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.couplings().is_empty() {
            return Err(ConfigurationError::EmptySweep {
                from_ms: self.coupling_max_ms,
                to_ms: self.coupling_min_ms,
                step_ms: self.coupling_step_ms,
            });
        }
        if self.s1_count == 0 {
            return Err(ConfigurationError::ZeroBeats);
        }
        if self.stimulus_duration_ms <= 0.0 {
            return Err(ConfigurationError::NonPositiveStimulusDuration {
                index: 0,
                duration_ms: self.stimulus_duration_ms,
            });
        }
        if self.stimulus_duration_ms >= self.s1_bcl_ms {
            return Err(ConfigurationError::StimulusExceedsCycle {
                duration_ms: self.stimulus_duration_ms,
                cycle_ms: self.s1_bcl_ms,
            });
        }
        if self.stimulus_duration_ms >= self.coupling_min_ms {
            return Err(ConfigurationError::StimulusExceedsCycle {
                duration_ms: self.stimulus_duration_ms,
                cycle_ms: self.coupling_min_ms,
            });
        }
        Ok(())
    }

    /// Onset of the last S1 beat (ms)
    pub fn last_s1_onset_ms(&self) -> f64 {
        self.start_ms + (self.s1_count - 1) as f64 * self.s1_bcl_ms
    }

    /// Onset of the S2 beat for a given coupling interval (ms)
    pub fn s2_onset_ms(&self, coupling_ms: f64) -> f64 {
        self.last_s1_onset_ms() + coupling_ms
    }

    /// Single-cell run parameters for one sweep iteration
    pub fn run_parameters(&self, coupling_ms: f64) -> SimulationParameters {
        let duration_ms = self.s2_onset_ms(coupling_ms) + self.tail_ms;
        let mut params = SimulationParameters::single_cell(self.model, self.dt_ms, duration_ms);
        params.stride = self.stride;
        params.stimuli = s1s2_schedule(
            self.s1_count,
            self.s1_bcl_ms,
            coupling_ms,
            self.start_ms,
            StimulusShape::Point,
            self.stimulus_duration_ms,
            self.stimulus_amplitude,
        );
        params
    }
}

/// Dynamic restitution sweep: one single-cell pacing run per cycle length.
///
/// Each iteration paces `beats_per_level` beats at a fixed BCL; the BCL
/// descends across iterations. The last beat probes the restitution curve,
/// the preceding beat supplies the diastolic interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicRestitutionProtocol {
    pub model: ModelConfig,
    pub dt_ms: f64,
    pub stride: usize,
    /// Onset of the first beat after t=0 (ms)
    pub start_ms: f64,
    /// Longest cycle length; the sweep descends from here
    pub bcl_max_ms: f64,
    /// Shortest cycle length
    pub bcl_min_ms: f64,
    pub bcl_step_ms: f64,
    /// Beats paced at each cycle length before the probe beat is measured
    pub beats_per_level: usize,
    pub stimulus_duration_ms: f64,
    pub stimulus_amplitude: f64,
    /// Recording time after the last onset (ms)
    pub tail_ms: f64,
}

impl Default for DynamicRestitutionProtocol {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            dt_ms: 0.02,
            stride: 5,
            start_ms: 10.0,
            bcl_max_ms: 600.0,
            bcl_min_ms: 300.0,
            bcl_step_ms: 50.0,
            beats_per_level: 8,
            stimulus_duration_ms: 1.0,
            stimulus_amplitude: 1.0,
            tail_ms: 500.0,
        }
    }
}

impl DynamicRestitutionProtocol {
    /// Cycle lengths in sweep order (longest first)
    pub fn bcls(&self) -> Vec<f64> {
        descending_sweep(self.bcl_max_ms, self.bcl_min_ms, self.bcl_step_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.bcls().is_empty() {
            return Err(ConfigurationError::EmptySweep {
                from_ms: self.bcl_max_ms,
                to_ms: self.bcl_min_ms,
                step_ms: self.bcl_step_ms,
            });
        }
        if self.beats_per_level < 2 {
            return Err(ConfigurationError::ZeroBeats);
        }
        if self.stimulus_duration_ms <= 0.0 {
            return Err(ConfigurationError::NonPositiveStimulusDuration {
                index: 0,
                duration_ms: self.stimulus_duration_ms,
            });
        }
        if self.stimulus_duration_ms >= self.bcl_min_ms {
            return Err(ConfigurationError::StimulusExceedsCycle {
                duration_ms: self.stimulus_duration_ms,
                cycle_ms: self.bcl_min_ms,
            });
        }
        Ok(())
    }

    /// Onset of beat `index` (0-based) at a given cycle length (ms)
    pub fn onset_ms(&self, bcl_ms: f64, index: usize) -> f64 {
        self.start_ms + index as f64 * bcl_ms
    }

    /// Single-cell run parameters for one sweep iteration
    pub fn run_parameters(&self, bcl_ms: f64) -> SimulationParameters {
        let last_onset = self.onset_ms(bcl_ms, self.beats_per_level - 1);
        let mut params =
            SimulationParameters::single_cell(self.model, self.dt_ms, last_onset + self.tail_ms);
        params.stride = self.stride;
        params.stimuli = periodic_train(
            self.beats_per_level,
            bcl_ms,
            self.start_ms,
            StimulusShape::Point,
            self.stimulus_duration_ms,
            self.stimulus_amplitude,
        );
        params
    }
}

/// BCL series: independent full pacing runs at explicitly listed cycle
/// lengths, aggregated afterward into one response sorted by BCL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BclSeriesProtocol {
    pub model: ModelConfig,
    pub dt_ms: f64,
    pub stride: usize,
    /// Onset of the first beat after t=0 (ms)
    pub start_ms: f64,
    /// Cycle lengths to run, in any order; results sort descending
    pub bcls_ms: Vec<f64>,
    pub beats: usize,
    pub stimulus_duration_ms: f64,
    pub stimulus_amplitude: f64,
    /// Recording time after the last onset (ms)
    pub tail_ms: f64,
    /// Keep the raw voltage trace of every sub-run in the response
    pub keep_traces: bool,
}

impl Default for BclSeriesProtocol {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            dt_ms: 0.02,
            stride: 5,
            start_ms: 10.0,
            bcls_ms: vec![600.0, 500.0, 400.0, 350.0, 300.0],
            beats: 6,
            stimulus_duration_ms: 1.0,
            stimulus_amplitude: 1.0,
            tail_ms: 500.0,
            keep_traces: false,
        }
    }
}

impl BclSeriesProtocol {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.bcls_ms.is_empty() {
            return Err(ConfigurationError::EmptyBclList);
        }
        if self.beats < 2 {
            return Err(ConfigurationError::ZeroBeats);
        }
        if self.stimulus_duration_ms <= 0.0 {
            return Err(ConfigurationError::NonPositiveStimulusDuration {
                index: 0,
                duration_ms: self.stimulus_duration_ms,
            });
        }
        for &bcl in &self.bcls_ms {
            if self.stimulus_duration_ms >= bcl {
                return Err(ConfigurationError::StimulusExceedsCycle {
                    duration_ms: self.stimulus_duration_ms,
                    cycle_ms: bcl,
                });
            }
        }
        Ok(())
    }

    /// Onset of beat `index` (0-based) at a given cycle length (ms)
    pub fn onset_ms(&self, bcl_ms: f64, index: usize) -> f64 {
        self.start_ms + index as f64 * bcl_ms
    }

    /// Single-cell run parameters for one cycle length
    pub fn run_parameters(&self, bcl_ms: f64) -> SimulationParameters {
        let last_onset = self.onset_ms(bcl_ms, self.beats - 1);
        let mut params =
            SimulationParameters::single_cell(self.model, self.dt_ms, last_onset + self.tail_ms);
        params.stride = self.stride;
        params.stimuli = periodic_train(
            self.beats,
            bcl_ms,
            self.start_ms,
            StimulusShape::Point,
            self.stimulus_duration_ms,
            self.stimulus_amplitude,
        );
        params
    }
}
