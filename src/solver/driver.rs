//! Simulation Driver: owns one run from validation to the finished buffers.
//!
//! Lifecycle: `new` validates the request, clamps the time step against the
//! stability limit and builds every map (diffusion, fibrosis, zones,
//! stimuli); the `run_*` methods then execute the strictly sequential time
//! loop, sampling a snapshot every `stride` steps, and move the buffers out
//! on completion. Cancellation is all-or-nothing: a cancelled run yields no
//! buffers at all.
//!
//! The Driver is geometry- and model-agnostic: one stepping loop serves
//! every kernel and spatial operator combination. Only the output buffer
//! shape differs per geometry, which is what the three entry points are for.

use crossbeam_channel::Sender;

use crate::config::{Geometry, IntegrationMethod, SimulationParameters};
use crate::error::{ConfigurationError, ExecutionError, SimResult};
use crate::membrane::{CellKernel, GateLaw, MAX_GATES, ZONE_UNSET};
use crate::runtime::{CancelToken, ProgressTracker, ProgressUpdate};
use crate::solver::diffusion::SpatialOperator;
use crate::solver::integrator::Rk4Integrator;
use crate::solver::stimulus::StimulusMap;
use crate::state::{CableRun, CellTrace, StateVector, TissueRun};
use crate::tissue::{generate_fibrosis_map, generate_zone_map, DiffusionMap, Grid};

/// Fraction of the stability limit used when the requested step exceeds it
const CFL_SAFETY: f64 = 0.9;

/// Progress reports per run (2D only)
const PROGRESS_REPORTS: usize = 100;

pub struct Driver {
    kernel: CellKernel,
    spatial: SpatialOperator,
    stimuli: StimulusMap,
    state: StateVector,
    /// Per-node transmural zone; `ZONE_UNSET` where no zonation applies
    zones: Vec<u8>,
    /// Per-node conductivity factor, returned with tissue output
    fibrosis_factors: Vec<f64>,
    /// Zone map as configured, surfaced in tissue output
    zone_map_out: Option<Vec<u8>>,
    geometry: Geometry,
    method: IntegrationMethod,
    dt_ms: f64,
    steps: usize,
    stride: usize,
}

impl Driver {
    /// Validate the request, clamp the step and build all static maps.
    pub fn new(params: &SimulationParameters) -> Result<Self, ConfigurationError> {
        params.validate()?;

        let kernel = params.model.kernel();
        let node_count = params.geometry.node_count();

        let (spatial, fibrosis_factors, zone_map_out) = match params.geometry {
            Geometry::SingleCell => (SpatialOperator::none(), vec![1.0], None),
            Geometry::Cable { nodes, dx_mm } => (
                SpatialOperator::cable(nodes, dx_mm, params.conductivity.sigma_l),
                vec![1.0; nodes],
                None,
            ),
            Geometry::Tissue { n, dx_mm } => {
                let grid = Grid::new(n, dx_mm);
                let mut map = DiffusionMap::uniform(&grid, &params.conductivity);
                let factors = match &params.fibrosis {
                    Some(config) => generate_fibrosis_map(config, &grid)?,
                    None => vec![1.0; grid.node_count()],
                };
                map.apply_factors(&factors);
                let zones_out = params
                    .transmural
                    .as_ref()
                    .map(|config| generate_zone_map(config, &grid));
                (SpatialOperator::tissue(grid, map), factors, zones_out)
            }
        };

        let zones = zone_map_out
            .clone()
            .unwrap_or_else(|| vec![ZONE_UNSET; node_count]);

        // Stability clamp: applied once here, never re-checked mid-run
        // because every map is static from this point on
        let limit_ms = spatial.cfl_limit_ms();
        let mut dt_ms = params.dt_ms;
        if dt_ms > limit_ms {
            dt_ms = CFL_SAFETY * limit_ms;
            log::warn!(
                "Requested dt {} ms exceeds the stability limit {:.6} ms, stepping at {:.6} ms",
                params.dt_ms,
                limit_ms,
                dt_ms
            );
        }
        let steps = (params.duration_ms / dt_ms).round() as usize;

        log::debug!(
            "Driver ready: {} model, {} nodes, {} steps of {:.6} ms",
            params.model.name(),
            node_count,
            steps,
            dt_ms
        );

        Ok(Self {
            state: StateVector::at_rest(&kernel, node_count),
            stimuli: StimulusMap::build(&params.stimuli, &params.geometry),
            kernel,
            spatial,
            zones,
            fibrosis_factors,
            zone_map_out,
            geometry: params.geometry,
            method: params.method,
            dt_ms,
            steps,
            stride: params.stride,
        })
    }

    /// Time step actually used, after any stability clamp (ms)
    pub fn effective_dt_ms(&self) -> f64 {
        self.dt_ms
    }

    pub fn step_count(&self) -> usize {
        self.steps
    }

    /// Snapshots the run will produce, fixed before step 0
    pub fn sample_count(&self) -> usize {
        self.steps / self.stride + 1
    }

    /// One explicit step: Euler voltage update plus Rush-Larsen gates.
    ///
    /// Reads the committed voltage, writes the scratch buffer, then applies
    /// the no-flux boundary and commits. `t_ms` is the time at the start of
    /// the step.
    fn step_explicit(&mut self, t_ms: f64, active: &mut Vec<usize>) {
        self.stimuli.collect_active(t_ms, active);
        let n_gates = self.kernel.n_gates();
        for node in 0..self.state.nodes() {
            let v = self.state.voltage()[node];
            let gates = self.state.gates_at(node);
            let zone = self.zones[node];

            let i_stim = self.stimuli.current_at(active, node);
            let reaction = self.kernel.dv_dt(v, &gates[..n_gates], zone, i_stim);
            let diffusion = self.spatial.term(self.state.voltage(), node);
            let mut v_next = v + self.dt_ms * (reaction + diffusion);

            let mut laws = [GateLaw {
                target: 0.0,
                tau_ms: 1.0,
            }; MAX_GATES];
            self.kernel.gate_laws(v, zone, &mut laws[..n_gates]);
            let mut gates_next = gates;
            for g in 0..n_gates {
                gates_next[g] = laws[g].advance(gates[g], self.dt_ms);
            }

            self.kernel.clamp(&mut v_next, &mut gates_next[..n_gates]);
            self.state.voltage_scratch()[node] = v_next;
            self.state.set_gates_at(node, &gates_next);
        }
        self.spatial.apply_boundary(self.state.voltage_scratch());
        self.state.swap_voltage();
    }

    /// One RK4 step over the full single-cell state vector. The stimulus
    /// current is frozen at its start-of-step value across the stages.
    fn step_rk4(&mut self, t_ms: f64, integrator: &mut Rk4Integrator, active: &mut Vec<usize>) {
        self.stimuli.collect_active(t_ms, active);
        let i_stim = self.stimuli.current_at(active, 0);
        let n_gates = self.kernel.n_gates();
        let zone = self.zones[0];
        let kernel = self.kernel;

        let mut y = [0.0; 1 + MAX_GATES];
        y[0] = self.state.voltage()[0];
        let gates = self.state.gates_at(0);
        y[1..1 + n_gates].copy_from_slice(&gates[..n_gates]);

        integrator.step(self.dt_ms, &mut y[..1 + n_gates], |state, dydt| {
            dydt[0] = kernel.dv_dt(state[0], &state[1..], zone, i_stim);
            kernel.gate_rates(state[0], &state[1..], zone, &mut dydt[1..]);
        });

        let mut v_next = y[0];
        let mut gates_next = [0.0; MAX_GATES];
        gates_next[..n_gates].copy_from_slice(&y[1..1 + n_gates]);
        self.kernel.clamp(&mut v_next, &mut gates_next[..n_gates]);
        self.state.voltage_scratch()[0] = v_next;
        self.state.set_gates_at(0, &gates_next);
        self.state.swap_voltage();
    }

    fn sample_cell(&self, trace: &mut CellTrace, t_ms: f64) {
        trace.time_ms.push(t_ms);
        trace.v.push(self.state.voltage()[0]);
        for g in 0..self.kernel.n_gates() {
            trace.gates[g].push(self.state.gate(g)[0]);
        }
    }

    /// Run a single-cell simulation to completion.
    pub fn run_cell(mut self, cancel: &CancelToken) -> SimResult<CellTrace> {
        if self.geometry != Geometry::SingleCell {
            return Err(ConfigurationError::GeometryMismatch {
                expected: "single-cell",
            }
            .into());
        }
        let mut trace =
            CellTrace::with_capacity(self.sample_count(), self.kernel.gate_names(), self.dt_ms);
        self.sample_cell(&mut trace, 0.0);

        let mut active = Vec::new();
        let mut rk4 = (self.method == IntegrationMethod::Rk4)
            .then(|| Rk4Integrator::new(1 + self.kernel.n_gates()));

        for step in 1..=self.steps {
            if cancel.is_cancelled() {
                return Err(ExecutionError::Cancelled.into());
            }
            let t_ms = (step - 1) as f64 * self.dt_ms;
            match rk4.as_mut() {
                Some(integrator) => self.step_rk4(t_ms, integrator, &mut active),
                None => self.step_explicit(t_ms, &mut active),
            }
            if step % self.stride == 0 {
                self.sample_cell(&mut trace, step as f64 * self.dt_ms);
            }
        }
        Ok(trace)
    }

    /// Run a cable simulation to completion.
    pub fn run_cable(mut self, cancel: &CancelToken) -> SimResult<CableRun> {
        let (nodes, dx_mm) = match self.geometry {
            Geometry::Cable { nodes, dx_mm } => (nodes, dx_mm),
            _ => {
                return Err(ConfigurationError::GeometryMismatch { expected: "cable" }.into());
            }
        };
        let mut run = CableRun::with_capacity(self.sample_count(), nodes, dx_mm, self.dt_ms);
        run.time_ms.push(0.0);
        run.frames.push(snapshot_f32(self.state.voltage()));

        let mut active = Vec::new();
        for step in 1..=self.steps {
            if cancel.is_cancelled() {
                return Err(ExecutionError::Cancelled.into());
            }
            self.step_explicit((step - 1) as f64 * self.dt_ms, &mut active);
            if step % self.stride == 0 {
                run.time_ms.push(step as f64 * self.dt_ms);
                run.frames.push(snapshot_f32(self.state.voltage()));
            }
        }
        Ok(run)
    }

    /// Run a tissue simulation to completion, reporting progress when a
    /// channel is supplied. Progress sends never block: stale updates are
    /// dropped in favor of the simulation loop.
    pub fn run_tissue(
        mut self,
        cancel: &CancelToken,
        progress: Option<Sender<ProgressUpdate>>,
    ) -> SimResult<TissueRun> {
        let (n, dx_mm) = match self.geometry {
            Geometry::Tissue { n, dx_mm } => (n, dx_mm),
            _ => {
                return Err(ConfigurationError::GeometryMismatch { expected: "tissue" }.into());
            }
        };
        let mut run = TissueRun::with_capacity(self.sample_count(), n, dx_mm, self.dt_ms);
        run.fibrosis_map = std::mem::take(&mut self.fibrosis_factors);
        run.zone_map = self.zone_map_out.take();
        run.time_ms.push(0.0);
        run.frames
            .extend(self.state.voltage().iter().map(|&v| v as f32));

        let report_every = (self.steps / PROGRESS_REPORTS).max(1);
        let mut tracker = ProgressTracker::new(self.steps);
        let mut active = Vec::new();

        for step in 1..=self.steps {
            if cancel.is_cancelled() {
                return Err(ExecutionError::Cancelled.into());
            }
            self.step_explicit((step - 1) as f64 * self.dt_ms, &mut active);
            if step % self.stride == 0 {
                run.time_ms.push(step as f64 * self.dt_ms);
                run.frames
                    .extend(self.state.voltage().iter().map(|&v| v as f32));
            }
            if let Some(sender) = &progress {
                if step % report_every == 0 {
                    let _ = sender.try_send(tracker.update(step));
                }
            }
        }
        Ok(run)
    }
}

fn snapshot_f32(v: &[f64]) -> Vec<f32> {
    v.iter().map(|&x| x as f32).collect()
}
