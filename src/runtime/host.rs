//! Execution host: isolated simulation units on dedicated threads.
//!
//! Each run is a unit of work with its own Driver, its own state and a
//! bounded reply channel. Units never share mutable state, so a host can
//! run many of them concurrently and a failure in one cannot corrupt
//! another. Cancellation is cooperative: the Driver polls its token every
//! step and abandons the run without producing buffers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::config::SimulationParameters;
use crate::error::{ExecutionError, SimResult};
use crate::runtime::ProgressUpdate;
use crate::solver::Driver;
use crate::state::{CableRun, CellTrace, TissueRun};

/// Shared cancellation flag for one simulation unit.
///
/// Cloning yields another handle to the same flag. Once set, the flag
/// stays set for the lifetime of the unit.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread, any number of
    /// times.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Handle to one in-flight simulation unit.
///
/// Dropping the handle cancels the unit and waits for its thread to exit,
/// so an abandoned run never outlives its owner.
pub struct RunHandle<T> {
    unit: String,
    cancel: CancelToken,
    rx: Receiver<SimResult<T>>,
    thread: Option<JoinHandle<()>>,
}

impl<T> RunHandle<T> {
    /// Label identifying this unit in errors and logs.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Request cancellation of the running unit.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that can cancel this unit from elsewhere.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the unit to finish and take its result.
    ///
    /// A worker that exits without replying is reported as `UnitFailed`
    /// when its thread panicked and `Disconnected` otherwise.
    pub fn join(mut self) -> SimResult<T> {
        let reply = self.rx.recv();
        let thread_outcome = match self.thread.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        };
        match reply {
            Ok(result) => result,
            Err(_) if thread_outcome.is_err() => Err(ExecutionError::UnitFailed {
                unit: self.unit.clone(),
            }
            .into()),
            Err(_) => Err(ExecutionError::Disconnected {
                unit: self.unit.clone(),
            }
            .into()),
        }
    }
}

impl<T> Drop for RunHandle<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Spawns simulation units and joins their results.
#[derive(Debug, Default)]
pub struct SimulationHost {
    units: AtomicU64,
}

impl SimulationHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a single-cell unit.
    pub fn spawn_cell(&self, params: &SimulationParameters) -> SimResult<RunHandle<CellTrace>> {
        self.spawn_cell_as(self.next_unit("cell"), params)
    }

    /// Start a cable unit.
    pub fn spawn_cable(&self, params: &SimulationParameters) -> SimResult<RunHandle<CableRun>> {
        let params = params.clone();
        self.spawn_unit(self.next_unit("cable"), move |cancel| {
            Driver::new(&params)?.run_cable(cancel)
        })
    }

    /// Start a tissue unit, optionally streaming progress updates.
    pub fn spawn_tissue(
        &self,
        params: &SimulationParameters,
        progress: Option<Sender<ProgressUpdate>>,
    ) -> SimResult<RunHandle<TissueRun>> {
        let params = params.clone();
        self.spawn_unit(self.next_unit("tissue"), move |cancel| {
            Driver::new(&params)?.run_tissue(cancel, progress)
        })
    }

    /// Run a single-cell simulation to completion on a unit thread.
    pub fn run_cell(&self, params: &SimulationParameters) -> SimResult<CellTrace> {
        self.spawn_cell(params)?.join()
    }

    /// Run a cable simulation to completion on a unit thread.
    pub fn run_cable(&self, params: &SimulationParameters) -> SimResult<CableRun> {
        self.spawn_cable(params)?.join()
    }

    /// Run a tissue simulation to completion on a unit thread.
    pub fn run_tissue(
        &self,
        params: &SimulationParameters,
        progress: Option<Sender<ProgressUpdate>>,
    ) -> SimResult<TissueRun> {
        self.spawn_tissue(params, progress)?.join()
    }

    /// Cell unit with a caller-chosen label, used by the protocol runners.
    pub(crate) fn spawn_cell_as(
        &self,
        unit: String,
        params: &SimulationParameters,
    ) -> SimResult<RunHandle<CellTrace>> {
        let params = params.clone();
        self.spawn_unit(unit, move |cancel| Driver::new(&params)?.run_cell(cancel))
    }

    fn next_unit(&self, kind: &str) -> String {
        let seq = self.units.fetch_add(1, Ordering::Relaxed);
        format!("{kind}-{seq}")
    }

    fn spawn_unit<T, F>(&self, unit: String, work: F) -> SimResult<RunHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> SimResult<T> + Send + 'static,
    {
        let cancel = CancelToken::new();
        let worker_token = cancel.clone();
        let (tx, rx) = bounded::<SimResult<T>>(1);

        let thread = thread::Builder::new()
            .name(format!("cardiosim-{unit}"))
            .spawn(move || {
                let _ = tx.send(work(&worker_token));
            })
            .map_err(|_| ExecutionError::UnitFailed { unit: unit.clone() })?;

        log::debug!("Spawned simulation unit '{}'", unit);
        Ok(RunHandle {
            unit,
            cancel,
            rx,
            thread: Some(thread),
        })
    }
}

/// Join a batch of units in submission order, all-or-nothing.
///
/// The first failure cancels every unit still pending, and the remaining
/// handles are still joined so no thread is left running. The original
/// error is the one reported.
pub(crate) fn join_all<T>(handles: Vec<RunHandle<T>>) -> SimResult<Vec<T>> {
    let mut results = Vec::with_capacity(handles.len());
    let mut failure = None;
    for handle in handles {
        if failure.is_some() {
            handle.cancel();
        }
        match handle.join() {
            Ok(value) => results.push(value),
            Err(err) => {
                log::warn!("Batch unit failed: {}", err);
                failure.get_or_insert(err);
            }
        }
    }
    match failure {
        None => Ok(results),
        Some(err) => Err(err),
    }
}
