//! Run execution: cancellation, progress reporting, the host and the
//! protocol sweep runners.

mod batch;
mod host;
mod progress;

pub use host::{CancelToken, RunHandle, SimulationHost};
pub use progress::{ProgressTracker, ProgressUpdate};
