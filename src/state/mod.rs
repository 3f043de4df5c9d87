//! Run state and output buffers.
//!
//! `StateVector` is the mutable per-node state a Driver owns while stepping;
//! the buffer types are the immutable results handed back to the caller at
//! completion.

mod buffers;
mod vector;

pub use buffers::{CableRun, CellTrace, TissueRun};
pub use vector::StateVector;
