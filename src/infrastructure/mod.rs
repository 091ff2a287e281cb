//! Infrastructure layer: everything that touches the machine.
//!
//! Manifest and stamp persistence, the workspace layout under `.kiln/`,
//! and compiler driver invocation live here, behind interfaces the
//! application layer can exercise without a compiler installed.

pub mod persistence;
pub mod toolchain;

pub use persistence::*;
pub use toolchain::*;
