//! Application layer: project and target orchestration.

pub mod project;
pub mod target;

pub use project::*;
pub use target::*;
