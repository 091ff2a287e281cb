//! kiln - an incremental build tool for small C and C++ projects.
//!
//! Projects are described by a `kiln.toml` manifest; kiln collects the
//! sources, scans `#include` directives for dependencies, recompiles
//! what changed and links each target into an executable.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::*;
pub use domain::*;
