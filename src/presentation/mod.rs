//! Presentation layer: terminal output.

pub mod report;

pub use report::*;
