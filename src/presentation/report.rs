//! Colored status lines for the terminal.
//!
//! Build progress is reported as a right-aligned verdict column followed
//! by the subject: `Complete`/`Fail` per translation unit, one line per
//! phase. Styling goes through crossterm so the format degrades
//! gracefully on dumb terminals.

use std::path::Path;

use crossterm::style::Stylize;

const VERDICT_WIDTH: usize = 10;

fn padded(verdict: &str) -> String {
    format!("{:>width$}", verdict, width = VERDICT_WIDTH)
}

/// Prints build progress to stdout and failures to stderr.
#[derive(Debug, Default)]
pub struct Reporter;

impl Reporter {
    pub fn new() -> Reporter {
        Reporter
    }

    /// One translation unit made it through the compiler.
    pub fn unit_complete(&self, unit: &Path) {
        println!("{} '{}'", padded("Complete").green().bold(), unit.display());
    }

    /// One translation unit was rejected.
    pub fn unit_fail(&self, unit: &Path) {
        println!("{} '{}'", padded("Fail").red().bold(), unit.display());
    }

    /// A whole phase (compiling, linking) finished.
    pub fn phase_complete(&self, phase: &str) {
        println!("{} {}", padded("Complete").green().bold(), phase.cyan());
    }

    pub fn phase_fail(&self, phase: &str) {
        println!("{} {}", padded("Fail").red().bold(), phase.cyan());
    }

    /// Progress note without a verdict, e.g. `Compiling nothing to do`.
    pub fn activity(&self, verb: &str, detail: &str) {
        println!("{} {}", padded(verb).green(), detail);
    }

    /// Tool-level error, outside any phase.
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "kiln:".red().bold(), message);
    }
}
