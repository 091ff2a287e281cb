//! kiln - an incremental build tool for small C and C++ projects.
//!
//! Reads a `kiln.toml` manifest, collects C/C++ sources, scans their
//! `#include` directives for dependencies, and drives the system
//! compiler to check, build and run the described targets.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod application;
mod domain;
mod infrastructure;
mod presentation;

use application::Project;
use presentation::Reporter;

#[derive(Parser, Debug)]
#[command(name = "kiln", about = "An incremental build tool for small C and C++ projects")]
struct Cli {
    /// Path to the project manifest.
    #[arg(long, default_value = "kiln.toml")]
    manifest: PathBuf,

    /// Compilation profile to use.
    #[arg(long, default_value = "debug")]
    profile: String,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum CliCommand {
    /// Show collected targets, sources and their dependents.
    Files,
    /// Run the compiler in syntax-only mode over every unit.
    Check,
    /// Incrementally compile and link every target.
    Build,
    /// Build every target, then execute its binary.
    Run,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let reporter = Reporter::new();

    let project = match Project::load(&cli.manifest, &cli.profile) {
        Ok(project) => project,
        Err(error) => {
            reporter.error(&error.to_string());
            return ExitCode::from(2);
        }
    };

    let ok = match cli.command {
        CliCommand::Files => {
            project.describe();
            true
        }
        CliCommand::Check => project.check(&reporter),
        CliCommand::Build => project.build(&reporter),
        CliCommand::Run => project.run(&reporter),
    };

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
