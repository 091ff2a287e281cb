//! Compiler driver invocation.
//!
//! Every external compiler call is built here as a `std::process::Command`
//! so the exact argument vectors stay testable without a compiler
//! installed. Execution itself is a thin spawn-and-wait wrapper that maps
//! a missing driver to an error message instead of a panic.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::domain::Profile;

/// Builds compiler command lines for one resolved profile.
#[derive(Debug)]
pub struct Toolchain {
    profile: Profile,
}

impl Toolchain {
    pub fn new(profile: Profile) -> Toolchain {
        Toolchain { profile }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// `<compiler> -fsyntax-only <std> <options> <defines> -I… <unit>`
    pub fn syntax_check_command(&self, unit: &Path, include_dirs: &[PathBuf]) -> Command {
        let mut command = Command::new(&self.profile.compiler);
        command.arg("-fsyntax-only");
        self.compile_flags(&mut command, include_dirs);
        command.arg(unit);
        command
    }

    /// `<compiler> -c <std> <options> <defines> -I… <unit> -o <object>`
    pub fn compile_command(&self, unit: &Path, include_dirs: &[PathBuf], object: &Path) -> Command {
        let mut command = Command::new(&self.profile.compiler);
        command.arg("-c");
        self.compile_flags(&mut command, include_dirs);
        command.arg(unit).arg("-o").arg(object);
        command
    }

    /// `<compiler> <link options> -L… <objects>… -o <binary>`
    pub fn link_command(&self, objects: &[PathBuf], binary: &Path) -> Command {
        let mut command = Command::new(&self.profile.compiler);
        command.args(&self.profile.linking_options);
        for dir in &self.profile.linking_directories {
            command.arg(format!("-L{}", dir));
        }
        command.args(objects).arg("-o").arg(binary);
        command
    }

    fn compile_flags(&self, command: &mut Command, include_dirs: &[PathBuf]) {
        command.arg(&self.profile.standard);
        command.args(&self.profile.options);
        for define in &self.profile.defines {
            command.arg(format!("-D{}", define));
        }
        for dir in include_dirs {
            command.arg(format!("-I{}", dir.display()));
        }
        for dir in &self.profile.include_directories {
            command.arg(format!("-I{}", dir));
        }
    }
}

/// Spawns the command and waits for it, reporting success of the exit
/// status. A driver that cannot be started at all surfaces as an error.
pub fn run_to_completion(command: &mut Command) -> Result<bool, String> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command
        .spawn()
        .map_err(|err| format!("failed to start '{}': {}", program, err))?;
    let status = child
        .wait()
        .map_err(|err| format!("failed to wait for '{}': {}", program, err))?;
    Ok(status.success())
}

/// Asks the compiler driver where it searches for headers.
///
/// Runs `c++ -xc++ /dev/null -E -Wp,-v` and parses the search-path
/// report. A machine without a driver degrades to an empty list; local
/// include resolution still works, standard headers are then treated as
/// unresolvable system includes.
pub fn system_include_dirs() -> Vec<PathBuf> {
    let output = Command::new("c++")
        .args(["-xc++", "/dev/null", "-E", "-Wp,-v"])
        .output();
    match output {
        // the search-path report goes to stderr
        Ok(output) => parse_search_paths(&String::from_utf8_lossy(&output.stderr)),
        Err(_) => vec![],
    }
}

/// Parses the driver's `-Wp,-v` report: search directories are the lines
/// indented with a single space.
pub fn parse_search_paths(report: &str) -> Vec<PathBuf> {
    report
        .lines()
        .filter_map(|line| line.strip_prefix(' '))
        .map(|line| PathBuf::from(line.trim()))
        .filter(|path| !path.as_os_str().is_empty())
        .collect()
}
