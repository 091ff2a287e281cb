//! Compiler profiles.
//!
//! A profile bundles everything about *how* sources get compiled: the
//! compiler driver, language standard, defines, per-unit options and
//! link-time options. A fixed set of built-in profiles covers the common
//! debug/release/sanitizer setups; `[profiles.<name>]` tables in the
//! manifest override individual fields of the built-in with the same
//! name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};

/// Warning flags shared by every built-in profile.
const DEFAULT_WARNINGS: [&str; 24] = [
    "-pedantic",
    "-Wall",
    "-Wextra",
    "-Wcast-align",
    "-Wcast-qual",
    "-Wconversion",
    "-Wdisabled-optimization",
    "-Wmissing-include-dirs",
    "-Wmissing-noreturn",
    "-Wshadow",
    "-Wstack-protector",
    "-Wunreachable-code",
    "-Wfloat-equal",
    "-Wunused",
    "-Wswitch",
    "-Wswitch-enum",
    "-Winit-self",
    "-Wuninitialized",
    "-Wformat=2",
    "-Wformat-nonliteral",
    "-Wformat-security",
    "-Wformat-y2k",
    "-Winline",
    "-Wredundant-decls",
];

const DEFAULT_COMPILER: &str = "g++";
const DEFAULT_STANDARD: &str = "-std=c++17";

/// A fully resolved compilation profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub compiler: String,
    pub standard: String,
    pub defines: Vec<String>,
    pub options: Vec<String>,
    pub linking_options: Vec<String>,
    pub linking_directories: Vec<String>,
    pub include_directories: Vec<String>,
}

/// Fields a `[profiles.<name>]` manifest table may override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverride {
    pub compiler: Option<String>,
    pub standard: Option<String>,
    pub defines: Option<Vec<String>>,
    pub options: Option<Vec<String>>,
    pub linking_options: Option<Vec<String>>,
    pub linking_directories: Option<Vec<String>>,
    pub include_directories: Option<Vec<String>>,
}

impl Profile {
    fn base(name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            compiler: DEFAULT_COMPILER.to_string(),
            standard: DEFAULT_STANDARD.to_string(),
            defines: vec![],
            options: vec![],
            linking_options: vec![],
            linking_directories: vec![],
            include_directories: vec![],
        }
    }

    fn with_options<const N: usize>(name: &str, options: [&str; N]) -> Profile {
        let mut profile = Profile::base(name);
        profile.options = options
            .iter()
            .map(ToString::to_string)
            .chain(DEFAULT_WARNINGS.iter().map(ToString::to_string))
            .collect();
        profile
    }

    /// Applies a manifest override on top of this profile. Fields absent
    /// from the override keep the built-in values.
    pub fn apply(&mut self, patch: &ProfileOverride) {
        if let Some(compiler) = &patch.compiler {
            self.compiler = compiler.clone();
        }
        if let Some(standard) = &patch.standard {
            self.standard = standard.clone();
        }
        if let Some(defines) = &patch.defines {
            self.defines = defines.clone();
        }
        if let Some(options) = &patch.options {
            self.options = options.clone();
        }
        if let Some(linking_options) = &patch.linking_options {
            self.linking_options = linking_options.clone();
        }
        if let Some(linking_directories) = &patch.linking_directories {
            self.linking_directories = linking_directories.clone();
        }
        if let Some(include_directories) = &patch.include_directories {
            self.include_directories = include_directories.clone();
        }
    }
}

/// Constructs the built-in profile set.
pub fn builtin_profiles() -> HashMap<String, Profile> {
    let mut profiles = HashMap::new();

    let release = Profile::with_options("release", ["-O2", "-g0", "-Werror"]);
    let debug = Profile::with_options("debug", ["-O0", "-g3", "-Werror"]);
    let release_unsafe = Profile::with_options("release-unsafe", ["-O3", "-g0"]);
    let debug_unsafe = Profile::with_options("debug-unsafe", ["-O0", "-g3"]);

    let mut debug_asan = Profile::with_options(
        "debug-asan",
        [
            "-O0",
            "-g3",
            "-Werror",
            "-fsanitize=address",
            "-fsanitize=undefined",
            "-fsanitize=leak",
        ],
    );
    debug_asan.linking_options = vec![
        "-fsanitize=address".to_string(),
        "-fsanitize=undefined".to_string(),
        "-fsanitize=leak".to_string(),
    ];

    let mut debug_tsan =
        Profile::with_options("debug-tsan", ["-O0", "-g3", "-Werror", "-fsanitize=thread"]);
    debug_tsan.linking_options = vec!["-fsanitize=thread".to_string()];

    for profile in [release, debug, release_unsafe, debug_unsafe, debug_asan, debug_tsan] {
        profiles.insert(profile.name.clone(), profile);
    }
    profiles
}

/// Resolves a profile name against the built-ins and manifest overrides.
///
/// An override for a built-in name patches that built-in. An override
/// under a new name starts from the `debug` built-in. A name with
/// neither a built-in nor an override is an error listing what exists.
pub fn resolve_profile(
    name: &str,
    overrides: &std::collections::BTreeMap<String, ProfileOverride>,
) -> DomainResult<Profile> {
    let builtins = builtin_profiles();

    let mut profile = match builtins.get(name) {
        Some(profile) => profile.clone(),
        None if overrides.contains_key(name) => {
            let mut custom = builtins["debug"].clone();
            custom.name = name.to_string();
            custom
        }
        None => {
            let mut known: Vec<String> = builtins.keys().cloned().collect();
            known.extend(overrides.keys().cloned());
            known.sort();
            known.dedup();
            return Err(DomainError::UnknownProfile { name: name.to_string(), known });
        }
    };

    if let Some(patch) = overrides.get(name) {
        profile.apply(patch);
    }
    Ok(profile)
}
