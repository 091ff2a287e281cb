//! The project: manifest, profile, targets, and the four operations the
//! CLI exposes (`files`, `check`, `build`, `run`).

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::domain::{resolve_profile, DomainResult, FileKind, Manifest, Profile, SourceFile};
use crate::infrastructure::{
    run_to_completion, system_include_dirs, ManifestRepository, StampStore, Toolchain,
    WorkspaceLayout,
};
use crate::presentation::Reporter;

use super::target::Target;

/// A loaded manifest with its targets resolved against the filesystem
/// and a compilation profile picked.
#[derive(Debug)]
pub struct Project {
    name: String,
    version: String,
    targets: Vec<Target>,
    toolchain: Toolchain,
}

impl Project {
    /// Loads the manifest, resolves the requested profile and assembles
    /// every target. The compiler's system include directories join the
    /// search list so angle-bracket includes resolve where possible.
    pub fn load(manifest_path: &Path, profile_name: &str) -> DomainResult<Project> {
        let manifest = ManifestRepository::load(manifest_path)?;
        let profile = resolve_profile(profile_name, &manifest.profiles)?;
        Project::assemble(&manifest, profile, &system_include_dirs())
    }

    /// Assembly with an explicit system include list, separable from the
    /// machine's compiler installation.
    pub fn assemble(
        manifest: &Manifest,
        profile: Profile,
        system_dirs: &[PathBuf],
    ) -> DomainResult<Project> {
        let mut targets = vec![];
        for (name, config) in &manifest.targets {
            targets.push(Target::assemble(name, config, system_dirs)?);
        }
        Ok(Project {
            name: manifest.project.name.clone(),
            version: manifest.project.version.clone(),
            targets,
            toolchain: Toolchain::new(profile),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn profile(&self) -> &Profile {
        self.toolchain.profile()
    }

    /// The `files` operation: prints every target with its sources and
    /// what depends on each of them.
    pub fn describe(&self) {
        println!("{} v{} [profile: {}]", self.name, self.version, self.profile().name);
        for target in &self.targets {
            println!("\ntarget '{}'", target.name());
            for file in target.files() {
                let marker = match file.kind() {
                    FileKind::TranslationUnit => "unit  ",
                    FileKind::Header => "header",
                };
                println!("  {} {}", marker, file.path().display());
                for dependent in target.dependents_of(file) {
                    if dependent != file {
                        println!("         <- {}", dependent.path().display());
                    }
                }
            }
        }
    }

    /// The `check` operation: syntax-only compilation of every unit.
    pub fn check(&self, reporter: &Reporter) -> bool {
        let mut all_ok = true;
        for target in &self.targets {
            for unit in target.translation_units() {
                let mut command = self
                    .toolchain
                    .syntax_check_command(unit.path(), target.include_directories());
                match run_to_completion(&mut command) {
                    Ok(true) => reporter.unit_complete(unit.path()),
                    Ok(false) => {
                        reporter.unit_fail(unit.path());
                        all_ok = false;
                    }
                    Err(message) => {
                        reporter.error(&message);
                        return false;
                    }
                }
            }
        }
        all_ok
    }

    /// The `build` operation: compile what changed, then link.
    pub fn build(&self, reporter: &Reporter) -> bool {
        self.build_in(Path::new(".kiln"), reporter)
    }

    /// Build with an explicit workspace base directory instead of
    /// `.kiln/` under the working directory.
    pub fn build_in(&self, base: &Path, reporter: &Reporter) -> bool {
        self.targets
            .iter()
            .all(|target| self.build_target(target, base, reporter))
    }

    /// The `run` operation: build everything, then execute each target
    /// binary and propagate its exit status.
    pub fn run(&self, reporter: &Reporter) -> bool {
        self.run_in(Path::new(".kiln"), reporter)
    }

    pub fn run_in(&self, base: &Path, reporter: &Reporter) -> bool {
        if !self.build_in(base, reporter) {
            return false;
        }
        self.targets.iter().all(|target| {
            let layout = WorkspaceLayout::rooted(base, target.name());
            reporter.activity("Running", &format!("'{}'", target.name()));
            let mut command = Command::new(layout.binary_path());
            match run_to_completion(&mut command) {
                Ok(ok) => ok,
                Err(message) => {
                    reporter.error(&message);
                    false
                }
            }
        })
    }

    fn build_target(&self, target: &Target, base: &Path, reporter: &Reporter) -> bool {
        let layout = WorkspaceLayout::rooted(base, target.name());
        if let Err(message) = layout.prepare() {
            reporter.error(&message);
            return false;
        }

        let mut stamps = StampStore::load(&layout.stamps_path());
        let stale = target.stale_units(&stamps, &layout);

        if stale.is_empty() && layout.binary_path().exists() {
            reporter.activity("Compiling", "nothing to compile");
            return true;
        }

        let mut all_ok = true;
        for unit in &stale {
            match self.compile_unit(target, unit, &layout, reporter) {
                Ok(true) => {}
                Ok(false) => all_ok = false,
                Err(message) => {
                    // the driver itself is broken, rerunning it per unit is pointless
                    reporter.error(&message);
                    all_ok = false;
                    break;
                }
            }
        }
        // Stamps refresh only once every stale unit compiled. Refreshing a
        // shared header after one sibling succeeds would leave a failed
        // sibling looking up to date on the next build.
        if all_ok {
            for unit in &stale {
                for file in target.includes_of(unit) {
                    stamps.record(file);
                }
            }
            if let Err(message) = stamps.save(&layout.stamps_path()) {
                reporter.error(&message);
            }
        }
        if !all_ok {
            reporter.phase_fail("compiling");
            return false;
        }
        reporter.phase_complete("compiling");

        self.link_target(&layout, reporter)
    }

    fn compile_unit(
        &self,
        target: &Target,
        unit: &SourceFile,
        layout: &WorkspaceLayout,
        reporter: &Reporter,
    ) -> Result<bool, String> {
        let object = match layout.object_path(unit) {
            Some(object) => object,
            None => return Ok(true), // headers are never compiled
        };
        let mut command =
            self.toolchain
                .compile_command(unit.path(), target.include_directories(), &object);
        match run_to_completion(&mut command)? {
            true => {
                reporter.unit_complete(unit.path());
                Ok(true)
            }
            false => {
                reporter.unit_fail(unit.path());
                Ok(false)
            }
        }
    }

    fn link_target(&self, layout: &WorkspaceLayout, reporter: &Reporter) -> bool {
        let objects = layout.existing_objects();
        let mut command = self.toolchain.link_command(&objects, &layout.binary_path());
        match run_to_completion(&mut command) {
            Ok(true) => {
                reporter.phase_complete("linking");
                true
            }
            Ok(false) => {
                reporter.phase_fail("linking");
                false
            }
            Err(message) => {
                reporter.error(&message);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builtin_profiles;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, text: &str) {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
    }

    fn demo_manifest(dir: &TempDir) -> Manifest {
        write(dir, "src/main.cpp", "int main() {}\n");
        write(dir, "src/util.hpp", "void util();\n");
        Manifest::from_toml_str(&format!(
            r#"
            [project]
            name = "demo"
            version = "0.1.0"

            [targets.app]
            source = "{}"
            "#,
            dir.path().join("src").display()
        ))
        .unwrap()
    }

    #[test]
    fn test_assemble_resolves_targets() {
        let dir = TempDir::new().unwrap();
        let manifest = demo_manifest(&dir);
        let profile = builtin_profiles()["debug"].clone();

        let project = Project::assemble(&manifest, profile, &[]).unwrap();

        assert_eq!(project.name(), "demo");
        assert_eq!(project.version(), "0.1.0");
        assert_eq!(project.targets().len(), 1);
        assert_eq!(project.targets()[0].name(), "app");
        assert_eq!(project.profile().name, "debug");
    }

    #[test]
    fn test_assemble_empty_targets_table() {
        let manifest =
            Manifest::from_toml_str("[project]\nname = \"demo\"\nversion = \"0.1.0\"\n").unwrap();
        let profile = builtin_profiles()["debug"].clone();

        let project = Project::assemble(&manifest, profile, &[]).unwrap();
        assert!(project.targets().is_empty());
        // nothing to do is a successful build
        assert!(project.build(&Reporter::new()));
    }

    #[test]
    fn test_load_reports_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let err = Project::load(&dir.path().join("kiln.toml"), "debug").unwrap_err();
        assert!(matches!(err, crate::domain::DomainError::FileUnavailable(_)));
        assert!(err.to_string().contains("kiln.toml"));
    }

    #[test]
    fn test_load_reports_unknown_profile() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "kiln.toml",
            "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n",
        );
        let err = Project::load(&dir.path().join("kiln.toml"), "fastest").unwrap_err();
        assert!(matches!(err, crate::domain::DomainError::UnknownProfile { .. }));
        assert!(err.to_string().contains("unknown profile 'fastest'"));
    }

    /// Manifest whose single unit pulls in test_data/inner/a.hpp, the
    /// declaration-plus-malformed-template header. Real compilers reject
    /// any unit including it; the stand-in compiler decides the verdict
    /// here so tests run without a toolchain installed.
    fn fixture_manifest(dir: &TempDir) -> Manifest {
        write(
            dir,
            "src/main.cpp",
            "#include \"a.hpp\"\nint main() { return 0; }\n",
        );
        Manifest::from_toml_str(&format!(
            r#"
            [project]
            name = "demo"
            version = "0.1.0"

            [targets.app]
            source = "{}"
            include = "test_data/inner"
            "#,
            dir.path().join("src").display()
        ))
        .unwrap()
    }

    fn project_with_compiler(manifest: &Manifest, compiler: &str) -> Project {
        let mut profile = builtin_profiles()["debug"].clone();
        profile.compiler = compiler.to_string();
        Project::assemble(manifest, profile, &[]).unwrap()
    }

    #[test]
    fn test_check_reports_rejected_unit_without_panicking() {
        let dir = TempDir::new().unwrap();
        let manifest = fixture_manifest(&dir);
        // `false` rejects every unit, like a real compiler does once it
        // reaches the template body of a.hpp
        let project = project_with_compiler(&manifest, "false");
        assert!(!project.check(&Reporter::new()));
    }

    #[test]
    fn test_check_passes_when_compiler_accepts() {
        let dir = TempDir::new().unwrap();
        let manifest = fixture_manifest(&dir);
        let project = project_with_compiler(&manifest, "true");
        assert!(project.check(&Reporter::new()));
    }

    #[test]
    fn test_build_fails_when_a_unit_is_rejected() {
        let dir = TempDir::new().unwrap();
        let manifest = fixture_manifest(&dir);
        let project = project_with_compiler(&manifest, "false");
        let workspace = TempDir::new().unwrap();
        assert!(!project.build_in(workspace.path(), &Reporter::new()));
    }

    #[test]
    fn test_build_succeeds_when_compiler_accepts() {
        let dir = TempDir::new().unwrap();
        let manifest = fixture_manifest(&dir);
        let project = project_with_compiler(&manifest, "true");
        let workspace = TempDir::new().unwrap();
        assert!(project.build_in(workspace.path(), &Reporter::new()));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_unit_stays_stale_across_builds() {
        use chrono::NaiveDate;
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(&dir, "src/good.cpp", "#include \"shared.hpp\"\nint good() { return 1; }\n");
        write(&dir, "src/bad.cpp", "#include \"shared.hpp\"\nint bad() { return 2; }\n");
        write(&dir, "src/shared.hpp", "int good();\nint bad();\n");

        // stand-in compiler that rejects bad.cpp and accepts the rest
        let script = dir.path().join("cc.sh");
        fs::write(
            &script,
            "#!/bin/sh\nfor arg in \"$@\"; do\n  case \"$arg\" in *bad.cpp) exit 1 ;; esac\ndone\nexit 0\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let manifest = Manifest::from_toml_str(&format!(
            r#"
            [project]
            name = "demo"
            version = "0.1.0"

            [targets.app]
            source = "{}"
            "#,
            dir.path().join("src").display()
        ))
        .unwrap();
        let project = project_with_compiler(&manifest, &script.to_string_lossy());

        // state after an earlier successful build followed by an edit of
        // shared.hpp: objects and binary present, unit stamps fresh, the
        // header's stamp predating its modification time
        let workspace = TempDir::new().unwrap();
        let layout = WorkspaceLayout::rooted(workspace.path(), "app");
        layout.prepare().unwrap();
        fs::write(layout.binary_path(), b"").unwrap();
        let mut stamps = StampStore::default();
        for name in ["src/good.cpp", "src/bad.cpp"] {
            let unit = SourceFile::from_path(&dir.path().join(name)).unwrap();
            fs::write(layout.object_path(&unit).unwrap(), b"").unwrap();
            stamps.record(&unit);
        }
        let shared = SourceFile::from_path(&dir.path().join("src/shared.hpp")).unwrap();
        let old_stamp = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        stamps.record(&SourceFile::new(shared.path().to_path_buf(), old_stamp));
        stamps.save(&layout.stamps_path()).unwrap();

        let reporter = Reporter::new();
        // good.cpp recompiles fine, bad.cpp is rejected
        assert!(!project.build_in(workspace.path(), &reporter));
        // good.cpp's success must not refresh the shared header's stamp:
        // the rebuild has to attempt bad.cpp again and fail again, not
        // report "nothing to compile" over the stale binary
        assert!(!project.build_in(workspace.path(), &reporter));
    }

    #[test]
    fn test_describe_smoke() {
        let dir = TempDir::new().unwrap();
        let manifest = demo_manifest(&dir);
        let project =
            Project::assemble(&manifest, builtin_profiles()["debug"].clone(), &[]).unwrap();
        // output format is human-facing, just exercise the path
        project.describe();
    }
}
