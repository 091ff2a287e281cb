//! One linkable target: its collected sources, include search list and
//! dependency maps, plus the planning step that decides what to rebuild.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::domain::{
    dependents_map, source_dependencies, DomainError, DomainResult, FileKind, IncludeScanner,
    SourceFile, TargetConfig, COLLECTED_SUFFIXES,
};
use crate::infrastructure::{StampStore, WorkspaceLayout};

/// A `[targets.<name>]` entry resolved against the filesystem.
#[derive(Debug)]
pub struct Target {
    name: String,
    files: Vec<SourceFile>,
    include_directories: Vec<PathBuf>,
    /// file -> its direct local includes plus itself
    includes: HashMap<SourceFile, Vec<SourceFile>>,
    /// file -> the files that include it
    dependents: HashMap<SourceFile, Vec<SourceFile>>,
}

impl Target {
    /// Collects sources, builds the include search list (system
    /// directories first, then the source directory, then the declared
    /// include directory) and scans the dependency maps.
    pub fn assemble(
        name: &str,
        config: &TargetConfig,
        system_dirs: &[PathBuf],
    ) -> DomainResult<Target> {
        let mut files = collect_sources(Path::new(&config.source))?;

        let mut include_directories: Vec<PathBuf> = system_dirs.to_vec();
        include_directories.push(PathBuf::from(&config.source));
        if let Some(include) = &config.include {
            files.extend(collect_sources(Path::new(include))?);
            include_directories.push(PathBuf::from(include));
        }

        let scanner = IncludeScanner::new(include_directories.clone());
        let includes = source_dependencies(&files, &scanner)?;
        let dependents = dependents_map(&includes);

        Ok(Target {
            name: name.to_string(),
            files,
            include_directories,
            includes,
            dependents,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn include_directories(&self) -> &[PathBuf] {
        &self.include_directories
    }

    pub fn translation_units(&self) -> impl Iterator<Item = &SourceFile> {
        self.files
            .iter()
            .filter(|file| file.kind() == FileKind::TranslationUnit)
    }

    /// Direct local includes of a unit, plus the unit itself. Compiling
    /// the unit refreshes the stamps of exactly these files.
    pub fn includes_of(&self, unit: &SourceFile) -> &[SourceFile] {
        self.includes.get(unit).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Files that pull in the given file, as scanned.
    pub fn dependents_of(&self, file: &SourceFile) -> &[SourceFile] {
        self.dependents.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Translation units that must be recompiled: dependents of every
    /// stale file, plus units whose object file is missing.
    ///
    /// Staleness is judged purely against the stamp store, so callers
    /// must only refresh a file's stamp once every unit depending on it
    /// compiled; a header refreshed after one successful sibling would
    /// make a failed unit look up to date here.
    pub fn stale_units(&self, stamps: &StampStore, layout: &WorkspaceLayout) -> Vec<SourceFile> {
        let mut stale: Vec<SourceFile> = vec![];

        for file in &self.files {
            if !stamps.is_stale(file) {
                continue;
            }
            for unit in self.dependents_of(file) {
                if unit.kind() == FileKind::TranslationUnit && !stale.contains(unit) {
                    stale.push(unit.clone());
                }
            }
        }

        for unit in self.translation_units() {
            let object_missing = layout
                .object_path(unit)
                .is_some_and(|object| !object.exists());
            if object_missing && !stale.contains(unit) {
                stale.push(unit.clone());
            }
        }

        stale.sort_by(|a, b| a.path().cmp(b.path()));
        stale
    }
}

/// Walks a directory recursively, collecting every file with a C/C++
/// source or header extension.
fn collect_sources(dir: &Path) -> DomainResult<Vec<SourceFile>> {
    let mut files = vec![];
    for entry in WalkDir::new(dir) {
        let entry =
            entry.map_err(|err| DomainError::FileUnavailable(format!("{}: {}", dir.display(), err)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_source = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| COLLECTED_SUFFIXES.contains(&ext));
        if is_source {
            files.push(SourceFile::from_path(entry.path())?);
        }
    }
    files.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(files)
}
