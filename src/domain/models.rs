use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};
use super::profile::ProfileOverride;

/// File extensions the source walker collects into a target.
pub const COLLECTED_SUFFIXES: [&str; 4] = ["hpp", "cpp", "h", "c"];

/// Role a file plays in the build.
///
/// Headers participate in dependency scanning but are never compiled on
/// their own; translation units are handed to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Included text (`.h`, `.hpp`, or anything pulled in by an include)
    Header,
    /// A compilable unit (`.c`, `.cpp`)
    TranslationUnit,
}

impl FileKind {
    /// Classifies a path by its extension.
    ///
    /// Anything that is not a known compilable extension counts as a
    /// header, since the only other way a file enters the build is by
    /// being included.
    ///
    /// # Examples
    ///
    /// ```
    /// use kiln::domain::FileKind;
    /// use std::path::Path;
    ///
    /// assert_eq!(FileKind::classify(Path::new("src/main.cpp")), FileKind::TranslationUnit);
    /// assert_eq!(FileKind::classify(Path::new("src/util.hpp")), FileKind::Header);
    /// assert_eq!(FileKind::classify(Path::new("string_view")), FileKind::Header);
    /// ```
    pub fn classify(path: &Path) -> FileKind {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("c") | Some("cpp") => FileKind::TranslationUnit,
            _ => FileKind::Header,
        }
    }
}

/// A file that participates in a build, identified by its canonical path
/// and the modification time observed when it was collected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    path: PathBuf,
    modified: NaiveDateTime,
    kind: FileKind,
}

impl SourceFile {
    /// Creates a source file from an already-known path and timestamp.
    pub fn new(path: PathBuf, modified: NaiveDateTime) -> SourceFile {
        let kind = FileKind::classify(&path);
        SourceFile { path, modified, kind }
    }

    /// Reads metadata from disk and canonicalizes the path.
    pub fn from_path(path: &Path) -> DomainResult<SourceFile> {
        let canonical = path
            .canonicalize()
            .map_err(|err| DomainError::FileUnavailable(format!("{}: {}", path.display(), err)))?;
        let modified = canonical
            .metadata()
            .and_then(|meta| meta.modified())
            .map_err(|err| DomainError::FileUnavailable(format!("{}: {}", path.display(), err)))?;
        let modified = chrono::DateTime::<chrono::Local>::from(modified).naive_local();
        Ok(SourceFile::new(canonical, modified))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn modified(&self) -> NaiveDateTime {
        self.modified
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_newer_than(&self, stamp: NaiveDateTime) -> bool {
        self.modified > stamp
    }

    /// Flattens a path into a single file-name component.
    ///
    /// Objects for every translation unit of a target live in one flat
    /// directory, so the unit's full path is encoded into the object name
    /// with `|` standing in for the path separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use kiln::domain::SourceFile;
    /// use std::path::Path;
    ///
    /// assert_eq!(SourceFile::flatten(Path::new("src/app/main.cpp")), "src|app|main.cpp");
    /// ```
    pub fn flatten(path: &Path) -> String {
        path.to_string_lossy().replace(['/', '\\'], "|")
    }

    /// Name of the object file this unit compiles to, or `None` for
    /// headers.
    pub fn object_file_name(&self) -> Option<String> {
        if self.kind != FileKind::TranslationUnit {
            return None;
        }
        let flat = SourceFile::flatten(&self.path);
        let stem = flat
            .strip_suffix(".cpp")
            .or_else(|| flat.strip_suffix(".c"))?;
        Some(format!("{}.o", stem))
    }
}

/// Top-level structure of a `kiln.toml` manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub project: ProjectInfo,
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileOverride>,
}

/// The mandatory `[project]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub version: String,
}

/// One `[targets.<name>]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Directory walked recursively for sources. Mandatory.
    pub source: String,
    /// Optional extra include directory, also walked for sources.
    pub include: Option<String>,
}

impl Manifest {
    /// Parses manifest text, reporting the offending field on failure.
    pub fn from_toml_str(text: &str) -> DomainResult<Manifest> {
        toml::from_str(text).map_err(|err| DomainError::InvalidManifest(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp(secs: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, secs)
            .unwrap()
    }

    #[test]
    fn test_classify_compilable_extensions() {
        assert_eq!(FileKind::classify(Path::new("a.c")), FileKind::TranslationUnit);
        assert_eq!(FileKind::classify(Path::new("deep/dir/b.cpp")), FileKind::TranslationUnit);
    }

    #[test]
    fn test_classify_everything_else_as_header() {
        assert_eq!(FileKind::classify(Path::new("a.h")), FileKind::Header);
        assert_eq!(FileKind::classify(Path::new("a.hpp")), FileKind::Header);
        assert_eq!(FileKind::classify(Path::new("string_view")), FileKind::Header);
        assert_eq!(FileKind::classify(Path::new("weird.cxx")), FileKind::Header);
    }

    #[test]
    fn test_object_file_name_for_unit() {
        let unit = SourceFile::new(PathBuf::from("src/app/main.cpp"), timestamp(0));
        assert_eq!(unit.object_file_name(), Some("src|app|main.o".to_string()));

        let c_unit = SourceFile::new(PathBuf::from("src/legacy.c"), timestamp(0));
        assert_eq!(c_unit.object_file_name(), Some("src|legacy.o".to_string()));
    }

    #[test]
    fn test_object_file_name_for_header_is_none() {
        let header = SourceFile::new(PathBuf::from("include/a.hpp"), timestamp(0));
        assert_eq!(header.object_file_name(), None);
    }

    #[test]
    fn test_is_newer_than() {
        let file = SourceFile::new(PathBuf::from("src/main.cpp"), timestamp(30));
        assert!(file.is_newer_than(timestamp(10)));
        assert!(!file.is_newer_than(timestamp(30)));
        assert!(!file.is_newer_than(timestamp(50)));
    }

    #[test]
    fn test_manifest_minimal() {
        let manifest = Manifest::from_toml_str(
            r#"
            [project]
            name = "demo"
            version = "0.1.0"

            [targets.app]
            source = "src"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.project.name, "demo");
        assert_eq!(manifest.project.version, "0.1.0");
        assert_eq!(manifest.targets.len(), 1);
        assert_eq!(manifest.targets["app"].source, "src");
        assert!(manifest.targets["app"].include.is_none());
        assert!(manifest.profiles.is_empty());
    }

    #[test]
    fn test_manifest_missing_project_table() {
        let err = Manifest::from_toml_str("[targets.app]\nsource = \"src\"\n").unwrap_err();
        match err {
            DomainError::InvalidManifest(msg) => assert!(msg.contains("project")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_manifest_wrong_field_type() {
        let err = Manifest::from_toml_str(
            r#"
            [project]
            name = "demo"
            version = 1
            "#,
        )
        .unwrap_err();
        match err {
            DomainError::InvalidManifest(msg) => assert!(msg.contains("version")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_manifest_with_profile_override() {
        let manifest = Manifest::from_toml_str(
            r#"
            [project]
            name = "demo"
            version = "0.1.0"

            [profiles.release]
            options = ["-O3"]
            "#,
        )
        .unwrap();
        assert!(manifest.profiles.contains_key("release"));
    }
}
