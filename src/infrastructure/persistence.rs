//! Workspace layout, manifest loading and the incremental stamp store.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult, Manifest, SourceFile};

/// Where a target keeps its build products: objects under
/// `.kiln/<target>/obj/`, the linked binary under `.kiln/<target>/bin/`,
/// the stamp store next to them.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
    target: String,
}

impl WorkspaceLayout {
    pub fn for_target(target: &str) -> WorkspaceLayout {
        WorkspaceLayout::rooted(Path::new(".kiln"), target)
    }

    /// Layout under an explicit base directory. Tests use this to keep
    /// build products inside a temporary directory.
    pub fn rooted(base: &Path, target: &str) -> WorkspaceLayout {
        WorkspaceLayout {
            root: base.join(target),
            target: target.to_string(),
        }
    }

    pub fn prepare(&self) -> Result<(), String> {
        for dir in [self.object_dir(), self.binary_dir()] {
            fs::create_dir_all(&dir)
                .map_err(|err| format!("cannot create {}: {}", dir.display(), err))?;
        }
        Ok(())
    }

    pub fn object_dir(&self) -> PathBuf {
        self.root.join("obj")
    }

    pub fn binary_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn binary_path(&self) -> PathBuf {
        self.binary_dir().join(&self.target)
    }

    pub fn stamps_path(&self) -> PathBuf {
        self.root.join("stamps.json")
    }

    /// Object path for a translation unit, `None` for headers.
    pub fn object_path(&self, unit: &SourceFile) -> Option<PathBuf> {
        unit.object_file_name().map(|name| self.object_dir().join(name))
    }

    /// All objects currently present, as handed to the linker.
    pub fn existing_objects(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(self.object_dir()) {
            Ok(entries) => entries,
            Err(_) => return vec![],
        };
        let mut objects: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "o"))
            .collect();
        objects.sort();
        objects
    }
}

/// Loads and parses `kiln.toml`.
pub struct ManifestRepository;

impl ManifestRepository {
    pub fn load(path: &Path) -> DomainResult<Manifest> {
        let text = fs::read_to_string(path).map_err(|err| {
            DomainError::FileUnavailable(format!("cannot read {}: {}", path.display(), err))
        })?;
        Manifest::from_toml_str(&text)
    }
}

/// Modification times recorded at the last successful compile, keyed by
/// canonical path. Serialized as pretty JSON so a stamp file is
/// inspectable when a rebuild decision looks wrong.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StampStore {
    stamps: HashMap<String, NaiveDateTime>,
}

impl StampStore {
    /// Loads the store, treating a missing or unreadable file as empty:
    /// the worst case is a full rebuild.
    pub fn load(path: &Path) -> StampStore {
        match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(_) => StampStore::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| format!("cannot serialize stamps: {}", err))?;
        fs::write(path, json).map_err(|err| format!("cannot write {}: {}", path.display(), err))
    }

    fn key(file: &SourceFile) -> String {
        file.path().to_string_lossy().into_owned()
    }

    pub fn stamp_for(&self, file: &SourceFile) -> Option<NaiveDateTime> {
        self.stamps.get(&StampStore::key(file)).copied()
    }

    /// A file is stale when it has no stamp or is newer than its stamp.
    pub fn is_stale(&self, file: &SourceFile) -> bool {
        match self.stamp_for(file) {
            Some(stamp) => file.is_newer_than(stamp),
            None => true,
        }
    }

    pub fn record(&mut self, file: &SourceFile) {
        self.stamps.insert(StampStore::key(file), file.modified());
    }
}
