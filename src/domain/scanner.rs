//! Include scanning and dependency-map construction.
//!
//! Targets are rebuilt incrementally by watching which files changed, so
//! the build needs to know which translation units are affected by each
//! header. That knowledge comes from a line-level scan of `#include`
//! directives: no preprocessor is involved, a directive is any line whose
//! trimmed text starts with `#include`.
//!
//! Resolution walks the including file's own directory first, then the
//! target's search list (system include directories, the source
//! directory, the declared include directory). A quoted include that
//! resolves nowhere is an error; an angle-bracket include that resolves
//! nowhere is recorded as a system include and otherwise ignored, since
//! standard-library headers live outside the project and never change
//! under it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{DomainError, DomainResult};
use super::models::SourceFile;

/// How an include directive was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeStyle {
    /// `#include "name"`
    Quoted,
    /// `#include <name>`
    Angled,
}

/// One parsed `#include` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRef {
    pub name: String,
    pub style: IncludeStyle,
}

/// Extracts the include directives from source text.
///
/// Lines that start with `#include` but carry no well-formed `"…"` or
/// `<…>` operand are skipped rather than reported; the compiler will
/// complain about them with a far better message.
///
/// # Examples
///
/// ```
/// use kiln::domain::{extract_includes, IncludeStyle};
///
/// let refs = extract_includes("#include <string_view>\n#include \"util.hpp\"\nint x;\n");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[0].name, "string_view");
/// assert_eq!(refs[0].style, IncludeStyle::Angled);
/// assert_eq!(refs[1].name, "util.hpp");
/// assert_eq!(refs[1].style, IncludeStyle::Quoted);
/// ```
pub fn extract_includes(text: &str) -> Vec<IncludeRef> {
    text.lines()
        .filter_map(|line| {
            let rest = line.trim_start().strip_prefix("#include")?.trim();
            let mut chars = rest.chars();
            let (style, closer) = match chars.next()? {
                '"' => (IncludeStyle::Quoted, '"'),
                '<' => (IncludeStyle::Angled, '>'),
                _ => return None,
            };
            let body: &str = chars.as_str();
            let end = body.find(closer)?;
            if end == 0 {
                return None;
            }
            Some(IncludeRef { name: body[..end].to_string(), style })
        })
        .collect()
}

/// Result of scanning one file: the local files it includes and the
/// names it pulls from outside the project.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub locals: Vec<SourceFile>,
    pub system: Vec<String>,
}

/// Resolves include directives against a fixed directory search list.
pub struct IncludeScanner {
    search_dirs: Vec<PathBuf>,
}

impl IncludeScanner {
    pub fn new(search_dirs: Vec<PathBuf>) -> IncludeScanner {
        IncludeScanner { search_dirs }
    }

    /// Reads a file and resolves every include directive in it.
    pub fn scan_file(&self, file: &SourceFile) -> DomainResult<ScanOutcome> {
        let text = fs::read_to_string(file.path()).map_err(|err| {
            DomainError::FileUnavailable(format!("{}: {}", file.path().display(), err))
        })?;
        self.resolve_all(file.path(), &extract_includes(&text))
    }

    fn resolve_all(&self, origin: &Path, refs: &[IncludeRef]) -> DomainResult<ScanOutcome> {
        let origin_dir = origin.parent().map(Path::to_path_buf);
        let mut outcome = ScanOutcome::default();

        for include in refs {
            let local_hit = origin_dir
                .iter()
                .chain(self.search_dirs.iter())
                .map(|dir| dir.join(&include.name))
                .find(|candidate| candidate.exists());

            match (local_hit, include.style) {
                (Some(path), _) => outcome.locals.push(SourceFile::from_path(&path)?),
                (None, IncludeStyle::Angled) => outcome.system.push(include.name.clone()),
                (None, IncludeStyle::Quoted) => {
                    return Err(DomainError::MissingInclude {
                        header: include.name.clone(),
                        included_by: origin.display().to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }
}

/// Maps every file to its direct local includes plus itself.
///
/// A file always depends on itself so that editing a translation unit
/// marks the unit for rebuild through the same map as editing a header.
pub fn source_dependencies(
    files: &[SourceFile],
    scanner: &IncludeScanner,
) -> DomainResult<HashMap<SourceFile, Vec<SourceFile>>> {
    let mut map = HashMap::new();
    for file in files {
        let mut deps = scanner.scan_file(file)?.locals;
        deps.push(file.clone());
        map.insert(file.clone(), deps);
    }
    Ok(map)
}

/// Inverts a dependency map: every file maps to the files that include
/// it. Rebuild planning reads this direction.
pub fn dependents_map(
    includes: &HashMap<SourceFile, Vec<SourceFile>>,
) -> HashMap<SourceFile, Vec<SourceFile>> {
    let mut map: HashMap<SourceFile, Vec<SourceFile>> = HashMap::new();
    for (source, deps) in includes {
        for dep in deps {
            map.entry(dep.clone()).or_default().push(source.clone());
        }
    }
    map
}
