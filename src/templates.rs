//! Template tree discovery.
//!
//! A target keeps its templates under `<base_dir>/templates/`, one directory
//! per kind (`templates/<handle>/<name>/...`). Every file below `templates/`
//! doubles as a partial named after its path relative to that root.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

pub const TEMPLATES_DIR: &str = "templates";

/// One template file, loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Path relative to the walked root, `/`-separated
    pub id: String,
    /// Absolute (or base-relative) location on disk
    pub path: PathBuf,
    pub source: String,
}

/// Every regular file below `dir`, recursively, in file-name order
pub fn walk_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::TemplateRead {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: io::Error::from(e),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    debug!(dir = %dir.display(), count = files.len(), "Walked template directory");
    Ok(files)
}

/// `path` relative to `root` with `/` separators
pub fn relative_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read a template as text. Invalid UTF-8 (binary assets) is replaced, never fatal.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| Error::TemplateRead {
        path: path.to_path_buf(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(source) => Ok(source),
        Err(e) => {
            debug!(path = %path.display(), "Template is not valid UTF-8, reading lossily");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Load every template below `dir`, ids relative to `dir`
pub fn load_templates(dir: &Path) -> Result<Vec<TemplateFile>> {
    walk_directory(dir)?
        .into_iter()
        .map(|path| {
            let source = read_source(&path)?;
            Ok(TemplateFile {
                id: relative_id(dir, &path),
                path,
                source,
            })
        })
        .collect()
}
