//! Library file persistence.
//!
//! The library is a single JSON document (`notebooks`, `active_notebook_id`,
//! `updated_at`). It is read once at the start of a run and written back as
//! a whole at the end. Writes go to a sibling temp file that is renamed over
//! the target, so a crash never leaves a half-written library behind.
//!
//! A missing file is an empty library. An unreadable or malformed file is
//! an error; nothing here tries to repair it.

use std::path::{Path, PathBuf};

use nbshelf_shared::{Library, NbshelfError, Result};

/// Handle to the library file at a fixed path.
#[derive(Debug, Clone)]
pub struct LibraryStore {
    path: PathBuf,
}

impl LibraryStore {
    /// Create a store for `path`. Nothing is touched on disk yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the library file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the library, or an empty one if the file does not exist.
    pub fn load(&self) -> Result<Library> {
        if !self.path.exists() {
            tracing::debug!(path = ?self.path, "library file not found, starting empty");
            return Ok(Library::default());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| NbshelfError::io(&self.path, e))?;

        let library: Library = serde_json::from_str(&content).map_err(|e| {
            NbshelfError::Storage(format!("corrupt library {}: {e}", self.path.display()))
        })?;

        check_keys(&library)?;

        tracing::debug!(
            path = ?self.path,
            notebooks = library.notebooks.len(),
            "library loaded"
        );
        Ok(library)
    }

    /// Overwrite the library file with `library`.
    pub fn save(&self, library: &Library) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| NbshelfError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(library)
            .map_err(|e| NbshelfError::Storage(format!("failed to serialize library: {e}")))?;

        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(|e| NbshelfError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| NbshelfError::io(&self.path, e))?;

        tracing::info!(
            path = ?self.path,
            notebooks = library.notebooks.len(),
            "library saved"
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "library.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Every key must equal its record's id.
fn check_keys(library: &Library) -> Result<()> {
    for (key, record) in &library.notebooks {
        if key != &record.id {
            return Err(NbshelfError::Storage(format!(
                "library key '{key}' does not match record id '{}'",
                record.id
            )));
        }
    }
    Ok(())
}
