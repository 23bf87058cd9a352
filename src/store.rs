use crate::{
    cell::CellKind,
    error::{Error, Result},
    notebook::Notebook,
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::{debug, info};

/// A notebook persisted at a fixed path.
///
/// Every mutating operation is a full load, mutate and store round trip,
/// so the file is valid notebook JSON between any two calls.
#[derive(Debug, Clone)]
pub struct NotebookStore {
    path: PathBuf,
    backup_existing: bool,
    emit_raw_cells: bool,
}

impl NotebookStore {
    /// Creates a store for `path`. Nothing is touched on disk yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_existing: false,
            emit_raw_cells: false,
        }
    }

    /// Copies an existing file aside before it is first overwritten.
    #[must_use]
    pub fn backup_existing(mut self, enabled: bool) -> Self {
        self.backup_existing = enabled;
        self
    }

    /// Appends `<raw>` chunks as raw cells instead of ignoring them.
    #[must_use]
    pub fn emit_raw_cells(mut self, enabled: bool) -> Self {
        self.emit_raw_cells = enabled;
        self
    }

    /// Returns the notebook path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a brand-new template document, replacing anything at the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not writable.
    pub fn initialize(&self) -> Result<()> {
        self.create(&Notebook::template())
    }

    /// Sets the source of cell 0 to `title_text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupt`] if the document is malformed or empty.
    pub fn retitle_first_cell(&self, title_text: &str) -> Result<()> {
        let mut nb = self.load()?;
        if nb.is_empty() {
            return Err(Error::corrupt(&self.path, "notebook has no cell 0 to retitle"));
        }
        nb.set_source(0, title_text)?;
        self.store(&nb)
    }

    /// Appends a cell of `kind` holding `text` after all existing cells.
    ///
    /// Returns `false` when nothing was appended, which happens for raw
    /// chunks unless raw cell output is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be loaded or stored.
    pub fn append_cell(&self, kind: CellKind, text: &str) -> Result<bool> {
        let mut nb = self.load()?;
        if !nb.append_cell(kind, text, self.emit_raw_cells) {
            return Ok(false);
        }
        self.store(&nb)?;
        Ok(true)
    }

    /// Removes the cell at `index` and returns how many cells remain.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be loaded or stored, or if
    /// `index` is out of range.
    pub fn pop_cell(&self, index: usize) -> Result<usize> {
        let mut nb = self.load()?;
        nb.remove_at(index)?;
        self.store(&nb)?;

        info!("Total cells in {}: {}", self.path.display(), nb.len());
        Ok(nb.len())
    }

    /// Reads and parses the notebook.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read and
    /// [`Error::Corrupt`] if it is not a notebook.
    pub fn load(&self) -> Result<Notebook> {
        let text = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        Notebook::from_json(&self.path, &text)
    }

    /// Writes `nb` as the first version of this file, backing up whatever
    /// was there before if enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup or the write fails.
    pub fn create(&self, nb: &Notebook) -> Result<()> {
        if self.backup_existing && self.path.exists() {
            self.backup_file()?;
        }
        self.store(nb)
    }

    /// Replaces the file with `nb`.
    fn store(&self, nb: &Notebook) -> Result<()> {
        let content = nb.to_json()?;
        write_file_atomic(&self.path, &content)?;
        debug!("Stored {} cells to {}", nb.len(), self.path.display());
        Ok(())
    }

    /// Creates a timestamped backup of the existing file.
    fn backup_file(&self) -> Result<PathBuf> {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_nanos();

        let filename = self
            .path
            .file_name()
            .ok_or_else(|| Error::config("Invalid notebook path"))?
            .to_string_lossy();

        let backup_path = self
            .path
            .with_file_name(format!("{filename}.backup.{timestamp}"));

        fs::copy(&self.path, &backup_path).map_err(|e| Error::io(&backup_path, e))?;

        debug!("Created backup: {}", backup_path.display());
        Ok(backup_path)
    }
}

/// Writes a file through a synced temporary sibling and a rename.
fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("ipynb.tmp");
    let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;

    drop(temp_file);

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    Ok(())
}
