//! In-memory notebook document and its fixed skeleton.

use crate::cell::{Cell, CellKind};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::path::Path;
use tracing::debug;

/// Notebook format major version written to every document.
pub const NBFORMAT: u32 = 4;

/// Notebook format minor version written to every document.
pub const NBFORMAT_MINOR: u32 = 2;

/// Source text of the seed cell in a freshly initialized document.
pub const PLACEHOLDER_SOURCE: &str = "template";

/// The blank document every build starts from: fixed Python 3 kernel
/// metadata and a single placeholder markdown cell.
pub static TEMPLATE: Lazy<Notebook> = Lazy::new(|| Notebook {
    cells: vec![Cell::markdown(PLACEHOLDER_SOURCE)],
    metadata: NotebookMetadata::python3(),
    nbformat: NBFORMAT,
    nbformat_minor: NBFORMAT_MINOR,
});

/// Kernel descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSpec {
    /// Name shown in the notebook UI
    pub display_name: String,
    /// Kernel language
    pub language: String,
    /// Kernel identifier
    pub name: String,
}

/// Syntax highlighting mode for the classic notebook editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodemirrorMode {
    /// Mode name
    pub name: String,
    /// Language major version
    pub version: u32,
}

/// Language descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Editor mode
    pub codemirror_mode: CodemirrorMode,
    /// Extension for exported scripts
    pub file_extension: String,
    /// MIME type of exported scripts
    pub mimetype: String,
    /// Language name
    pub name: String,
    /// Exporter used by nbconvert
    pub nbconvert_exporter: String,
    /// Pygments lexer name
    pub pygments_lexer: String,
    /// Language version string
    pub version: String,
}

/// Notebook-level metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookMetadata {
    /// Execution kernel
    pub kernelspec: KernelSpec,
    /// Language details
    pub language_info: LanguageInfo,
}

impl NotebookMetadata {
    /// The Python 3 kernel block written into every produced notebook.
    #[must_use]
    pub fn python3() -> Self {
        Self {
            kernelspec: KernelSpec {
                display_name: "Python 3".to_string(),
                language: "python".to_string(),
                name: "python3".to_string(),
            },
            language_info: LanguageInfo {
                codemirror_mode: CodemirrorMode {
                    name: "ipython".to_string(),
                    version: 3,
                },
                file_extension: ".py".to_string(),
                mimetype: "text/x-python".to_string(),
                name: "python".to_string(),
                nbconvert_exporter: "python".to_string(),
                pygments_lexer: "ipython3".to_string(),
                version: "3.6.8".to_string(),
            },
        }
    }
}

/// A notebook document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Cells in presentation order
    pub cells: Vec<Cell>,
    /// Kernel and language metadata
    pub metadata: NotebookMetadata,
    /// Format major version
    pub nbformat: u32,
    /// Format minor version
    pub nbformat_minor: u32,
}

impl Default for Notebook {
    fn default() -> Self {
        Self::template()
    }
}

impl Notebook {
    /// Returns a fresh copy of [`TEMPLATE`].
    #[must_use]
    pub fn template() -> Self {
        TEMPLATE.clone()
    }

    /// Parses a notebook from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupt`] if the text is not JSON or does not have
    /// the notebook structure (for example, no `cells` key).
    pub fn from_json(path: &Path, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::corrupt(path, e.to_string()))
    }

    /// Renders the notebook as JSON with a one-space indent.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let mut out = Vec::with_capacity(1024);
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b" "));
        self.serialize(&mut serializer)?;
        // serde_json only emits valid UTF-8
        String::from_utf8(out).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the notebook has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Appends a cell of `kind` at the end.
    pub fn append(&mut self, kind: CellKind, text: impl Into<String>) {
        self.push(Cell::new(kind, text));
    }

    /// Appends a cell for a segmented chunk.
    ///
    /// Raw chunks are only turned into cells when `emit_raw` is set;
    /// otherwise they are dropped. Returns whether a cell was appended.
    pub fn append_cell(&mut self, kind: CellKind, text: impl Into<String>, emit_raw: bool) -> bool {
        if kind == CellKind::Raw && !emit_raw {
            debug!("Dropping raw chunk; raw cell output is disabled");
            return false;
        }
        self.append(kind, text);
        true
    }

    /// Appends an already built cell at the end.
    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Removes and returns the cell at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CellIndex`] if `index` is past the end.
    pub fn remove_at(&mut self, index: usize) -> Result<Cell> {
        if index >= self.cells.len() {
            return Err(Error::CellIndex {
                index,
                len: self.cells.len(),
            });
        }
        Ok(self.cells.remove(index))
    }

    /// Replaces the source of the cell at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CellIndex`] if `index` is past the end.
    pub fn set_source(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        let len = self.cells.len();
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(Error::CellIndex { index, len })?;
        cell.set_source(text);
        Ok(())
    }

    /// Returns true if cell 0 is still the untouched placeholder.
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.cells
            .first()
            .is_some_and(|c| c.kind() == CellKind::Markdown && c.text() == PLACEHOLDER_SOURCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const EXPECTED_TEMPLATE: &str = r#"{
 "cells": [
  {
   "cell_type": "markdown",
   "metadata": {},
   "source": [
    "template"
   ]
  }
 ],
 "metadata": {
  "kernelspec": {
   "display_name": "Python 3",
   "language": "python",
   "name": "python3"
  },
  "language_info": {
   "codemirror_mode": {
    "name": "ipython",
    "version": 3
   },
   "file_extension": ".py",
   "mimetype": "text/x-python",
   "name": "python",
   "nbconvert_exporter": "python",
   "pygments_lexer": "ipython3",
   "version": "3.6.8"
  }
 },
 "nbformat": 4,
 "nbformat_minor": 2
}"#;

    #[test]
    fn test_template_renders_byte_for_byte() {
        assert_eq!(Notebook::template().to_json().unwrap(), EXPECTED_TEMPLATE);
    }

    #[test]
    fn test_template_has_single_placeholder() {
        let nb = Notebook::template();
        assert_eq!(nb.len(), 1);
        assert!(nb.has_placeholder());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut nb = Notebook::template();
        nb.append(CellKind::Markdown, "# one\n");
        nb.append(CellKind::Code, "two()\n");
        nb.append(CellKind::Markdown, "three\n");

        let texts: Vec<_> = nb.cells.iter().map(Cell::text).collect();
        assert_eq!(texts, ["template", "# one\n", "two()\n", "three\n"]);
    }

    #[test]
    fn test_raw_chunks_follow_policy() {
        let mut nb = Notebook::template();
        assert!(!nb.append_cell(CellKind::Raw, "dropped", false));
        assert_eq!(nb.len(), 1);

        assert!(nb.append_cell(CellKind::Raw, "kept", true));
        assert!(nb.append_cell(CellKind::Markdown, "md", false));
        assert_eq!(nb.len(), 3);
        assert_eq!(nb.cells[1].kind(), CellKind::Raw);
    }

    #[test]
    fn test_remove_at_out_of_range() {
        let mut nb = Notebook::template();
        nb.remove_at(0).unwrap();
        assert!(nb.is_empty());

        let err = nb.remove_at(0).unwrap_err();
        assert!(matches!(err, Error::CellIndex { index: 0, len: 0 }));
    }

    #[test]
    fn test_set_source_on_empty_notebook_fails() {
        let mut nb = Notebook::template();
        nb.set_source(0, "# heading").unwrap();
        assert!(!nb.has_placeholder());

        nb.remove_at(0).unwrap();
        assert!(nb.set_source(0, "x").is_err());
    }

    #[test]
    fn test_from_json_rejects_missing_cells() {
        let err = Notebook::from_json(Path::new("x.ipynb"), r#"{"metadata": {}}"#).unwrap_err();
        assert!(err.is_corrupt());

        let err = Notebook::from_json(Path::new("x.ipynb"), "not json").unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_from_json_reads_back_template() {
        let nb = Notebook::from_json(Path::new("x.ipynb"), EXPECTED_TEMPLATE).unwrap();
        assert_eq!(nb, Notebook::template());
    }

    #[test]
    fn test_execution_count_is_null_in_output() {
        let mut nb = Notebook::template();
        nb.append(CellKind::Code, "print(1)\n");
        let value: Value = serde_json::from_str(&nb.to_json().unwrap()).unwrap();
        assert!(value["cells"][1]["execution_count"].is_null());
        assert_eq!(value["cells"][1]["outputs"], Value::Array(vec![]));
    }
}
