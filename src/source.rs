use crate::{
    error::{Error, Result},
    segmenter::{Chunk, Segmentation, Segmenter},
};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension given to every produced notebook.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

/// How an input file is turned into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Delimited text (`.txt`), segmented on `<...>` lines
    Text,
    /// Python script (`.py`), read as one code cell
    Script,
}

impl SourceKind {
    /// Returns the file extension for this kind, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Script => "py",
        }
    }

    /// Returns a human-readable label for menus and summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Script => "python",
        }
    }

    /// Detects the kind from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "txt" => Some(Self::Text),
            "py" => Some(Self::Script),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An input file loaded into memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as given by the caller
    pub path: PathBuf,

    /// Detected kind
    pub kind: SourceKind,

    /// Full UTF-8 content
    pub content: String,
}

impl SourceFile {
    /// Reads a source file and detects its kind.
    ///
    /// `\r\n` and lone `\r` line endings are converted to `\n`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The extension is neither `txt` nor `py`
    /// - The file cannot be read
    /// - The file is not valid UTF-8
    pub fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let kind = SourceKind::from_path(&path).ok_or_else(|| unsupported_extension(&path))?;

        let bytes = fs::read(&path).map_err(|e| Error::io(&path, e))?;
        let content = String::from_utf8(bytes).map_err(|_| Error::invalid_utf8(&path))?;
        let content = normalize_newlines(content);

        Ok(Self {
            path,
            kind,
            content,
        })
    }

    /// Turns the content into chunks according to the source kind.
    ///
    /// # Errors
    ///
    /// Returns an error if a text source contains an unsupported directive
    /// and the segmenter is strict.
    pub fn chunks(&self, segmenter: &Segmenter) -> Result<Segmentation> {
        match self.kind {
            SourceKind::Text => segmenter.segment(&self.path, &self.content),
            SourceKind::Script => Ok(Segmentation {
                chunks: vec![Chunk::script(self.content.as_str())],
                skipped: Vec::new(),
            }),
        }
    }

    /// Returns the notebook path for this source.
    ///
    /// The extension is replaced by `ipynb`. With `output_dir` set, the
    /// notebook lands there instead of next to the source.
    #[must_use]
    pub fn notebook_path(&self, output_dir: Option<&Path>) -> PathBuf {
        notebook_path(&self.path, output_dir)
    }
}

/// Derives a notebook path from a source path.
#[must_use]
pub fn notebook_path(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    let with_ext = source.with_extension(NOTEBOOK_EXTENSION);
    match (output_dir, with_ext.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => with_ext,
    }
}

/// Converts `\r\n` and lone `\r` line endings to `\n`.
fn normalize_newlines(content: String) -> String {
    if !content.contains('\r') {
        return content;
    }
    content.replace("\r\n", "\n").replace('\r', "\n")
}

pub(crate) fn unsupported_extension(path: &Path) -> Error {
    Error::selection(format!(
        "Must be a .txt or .py file. File {} is not valid.",
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellKind;
    use assert_fs::prelude::*;

    #[test]
    fn test_kind_from_path() {
        assert_eq!(SourceKind::from_path(Path::new("a.txt")), Some(SourceKind::Text));
        assert_eq!(SourceKind::from_path(Path::new("dir/b.py")), Some(SourceKind::Script));
        assert_eq!(SourceKind::from_path(Path::new("c.md")), None);
        assert_eq!(SourceKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_notebook_path() {
        assert_eq!(
            notebook_path(Path::new("hello_world.txt"), None),
            PathBuf::from("hello_world.ipynb")
        );
        assert_eq!(
            notebook_path(Path::new("src/demo.py"), Some(Path::new("out"))),
            PathBuf::from("out/demo.ipynb")
        );
    }

    #[test]
    fn test_read_script_as_single_code_chunk() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("hi.py");
        file.write_str("print(\"hi\")\n").unwrap();

        let source = SourceFile::read(file.path()).unwrap();
        assert_eq!(source.kind, SourceKind::Script);

        let seg = source.chunks(&Segmenter::default()).unwrap();
        assert_eq!(seg.chunks, vec![Chunk::new(CellKind::Code, "print(\"hi\")\n")]);
    }

    #[test]
    fn test_script_delimiters_are_not_segmented() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("tricky.py");
        file.write_str("<markdown>\nx = 1\n").unwrap();

        let seg = SourceFile::read(file.path())
            .unwrap()
            .chunks(&Segmenter::strict())
            .unwrap();
        assert_eq!(seg.chunks.len(), 1);
        assert_eq!(seg.chunks[0].text, "<markdown>\nx = 1\n");
    }

    #[test]
    fn test_crlf_source_is_normalized() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("win.txt");
        file.write_str("<markdown>\r\n# T\r\n<code>  \r\nx\r\n").unwrap();

        let seg = SourceFile::read(file.path())
            .unwrap()
            .chunks(&Segmenter::default())
            .unwrap();
        assert_eq!(
            seg.chunks,
            vec![
                Chunk::new(CellKind::Markdown, "# T\n"),
                Chunk::new(CellKind::Code, "x\n"),
            ]
        );
    }

    #[test]
    fn test_cr_only_source_is_segmented() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("mac.txt");
        file.write_str("pre\r<markdown>\r# T\r<code>\rx=1\r").unwrap();

        let seg = SourceFile::read(file.path())
            .unwrap()
            .chunks(&Segmenter::default())
            .unwrap();
        assert_eq!(
            seg.chunks,
            vec![
                Chunk::new(CellKind::Markdown, "# T\n"),
                Chunk::new(CellKind::Code, "x=1\n"),
            ]
        );
    }

    #[test]
    fn test_script_line_endings_normalized() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("win.py");
        file.write_str("a = 1\r\nb = 2\r\n").unwrap();

        let source = SourceFile::read(file.path()).unwrap();
        assert_eq!(source.content, "a = 1\nb = 2\n");
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\rc\n".to_string()), "a\nb\nc\n");
        assert_eq!(normalize_newlines("\r\r\n".to_string()), "\n\n");
        assert_eq!(normalize_newlines("plain\n".to_string()), "plain\n");
    }

    #[test]
    fn test_read_rejects_unknown_extension() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("notes.md");
        file.write_str("# notes").unwrap();

        let err = SourceFile::read(file.path()).unwrap_err();
        assert!(err.is_selection());
    }

    #[test]
    fn test_read_rejects_invalid_utf8() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("bin.txt");
        file.write_binary(&[0xff, 0xfe, 0x00, 0x41]).unwrap();

        let err = SourceFile::read(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_read_missing_file() {
        let err = SourceFile::read("/nonexistent/dir/missing.txt").unwrap_err();
        assert!(err.is_io());
    }
}
