use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the nbweave library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// The notebook on disk is not valid JSON or lacks the expected structure.
    #[error("Notebook '{path}' is corrupt: {message}")]
    Corrupt {
        /// Notebook path
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// A cell index was outside the document.
    #[error("Cell index {index} is out of range (notebook has {len} cells)")]
    CellIndex {
        /// Requested index
        index: usize,
        /// Number of cells present
        len: usize,
    },

    /// A delimiter line carried a directive that is neither an opener nor a comment.
    #[error("Unsupported directive '<{directive}>' on line {line} of '{path}'")]
    UnsupportedDirective {
        /// Source file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Raw content between the brackets
        directive: String,
    },

    /// Input files could not be resolved.
    #[error("{message}")]
    Selection {
        /// Detailed error message
        message: String,
    },

    /// Heading template rendering error.
    #[error("Failed to render heading template: {message}")]
    Template {
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// Invalid UTF-8 encountered in a source file.
    #[error("Invalid UTF-8 encoding in file '{path}'. File may be binary or use unsupported encoding.")]
    InvalidUtf8 {
        /// Path to file with encoding issues
        path: PathBuf,
    },

    /// System time error.
    #[error("System time error: {message}")]
    SystemTime {
        /// Error message
        message: String,
    },

    /// Multiple errors occurred during a batch.
    #[error("Multiple errors occurred during processing ({count} errors)")]
    Multiple {
        /// Number of errors
        count: usize,
        /// Collection of errors
        errors: Vec<Error>,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a document-corruption error.
    #[must_use]
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an input-selection error.
    #[must_use]
    pub fn selection(message: impl Into<String>) -> Self {
        Self::Selection {
            message: message.into(),
        }
    }

    /// Creates an invalid UTF-8 error.
    #[must_use]
    pub fn invalid_utf8(path: impl Into<PathBuf>) -> Self {
        Self::InvalidUtf8 { path: path.into() }
    }

    /// Combines multiple errors into a single error.
    #[must_use]
    pub fn multiple(errors: Vec<Self>) -> Self {
        let count = errors.len();
        Self::Multiple { count, errors }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a document-corruption error.
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this is an input-selection error.
    #[must_use]
    pub const fn is_selection(&self) -> bool {
        matches!(self, Self::Selection { .. })
    }
}

impl From<std::time::SystemTimeError> for Error {
    fn from(e: std::time::SystemTimeError) -> Self {
        Self::SystemTime {
            message: e.to_string(),
        }
    }
}

impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        // tera keeps the useful part of parse errors in the source chain
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = std::error::Error::source(inner);
        }
        Self::Template { message }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/test.txt", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn test_corrupt_error() {
        let err = Error::corrupt("demo.ipynb", "missing field `cells`");
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("demo.ipynb"));
        assert!(err.to_string().contains("cells"));
    }

    #[test]
    fn test_selection_error_message_is_verbatim() {
        let err = Error::selection("No files with extension of .txt were found");
        assert!(err.is_selection());
        assert_eq!(err.to_string(), "No files with extension of .txt were found");
    }

    #[test]
    fn test_unsupported_directive_message() {
        let err = Error::UnsupportedDirective {
            path: PathBuf::from("notes.txt"),
            line: 7,
            directive: "div".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("<div>"));
        assert!(msg.contains("line 7"));
    }

    #[test]
    fn test_multiple_errors() {
        let errors = vec![Error::config("error 1"), Error::config("error 2")];
        let combined = Error::multiple(errors);
        assert!(combined.to_string().contains("2 errors"));
    }

    #[test]
    fn test_serialization_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }
}
