use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Markdown documentation cell
    Markdown,
    /// Executable code cell
    Code,
    /// Raw cell, passed through untouched by notebook frontends
    Raw,
}

impl CellKind {
    /// Every kind, in the order they are documented.
    pub const ALL: [Self; 3] = [Self::Markdown, Self::Code, Self::Raw];

    /// Returns the `cell_type` string used in notebook JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Code => "code",
            Self::Raw => "raw",
        }
    }
}

impl std::fmt::Display for CellKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CellKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown cell kind '{s}'. Expected: markdown, code, raw"))
    }
}

/// A single notebook cell as it appears in the `.ipynb` JSON.
///
/// Field order inside each variant is the order keys are written, so
/// changing it changes the produced bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    /// Markdown cell
    Markdown {
        /// Always empty for cells we create
        metadata: Map<String, Value>,
        /// Source lines
        source: Vec<String>,
    },
    /// Code cell
    Code {
        /// Never set; the tool does not execute anything
        execution_count: Option<u64>,
        /// Always empty for cells we create
        metadata: Map<String, Value>,
        /// Always empty for cells we create
        outputs: Vec<Value>,
        /// Source lines
        source: Vec<String>,
    },
    /// Raw cell
    Raw {
        /// Always empty for cells we create
        metadata: Map<String, Value>,
        /// Source lines
        source: Vec<String>,
    },
}

impl Cell {
    /// Builds a fresh cell of `kind` holding `text` as its only source entry.
    #[must_use]
    pub fn new(kind: CellKind, text: impl Into<String>) -> Self {
        let source = vec![text.into()];
        match kind {
            CellKind::Markdown => Self::Markdown {
                metadata: Map::new(),
                source,
            },
            CellKind::Code => Self::Code {
                execution_count: None,
                metadata: Map::new(),
                outputs: Vec::new(),
                source,
            },
            CellKind::Raw => Self::Raw {
                metadata: Map::new(),
                source,
            },
        }
    }

    /// Creates a markdown cell.
    #[must_use]
    pub fn markdown(text: impl Into<String>) -> Self {
        Self::new(CellKind::Markdown, text)
    }

    /// Creates a code cell.
    #[must_use]
    pub fn code(text: impl Into<String>) -> Self {
        Self::new(CellKind::Code, text)
    }

    /// Returns the kind of this cell.
    #[must_use]
    pub const fn kind(&self) -> CellKind {
        match self {
            Self::Markdown { .. } => CellKind::Markdown,
            Self::Code { .. } => CellKind::Code,
            Self::Raw { .. } => CellKind::Raw,
        }
    }

    /// Returns the source lines.
    #[must_use]
    pub fn source(&self) -> &[String] {
        match self {
            Self::Markdown { source, .. } | Self::Code { source, .. } | Self::Raw { source, .. } => {
                source
            }
        }
    }

    /// Returns the semantic content: all source lines concatenated.
    #[must_use]
    pub fn text(&self) -> String {
        self.source().concat()
    }

    /// Replaces the source with a single entry.
    pub fn set_source(&mut self, text: impl Into<String>) {
        let new_source = vec![text.into()];
        match self {
            Self::Markdown { source, .. } | Self::Code { source, .. } | Self::Raw { source, .. } => {
                *source = new_source;
            }
        }
    }
}
