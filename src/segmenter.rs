//! Delimiter-driven segmentation of text sources into typed chunks.
//!
//! A delimiter line is a line whose trailing-trimmed form starts with `<`
//! and ends with `>`. The first whitespace-separated token inside the
//! brackets is the directive:
//!
//! - `markdown`, `code`, `raw` open a new chunk; extra tokens are a note
//! - `comment` drops the line without closing the current chunk
//! - anything else is unsupported and is either skipped or rejected
//!
//! Lines before the first opener are preamble and never reach a chunk,
//! delimiter lines included. Sources are expected to use `\n` line endings;
//! [`SourceFile::read`](crate::SourceFile::read) normalizes them.

use crate::{
    cell::CellKind,
    config::Config,
    error::{Error, Result},
};
use std::path::Path;
use tracing::{debug, trace, warn};

/// One directive-delimited section of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Kind of cell this chunk becomes
    pub kind: CellKind,

    /// Verbatim text, each line keeping its own line ending
    pub text: String,
}

impl Chunk {
    /// Creates a new chunk.
    #[must_use]
    pub fn new(kind: CellKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Wraps a whole script file as a single code chunk.
    #[must_use]
    pub fn script(content: impl Into<String>) -> Self {
        Self::new(CellKind::Code, content)
    }
}

/// Parsed meaning of a delimiter line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Starts a chunk of the given kind
    Open(CellKind),
    /// Single-line comment
    Comment,
    /// Anything else, with the raw bracket content
    Unsupported(String),
}

impl Directive {
    /// Classifies a line. Returns `None` for ordinary content lines.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim_end();
        if trimmed.len() < 2 || !trimmed.starts_with('<') || !trimmed.ends_with('>') {
            return None;
        }

        let inner = trimmed[1..trimmed.len() - 1].trim();
        let directive = match inner.split_whitespace().next() {
            Some("comment") => Self::Comment,
            Some(word) => word
                .parse::<CellKind>()
                .map_or_else(|_| Self::Unsupported(inner.to_string()), Self::Open),
            None => Self::Unsupported(String::new()),
        };
        Some(directive)
    }
}

/// A delimiter line that was skipped because its directive is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDirective {
    /// 1-based line number
    pub line: usize,

    /// Content between the brackets
    pub content: String,
}

/// Result of segmenting one text source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    /// Chunks in source order, one per opener directive
    pub chunks: Vec<Chunk>,

    /// Unsupported delimiter lines that were skipped
    pub skipped: Vec<SkippedDirective>,
}

/// Splits delimited text into chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter {
    strict: bool,
}

impl Segmenter {
    /// Creates a segmenter from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            strict: config.strict_directives,
        }
    }

    /// Creates a segmenter that fails on unsupported directives.
    #[must_use]
    pub const fn strict() -> Self {
        Self { strict: true }
    }

    /// Segments `text`, read from `source`.
    ///
    /// # Algorithm
    ///
    /// 1. Lines are scanned in order, keeping their line endings
    /// 2. An opener flushes the pending chunk and starts a new one
    /// 3. Content lines are appended to the pending chunk, if there is one
    /// 4. The pending chunk is flushed at end of input
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`Error::UnsupportedDirective`] for the first
    /// delimiter line that is neither an opener nor a comment.
    pub fn segment(&self, source: &Path, text: &str) -> Result<Segmentation> {
        let mut out = Segmentation::default();
        let mut pending: Option<Chunk> = None;

        for (index, line) in text.split_inclusive('\n').enumerate() {
            let line_no = index + 1;

            match Directive::parse(line) {
                Some(Directive::Open(kind)) => {
                    trace!("line {}: opens {} chunk", line_no, kind);
                    if let Some(done) = pending.replace(Chunk::new(kind, String::new())) {
                        out.chunks.push(done);
                    }
                }
                Some(Directive::Comment) => {
                    trace!("line {}: comment", line_no);
                }
                Some(Directive::Unsupported(_)) if pending.is_none() => {
                    trace!("line {}: preamble", line_no);
                }
                Some(Directive::Unsupported(content)) => {
                    if self.strict {
                        return Err(Error::UnsupportedDirective {
                            path: source.to_path_buf(),
                            line: line_no,
                            directive: content,
                        });
                    }
                    warn!(
                        "{}:{}: skipping unsupported directive <{}>",
                        source.display(),
                        line_no,
                        content
                    );
                    out.skipped.push(SkippedDirective {
                        line: line_no,
                        content,
                    });
                }
                None => {
                    if let Some(chunk) = pending.as_mut() {
                        chunk.text.push_str(line);
                    }
                }
            }
        }

        out.chunks.extend(pending);

        debug!(
            "Segmented {} into {} chunks ({} directives skipped)",
            source.display(),
            out.chunks.len(),
            out.skipped.len()
        );

        Ok(out)
    }
}
