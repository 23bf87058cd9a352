//! # nbweave
//!
//! Turns delimited text files and Python scripts into Jupyter notebooks.
//!
//! ## Features
//!
//! - `<markdown>`, `<code>` and `<raw>` delimiter lines split text into cells
//! - `<comment ...>` lines are dropped; anything before the first delimiter
//!   is ignored
//! - Python scripts become a single code cell
//! - Atomic notebook writes with automatic backups
//!
//! ## Quick Start
//!
//! ```no_run
//! use nbweave::{Config, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .input("hello_world.txt")
//!     .input("script.py")
//!     .build()?;
//!
//! let stats = Pipeline::new(config)?.run()?;
//! stats.print_summary();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Segmenter**: splits text on delimiter lines into typed chunks
//! 2. **Notebook**: in-memory document built from a fixed template
//! 3. **Store**: file-backed load, mutate and store operations
//! 4. **Pipeline**: runs each input through the above, isolating failures

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod cell;
mod config;
mod error;
mod heading;
mod notebook;
mod pipeline;
mod scanner;
mod segmenter;
mod source;
mod store;

pub mod prompt;

pub use cell::{Cell, CellKind};
pub use config::{Config, ConfigBuilder, PersistMode};
pub use error::{Error, Result};
pub use heading::DEFAULT_HEADING_TEMPLATE;
pub use notebook::{
    CodemirrorMode, KernelSpec, LanguageInfo, Notebook, NotebookMetadata, NBFORMAT,
    NBFORMAT_MINOR, PLACEHOLDER_SOURCE, TEMPLATE,
};
pub use pipeline::{BatchStats, BuildStats, Pipeline};
pub use segmenter::{Chunk, Directive, Segmentation, Segmenter, SkippedDirective};
pub use source::{notebook_path, SourceFile, SourceKind, NOTEBOOK_EXTENSION};
pub use store::NotebookStore;

/// Converts every configured input and fails if any file failed.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The output directory cannot be created
/// - Any input could not be converted ([`Error::Multiple`])
///
/// # Examples
///
/// ```no_run
/// use nbweave::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .input("notes.txt")
///     .build()?;
///
/// run(config)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<BatchStats> {
    Pipeline::new(config)?.run()?.into_result()
}
