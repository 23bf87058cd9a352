use crate::error::{Error, Result};
use crate::heading::HeadingRenderer;
use crate::source::{notebook_path, unsupported_extension, SourceKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// When the builder writes the notebook to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistMode {
    /// Build the whole document in memory and write it once
    #[default]
    Once,
    /// Load, mutate and store the file for every single operation
    EveryMutation,
}

/// Configuration for a conversion batch.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Source files to convert, in processing order
    pub inputs: Vec<PathBuf>,

    /// Directory for produced notebooks (defaults to each source's directory)
    pub output_dir: Option<PathBuf>,

    /// When notebooks are written
    pub persist_mode: PersistMode,

    /// Fail on unsupported directives instead of skipping them
    pub strict_directives: bool,

    /// Turn `<raw>` chunks into raw cells instead of dropping them
    pub emit_raw_cells: bool,

    /// Keep the heading cell in notebooks built from scripts
    pub keep_heading: bool,

    /// Tera template for the heading cell
    pub heading_template: Option<String>,

    /// Dry run mode (no file writes)
    pub dry_run: bool,

    /// Create backups of existing notebooks
    pub backup_existing: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nbweave::Config;
    ///
    /// let config = Config::builder()
    ///     .input("hello_world.txt")
    ///     .output_dir("notebooks")
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No inputs are given
    /// - An input does not exist or has an unsupported extension
    /// - Two inputs would produce the same notebook
    /// - The output path exists but is not a directory
    /// - The heading template does not parse or render
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(Error::selection("No input files were given"));
        }

        // Extensions first, so a bad name is reported before any missing file
        for input in &self.inputs {
            if SourceKind::from_path(input).is_none() {
                return Err(unsupported_extension(input));
            }
        }

        for input in &self.inputs {
            if !input.is_file() {
                let dir = input
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map_or_else(|| ".".to_string(), |p| p.display().to_string());
                return Err(Error::selection(format!(
                    "{} not in directory {}.",
                    input.display(),
                    dir
                )));
            }
        }

        let mut outputs: HashMap<PathBuf, &PathBuf> = HashMap::new();
        for input in &self.inputs {
            let output = notebook_path(input, self.output_dir.as_deref());
            if let Some(first) = outputs.insert(output.clone(), input) {
                return Err(Error::selection(format!(
                    "{} and {} would both be written to {}",
                    first.display(),
                    input.display(),
                    output.display()
                )));
            }
        }

        if let Some(ref dir) = self.output_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(Error::config(format!(
                    "Output path is not a directory: {}",
                    dir.display()
                )));
            }
        }

        // Unknown variables only show up when rendering
        if let Some(ref template) = self.heading_template {
            HeadingRenderer::from_template(template)?
                .render(Path::new("notebook.ipynb"), Path::new("notebook.py"))?;
        }

        let all_text = self
            .inputs
            .iter()
            .all(|p| SourceKind::from_path(p) == Some(SourceKind::Text));
        if self.keep_heading && all_text {
            tracing::warn!("keep_heading only affects python sources; all inputs are text files");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output_dir: None,
            persist_mode: PersistMode::Once,
            strict_directives: false,
            emit_raw_cells: false,
            keep_heading: false,
            heading_template: None,
            dry_run: false,
            backup_existing: true,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    inputs: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    persist_mode: Option<PersistMode>,
    strict_directives: bool,
    emit_raw_cells: bool,
    keep_heading: bool,
    heading_template: Option<String>,
    dry_run: bool,
    backup_existing: Option<bool>,
}

impl ConfigBuilder {
    /// Adds one source file.
    #[must_use]
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    /// Adds several source files.
    #[must_use]
    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Sets the output directory for produced notebooks.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets when notebooks are written.
    #[must_use]
    pub fn persist_mode(mut self, mode: PersistMode) -> Self {
        self.persist_mode = Some(mode);
        self
    }

    /// Fails on unsupported directives instead of skipping them.
    #[must_use]
    pub fn strict_directives(mut self, enabled: bool) -> Self {
        self.strict_directives = enabled;
        self
    }

    /// Emits `<raw>` chunks as raw cells.
    #[must_use]
    pub fn emit_raw_cells(mut self, enabled: bool) -> Self {
        self.emit_raw_cells = enabled;
        self
    }

    /// Keeps the heading cell for notebooks built from scripts.
    #[must_use]
    pub fn keep_heading(mut self, enabled: bool) -> Self {
        self.keep_heading = enabled;
        self
    }

    /// Sets the Tera template for the heading cell.
    ///
    /// The template sees `name` (the notebook file stem) and `source`
    /// (the input file name).
    #[must_use]
    pub fn heading_template(mut self, template: impl Into<String>) -> Self {
        self.heading_template = Some(template.into());
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enables or disables backup creation.
    #[must_use]
    pub fn backup_existing(mut self, enabled: bool) -> Self {
        self.backup_existing = Some(enabled);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            inputs: self.inputs,
            output_dir: self.output_dir,
            persist_mode: self.persist_mode.unwrap_or_default(),
            strict_directives: self.strict_directives,
            emit_raw_cells: self.emit_raw_cells,
            keep_heading: self.keep_heading,
            heading_template: self.heading_template,
            dry_run: self.dry_run,
            backup_existing: self.backup_existing.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
