use crate::{config::Config, error::Result};
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

/// Heading written into cell 0 before the cells are appended.
pub const DEFAULT_HEADING_TEMPLATE: &str =
    "# {{ name }}\n\nCreated from the python file: {{ name }}.py";

const TEMPLATE_NAME: &str = "heading";

#[derive(Serialize)]
struct HeadingContext<'a> {
    /// Notebook file stem
    name: &'a str,
    /// Input file name
    source: &'a str,
}

/// Renders the heading text for a notebook's first cell.
pub(crate) struct HeadingRenderer {
    tera: Tera,
}

impl HeadingRenderer {
    /// Creates a renderer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured template does not parse.
    pub(crate) fn new(config: &Config) -> Result<Self> {
        Self::from_template(
            config
                .heading_template
                .as_deref()
                .unwrap_or(DEFAULT_HEADING_TEMPLATE),
        )
    }

    /// Creates a renderer from raw template text.
    ///
    /// # Errors
    ///
    /// Returns an error if `template` is not valid Tera syntax.
    pub(crate) fn from_template(template: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, template)?;
        Ok(Self { tera })
    }

    /// Renders the heading for a notebook written to `output` from `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails, e.g. the template references
    /// an unknown variable.
    pub(crate) fn render(&self, output: &Path, input: &Path) -> Result<String> {
        let name = file_part(output.file_stem());
        let source = file_part(input.file_name());
        let ctx = Context::from_serialize(HeadingContext {
            name: &name,
            source: &source,
        })?;
        Ok(self.tera.render(TEMPLATE_NAME, &ctx)?)
    }
}

fn file_part(part: Option<&std::ffi::OsStr>) -> String {
    part.map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}
