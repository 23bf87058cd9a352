use crate::{
    config::{Config, PersistMode},
    error::{Error, Result},
    heading::HeadingRenderer,
    notebook::Notebook,
    segmenter::{Chunk, Segmenter},
    source::{SourceFile, SourceKind},
    store::NotebookStore,
};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::{debug, error, info, instrument, warn};

/// Outcome of converting one source file.
#[derive(Debug, Clone)]
pub struct BuildStats {
    /// Source file
    pub input: PathBuf,

    /// Notebook path (not written in dry run mode)
    pub output: PathBuf,

    /// How the source was read
    pub kind: SourceKind,

    /// Chunks produced from the source
    pub chunks: usize,

    /// Cells in the final notebook
    pub cells: usize,

    /// Raw chunks that did not become cells
    pub skipped_raw: usize,

    /// Unsupported delimiter lines that were skipped
    pub skipped_directives: usize,

    /// Number of times the notebook file was written
    pub writes: usize,
}

/// Statistics for a whole batch.
#[derive(Debug)]
pub struct BatchStats {
    /// Successfully converted files, in input order
    pub files: Vec<BuildStats>,

    /// Errors for files that failed, in input order
    pub failures: Vec<Error>,

    /// Total execution time
    pub duration: Duration,

    /// Whether anything was written
    pub dry_run: bool,
}

impl BatchStats {
    /// Total cells across all produced notebooks.
    #[must_use]
    pub fn total_cells(&self) -> usize {
        self.files.iter().map(|f| f.cells).sum()
    }

    /// Returns true if every file converted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turns recorded failures into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Multiple`] holding every failure if any file failed.
    pub fn into_result(mut self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(Error::multiple(std::mem::take(&mut self.failures)))
        }
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        if self.dry_run {
            println!("║              Dry Run Summary (no writes)              ║");
        } else {
            println!("║               Notebook Build Summary                  ║");
        }
        println!("╠═══════════════════════════════════════════════════════╣");
        for file in &self.files {
            println!(
                "║ {:<40} {:>5} cells ║",
                truncate(&file.output.display().to_string(), 40),
                file.cells
            );
        }
        if !self.files.is_empty() {
            println!("║                                                       ║");
        }
        println!(
            "║ Notebooks:            {:>8}                        ║",
            self.files.len()
        );
        println!(
            "║ Total Cells:          {:>8}                        ║",
            self.total_cells()
        );
        println!(
            "║ Failed:               {:>8}                        ║",
            self.failures.len()
        );
        println!(
            "║ Total Time:           {:>8.2}s                       ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

fn truncate(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - (width - 1)).collect();
    format!("…{tail}")
}

/// Converts source files into notebooks.
pub struct Pipeline {
    config: Config,
    segmenter: Segmenter,
    heading: HeadingRenderer,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The heading template does not parse
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let segmenter = Segmenter::new(&config);
        let heading = HeadingRenderer::new(&config)?;

        Ok(Self {
            config,
            segmenter,
            heading,
        })
    }

    /// Converts every input and returns statistics.
    ///
    /// Files are processed one after another. A failing file is logged and
    /// recorded in [`BatchStats::failures`]; the remaining files still run.
    ///
    /// # Errors
    ///
    /// Returns an error only if the output directory cannot be created.
    #[instrument(skip(self), fields(inputs = self.config.inputs.len()))]
    pub fn run(&self) -> Result<BatchStats> {
        let start_time = Instant::now();

        if let Some(ref dir) = self.config.output_dir {
            if !self.config.dry_run {
                fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
            }
        }

        if self.config.dry_run {
            warn!("Dry run mode enabled - skipping file writes");
        }

        let mut files = Vec::with_capacity(self.config.inputs.len());
        let mut failures = Vec::new();

        for input in &self.config.inputs {
            match self.build_file(input) {
                Ok(stats) => {
                    info!(
                        "✓ {} -> {} ({} cells)",
                        stats.input.display(),
                        stats.output.display(),
                        stats.cells
                    );
                    files.push(stats);
                }
                Err(e) => {
                    error!("✗ {}: {}", input.display(), e);
                    failures.push(e);
                }
            }
        }

        let duration = start_time.elapsed();
        info!(
            "Converted {} of {} files in {:.2}s",
            files.len(),
            self.config.inputs.len(),
            duration.as_secs_f64()
        );

        Ok(BatchStats {
            files,
            failures,
            duration,
            dry_run: self.config.dry_run,
        })
    }

    /// Converts a single source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or segmented, or if the
    /// notebook cannot be written.
    #[instrument(skip(self))]
    pub fn build_file(&self, input: &Path) -> Result<BuildStats> {
        let source = SourceFile::read(input)?;
        let output = source.notebook_path(self.config.output_dir.as_deref());
        let segmentation = source.chunks(&self.segmenter)?;
        let heading = self.heading.render(&output, &source.path)?;

        // Scripts may keep the heading; text sources never do
        let drop_heading = !(source.kind == SourceKind::Script && self.config.keep_heading);

        debug!(
            "{} source {} gave {} chunks",
            source.kind,
            source.path.display(),
            segmentation.chunks.len()
        );

        let plan = BuildPlan {
            heading: &heading,
            chunks: &segmentation.chunks,
            drop_heading,
            emit_raw: self.config.emit_raw_cells,
        };

        let outcome = if self.config.dry_run {
            let (nb, skipped_raw) = plan.assemble()?;
            Outcome {
                cells: nb.len(),
                skipped_raw,
                writes: 0,
            }
        } else {
            let store = NotebookStore::new(&output)
                .backup_existing(self.config.backup_existing)
                .emit_raw_cells(self.config.emit_raw_cells);
            match self.config.persist_mode {
                PersistMode::Once => {
                    let (nb, skipped_raw) = plan.assemble()?;
                    store.create(&nb)?;
                    Outcome {
                        cells: nb.len(),
                        skipped_raw,
                        writes: 1,
                    }
                }
                PersistMode::EveryMutation => plan.replay(&store)?,
            }
        };

        if outcome.skipped_raw > 0 {
            warn!(
                "{}: {} raw chunk(s) were not emitted",
                source.path.display(),
                outcome.skipped_raw
            );
        }

        Ok(BuildStats {
            input: source.path,
            output,
            kind: source.kind,
            chunks: segmentation.chunks.len(),
            cells: outcome.cells,
            skipped_raw: outcome.skipped_raw,
            skipped_directives: segmentation.skipped.len(),
            writes: outcome.writes,
        })
    }
}

struct Outcome {
    cells: usize,
    skipped_raw: usize,
    writes: usize,
}

/// The sequence of builder operations for one notebook: seed the template,
/// retitle cell 0, append every chunk, then optionally drop cell 0.
struct BuildPlan<'a> {
    heading: &'a str,
    chunks: &'a [Chunk],
    drop_heading: bool,
    emit_raw: bool,
}

impl BuildPlan<'_> {
    /// Runs the plan against an in-memory document.
    fn assemble(&self) -> Result<(Notebook, usize)> {
        let mut nb = Notebook::template();
        nb.set_source(0, self.heading)?;

        let mut skipped_raw = 0;
        for chunk in self.chunks {
            if !nb.append_cell(chunk.kind, chunk.text.as_str(), self.emit_raw) {
                skipped_raw += 1;
            }
        }

        if self.drop_heading {
            nb.remove_at(0)?;
        }
        Ok((nb, skipped_raw))
    }

    /// Runs the plan as file round trips, one write per operation.
    fn replay(&self, store: &NotebookStore) -> Result<Outcome> {
        store.initialize()?;
        store.retitle_first_cell(self.heading)?;
        let mut writes = 2;

        let mut skipped_raw = 0;
        for chunk in self.chunks {
            if store.append_cell(chunk.kind, &chunk.text)? {
                writes += 1;
            } else {
                skipped_raw += 1;
            }
        }

        let cells = if self.drop_heading {
            writes += 1;
            store.pop_cell(0)?
        } else {
            store.load()?.len()
        };

        Ok(Outcome {
            cells,
            skipped_raw,
            writes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellKind};
    use assert_fs::prelude::*;
    use serde_json::Value;

    const HELLO_WORLD: &str = "\
Anything written here is ignored because its before the first delimiter.

<markdown>
# Hello World Heading
This is my *hello world* program.
<code>
# hello_world
print(\"hello world\")

< markdown The second python program will do some maths.>
# Maths
This is how to obtain the **square root of 2**

< code >
import math
< comment Remember to include the import math!>
a = 2
print(math.sqrt(a))
< markdown >
### *The End*
<comment This is the end of the hello_world.txt example file.>
";

    fn config_for(paths: &[&Path]) -> crate::config::ConfigBuilder {
        Config::builder().inputs(paths.iter().copied())
    }

    fn load(path: &Path) -> Notebook {
        NotebookStore::new(path).load().unwrap()
    }

    #[test]
    fn test_text_file_end_to_end() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("hello_world.txt");
        input.write_str(HELLO_WORLD).unwrap();

        let pipeline = Pipeline::new(config_for(&[input.path()]).build().unwrap()).unwrap();
        let stats = pipeline.run().unwrap().into_result().unwrap();

        assert_eq!(stats.files.len(), 1);
        assert_eq!(stats.files[0].chunks, 5);
        assert_eq!(stats.files[0].writes, 1);

        let nb = load(temp.child("hello_world.ipynb").path());
        let kinds: Vec<_> = nb.cells.iter().map(Cell::kind).collect();
        assert_eq!(
            kinds,
            [
                CellKind::Markdown,
                CellKind::Code,
                CellKind::Markdown,
                CellKind::Code,
                CellKind::Markdown
            ]
        );
        assert_eq!(nb.cells[3].text(), "import math\na = 2\nprint(math.sqrt(a))\n");
        assert_eq!(nb.cells[4].text(), "### *The End*\n");
        assert!(!nb.has_placeholder());
    }

    #[test]
    fn test_script_file_gives_one_code_cell() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("hi.py");
        input.write_str("print(\"hi\")\n").unwrap();

        let pipeline = Pipeline::new(config_for(&[input.path()]).build().unwrap()).unwrap();
        pipeline.run().unwrap().into_result().unwrap();

        let text = std::fs::read_to_string(temp.child("hi.ipynb").path()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["cells"].as_array().unwrap().len(), 1);
        assert_eq!(value["cells"][0]["cell_type"], "code");
        assert_eq!(value["cells"][0]["source"][0], "print(\"hi\")\n");
    }

    #[test]
    fn test_script_keep_heading() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("calc.py");
        input.write_str("1 + 2\n").unwrap();

        let config = config_for(&[input.path()]).keep_heading(true).build().unwrap();
        Pipeline::new(config).unwrap().run().unwrap();

        let nb = load(temp.child("calc.ipynb").path());
        assert_eq!(nb.cells.len(), 2);
        assert_eq!(
            nb.cells[0].text(),
            "# calc\n\nCreated from the python file: calc.py"
        );
        assert_eq!(nb.cells[1], Cell::code("1 + 2\n"));
    }

    #[test]
    fn test_empty_text_gives_empty_notebook() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("empty.txt");
        input.write_str("").unwrap();

        let config = config_for(&[input.path()]).build().unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.files[0].cells, 0);
        assert!(load(temp.child("empty.ipynb").path()).is_empty());
    }

    #[test]
    fn test_persist_modes_produce_identical_bytes() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("hello_world.txt");
        input.write_str(HELLO_WORLD).unwrap();

        let once_dir = temp.child("once");
        let each_dir = temp.child("each");

        let once = config_for(&[input.path()])
            .output_dir(once_dir.path())
            .build()
            .unwrap();
        Pipeline::new(once).unwrap().run().unwrap();

        let each = config_for(&[input.path()])
            .output_dir(each_dir.path())
            .persist_mode(PersistMode::EveryMutation)
            .build()
            .unwrap();
        let stats = Pipeline::new(each).unwrap().run().unwrap();

        // initialize + retitle + 5 appends + pop
        assert_eq!(stats.files[0].writes, 8);

        let a = std::fs::read(once_dir.child("hello_world.ipynb").path()).unwrap();
        let b = std::fs::read(each_dir.child("hello_world.ipynb").path()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_raw_chunks() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("raw.txt");
        input.write_str("<raw>\nr\n<code>\nc\n").unwrap();

        let config = config_for(&[input.path()]).build().unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();
        assert_eq!(stats.files[0].chunks, 2);
        assert_eq!(stats.files[0].cells, 1);
        assert_eq!(stats.files[0].skipped_raw, 1);

        let config = config_for(&[input.path()]).emit_raw_cells(true).build().unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();
        assert_eq!(stats.files[0].cells, 2);
        assert_eq!(load(temp.child("raw.ipynb").path()).cells[0].kind(), CellKind::Raw);
    }

    #[test]
    fn test_fixed_metadata_identical_across_documents() {
        let temp = assert_fs::TempDir::new().unwrap();
        let a = temp.child("a.txt");
        a.write_str("<markdown>\nA\n").unwrap();
        let b = temp.child("b.py");
        b.write_str("b = 2\n").unwrap();

        let config = config_for(&[a.path(), b.path()]).build().unwrap();
        Pipeline::new(config).unwrap().run().unwrap();

        let na = load(temp.child("a.ipynb").path());
        let nb = load(temp.child("b.ipynb").path());
        assert_eq!(na.metadata, nb.metadata);
        assert_eq!((na.nbformat, na.nbformat_minor), (nb.nbformat, nb.nbformat_minor));
        assert_eq!(na.metadata.kernelspec.name, "python3");
    }

    #[test]
    fn test_failure_is_isolated_per_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let good = temp.child("good.txt");
        good.write_str("<markdown>\nok\n").unwrap();
        let bad = temp.child("bad.txt");
        bad.write_str("<markdown>\nok\n<bogus>\n").unwrap();
        let after = temp.child("after.py");
        after.write_str("x = 1\n").unwrap();

        let config = config_for(&[good.path(), bad.path(), after.path()])
            .strict_directives(true)
            .build()
            .unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.files.len(), 2);
        assert_eq!(stats.failures.len(), 1);
        assert!(temp.child("good.ipynb").exists());
        assert!(!temp.child("bad.ipynb").exists());
        assert!(temp.child("after.ipynb").exists());

        let err = stats.into_result().unwrap_err();
        assert!(matches!(err, Error::Multiple { count: 1, .. }));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("notes.txt");
        input.write_str("<markdown>\n# A\n<code>\nb\n").unwrap();

        let config = config_for(&[input.path()])
            .output_dir(temp.child("out").path())
            .dry_run(true)
            .build()
            .unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.files[0].cells, 2);
        assert_eq!(stats.files[0].writes, 0);
        assert!(!temp.child("out").exists());
    }

    #[test]
    fn test_skipped_directives_counted() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("html.txt");
        input.write_str("<markdown>\n<div>\ntext\n</div>\n").unwrap();

        let config = config_for(&[input.path()]).build().unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.files[0].skipped_directives, 2);
        assert_eq!(load(temp.child("html.ipynb").path()).cells[0].text(), "text\n");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "…ghij");
    }
}
