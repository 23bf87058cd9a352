use anyhow::Context;
use clap::Parser;
use nbweave::{Config, PersistMode, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DELIMITER_GUIDE: &str = "\
NOTES:
  A notebook created from a python file holds the script in one code cell.
  With --keep-heading a markdown cell naming the script comes first.

  A notebook created from a text file gets its cells from the delimiters
  inserted into the text file:
  o Delimiters start with \"<\" and end with \">\".
  o The \"<\" must be the first character on the line.
  o <markdown> and <code> start new cells.
  o <raw> is accepted but only produces a cell with --raw.
  o <comment ...> is a one line comment and is dropped.
  o Other delimiters may carry a note: <code This is my hello_world.py program>
  o A delimiter may be padded with spaces: <   code         >
  o Text after a delimiter becomes the markdown or the code.
  o Lines of text before the first delimiter are ignored.
  o Unknown delimiters are skipped with a warning (rejected with --strict).

EXAMPLE hello_world.txt:

  Anything written here is ignored because it is before the first delimiter.

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
  <comment This is the end of the hello_world.txt example file.>";

#[derive(Parser, Debug)]
#[command(
    name = "nbweave",
    version,
    about = "Create Jupyter notebook ipynb file(s) from python (.py) or text (.txt) file(s)",
    long_about = "Create Jupyter notebook ipynb file(s) from python (.py) or text (.txt) file(s).\n\n\
    If no files are given, runs in a menu driven mode and prompts you to select \
    either a python or a text file from the current directory.\n\n\
    One notebook is created for each file, named after it with an .ipynb extension.\n\n\
    USAGE EXAMPLES:\n  \
      # All python files in the current directory\n  \
      nbweave *.py\n\n  \
      # Python and text files, notebooks into ./notebooks\n  \
      nbweave *.py *.txt --out notebooks\n\n  \
      # Comma separated list\n  \
      nbweave intro.txt,demo.py",
    after_long_help = DELIMITER_GUIDE
)]
struct Cli {
    /// Source files (.txt or .py), space or comma separated
    #[arg(value_name = "FILE", value_delimiter = ',')]
    files: Vec<PathBuf>,

    /// Output directory for notebooks (default: next to each source)
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Fail on unknown delimiters instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Emit <raw> sections as raw cells
    #[arg(long)]
    raw: bool,

    /// Keep the markdown heading cell in notebooks built from python files
    #[arg(long)]
    keep_heading: bool,

    /// Tera template for the heading cell ({{ name }}, {{ source }})
    #[arg(long, value_name = "TEMPLATE")]
    heading_template: Option<String>,

    /// Rewrite the notebook after every cell instead of once per file
    #[arg(long)]
    persist_each_step: bool,

    /// Dry run (don't write files)
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing notebooks without keeping a backup
    #[arg(long)]
    no_backup: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let files = if cli.files.is_empty() {
        let cwd = std::env::current_dir().context("Cannot determine current directory")?;
        let picked = nbweave::prompt::pick_source(
            &cwd,
            &mut std::io::stdin().lock(),
            &mut std::io::stdout(),
        )?;
        println!("File to be used to create ipynb file is: {}", picked.display());
        vec![picked]
    } else {
        cli.files
    };

    let mut builder = Config::builder()
        .inputs(files)
        .strict_directives(cli.strict)
        .emit_raw_cells(cli.raw)
        .keep_heading(cli.keep_heading)
        .dry_run(cli.dry_run)
        .backup_existing(!cli.no_backup);

    if let Some(out) = cli.out {
        builder = builder.output_dir(out);
    }

    if let Some(template) = cli.heading_template {
        builder = builder.heading_template(template);
    }

    if cli.persist_each_step {
        builder = builder.persist_mode(PersistMode::EveryMutation);
    }

    let config = builder.build()?;

    let stats = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Pipeline execution failed")?;

    stats.print_summary();

    stats.into_result().map_err(describe_failures)?;
    Ok(())
}

/// Expands a batch error into one line per failed file.
fn describe_failures(err: nbweave::Error) -> anyhow::Error {
    match err {
        nbweave::Error::Multiple { count, errors } => {
            let lines: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
            anyhow::anyhow!("{count} file(s) failed:\n{}", lines.join("\n"))
        }
        other => other.into(),
    }
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("nbweave=info"),
        1 => EnvFilter::new("nbweave=debug"),
        _ => EnvFilter::new("nbweave=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
