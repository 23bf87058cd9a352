//! Interactive prompts used when no files are named on the command line.
//!
//! Every function takes its reader and writer explicitly so the binary can
//! pass stdin/stdout and tests can pass in-memory buffers.

use crate::{
    error::{Error, Result},
    scanner::Scanner,
    source::SourceKind,
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const YES: [char; 3] = ['y', 't', '1'];
const NO: [char; 3] = ['n', 'f', '0'];

/// Asks a yes/no question. An empty answer picks `default`.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or written, or if
/// input ends before an answer is given.
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: bool,
) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[N/y]" };
    let answer = ask(input, output, &format!("{question} {hint}: "))?;

    let Some(first) = answer.chars().next().map(|c| c.to_ascii_lowercase()) else {
        return Ok(default);
    };

    Ok(if default {
        YES.contains(&first)
    } else {
        !NO.contains(&first)
    })
}

/// Shows a numbered menu and returns the 0-based index of the chosen item.
///
/// `default` is the 1-based item picked on an empty answer. Invalid answers
/// print a hint and ask again. Returns `None` for an empty menu.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or written, or if
/// input ends before a valid choice is made.
pub fn select<R: BufRead, W: Write, T: std::fmt::Display>(
    input: &mut R,
    output: &mut W,
    items: &[T],
    prompt: &str,
    default: usize,
) -> Result<Option<usize>> {
    if items.is_empty() {
        return Ok(None);
    }

    writeln!(output).map_err(terminal_error)?;
    for (index, item) in items.iter().enumerate() {
        writeln!(output, "{:>3}. {}", index + 1, item).map_err(terminal_error)?;
    }

    let question = format!("\n{prompt} [{default}]: ");
    loop {
        let answer = ask(input, output, &question)?;
        let choice = if answer.is_empty() {
            Ok(default)
        } else {
            answer.parse::<usize>()
        };

        let written = match choice {
            Ok(n) if (1..=items.len()).contains(&n) => return Ok(Some(n - 1)),
            Ok(_) => writeln!(
                output,
                "Invalid.  Requires a value between 1 and {}",
                items.len()
            ),
            Err(_) => writeln!(
                output,
                "Value Error. Requires a value between 1 and {}",
                items.len()
            ),
        };
        written.map_err(terminal_error)?;
    }
}

/// Walks the user through choosing one source file in `dir`.
///
/// First asks whether a python file should be converted (default yes,
/// otherwise a text file), then offers a menu of matching files.
///
/// # Errors
///
/// Returns [`Error::Selection`] if `dir` holds no file of the chosen kind,
/// and propagates terminal errors.
pub fn pick_source<R: BufRead, W: Write>(
    dir: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<PathBuf> {
    let script = confirm(
        input,
        output,
        "\nMove the contents of a python file to Jupyter notebook?",
        true,
    )?;
    let kind = if script {
        SourceKind::Script
    } else {
        SourceKind::Text
    };

    writeln!(
        output,
        "\nRead a {label} file and create an ipynb file.\n\
         {title} files (.{ext}) found in {dir}:",
        label = kind.label(),
        title = capitalize(kind.label()),
        ext = kind.extension(),
        dir = dir.display()
    )
    .map_err(terminal_error)?;

    let files = Scanner::new(kind)?.list(dir)?;
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap_or(p.as_os_str()).to_string_lossy())
        .collect();

    let index = select(
        input,
        output,
        &names,
        "Select the file for creating the ipynb file",
        1,
    )?
    .ok_or_else(|| {
        Error::selection(format!(
            "No files with extension of .{} were found. Exiting",
            kind.extension()
        ))
    })?;

    Ok(files[index].clone())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

/// Prints `question` and reads one trimmed line.
fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{question}").map_err(terminal_error)?;
    output.flush().map_err(terminal_error)?;

    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(terminal_error)?;
    if read == 0 {
        return Err(Error::selection("Input ended before a choice was made"));
    }
    Ok(line.trim().to_string())
}

fn terminal_error(e: std::io::Error) -> Error {
    Error::io("<terminal>", e)
}
