use crate::{
    error::{Error, Result},
    source::SourceKind,
};
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Lists candidate source files of one kind in a directory.
pub(crate) struct Scanner {
    matcher: GlobMatcher,
    kind: SourceKind,
}

impl Scanner {
    /// Creates a scanner for files of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the glob for the kind fails to compile.
    pub(crate) fn new(kind: SourceKind) -> Result<Self> {
        let pattern = format!("*.{}", kind.extension());
        let matcher = Glob::new(&pattern)
            .map_err(|e| Error::config(format!("Invalid glob '{pattern}': {e}")))?
            .compile_matcher();
        Ok(Self { matcher, kind })
    }

    /// Returns the matching files directly inside `dir`, sorted by name.
    ///
    /// Subdirectories are not entered. Entries that cannot be read are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` itself cannot be read.
    pub(crate) fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(Error::selection(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if self.matcher.is_match(entry.file_name()) {
                trace!("Candidate: {}", entry.path().display());
                files.push(entry.into_path());
            }
        }

        debug!(
            "Found {} {} files in {}",
            files.len(),
            self.kind,
            dir.display()
        );
        Ok(files)
    }
}
