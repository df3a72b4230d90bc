//! Lazy access to the engine's result file, with deferred cleanup.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Working files to remove once a successful run's result has been read.
#[derive(Debug, Clone)]
pub enum Cleanup {
    /// Every regular file in `dirs` whose name matches `pattern`.
    Matching {
        dirs: Vec<PathBuf>,
        pattern: glob::Pattern,
    },
    /// Exactly these files; missing ones are skipped.
    Files(Vec<PathBuf>),
}

impl Cleanup {
    /// Remove the files, returning how many were deleted.
    pub fn execute(&self) -> io::Result<usize> {
        let mut removed = 0;
        match self {
            Self::Matching { dirs, pattern } => {
                for dir in dirs {
                    for entry in std::fs::read_dir(dir)? {
                        let entry = entry?;
                        if !entry.file_type()?.is_file() {
                            continue;
                        }
                        let name = entry.file_name();
                        let matched = name.to_str().is_some_and(|name| pattern.matches(name));
                        if matched && remove_if_present(&entry.path())? {
                            removed += 1;
                        }
                    }
                }
            }
            Self::Files(paths) => {
                for path in paths {
                    if remove_if_present(path)? {
                        removed += 1;
                    }
                }
            }
        }
        Ok(removed)
    }
}

/// Remove `path`, treating an already-missing file as nothing to do.
pub(crate) fn remove_if_present(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed working file");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// ResultLines
// ---------------------------------------------------------------------------

/// Single-pass iterator over the lines of a result file.
///
/// Lines are yielded without their terminator. Attached cleanups run once
/// the iterator reaches end-of-file; a cleanup failure is yielded as a final
/// error item. A read error discards pending cleanups, and so does dropping
/// the iterator before it is exhausted.
#[derive(Debug)]
pub struct ResultLines {
    path: Option<PathBuf>,
    reader: Option<BufReader<File>>,
    cleanups: Vec<Cleanup>,
    warnings: Vec<String>,
}

impl ResultLines {
    pub(crate) fn open(path: &Path, warnings: Vec<String>) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            reader: Some(BufReader::new(file)),
            cleanups: Vec::new(),
            warnings,
        })
    }

    /// No result file: yields nothing.
    pub(crate) fn empty(warnings: Vec<String>) -> Self {
        Self {
            path: None,
            reader: None,
            cleanups: Vec::new(),
            warnings,
        }
    }

    /// Attach another cleanup to run after exhaustion.
    pub fn with_cleanup(mut self, cleanup: Cleanup) -> Self {
        self.cleanups.push(cleanup);
        self
    }

    /// The result file being read, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Console lines flagged as warnings during the run.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Discard the remaining lines and run the pending cleanups.
    pub fn finish(&mut self) -> io::Result<()> {
        for item in self.by_ref() {
            item?;
        }
        Ok(())
    }

    fn run_cleanups(&mut self) -> io::Result<()> {
        let mut first_error = None;
        for cleanup in std::mem::take(&mut self.cleanups) {
            if let Err(e) = cleanup.execute() {
                tracing::warn!(error = %e, "Failed to clean up working files");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Iterator for ResultLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(reader) = self.reader.as_mut() {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => self.reader = None,
                Ok(_) => {
                    while line.ends_with(['\n', '\r']) {
                        line.pop();
                    }
                    return Some(Ok(line));
                }
                Err(e) => {
                    self.reader = None;
                    self.cleanups.clear();
                    return Some(Err(e));
                }
            }
        }
        self.run_cleanups().err().map(Err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
