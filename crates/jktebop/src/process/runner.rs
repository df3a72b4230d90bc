//! Launching and running the engine.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::mpsc;

use super::drain::{collect, read_lines, DiagnosticBuffer, DiagnosticSink};
use super::handle::EngineProcess;
use super::outcome::{classify, FailureCause, Outcome};
use super::result_lines::{Cleanup, ResultLines};
use crate::config::JktebopConfig;

/// Error type for engine invocations.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("JKTEBOP input file not found: {}", .0.display())]
    InFileNotFound(PathBuf),

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to run `{command}` ({cause}), output:\n{output}")]
    Failed {
        exit_code: i32,
        command: String,
        output: String,
        cause: FailureCause,
    },

    #[error("Invalid cleanup pattern '{pattern}': {source}")]
    InvalidCleanupPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RunError {
    /// Captured console text of a failed run.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Failed { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            Self::Failed { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Per-run behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Glob matched against file names in the in-file's and out-file's
    /// directories; matches are removed after a successful run.
    pub cleanup_pattern: Option<String>,
    /// Raise a notification for console lines containing "warning".
    pub warn_on_warning_text: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            cleanup_pattern: None,
            warn_on_warning_text: true,
        }
    }
}

impl RunOptions {
    pub fn with_cleanup_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.cleanup_pattern = Some(pattern.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Starts the engine against input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runner {
    program: String,
    prefix_args: Vec<String>,
}

impl Runner {
    /// A runner for `program`. A relative path containing `/` is resolved
    /// against the in-file's directory; a bare name is looked up on `PATH`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    pub fn from_config(config: &JktebopConfig) -> Self {
        Self::new(config.program.clone())
    }

    /// Arguments placed before the in-file name, e.g. an interpreter script.
    pub fn with_prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Spawn the engine on `in_file`.
    ///
    /// The engine receives the in-file's base name as its argument and runs
    /// in the in-file's directory, with stdout and stderr sharing one pipe.
    pub fn launch(&self, in_file: &Path) -> Result<EngineProcess, RunError> {
        if !in_file.is_file() {
            return Err(RunError::InFileNotFound(in_file.to_path_buf()));
        }
        let file_name = in_file
            .file_name()
            .ok_or_else(|| RunError::InFileNotFound(in_file.to_path_buf()))?;
        let working_dir = std::path::absolute(parent_dir(in_file))?;
        let program = self.resolve_program(&working_dir);

        let (reader, writer) = io::pipe()?;
        let stderr = writer.try_clone()?;

        let mut cmd = Command::new(&program);
        cmd.args(&self.prefix_args)
            .arg(file_name)
            .current_dir(&working_dir)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr)
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| RunError::Spawn {
            program: program.display().to_string(),
            source,
        })?;
        // The command still owns our copies of the write end; end-of-stream
        // only arrives once they are closed.
        drop(cmd);

        let mut command_line = vec![program.display().to_string()];
        command_line.extend(self.prefix_args.iter().cloned());
        command_line.push(file_name.to_string_lossy().into_owned());

        Ok(EngineProcess::new(child, reader, command_line, working_dir))
    }

    /// Run the engine on `in_file` to completion.
    ///
    /// Console output is drained concurrently with the wait, forwarded to
    /// `sink` and kept for error reporting. On success the lines of
    /// `out_file` are returned lazily; with a cleanup pattern, matching
    /// working files are removed once those lines are exhausted (at once when
    /// there is no out-file). Nothing is removed after a failure.
    pub async fn run(
        &self,
        in_file: &Path,
        out_file: Option<&Path>,
        options: &RunOptions,
        sink: Option<&mut dyn DiagnosticSink>,
    ) -> Result<ResultLines, RunError> {
        let pattern = options
            .cleanup_pattern
            .as_deref()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|source| RunError::InvalidCleanupPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;

        let mut process = self.launch(in_file)?;
        tracing::info!(
            program = %self.program,
            in_file = %in_file.display(),
            pid = ?process.id(),
            "Started JKTEBOP"
        );

        let output = process
            .take_output()
            .ok_or_else(|| io::Error::other("engine output already taken"))?;
        let (tx, rx) = mpsc::unbounded_channel();
        let drain = tokio::task::spawn_blocking(move || read_lines(output, tx));

        let mut buffer = DiagnosticBuffer::default();
        let (status, warnings) = tokio::join!(
            process.wait(),
            collect(rx, &mut buffer, sink, options.warn_on_warning_text),
        );
        drain.await.map_err(io::Error::other)??;
        let exit_code = status?;

        let duration_ms = process.elapsed().as_millis() as u64;
        let output = buffer.text();
        let missing_out_file = out_file.filter(|path| !path.exists());

        if let Outcome::Failed(cause) = classify(exit_code, &output, missing_out_file) {
            tracing::warn!(
                in_file = %in_file.display(),
                exit_code,
                duration_ms,
                cause = %cause,
                "JKTEBOP run failed"
            );
            return Err(RunError::Failed {
                exit_code,
                command: process.command_text(),
                output,
                cause,
            });
        }
        tracing::info!(
            in_file = %in_file.display(),
            exit_code,
            duration_ms,
            lines = buffer.len(),
            "JKTEBOP run succeeded"
        );

        let cleanup = match pattern {
            Some(pattern) => Some(Cleanup::Matching {
                dirs: cleanup_dirs(in_file, out_file)?,
                pattern,
            }),
            None => None,
        };

        match out_file {
            Some(out_file) => {
                let lines = ResultLines::open(out_file, warnings)?;
                Ok(match cleanup {
                    Some(cleanup) => lines.with_cleanup(cleanup),
                    None => lines,
                })
            }
            None => {
                if let Some(cleanup) = cleanup {
                    cleanup.execute()?;
                }
                Ok(ResultLines::empty(warnings))
            }
        }
    }

    fn resolve_program(&self, working_dir: &Path) -> PathBuf {
        let program = Path::new(&self.program);
        if program.is_relative() && self.program.contains('/') {
            working_dir.join(program)
        } else {
            program.to_path_buf()
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Distinct absolute parents of the in-file and out-file.
fn cleanup_dirs(in_file: &Path, out_file: Option<&Path>) -> io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for file in std::iter::once(in_file).chain(out_file) {
        let dir = std::path::absolute(parent_dir(file))?;
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    Ok(dirs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
