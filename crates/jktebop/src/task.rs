//! Template-driven engine tasks.
//!
//! A [`Task`] owns a working directory and the input-file template for one
//! engine task. Running it renders `{stem}.in`, invokes the engine and hands
//! back the lines of the chosen result file. Working files sharing the stem
//! are cleared before the run and, on success, again once the result has
//! been read.

use std::io;
use std::path::{Path, PathBuf};

use deblib_core::error::TemplateError;
use deblib_core::light_curve::LightCurveError;
use deblib_core::params::Params;
use deblib_core::template::Template;

use crate::process::{Cleanup, DiagnosticSink, ResultLines, RunError, RunOptions, Runner};

/// File extensions the engine reads or writes for a given stem.
pub const KNOWN_ENGINE_EXTENSIONS: &[&str] = &["in", "par", "out", "fit"];

/// Error type for task operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("Failed to parse model light curve: {0}")]
    LightCurve(#[from] LightCurveError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid working file stem '{0}'")]
    InvalidStem(String),
}

/// Per-run task behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRunOptions {
    /// Remove the stem's working files after a successful run.
    pub cleanup: bool,
    /// Raise a notification for console lines containing "warning".
    pub warn_on_warning_text: bool,
}

impl Default for TaskRunOptions {
    fn default() -> Self {
        Self {
            cleanup: true,
            warn_on_warning_text: true,
        }
    }
}

/// One engine task bound to a working directory and input template.
#[derive(Debug, Clone)]
pub struct Task {
    working_dir: PathBuf,
    template: Template,
    runner: Runner,
}

impl Task {
    pub fn new(working_dir: impl Into<PathBuf>, template: Template, runner: Runner) -> Self {
        Self {
            working_dir: working_dir.into(),
            template,
            runner,
        }
    }

    /// Directory holding this task's input and output files.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Template parameters with their defaults; `None` marks a parameter the
    /// caller must supply.
    pub fn default_params(&self) -> Vec<(String, Option<String>)> {
        self.template.identifiers_and_defaults()
    }

    pub fn required_params(&self) -> Vec<&str> {
        self.template.required_identifiers()
    }

    /// Render the input document. Every parameter without a default must be
    /// supplied; extra entries are ignored.
    pub fn render(&self, params: &Params) -> Result<String, TaskError> {
        Ok(self.template.substitute(params)?)
    }

    /// (Over)write an input file. Nothing is written when rendering fails.
    pub fn write_in_file(&self, path: &Path, params: &Params) -> Result<(), TaskError> {
        let text = self.render(params)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Working files for `stem`: every known engine extension plus the
    /// result extension.
    pub fn working_files(&self, stem: &str, result_extension: Option<&str>) -> Vec<PathBuf> {
        let mut extensions: Vec<&str> = KNOWN_ENGINE_EXTENSIONS.to_vec();
        if let Some(ext) = result_extension.filter(|ext| !extensions.contains(ext)) {
            extensions.push(ext);
        }
        extensions
            .into_iter()
            .map(|ext| self.working_dir.join(format!("{stem}.{ext}")))
            .collect()
    }

    /// Render `{stem}.in`, run the engine and return the lines of
    /// `{stem}.{result_extension}`.
    ///
    /// Stale working files for the stem are removed first, so a leftover
    /// result file can never pass for fresh output. Stems must be unique
    /// among concurrent runs in the same directory.
    pub async fn run(
        &self,
        params: &Params,
        stem: &str,
        result_extension: Option<&str>,
        options: &TaskRunOptions,
        sink: Option<&mut dyn DiagnosticSink>,
    ) -> Result<ResultLines, TaskError> {
        validate_stem(stem)?;

        let files = self.working_files(stem, result_extension);
        Cleanup::Files(files.clone()).execute()?;

        let in_file = self.working_dir.join(format!("{stem}.in"));
        self.write_in_file(&in_file, params)?;
        let out_file = result_extension.map(|ext| self.working_dir.join(format!("{stem}.{ext}")));

        let run_options = RunOptions {
            cleanup_pattern: None,
            warn_on_warning_text: options.warn_on_warning_text,
        };
        let lines = self
            .runner
            .run(&in_file, out_file.as_deref(), &run_options, sink)
            .await?;

        if !options.cleanup {
            return Ok(lines);
        }
        let mut lines = lines.with_cleanup(Cleanup::Files(files));
        if out_file.is_none() {
            lines.finish()?;
        }
        Ok(lines)
    }
}

fn validate_stem(stem: &str) -> Result<(), TaskError> {
    let valid = !stem.is_empty()
        && stem != "."
        && stem != ".."
        && !stem.contains(['/', std::path::MAIN_SEPARATOR]);
    if valid {
        Ok(())
    } else {
        Err(TaskError::InvalidStem(stem.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
