//! Task 2: model light curves for a set of system parameters.
//!
//! Each call writes a uniquely named `task2-*.in` file into the working
//! directory, points the engine at a matching `.out` file and parses the
//! resulting two-column table. Every file sharing the generated stem is
//! removed after a successful run; failures leave them for inspection.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use deblib_core::light_curve::LightCurve;
use deblib_core::params::Params;
use deblib_core::template::Template;

use crate::config::JktebopConfig;
use crate::process::{remove_if_present, Cleanup, DiagnosticSink, RunOptions, Runner};
use crate::task::{Task, TaskError, KNOWN_ENGINE_EXTENSIONS};

/// Input template bundled with the crate.
pub const TASK2_TEMPLATE: &str = include_str!("../templates/task2.in.templateex");

/// Template parameter naming the engine's output file. Always set at run time.
pub const OUT_FILENAME_PARAM: &str = "out_filename";

/// Prefix for generated working file names.
pub const DEFAULT_FILE_PREFIX: &str = "task2-";

/// Generates model light curves with the engine's task 2.
#[derive(Debug, Clone)]
pub struct ModelLightCurveTask {
    task: Task,
}

impl ModelLightCurveTask {
    pub fn new(working_dir: impl Into<PathBuf>, runner: Runner) -> Result<Self, TaskError> {
        let template = Template::new(TASK2_TEMPLATE)?;
        Ok(Self {
            task: Task::new(working_dir, template, runner),
        })
    }

    /// Task working in the configured engine directory.
    pub fn from_config(config: &JktebopConfig) -> Result<Self, TaskError> {
        Self::new(config.dir.clone(), Runner::from_config(config))
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn working_dir(&self) -> &Path {
        self.task.working_dir()
    }

    /// Template parameters with their defaults (`None` when required).
    /// `out_filename` is listed but always generated.
    pub fn default_params(&self) -> Vec<(String, Option<String>)> {
        self.task.default_params()
    }

    /// Parameters a caller has to supply.
    pub fn required_params(&self) -> Vec<&str> {
        self.task
            .required_params()
            .into_iter()
            .filter(|name| *name != OUT_FILENAME_PARAM)
            .collect()
    }

    /// Generate a model light curve using [`DEFAULT_FILE_PREFIX`].
    pub async fn generate_model_light_curve(&self, params: &Params) -> Result<LightCurve, TaskError> {
        self.generate_model_light_curve_with(DEFAULT_FILE_PREFIX, params, None)
            .await
    }

    /// Generate a model light curve, prefixing working files with
    /// `file_prefix` and forwarding engine output to `sink`.
    ///
    /// Any `out_filename` in `params` is replaced by the generated name.
    pub async fn generate_model_light_curve_with(
        &self,
        file_prefix: &str,
        params: &Params,
        sink: Option<&mut dyn DiagnosticSink>,
    ) -> Result<LightCurve, TaskError> {
        let in_file = tempfile::Builder::new()
            .prefix(file_prefix)
            .suffix(".in")
            .tempfile_in(self.working_dir())?
            .into_temp_path()
            .keep()
            .map_err(|e| e.error)?;

        self.run_in_file(&in_file, params, sink).await
    }

    /// Render `in_file`, run the engine on it and parse `{stem}.out`.
    ///
    /// Sibling working files left over under the same stem are removed
    /// before the engine starts, so a stale table can never pass for output.
    async fn run_in_file(
        &self,
        in_file: &Path,
        params: &Params,
        sink: Option<&mut dyn DiagnosticSink>,
    ) -> Result<LightCurve, TaskError> {
        let Some(stem) = in_file.file_stem().and_then(OsStr::to_str).map(str::to_string) else {
            remove_if_present(in_file)?;
            return Err(TaskError::InvalidStem(in_file.display().to_string()));
        };
        let out_file = in_file.with_file_name(format!("{stem}.out"));

        let mut params = params.clone();
        params.insert(OUT_FILENAME_PARAM, format!("{stem}.out"));
        if let Err(e) = self.task.write_in_file(in_file, &params) {
            remove_if_present(in_file)?;
            return Err(e);
        }
        tracing::debug!(in_file = %in_file.display(), "Wrote task 2 input file");

        let stale: Vec<PathBuf> = KNOWN_ENGINE_EXTENSIONS
            .iter()
            .filter(|ext| **ext != "in")
            .map(|ext| in_file.with_file_name(format!("{stem}.{ext}")))
            .collect();
        Cleanup::Files(stale).execute()?;

        let options = RunOptions {
            cleanup_pattern: Some(format!("{}.*", glob::Pattern::escape(&stem))),
            warn_on_warning_text: true,
        };
        let lines = self
            .task
            .runner()
            .run(in_file, Some(&out_file), &options, sink)
            .await?;

        let lines = lines.collect::<io::Result<Vec<String>>>()?;
        Ok(LightCurve::parse_lines(lines)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
