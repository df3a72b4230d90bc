//! `deblib-runner` library crate.
//!
//! Argument parsing, task execution and output formatting for the
//! command-line entry point in `main.rs`.

pub mod cli;
pub mod output;

use deblib_core::light_curve::LightCurve;
use deblib_core::params::Params;
use deblib_core::registry::RegistryError;
use deblib_jktebop::process::DiagnosticSink;
use deblib_jktebop::{JktebopConfig, TaskError, TaskRegistry};

/// Error type for a command-line run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Cli(#[from] cli::CliError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Failed to format output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Resolve `task_name` in `registry`, build the task from `config` and run it.
pub async fn run_task(
    registry: &TaskRegistry,
    config: &JktebopConfig,
    task_name: &str,
    params: &Params,
    sink: Option<&mut dyn DiagnosticSink>,
) -> Result<LightCurve, RunnerError> {
    let (name, build) = registry.resolve(task_name)?;
    let task = build(config)?;

    tracing::info!(
        task = name,
        working_dir = %task.working_dir().display(),
        params = params.len(),
        "Running task",
    );

    let model = task
        .generate_model_light_curve_with(deblib_jktebop::task2::DEFAULT_FILE_PREFIX, params, sink)
        .await?;
    tracing::info!(task = name, points = model.len(), "Task complete");
    Ok(model)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use deblib_jktebop::{ModelLightCurveTask, Runner};

    use super::*;

    const ENGINE: &str = "engine.sh";

    fn scripted(config: &JktebopConfig) -> Result<ModelLightCurveTask, TaskError> {
        ModelLightCurveTask::new(config.dir.clone(), Runner::new("sh").with_prefix_args([ENGINE]))
    }

    fn registry() -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        registry.register("task2", scripted).expect("register");
        registry
    }

    fn config(dir: &std::path::Path) -> JktebopConfig {
        JktebopConfig {
            dir: dir.to_path_buf(),
            program: "sh".into(),
        }
    }

    fn params() -> Params {
        cli::parse_args([
            "task2", "sumr=0.3", "k=0.5", "inc=90", "qphot=1", "J=0.5", "L3=0", "LDA=quad",
            "LDB=quad", "LDA1=0.25", "LDB1=0.25", "LDA2=0.23", "LDB2=0.23",
        ])
        .expect("args")
        .params
    }

    #[tokio::test]
    async fn runs_resolved_task() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(ENGINE),
            "set -- $(tail -n 1 \"$1\")\nprintf '0.0 0.5\\n0.5 0.1\\n' > \"$1\"\n",
        )
        .expect("write engine");

        let mut console: Vec<String> = Vec::new();
        let model = run_task(&registry(), &config(dir.path()), "task", &params(), Some(&mut console))
            .await
            .expect("model");
        assert_eq!(model.len(), 2);
        assert!(console.is_empty());
    }

    #[tokio::test]
    async fn unknown_task_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = run_task(&registry(), &config(dir.path()), "task9", &params(), None)
            .await
            .unwrap_err();
        assert_matches!(err, RunnerError::Registry(RegistryError::NotFound(name)) if name == "task9");
    }
}
