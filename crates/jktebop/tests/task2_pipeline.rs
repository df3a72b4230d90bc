//! End-to-end runs of the task-2 pipeline against a scripted engine.

use std::path::Path;
use std::time::Duration;

use assert_matches::assert_matches;
use deblib_core::params::Params;
use deblib_jktebop::process::FailureCause;
use deblib_jktebop::{JktebopConfig, ModelLightCurveTask, RunError, Runner, TaskError};

const ENGINE: &str = "fake_jktebop.sh";

/// Mimics task 2: echoes a banner and writes a sampled model to the output
/// file named on the input's last line.
const FAKE_TASK2: &str = r##"#!/bin/sh
echo "JKTEBOP  v43 (fake)   reading $1"
set -- $(tail -n 1 "$1")
{
  echo "# PHASE        MAGNITUDE"
  i=0
  while [ "$i" -le 1000 ]; do
    echo "0.$(printf '%04d' "$i")  0.1"
    i=$((i + 10))
  done
} > "$1"
"##;

fn engine_dir(script: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join(ENGINE), script).expect("write engine");
    dir
}

fn task(dir: &Path) -> ModelLightCurveTask {
    let config = JktebopConfig::from_lookup(|key| match key {
        "JKTEBOP_DIR" => Some(dir.display().to_string()),
        "JKTEBOP_PROGRAM" => Some("sh".into()),
        _ => None,
    });
    let runner = Runner::from_config(&config).with_prefix_args([ENGINE]);
    ModelLightCurveTask::new(config.dir, runner).expect("task")
}

fn params() -> Params {
    [
        ("sumr", "0.3"),
        ("k", "0.5"),
        ("inc", "90"),
        ("qphot", "1"),
        ("J", "0.5"),
        ("L3", "0"),
        ("LDA", "quad"),
        ("LDB", "quad"),
        ("LDA1", "0.25"),
        ("LDB1", "0.25"),
        ("LDA2", "0.23"),
        ("LDB2", "0.23"),
    ]
    .into_iter()
    .collect()
}

fn leftover_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .expect("read dir")
        .filter(|e| e.as_ref().expect("entry").file_name() != ENGINE)
        .count()
}

#[tokio::test]
async fn model_light_curve_round_trip() {
    let dir = engine_dir(FAKE_TASK2);
    let model = task(dir.path())
        .generate_model_light_curve(&params())
        .await
        .expect("model");

    assert_eq!(model.len(), 101);
    assert_eq!(model.points()[0].phase, 0.0);
    assert!(model.delta_mags().all(|m| m == 0.1));
    assert_eq!(leftover_files(dir.path()), 0);
}

#[tokio::test]
async fn concurrent_runs_use_distinct_files() {
    let dir = engine_dir(FAKE_TASK2);
    let task = task(dir.path());
    let params = params();

    let (a, b, c) = tokio::join!(
        task.generate_model_light_curve(&params),
        task.generate_model_light_curve(&params),
        task.generate_model_light_curve(&params),
    );
    for model in [a, b, c] {
        assert_eq!(model.expect("model").len(), 101);
    }
    assert_eq!(leftover_files(dir.path()), 0);
}

#[tokio::test]
async fn engine_without_output_reports_missing_out_file() {
    let dir = engine_dir("#!/bin/sh\necho 'nothing to do'\n");
    let err = task(dir.path())
        .generate_model_light_curve(&params())
        .await
        .unwrap_err();

    assert_matches!(
        err,
        TaskError::Run(RunError::Failed { exit_code: 0, cause: FailureCause::MissingOutFile(_), .. })
    );
    assert_eq!(leftover_files(dir.path()), 1, "the input file is kept");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn timeout_abandons_and_kills_a_hung_engine() {
    let dir = engine_dir("#!/bin/sh\necho $$ > engine.pid\nexec sleep 30\n");
    let task = task(dir.path());
    let params = params();

    let result = tokio::time::timeout(
        Duration::from_millis(500),
        task.generate_model_light_curve(&params),
    )
    .await;
    assert!(result.is_err());

    let pid_file = dir.path().join("engine.pid");
    let mut exited = false;
    for _ in 0..50 {
        let pid = std::fs::read_to_string(&pid_file).ok().and_then(|t| t.trim().parse::<u32>().ok());
        if let Some(pid) = pid {
            if !is_running(pid) {
                exited = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(exited, "engine still running after the run was abandoned");
}

/// Whether `pid` names a live, non-zombie process.
#[cfg(target_os = "linux")]
fn is_running(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            let (_, rest) = stat.rsplit_once(") ")?;
            rest.chars().next()
        })
        .is_some_and(|state| state != 'Z' && state != 'X')
}
