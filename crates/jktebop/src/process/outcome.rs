//! Outcome classification for a finished engine invocation.
//!
//! The engine does not reliably report failure through its exit code, so an
//! invocation only succeeds when all of these hold:
//!
//! - the exit code is zero
//! - the captured console text carries no [`ERROR_MARKER`]
//! - the expected out-file, when one is declared, exists

use std::fmt;
use std::path::{Path, PathBuf};

/// Text the engine prints when it rejects its input.
pub const ERROR_MARKER: &str = "### ERROR";

/// Per-invocation lifecycle: `Running` until exit, then one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        })
    }
}

/// The reportable reason an invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureCause {
    #[error("engine exited with code {0}")]
    NonZeroExit(i32),

    #[error("engine output contains an error marker")]
    ErrorMarker,

    #[error("expected out-file {} was not produced", .0.display())]
    MissingOutFile(PathBuf),
}

/// Result of classifying a finished invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(FailureCause),
}

impl Outcome {
    pub fn state(&self) -> InvocationState {
        match self {
            Self::Succeeded => InvocationState::Succeeded,
            Self::Failed(_) => InvocationState::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Classify a finished invocation.
///
/// `missing_out_file` is the declared out-file when it does not exist after
/// exit. When several conditions fail, the cause is reported in this order:
/// exit code, error marker, missing out-file.
pub fn classify(exit_code: i32, output: &str, missing_out_file: Option<&Path>) -> Outcome {
    if exit_code != 0 {
        Outcome::Failed(FailureCause::NonZeroExit(exit_code))
    } else if output.contains(ERROR_MARKER) {
        Outcome::Failed(FailureCause::ErrorMarker)
    } else if let Some(path) = missing_out_file {
        Outcome::Failed(FailureCause::MissingOutFile(path.to_path_buf()))
    } else {
        Outcome::Succeeded
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
