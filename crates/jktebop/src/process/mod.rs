//! Running the JKTEBOP executable.
//!
//! [`Runner::run`] launches the engine against an input file, drains its
//! merged console output while waiting for it to exit, classifies the
//! outcome and hands back the result file as [`ResultLines`].
//!
//! One invocation owns exactly one child process and one blocking drain
//! worker. There is no built-in timeout: wrap the run in
//! `tokio::time::timeout` and the child is killed when the future is dropped.
//!
//! Only the direct child is killed. An engine that forks helpers sharing its
//! output pipe keeps the drain worker busy until those helpers exit too.
//! JKTEBOP itself runs as a single process.

mod drain;
mod handle;
mod outcome;
mod result_lines;
mod runner;

pub use drain::{is_warning, DiagnosticBuffer, DiagnosticSink, TracingSink};
pub use handle::EngineProcess;
pub use outcome::{classify, FailureCause, InvocationState, Outcome, ERROR_MARKER};
pub use result_lines::{Cleanup, ResultLines};
pub use runner::{RunError, RunOptions, Runner};

pub(crate) use result_lines::remove_if_present;
