//! Orchestration of the JKTEBOP eclipsing-binary modelling program.
//!
//! - [`config`]: where the engine lives, from environment variables
//! - [`process`]: launching the engine and capturing its console output
//! - [`task`]: template-driven tasks with working-file management
//! - [`task2`]: model light curves
//! - [`registry`]: tasks by name

pub mod config;
pub mod process;
pub mod registry;
pub mod task;
pub mod task2;

pub use config::JktebopConfig;
pub use process::{DiagnosticSink, ResultLines, RunError, RunOptions, Runner, TracingSink};
pub use registry::{default_registry, TaskConstructor, TaskRegistry};
pub use task::{Task, TaskError, TaskRunOptions};
pub use task2::ModelLightCurveTask;
