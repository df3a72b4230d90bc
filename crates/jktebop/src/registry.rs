//! Named engine tasks available to callers.

use deblib_core::registry::{Registry, RegistryError};

use crate::config::JktebopConfig;
use crate::task::TaskError;
use crate::task2::ModelLightCurveTask;

/// Builds a task from the engine configuration.
pub type TaskConstructor = fn(&JktebopConfig) -> Result<ModelLightCurveTask, TaskError>;

/// Canonical task name → constructor.
pub type TaskRegistry = Registry<TaskConstructor>;

/// Every task this crate provides, in lookup priority order.
pub fn default_registry() -> Result<TaskRegistry, RegistryError> {
    let mut registry = TaskRegistry::new();
    registry.register("task2", ModelLightCurveTask::from_config as TaskConstructor)?;
    registry.register("model_light_curve", ModelLightCurveTask::from_config as TaskConstructor)?;
    Ok(registry)
}
