//! `deblib-core` library crate.
//!
//! Engine-independent building blocks: input-file templates with inline
//! defaults, parameter mappings, the task-2 model table, and the explicit
//! name registry used to look tasks up.

pub mod error;
pub mod light_curve;
pub mod params;
pub mod registry;
pub mod template;
