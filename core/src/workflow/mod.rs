// shopfront/src/workflow/mod.rs

//! A small staged workflow runner.
//!
//! A [`Workflow`] is an ordered list of stages (a caller-supplied [`Stage`]
//! enum). Each stage has `on` handlers and optional `after` handlers; all of
//! them receive a clone of the shared [`ContextData`]. Stages run strictly in
//! order and a stage never starts before the previous one has finished.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;

pub use context_data::ContextData;
pub use control::{Halted, StepControl, WorkflowOutcome};
pub use definition::{Handler, Stage, StageDef, Workflow};
