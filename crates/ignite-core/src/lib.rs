//! Core traits and types for the ignite bootstrap sequencer.
//!
//! This crate provides the step abstraction and the report types without
//! any runtime dependency. Application code depends on it to define steps.
//!
//! # Core Types
//!
//! - [`Step`] - One named unit of startup work
//! - [`ExecutionContext`] / [`StepContext`] - Per-run storage for step results
//! - [`StepError`] - Why a step failed
//! - [`InitError`] / [`Severity`] - How a failure is classified
//! - [`InitResult`] - Aggregate outcome of a run
//!
//! # Optional Traits
//!
//! - [`WithTimeout`] - Configure a per-step timeout

mod context;
mod error;
mod report;
mod step;
mod traits;

pub use context::{ContextKey, ExecutionContext, PendingResults, StepContext};
pub use error::{BoxError, PlanError, StepError};
pub use report::{InitError, InitResult, Progress, Severity, StepRecord, StepStatus};
pub use step::{Step, StepName};
pub use traits::WithTimeout;
