//! Dependency-aware application bootstrap sequencer.
//!
//! Steps declare their dependencies; the manager groups them into batches,
//! runs each batch concurrently and classifies failures as fatal, warning or
//! ignorable. The run always produces an [`InitResult`], it never fails.
//!
//! # Example
//!
//! ```rust
//! use ignite::prelude::*;
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! struct LoadLocale;
//!
//! #[async_trait]
//! impl Step for LoadLocale {
//!     async fn execute(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
//!         ctx.set_result("locale", "en-US".to_string());
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> StepName {
//!         StepName::new("i18n")
//!     }
//!
//!     fn is_critical(&self) -> bool {
//!         true
//!     }
//!
//!     fn on_error(&self, _error: &StepError) -> InitError {
//!         InitError::fatal("could not initialise localisation")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = InitializationManager::builder()
//!         .add_step(LoadLocale)
//!         .build();
//!
//!     let result = manager.run_initialization().await;
//!     assert!(result.success);
//!     assert_eq!(result.completed_steps, vec!["i18n"]);
//! }
//! ```

mod manager;
mod plan;
mod report;

// Re-export core types
pub use ignite_core::*;

pub use manager::{InitializationManager, InitializationManagerBuilder, ProgressCallback};
pub use plan::ExecutionPlan;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        ExecutionContext, ExecutionPlan, InitError, InitResult, InitializationManager,
        InitializationManagerBuilder, PlanError, Progress, Severity, Step, StepContext, StepError,
        StepName, StepRecord, StepStatus, WithTimeout,
    };
}
