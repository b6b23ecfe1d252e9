//! Optional step traits for additional behavior.

use crate::step::Step;
use std::time::Duration;

/// Optional trait for steps with a timeout.
///
/// Steps run without a timeout unless one is configured. A step that
/// exceeds its timeout fails with [`StepError::Timeout`](crate::StepError::Timeout),
/// which is classified by its `on_error` like any other failure.
///
/// # Examples
///
/// ```
/// use ignite_core::{InitError, Step, StepContext, StepError, StepName, WithTimeout};
/// use async_trait::async_trait;
/// use std::time::Duration;
///
/// #[derive(Debug)]
/// struct FetchProviderCatalog;
///
/// #[async_trait]
/// impl Step for FetchProviderCatalog {
///     async fn execute(&self, _ctx: &mut StepContext<'_>) -> Result<(), StepError> {
///         Ok(())
///     }
///
///     fn name(&self) -> StepName {
///         StepName::new("modelProvider")
///     }
///
///     fn on_error(&self, _error: &StepError) -> InitError {
///         InitError::warning("provider catalog unavailable")
///     }
/// }
///
/// impl WithTimeout for FetchProviderCatalog {
///     fn timeout(&self) -> Duration {
///         Duration::from_secs(10)
///     }
/// }
/// ```
pub trait WithTimeout: Step {
    /// Returns the timeout duration for this step.
    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
}
