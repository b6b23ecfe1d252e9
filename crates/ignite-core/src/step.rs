//! Step trait and step naming.

use crate::context::StepContext;
use crate::error::StepError;
use crate::report::InitError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Type-safe step name wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepName(String);

impl StepName {
    /// Creates a new StepName.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the step name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StepName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StepName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for StepName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for StepName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for StepName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StepName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One named unit of startup work.
///
/// A step declares which steps must have run before it, whether its failure
/// is critical, and how its failures are classified. The manager calls
/// [`execute`](Step::execute) exactly once per run.
///
/// # Examples
///
/// ```
/// use ignite_core::{InitError, Step, StepContext, StepError, StepName};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct LoadLanguage;
///
/// #[async_trait]
/// impl Step for LoadLanguage {
///     async fn execute(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
///         ctx.set_result("appLanguage", "en".to_string());
///         Ok(())
///     }
///
///     fn name(&self) -> StepName {
///         StepName::new("appLanguage")
///     }
///
///     fn dependencies(&self) -> Vec<StepName> {
///         vec![StepName::new("i18n")]
///     }
///
///     fn on_error(&self, _error: &StepError) -> InitError {
///         InitError::warning("failed to load the application language")
///     }
/// }
/// ```
#[async_trait]
pub trait Step: Send + Sync + Debug {
    /// Performs the step's side effect.
    ///
    /// Values published with [`StepContext::set_result`] become visible to
    /// steps of later batches once this step's batch has settled.
    async fn execute(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError>;

    /// Returns the step name. Must be unique within one run.
    fn name(&self) -> StepName;

    /// Classifies a failure of this step.
    ///
    /// The manager fills in the step name and the cause when the returned
    /// error leaves them empty. Critical steps are escalated to fatal
    /// whatever severity is returned here.
    fn on_error(&self, error: &StepError) -> InitError;

    /// Whether a failure of this step makes the whole run fail.
    fn is_critical(&self) -> bool {
        false
    }

    /// Steps that must have run (successfully or not) before this one.
    fn dependencies(&self) -> Vec<StepName> {
        Vec::new()
    }
}
