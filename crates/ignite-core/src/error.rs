//! Step and plan error types.

use crate::step::StepName;
use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by collaborators that steps call into.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reasons a step can fail.
///
/// Whatever the variant, the failure is handed to the step's
/// [`on_error`](crate::Step::on_error) for classification.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StepError {
    /// The step reported a failure.
    #[error("Step failed: {step_name}, details: {details}")]
    Failed {
        /// The name of the step that failed.
        step_name: StepName,
        /// Details about the failure.
        details: String,
    },

    /// A collaborator called by the step returned an error.
    #[error("Step failed: {step_name}, source: {source}")]
    Source {
        /// The name of the step that failed.
        step_name: StepName,
        /// The collaborator's error.
        #[source]
        source: BoxError,
    },

    /// A step exceeded its timeout duration.
    #[error("Timeout occurred in step: {step_name} after {timeout:?}")]
    Timeout {
        /// The name of the step that timed out.
        step_name: StepName,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The step panicked while executing.
    #[error("Step panicked: {step_name}, details: {details}")]
    Panicked {
        /// The name of the step that panicked.
        step_name: StepName,
        /// The panic payload, when it was a string.
        details: String,
    },

    /// A result the step needs was not published by an earlier step.
    #[error("Step '{step_name}' requires result '{key}' which is not available")]
    MissingResult {
        /// The name of the step that needed the result.
        step_name: StepName,
        /// The missing context key.
        key: String,
    },
}

impl StepError {
    /// Creates a [`StepError::Failed`].
    pub fn failed(step_name: impl Into<StepName>, details: impl Into<String>) -> Self {
        Self::Failed {
            step_name: step_name.into(),
            details: details.into(),
        }
    }

    /// Wraps a collaborator error into a [`StepError::Source`].
    pub fn from_source(step_name: impl Into<StepName>, source: impl Into<BoxError>) -> Self {
        Self::Source {
            step_name: step_name.into(),
            source: source.into(),
        }
    }

    /// Returns the name of the step that failed.
    pub fn step_name(&self) -> &StepName {
        match self {
            Self::Failed { step_name, .. }
            | Self::Source { step_name, .. }
            | Self::Timeout { step_name, .. }
            | Self::Panicked { step_name, .. }
            | Self::MissingResult { step_name, .. } => step_name,
        }
    }
}

/// The step set cannot be turned into an execution plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Two steps share a name.
    #[error("Duplicate step name: {0}")]
    DuplicateStep(StepName),

    /// A step depends on a name that is not in the step set.
    #[error("Step '{step_name}' depends on unknown step '{dependency}'")]
    UnknownDependency {
        /// The step declaring the dependency.
        step_name: StepName,
        /// The name that could not be found.
        dependency: StepName,
    },

    /// The dependency relation is cyclic. Lists the steps that could not be scheduled.
    #[error("Circular dependency among steps: {}", join_names(.0))]
    Cycle(Vec<StepName>),
}

fn join_names(names: &[StepName]) -> String {
    names
        .iter()
        .map(StepName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let error = StepError::failed("test_step", "test error");
        assert_eq!(
            error.to_string(),
            "Step failed: test_step, details: test error"
        );

        let error = StepError::Timeout {
            step_name: StepName::new("slow"),
            timeout: Duration::from_millis(50),
        };
        assert_eq!(error.to_string(), "Timeout occurred in step: slow after 50ms");
    }

    #[test]
    fn test_source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "keyring missing");
        let error = StepError::from_source("masterKey", io);
        assert_eq!(error.step_name(), "masterKey");
        assert_eq!(
            error.source().map(|s| s.to_string()),
            Some("keyring missing".to_string())
        );
    }

    #[test]
    fn test_plan_error_display() {
        let error = PlanError::Cycle(vec![StepName::new("a"), StepName::new("b")]);
        assert_eq!(error.to_string(), "Circular dependency among steps: a, b");

        let error = PlanError::UnknownDependency {
            step_name: StepName::new("models"),
            dependency: StepName::new("vault"),
        };
        assert_eq!(
            error.to_string(),
            "Step 'models' depends on unknown step 'vault'"
        );
    }
}
