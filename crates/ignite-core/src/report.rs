//! Failure classification and run reports.

use crate::step::StepName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Impact of a step failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The application cannot be used.
    Fatal,
    /// A feature is degraded, the application keeps running.
    Warning,
    /// Nothing user-visible, a default is used instead.
    Ignorable,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "fatal"),
            Severity::Warning => write!(f, "warning"),
            Severity::Ignorable => write!(f, "ignorable"),
        }
    }
}

/// A classified failure.
///
/// Returned by [`Step::on_error`](crate::Step::on_error) and collected into
/// [`InitResult`].
///
/// # Examples
///
/// ```
/// use ignite_core::{InitError, Severity};
///
/// let error = InitError::warning("chat history could not be loaded")
///     .with_cause("database is locked");
///
/// assert_eq!(error.severity, Severity::Warning);
/// assert_eq!(error.cause.as_deref(), Some("database is locked"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitError {
    /// The failing step. `None` for configuration errors not tied to one step.
    pub step: Option<StepName>,
    /// How bad the failure is.
    pub severity: Severity,
    /// Message meant for the user.
    pub message: String,
    /// Display text of the underlying error.
    pub cause: Option<String>,
}

impl InitError {
    /// Creates a classified error with the given severity.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            step: None,
            severity,
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a fatal error.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, message)
    }

    /// Creates a warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Creates an ignorable error.
    pub fn ignorable(message: impl Into<String>) -> Self {
        Self::new(Severity::Ignorable, message)
    }

    /// Attaches the failing step's name.
    pub fn for_step(mut self, step: impl Into<StepName>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Attaches the underlying error's text.
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// Returns `true` if the severity is [`Severity::Fatal`].
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.severity)?;
        if let Some(step) = &self.step {
            write!(f, "{}: ", step)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " ({})", cause)?;
        }
        Ok(())
    }
}

/// Final state of one attempted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "severity")]
pub enum StepStatus {
    /// `execute` returned `Ok`.
    Succeeded,
    /// `execute` failed and was classified with the given severity.
    Failed(Severity),
}

/// Diagnostic record of one attempted step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Step name.
    pub name: StepName,
    /// Index of the batch the step was dispatched in.
    pub batch: usize,
    /// How the step ended.
    pub status: StepStatus,
    /// Time spent in the step.
    pub elapsed: Duration,
}

/// Progress notification, sent each time a step settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Steps settled so far, including this one.
    pub completed: usize,
    /// Steps in the run.
    pub total: usize,
    /// The step that just settled.
    pub step: StepName,
}

/// Outcome of one initialization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResult {
    /// `true` iff no failure was classified as fatal.
    pub success: bool,
    /// Every attempted step, in dispatch order.
    pub completed_steps: Vec<StepName>,
    /// Non-fatal failures the user should be told about.
    pub warnings: Vec<InitError>,
    /// Failures that make the application unusable.
    pub fatal_errors: Vec<InitError>,
    /// Failures that are silently tolerated.
    pub ignorable_errors: Vec<InitError>,
    /// Per-step records, in dispatch order.
    pub steps: Vec<StepRecord>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl InitResult {
    /// Returns `true` if the run succeeded but some feature is degraded.
    pub fn is_degraded(&self) -> bool {
        self.success && !self.warnings.is_empty()
    }

    /// Returns the record for a step, if it was attempted.
    pub fn record(&self, name: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|r| r.name == *name)
    }

    /// Returns `true` if the named step was attempted and succeeded.
    pub fn succeeded(&self, name: &str) -> bool {
        matches!(
            self.record(name).map(|r| r.status),
            Some(StepStatus::Succeeded)
        )
    }

    /// Returns the names of the steps that failed, in dispatch order.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepName> {
        self.steps
            .iter()
            .filter(|r| matches!(r.status, StepStatus::Failed(_)))
            .map(|r| &r.name)
    }
}
