//! Aggregation of step outcomes into an [`InitResult`].

use ignite_core::{
    InitError, InitResult, PlanError, Severity, StepName, StepRecord, StepStatus,
};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Collects outcomes in dispatch order.
#[derive(Debug, Default)]
pub(crate) struct Aggregator {
    result: InitResult,
}

impl Aggregator {
    pub fn with_capacity(steps: usize) -> Self {
        Self {
            result: InitResult {
                completed_steps: Vec::with_capacity(steps),
                steps: Vec::with_capacity(steps),
                ..InitResult::default()
            },
        }
    }

    /// Builds the report for a step set that could not be planned.
    pub fn configuration_error(plan_error: &PlanError, elapsed: Duration) -> InitResult {
        let step = match plan_error {
            PlanError::DuplicateStep(name) => Some(name.clone()),
            PlanError::UnknownDependency { step_name, .. } => Some(step_name.clone()),
            PlanError::Cycle(_) => None,
        };
        let mut fatal = InitError::fatal("Invalid initialization configuration")
            .with_cause(plan_error);
        fatal.step = step;

        InitResult {
            success: false,
            fatal_errors: vec![fatal],
            elapsed,
            ..InitResult::default()
        }
    }

    pub fn succeeded(&mut self, name: &StepName, batch: usize, elapsed: Duration) {
        self.push_record(name, batch, StepStatus::Succeeded, elapsed);
    }

    pub fn failed(&mut self, name: &StepName, batch: usize, elapsed: Duration, error: InitError) {
        self.push_record(name, batch, StepStatus::Failed(error.severity), elapsed);
        match error.severity {
            Severity::Fatal => {
                error!("{}", error);
                self.result.fatal_errors.push(error);
            }
            Severity::Warning => {
                warn!("{}", error);
                self.result.warnings.push(error);
            }
            Severity::Ignorable => {
                debug!("{}", error);
                self.result.ignorable_errors.push(error);
            }
        }
    }

    pub fn finish(mut self, elapsed: Duration) -> InitResult {
        self.result.success = self.result.fatal_errors.is_empty();
        self.result.elapsed = elapsed;
        self.result
    }

    fn push_record(&mut self, name: &StepName, batch: usize, status: StepStatus, elapsed: Duration) {
        self.result.completed_steps.push(name.clone());
        self.result.steps.push(StepRecord {
            name: name.clone(),
            batch,
            status,
            elapsed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_routing() {
        let mut aggregator = Aggregator::with_capacity(3);
        aggregator.succeeded(&StepName::new("a"), 0, Duration::ZERO);
        aggregator.failed(
            &StepName::new("b"),
            0,
            Duration::ZERO,
            InitError::warning("w").for_step("b"),
        );
        aggregator.failed(
            &StepName::new("c"),
            1,
            Duration::ZERO,
            InitError::ignorable("i").for_step("c"),
        );
        let result = aggregator.finish(Duration::from_millis(3));

        assert!(result.success);
        assert_eq!(result.completed_steps, vec!["a", "b", "c"]);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.ignorable_errors.len(), 1);
        assert!(result.fatal_errors.is_empty());
        assert_eq!(result.steps[2].batch, 1);
        assert_eq!(result.elapsed, Duration::from_millis(3));
    }

    #[test]
    fn test_fatal_fails_run() {
        let mut aggregator = Aggregator::default();
        aggregator.failed(
            &StepName::new("i18n"),
            0,
            Duration::ZERO,
            InitError::fatal("f"),
        );
        let result = aggregator.finish(Duration::ZERO);
        assert!(!result.success);
        assert_eq!(result.fatal_errors.len(), 1);
    }

    #[test]
    fn test_configuration_error_report() {
        let result = Aggregator::configuration_error(
            &PlanError::DuplicateStep(StepName::new("i18n")),
            Duration::ZERO,
        );
        assert!(!result.success);
        assert!(result.completed_steps.is_empty());
        assert_eq!(result.fatal_errors.len(), 1);
        assert_eq!(result.fatal_errors[0].step, Some(StepName::new("i18n")));
        assert_eq!(
            result.fatal_errors[0].cause.as_deref(),
            Some("Duplicate step name: i18n")
        );
    }
}
