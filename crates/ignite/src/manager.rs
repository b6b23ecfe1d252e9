//! Initialization manager: runs steps batch by batch and classifies failures.

use crate::plan::{self, ExecutionPlan, Node};
use crate::report::Aggregator;
use futures_util::future::join_all;
use futures_util::FutureExt;
use ignite_core::{
    ExecutionContext, InitError, InitResult, PendingResults, PlanError, Progress, Severity, Step,
    StepContext, StepError, StepName, WithTimeout,
};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Callback invoked each time a step settles.
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Runs a set of startup steps with maximum safe concurrency.
///
/// Steps whose dependencies have all run are grouped into a batch and
/// started together; the next batch starts once every member of the current
/// one has settled. Failures never abort the run: each one is classified by
/// the failing step and collected into the returned [`InitResult`].
pub struct InitializationManager {
    steps: Vec<StepEntry>,
    default_timeout: Option<Duration>,
    on_progress: Option<ProgressCallback>,
}

struct StepEntry {
    step: Box<dyn Step>,
    name: StepName,
    dependencies: Vec<StepName>,
    critical: bool,
    timeout: Option<Duration>,
}

impl StepEntry {
    fn new(step: Box<dyn Step>, timeout: Option<Duration>) -> Self {
        Self {
            name: step.name(),
            dependencies: step.dependencies(),
            critical: step.is_critical(),
            step,
            timeout,
        }
    }
}

struct StepOutcome {
    result: Result<(), StepError>,
    pending: PendingResults,
    elapsed: Duration,
}

impl fmt::Debug for InitializationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializationManager")
            .field("steps", &self.steps.iter().map(|e| &e.name).collect::<Vec<_>>())
            .field("default_timeout", &self.default_timeout)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl InitializationManager {
    /// Creates a new manager builder.
    pub fn builder() -> InitializationManagerBuilder {
        InitializationManagerBuilder::new()
    }

    /// Returns the registered step names, in input order.
    pub fn step_names(&self) -> impl Iterator<Item = &StepName> {
        self.steps.iter().map(|e| &e.name)
    }

    /// Returns `true` if a step with the given name is registered.
    pub fn has_step(&self, name: &str) -> bool {
        self.steps.iter().any(|e| e.name == *name)
    }

    /// Returns the number of registered steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Validates the step graph and returns the batches it would run.
    pub fn plan(&self) -> Result<ExecutionPlan, PlanError> {
        let nodes: Vec<Node<'_>> = self
            .steps
            .iter()
            .map(|e| Node {
                name: &e.name,
                dependencies: &e.dependencies,
            })
            .collect();
        plan::resolve(&nodes)
    }

    /// Runs every step once and reports the outcome.
    ///
    /// Never fails: an invalid step graph yields a fatal result without
    /// running anything, and step failures, timeouts and panics are
    /// classified through the failing step's `on_error`.
    pub async fn run_initialization(&self) -> InitResult {
        let started = Instant::now();
        info!("Initialization started with {} steps", self.steps.len());

        let plan = match self.plan() {
            Ok(plan) => plan,
            Err(e) => {
                error!("Invalid initialization configuration: {}", e);
                return Aggregator::configuration_error(&e, started.elapsed());
            }
        };
        debug!("Resolved {} batches", plan.len());

        let mut ctx = ExecutionContext::new();
        let mut report = Aggregator::with_capacity(self.steps.len());
        let settled = AtomicUsize::new(0);

        for (batch, indices) in plan.indices().iter().enumerate() {
            debug!("Dispatching batch {} ({} steps)", batch, indices.len());

            let outcomes = join_all(
                indices
                    .iter()
                    .map(|&i| self.run_step(&self.steps[i], &ctx, &settled)),
            )
            .await;

            for (&i, outcome) in indices.iter().zip(outcomes) {
                let entry = &self.steps[i];
                ctx.apply(outcome.pending);
                match outcome.result {
                    Ok(()) => {
                        ctx.mark_success(entry.name.clone());
                        report.succeeded(&entry.name, batch, outcome.elapsed);
                    }
                    Err(e) => {
                        let classified = self.classify(entry, &e);
                        report.failed(&entry.name, batch, outcome.elapsed, classified);
                    }
                }
            }
        }

        let result = report.finish(started.elapsed());
        info!(
            "Initialization finished in {:?}: success={}, {} warnings, {} fatal errors",
            result.elapsed,
            result.success,
            result.warnings.len(),
            result.fatal_errors.len()
        );
        result
    }

    async fn run_step(
        &self,
        entry: &StepEntry,
        ctx: &ExecutionContext,
        settled: &AtomicUsize,
    ) -> StepOutcome {
        let mut scope = ctx.scope(entry.name.clone());
        let started = Instant::now();
        debug!("Step '{}' running", entry.name);

        let result = self.invoke(entry, &mut scope).await;
        let elapsed = started.elapsed();
        match &result {
            Ok(()) => info!("Step '{}' completed successfully", entry.name),
            Err(e) => warn!("Step '{}' failed: {}", entry.name, e),
        }

        let completed = settled.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(on_progress) = &self.on_progress {
            let progress = Progress {
                completed,
                total: self.steps.len(),
                step: entry.name.clone(),
            };
            if let Err(payload) =
                std::panic::catch_unwind(AssertUnwindSafe(|| on_progress(&progress)))
            {
                warn!(
                    "Progress callback panicked after step '{}': {}",
                    entry.name,
                    panic_message(payload.as_ref())
                );
            }
        }

        StepOutcome {
            result,
            pending: scope.into_pending(),
            elapsed,
        }
    }

    async fn invoke(&self, entry: &StepEntry, scope: &mut StepContext<'_>) -> Result<(), StepError> {
        let guarded = AssertUnwindSafe(entry.step.execute(scope)).catch_unwind();

        let caught = match entry.timeout.or(self.default_timeout) {
            Some(limit) => match timeout(limit, guarded).await {
                Ok(caught) => caught,
                Err(_) => {
                    return Err(StepError::Timeout {
                        step_name: entry.name.clone(),
                        timeout: limit,
                    })
                }
            },
            None => guarded.await,
        };

        caught.unwrap_or_else(|payload| {
            Err(StepError::Panicked {
                step_name: entry.name.clone(),
                details: panic_message(payload.as_ref()),
            })
        })
    }

    fn classify(&self, entry: &StepEntry, failure: &StepError) -> InitError {
        let classified =
            std::panic::catch_unwind(AssertUnwindSafe(|| entry.step.on_error(failure)));
        let mut classified = classified.unwrap_or_else(|payload| {
            InitError::fatal("Error classification failed").with_cause(panic_message(payload.as_ref()))
        });

        if classified.step.is_none() {
            classified.step = Some(entry.name.clone());
        }
        if classified.cause.is_none() {
            classified.cause = Some(failure.to_string());
        }
        if entry.critical && classified.severity != Severity::Fatal {
            warn!(
                "Critical step '{}' classified its failure as {}, escalating to fatal",
                entry.name, classified.severity
            );
            classified.severity = Severity::Fatal;
        }
        classified
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Builder for constructing [`InitializationManager`] instances.
#[derive(Default)]
pub struct InitializationManagerBuilder {
    steps: Vec<StepEntry>,
    default_timeout: Option<Duration>,
    on_progress: Option<ProgressCallback>,
}

impl InitializationManagerBuilder {
    /// Creates a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a step. Steps keep the order in which they are added.
    pub fn add_step<S: Step + 'static>(self, step: S) -> Self {
        self.add_boxed(Box::new(step))
    }

    /// Adds an already boxed step.
    pub fn add_boxed(mut self, step: Box<dyn Step>) -> Self {
        self.steps.push(StepEntry::new(step, None));
        self
    }

    /// Adds a list of boxed steps.
    pub fn add_steps(mut self, steps: impl IntoIterator<Item = Box<dyn Step>>) -> Self {
        self.steps
            .extend(steps.into_iter().map(|step| StepEntry::new(step, None)));
        self
    }

    /// Adds a step with a custom timeout.
    pub fn add_with_timeout<S: Step + 'static>(mut self, step: S, timeout: Duration) -> Self {
        self.steps
            .push(StepEntry::new(Box::new(step), Some(timeout)));
        self
    }

    /// Adds a step that implements the [`WithTimeout`] trait.
    pub fn add_with_timeout_trait<S: WithTimeout + 'static>(self, step: S) -> Self {
        let timeout = step.timeout();
        self.add_with_timeout(step, timeout)
    }

    /// Sets the timeout for steps registered without one.
    ///
    /// By default steps have no timeout.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Sets a callback invoked each time a step settles.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Builds the manager.
    ///
    /// The step graph is validated when the manager runs, see
    /// [`InitializationManager::run_initialization`].
    pub fn build(self) -> InitializationManager {
        InitializationManager {
            steps: self.steps,
            default_timeout: self.default_timeout,
            on_progress: self.on_progress,
        }
    }
}
