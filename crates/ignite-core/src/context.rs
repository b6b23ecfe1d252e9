//! Per-run execution context with heterogeneous result storage.

use crate::error::StepError;
use crate::step::StepName;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;

type Value = Box<dyn Any + Send + Sync>;

/// Type-safe context key wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey(String);

impl ContextKey {
    /// Creates a new ContextKey.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContextKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ContextKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&StepName> for ContextKey {
    fn from(name: &StepName) -> Self {
        Self::new(name.as_str())
    }
}

impl AsRef<str> for ContextKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for ContextKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Results shared between the steps of one run.
///
/// Owned by the manager for the duration of a run. Steps never touch it
/// directly: each one gets a [`StepContext`] reading this context as it was
/// when the step's batch started. Writes are applied back with
/// [`apply`](ExecutionContext::apply) once the batch has settled.
///
/// # Examples
///
/// ```
/// use ignite_core::{ExecutionContext, StepName};
///
/// let mut ctx = ExecutionContext::new();
/// ctx.set_result("masterKey", vec![7u8; 32]);
/// ctx.mark_success(StepName::new("masterKey"));
///
/// assert_eq!(ctx.get_result::<Vec<u8>>("masterKey").map(Vec::len), Some(32));
/// assert!(ctx.is_success("masterKey"));
///
/// // Wrong type reads as absent
/// assert_eq!(ctx.get_result::<String>("masterKey"), None);
/// ```
pub struct ExecutionContext {
    results: HashMap<ContextKey, Value>,
    succeeded: HashSet<StepName>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("keys", &self.results.keys().collect::<Vec<_>>())
            .field("succeeded", &self.succeeded)
            .finish()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            succeeded: HashSet::new(),
        }
    }

    /// Stores a result under the given key, replacing any previous value.
    pub fn set_result<T: Any + Send + Sync>(&mut self, key: impl Into<ContextKey>, value: T) {
        self.results.insert(key.into(), Box::new(value));
    }

    /// Returns the result for the given key.
    ///
    /// Returns `None` if the key doesn't exist or the type doesn't match.
    pub fn get_result<T: Any>(&self, key: &str) -> Option<&T> {
        self.results.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Returns `true` if a result is stored under the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.results.contains_key(key)
    }

    /// Returns the number of stored results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if no result is stored.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns `true` if the named step ran and succeeded in an earlier batch.
    pub fn is_success(&self, name: &str) -> bool {
        self.succeeded.contains(name)
    }

    /// Records that a step succeeded.
    pub fn mark_success(&mut self, name: StepName) {
        self.succeeded.insert(name);
    }

    /// Opens a view of this context for one step.
    pub fn scope(&self, step: StepName) -> StepContext<'_> {
        StepContext {
            shared: self,
            step,
            pending: HashMap::new(),
        }
    }

    /// Applies the writes a step made through its [`StepContext`].
    pub fn apply(&mut self, pending: PendingResults) {
        self.results.extend(pending.values);
    }
}

/// Writes made by one step, waiting to be applied to the shared context.
#[derive(Default)]
pub struct PendingResults {
    values: HashMap<ContextKey, Value>,
}

impl fmt::Debug for PendingResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResults")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PendingResults {
    /// Returns the number of pending writes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the step wrote nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A step's view of the execution context.
///
/// Reads see results from earlier batches plus this step's own writes.
/// Writes stay local to the step until its batch settles, so steps running
/// in the same batch never observe each other.
pub struct StepContext<'a> {
    shared: &'a ExecutionContext,
    step: StepName,
    pending: HashMap<ContextKey, Value>,
}

impl fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("step", &self.step)
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a> StepContext<'a> {
    /// Returns the name of the step this view belongs to.
    pub fn step(&self) -> &StepName {
        &self.step
    }

    /// Publishes a result for steps of later batches.
    pub fn set_result<T: Any + Send + Sync>(&mut self, key: impl Into<ContextKey>, value: T) {
        self.pending.insert(key.into(), Box::new(value));
    }

    /// Returns a result written by this step or by an earlier batch.
    ///
    /// This step's own writes shadow earlier ones.
    pub fn get_result<T: Any>(&self, key: &str) -> Option<&T> {
        match self.pending.get(key) {
            Some(value) => value.downcast_ref::<T>(),
            None => self.shared.get_result(key),
        }
    }

    /// Like [`get_result`](StepContext::get_result) but fails with
    /// [`StepError::MissingResult`] when the value is absent.
    pub fn require_result<T: Any>(&self, key: &str) -> Result<&T, StepError> {
        self.get_result(key).ok_or_else(|| StepError::MissingResult {
            step_name: self.step.clone(),
            key: key.to_string(),
        })
    }

    /// Returns `true` if a result is visible under the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.pending.contains_key(key) || self.shared.contains_key(key)
    }

    /// Returns `true` if the named step succeeded in an earlier batch.
    pub fn is_success(&self, name: &str) -> bool {
        self.shared.is_success(name)
    }

    /// Consumes the view and returns the writes to apply.
    pub fn into_pending(self) -> PendingResults {
        PendingResults {
            values: self.pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heterogeneous_storage() {
        let mut ctx = ExecutionContext::new();

        ctx.set_result("int", 42i32);
        ctx.set_result("string", "hello".to_string());
        ctx.set_result("bool", true);

        assert_eq!(ctx.get_result::<i32>("int"), Some(&42));
        assert_eq!(
            ctx.get_result::<String>("string"),
            Some(&"hello".to_string())
        );
        assert_eq!(ctx.get_result::<bool>("bool"), Some(&true));
        assert_eq!(ctx.len(), 3);

        // Wrong type returns None
        assert_eq!(ctx.get_result::<String>("int"), None);
    }

    #[test]
    fn test_overwrite() {
        let mut ctx = ExecutionContext::new();
        ctx.set_result("key", 1u8);
        ctx.set_result("key", 2u8);
        assert_eq!(ctx.get_result::<u8>("key"), Some(&2));
    }

    #[test]
    fn test_scope_writes_are_deferred() {
        let mut ctx = ExecutionContext::new();
        ctx.set_result("earlier", "batch0".to_string());

        let mut scope = ctx.scope(StepName::new("step"));
        scope.set_result("mine", 5u32);
        assert_eq!(scope.get_result::<u32>("mine"), Some(&5));
        assert_eq!(
            scope.get_result::<String>("earlier").map(String::as_str),
            Some("batch0")
        );

        let pending = scope.into_pending();
        assert_eq!(pending.len(), 1);
        assert!(!ctx.contains_key("mine"));

        ctx.apply(pending);
        assert_eq!(ctx.get_result::<u32>("mine"), Some(&5));
    }

    #[test]
    fn test_scope_shadows_shared_value() {
        let mut ctx = ExecutionContext::new();
        ctx.set_result("key", "old".to_string());

        let mut scope = ctx.scope(StepName::new("step"));
        scope.set_result("key", 9i64);
        assert_eq!(scope.get_result::<i64>("key"), Some(&9));
        assert_eq!(scope.get_result::<String>("key"), None);
    }

    #[test]
    fn test_require_result_missing() {
        let ctx = ExecutionContext::new();
        let scope = ctx.scope(StepName::new("models"));
        match scope.require_result::<Vec<u8>>("masterKey") {
            Err(StepError::MissingResult { step_name, key }) => {
                assert_eq!(step_name, "models");
                assert_eq!(key, "masterKey");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_is_success() {
        let mut ctx = ExecutionContext::new();
        assert!(!ctx.is_success("i18n"));
        ctx.mark_success(StepName::new("i18n"));
        assert!(ctx.is_success("i18n"));
        assert!(ctx.scope(StepName::new("appLanguage")).is_success("i18n"));
    }

    #[test]
    fn test_context_key() {
        let key1 = ContextKey::new("test");
        let key2: ContextKey = "test".into();
        let key3: ContextKey = (&StepName::new("test")).into();
        assert_eq!(key1, key2);
        assert_eq!(key2, key3);
    }
}
