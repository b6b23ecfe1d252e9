//! Step graph validation and batch planning.

use ignite_core::{PlanError, StepName};
use std::collections::{HashMap, HashSet};

/// A step as seen by the planner.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Node<'a> {
    pub name: &'a StepName,
    pub dependencies: &'a [StepName],
}

/// Ordered batches of steps. Steps in one batch run concurrently; a batch
/// starts only after the previous one has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    names: Vec<StepName>,
    batches: Vec<Vec<usize>>,
}

impl ExecutionPlan {
    /// Returns the number of batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Returns `true` if there is nothing to run.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Returns the step names of each batch, in dispatch order.
    pub fn batches(&self) -> impl Iterator<Item = Vec<&StepName>> + '_ {
        self.batches
            .iter()
            .map(|batch| batch.iter().map(|&i| &self.names[i]).collect())
    }

    /// Returns the index of the batch a step is dispatched in.
    pub fn batch_of(&self, name: &str) -> Option<usize> {
        self.batches
            .iter()
            .position(|batch| batch.iter().any(|&i| self.names[i] == *name))
    }

    pub(crate) fn indices(&self) -> &[Vec<usize>] {
        &self.batches
    }
}

/// Validates the step graph and groups steps into batches.
///
/// A step joins the first batch in which all of its dependencies belong to
/// earlier batches. Within a batch, steps keep their input order.
pub(crate) fn resolve(nodes: &[Node<'_>]) -> Result<ExecutionPlan, PlanError> {
    let mut index: HashMap<&StepName, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(node.name, i).is_some() {
            return Err(PlanError::DuplicateStep(node.name.clone()));
        }
    }

    for node in nodes {
        if let Some(missing) = node
            .dependencies
            .iter()
            .find(|dep| !index.contains_key(dep))
        {
            return Err(PlanError::UnknownDependency {
                step_name: node.name.clone(),
                dependency: missing.clone(),
            });
        }
    }

    // `None` once the step has been placed in a batch.
    let mut unresolved: Vec<Option<HashSet<&StepName>>> = nodes
        .iter()
        .map(|node| Some(node.dependencies.iter().collect()))
        .collect();
    let mut remaining = nodes.len();
    let mut batches = Vec::new();

    while remaining > 0 {
        let batch: Vec<usize> = unresolved
            .iter()
            .enumerate()
            .filter(|(_, deps)| deps.as_ref().is_some_and(HashSet::is_empty))
            .map(|(i, _)| i)
            .collect();

        if batch.is_empty() {
            let stuck = unresolved
                .iter()
                .zip(nodes)
                .filter(|(deps, _)| deps.is_some())
                .map(|(_, node)| node.name.clone())
                .collect();
            return Err(PlanError::Cycle(stuck));
        }

        for &i in &batch {
            unresolved[i] = None;
        }
        for deps in unresolved.iter_mut().flatten() {
            for &i in &batch {
                deps.remove(nodes[i].name);
            }
        }

        remaining -= batch.len();
        batches.push(batch);
    }

    Ok(ExecutionPlan {
        names: nodes.iter().map(|node| node.name.clone()).collect(),
        batches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> Vec<(StepName, Vec<StepName>)> {
        edges.iter()
            .map(|(name, deps)| {
                (
                    StepName::new(*name),
                    deps.iter().map(|d| StepName::new(*d)).collect(),
                )
            })
            .collect()
    }

    fn plan(edges: &[(&str, &[&str])]) -> Result<ExecutionPlan, PlanError> {
        let owned = graph(edges);
        let nodes: Vec<Node<'_>> = owned
            .iter()
            .map(|(name, deps)| Node {
                name,
                dependencies: deps,
            })
            .collect();
        resolve(&nodes)
    }

    fn names(plan: &ExecutionPlan) -> Vec<Vec<String>> {
        plan.batches()
            .map(|batch| batch.into_iter().map(|n| n.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_independent_steps_share_first_batch() {
        let plan = plan(&[("a", &[]), ("b", &[]), ("c", &[])]).unwrap();
        assert_eq!(names(&plan), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_layers_follow_dependencies() {
        let plan = plan(&[
            ("models", &["masterKey"]),
            ("i18n", &[]),
            ("masterKey", &[]),
            ("appLanguage", &["i18n"]),
            ("chatList", &[]),
        ])
        .unwrap();

        assert_eq!(
            names(&plan),
            vec![
                vec!["i18n", "masterKey", "chatList"],
                vec!["models", "appLanguage"],
            ]
        );
        assert_eq!(plan.batch_of("models"), Some(1));
        assert_eq!(plan.batch_of("nope"), None);
    }

    #[test]
    fn test_diamond() {
        let plan = plan(&[
            ("d", &["b", "c"]),
            ("b", &["a"]),
            ("c", &["a"]),
            ("a", &[]),
        ])
        .unwrap();
        assert_eq!(names(&plan), vec![vec!["a"], vec!["b", "c"], vec!["d"]]);
    }

    #[test]
    fn test_repeated_dependency_collapses() {
        let plan = plan(&[("a", &[]), ("b", &["a", "a"])]).unwrap();
        assert_eq!(names(&plan), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn test_empty_graph() {
        let plan = plan(&[]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_duplicate_name() {
        let err = plan(&[("a", &[]), ("a", &[])]).unwrap_err();
        assert_eq!(err, PlanError::DuplicateStep(StepName::new("a")));
    }

    #[test]
    fn test_unknown_dependency() {
        let err = plan(&[("a", &["ghost"])]).unwrap_err();
        assert_eq!(
            err,
            PlanError::UnknownDependency {
                step_name: StepName::new("a"),
                dependency: StepName::new("ghost"),
            }
        );
    }

    #[test]
    fn test_cycles() {
        let err = plan(&[("a", &["b"]), ("b", &["a"])]).unwrap_err();
        assert_eq!(
            err,
            PlanError::Cycle(vec![StepName::new("a"), StepName::new("b")])
        );

        let err = plan(&[("a", &["c"]), ("b", &["a"]), ("c", &["b"]), ("free", &[])])
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::Cycle(vec![
                StepName::new("a"),
                StepName::new("b"),
                StepName::new("c")
            ])
        );

        let err = plan(&[("self", &["self"])]).unwrap_err();
        assert_eq!(err, PlanError::Cycle(vec![StepName::new("self")]));
    }
}
