// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Validation for compiled task graphs.
//!
//! A compiled graph is only executable if it passes three checks, run in this
//! order:
//!
//! 1. **Uniqueness**: every task name appears once in the task list
//! 2. **References**: every dependency names a task of the graph
//! 3. **Cycles**: DFS with a recursion stack finds any circular dependency
//!
//! Cycle detection needs a structurally valid graph, so it is skipped when the
//! first two checks already reported errors.
//!
//! # Example
//! ```rust
//! use std::collections::HashMap;
//! use pipewright::config::{validate_task_graph, DependencyGraph};
//! use pipewright::errors::ValidationError;
//!
//! let tasks = vec!["a".to_string(), "b".to_string()];
//! let graph = DependencyGraph::from(HashMap::from([
//!     ("a".to_string(), vec!["b".to_string()]),
//!     ("b".to_string(), vec!["a".to_string()]),
//! ]));
//!
//! let errors = validate_task_graph(&tasks, &graph).unwrap_err();
//! assert!(matches!(errors[0], ValidationError::CyclicDependency { .. }));
//! ```

use std::collections::{HashMap, HashSet};

use crate::config::DependencyGraph;
use crate::errors::ValidationError;

/// Validates a compiled task list and its dependency graph.
///
/// Accumulates every uniqueness and reference error so they can be reported
/// together. Returns at most one cycle, with its full path.
pub fn validate_task_graph(
    tasks: &[String],
    graph: &DependencyGraph,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(duplicate_errors) = validate_unique_tasks(tasks) {
        errors.extend(duplicate_errors);
    }

    if let Err(unresolved_errors) = validate_dependency_references(tasks, graph) {
        errors.extend(unresolved_errors);
    }

    if errors.is_empty() {
        if let Err(cycle_errors) = validate_acyclic_graph(tasks, graph) {
            errors.extend(cycle_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_tasks(tasks: &[String]) -> Result<(), Vec<ValidationError>> {
    let mut seen = HashSet::new();
    let errors: Vec<ValidationError> = tasks
        .iter()
        .filter(|task| !seen.insert(task.as_str()))
        .map(|task| ValidationError::DuplicateTask {
            task_id: task.clone(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Every key of the graph and every dependency it lists must be a task.
fn validate_dependency_references(
    tasks: &[String],
    graph: &DependencyGraph,
) -> Result<(), Vec<ValidationError>> {
    let task_ids: HashSet<&String> = tasks.iter().collect();
    let mut errors = Vec::new();

    for (task_id, dependencies) in &graph.0 {
        if !task_ids.contains(task_id) {
            errors.push(ValidationError::UnresolvedDependency {
                task_id: task_id.clone(),
                missing_dependency: task_id.clone(),
            });
            continue;
        }
        for dependency in dependencies {
            if !task_ids.contains(dependency) {
                errors.push(ValidationError::UnresolvedDependency {
                    task_id: task_id.clone(),
                    missing_dependency: dependency.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// "Three colors" DFS over the forward (dependency -> dependent) view.
///
/// Walks tasks in task-list order so the reported cycle is stable for a given
/// trace.
fn validate_acyclic_graph(
    tasks: &[String],
    graph: &DependencyGraph,
) -> Result<(), Vec<ValidationError>> {
    let dependents = graph.build_dependents();

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for task_id in tasks {
        if !visited.contains(task_id) {
            if let Some(cycle) = dfs_cycle_detection(
                task_id,
                &dependents,
                &mut visited,
                &mut rec_stack,
                &mut path,
            ) {
                return Err(vec![ValidationError::CyclicDependency { cycle }]);
            }
        }
    }

    Ok(())
}

/// Returns the cycle path when a back edge to a node on the current path is
/// found, e.g. `[a, b, c, a]` for `a -> b -> c -> a`.
fn dfs_cycle_detection(
    node: &str,
    graph: &HashMap<String, Vec<String>>,
    visited: &mut HashSet<String>,
    rec_stack: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Option<Vec<String>> {
    visited.insert(node.to_string());
    rec_stack.insert(node.to_string());
    path.push(node.to_string());

    if let Some(neighbors) = graph.get(node) {
        for neighbor in neighbors {
            if !visited.contains(neighbor) {
                if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path)
                {
                    return Some(cycle);
                }
            } else if rec_stack.contains(neighbor) {
                let cycle_start = path.iter().position(|x| x == neighbor).unwrap_or(0);
                let mut cycle = path[cycle_start..].to_vec();
                cycle.push(neighbor.clone());
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> (Vec<String>, DependencyGraph) {
        let tasks = edges.iter().map(|(t, _)| t.to_string()).collect();
        let map = edges
            .iter()
            .map(|(t, deps)| (t.to_string(), deps.iter().map(|d| d.to_string()).collect()))
            .collect::<HashMap<_, _>>();
        (tasks, DependencyGraph::from(map))
    }

    #[test]
    fn test_valid_empty_graph() {
        let (tasks, g) = graph(&[]);
        assert!(validate_task_graph(&tasks, &g).is_ok());
    }

    #[test]
    fn test_valid_linear_chain() {
        let (tasks, g) = graph(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
        assert!(validate_task_graph(&tasks, &g).is_ok());
    }

    #[test]
    fn test_valid_diamond_dependency() {
        let (tasks, g) = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
        assert!(validate_task_graph(&tasks, &g).is_ok());
    }

    #[test]
    fn test_duplicate_task() {
        let (mut tasks, g) = graph(&[("a", &[])]);
        tasks.push("a".to_string());

        let errors = validate_task_graph(&tasks, &g).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::DuplicateTask { .. }));
    }

    #[test]
    fn test_unresolved_dependency() {
        let (tasks, g) = graph(&[("a", &[]), ("b", &["nonexistent"])]);

        let errors = validate_task_graph(&tasks, &g).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnresolvedDependency {
                task_id: "b".to_string(),
                missing_dependency: "nonexistent".to_string(),
            }]
        );
    }

    #[test]
    fn test_self_dependency_cycle() {
        let (tasks, g) = graph(&[("a", &["a"])]);

        let errors = validate_task_graph(&tasks, &g).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::CyclicDependency {
                cycle: vec!["a".to_string(), "a".to_string()],
            }]
        );
    }

    #[test]
    fn test_complex_cycle() {
        // b -> c -> d -> b
        let (tasks, g) = graph(&[("a", &["b"]), ("b", &["d"]), ("c", &["b"]), ("d", &["c"])]);

        let errors = validate_task_graph(&tasks, &g).unwrap_err();
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            ValidationError::CyclicDependency { cycle } => {
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 4);
            }
            other => panic!("Expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_check_skipped_when_references_fail() {
        let (tasks, g) = graph(&[("a", &["a", "missing"])]);

        let errors = validate_task_graph(&tasks, &g).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::UnresolvedDependency { .. }));
    }
}
