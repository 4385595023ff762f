// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors found while validating a compiled task graph
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A circular dependency was detected between tasks
    CyclicDependency {
        /// The cycle path, first task repeated at the end
        cycle: Vec<String>,
    },
    /// A task lists a dependency that is not a task of the graph
    UnresolvedDependency {
        /// The task that has the unresolved dependency
        task_id: String,
        /// The dependency that couldn't be resolved
        missing_dependency: String,
    },
    /// The same task name appears more than once in the task list
    DuplicateTask {
        task_id: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedDependency {
                task_id,
                missing_dependency,
            } => {
                write!(
                    f,
                    "Task '{}' depends on '{}' which does not exist",
                    task_id, missing_dependency
                )
            }
            ValidationError::DuplicateTask { task_id } => {
                write!(f, "Duplicate task: '{}'", task_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
