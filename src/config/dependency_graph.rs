// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Newtype wrapper for a task dependency graph: task name -> names of the tasks
/// it depends on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph(pub HashMap<String, Vec<String>>);

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Record the dependencies of a task, replacing any previous entry
    pub fn add_dependencies(&mut self, task_id: String, dependencies: Vec<String>) {
        self.0.insert(task_id, dependencies);
    }

    /// Get the dependencies of a task. Unknown tasks have none.
    pub fn dependencies_of(&self, task_id: &str) -> &[String] {
        self.0.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get all task IDs that have an entry in the graph
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Build the forward view (task -> tasks that depend on it)
    pub fn build_dependents(&self) -> HashMap<String, Vec<String>> {
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for (task_id, dependencies) in &self.0 {
            dependents.entry(task_id.clone()).or_default();
            for dependency in dependencies {
                dependents
                    .entry(dependency.clone())
                    .or_default()
                    .push(task_id.clone());
            }
        }
        dependents
    }
}

impl From<HashMap<String, Vec<String>>> for DependencyGraph {
    fn from(graph: HashMap<String, Vec<String>>) -> Self {
        Self(graph)
    }
}

impl From<DependencyGraph> for HashMap<String, Vec<String>> {
    fn from(graph: DependencyGraph) -> Self {
        graph.0
    }
}
