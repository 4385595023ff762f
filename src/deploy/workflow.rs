// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::pipeline::ContainerSpec;

/// One containerized step of a deployed workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub k8s_name: String,
    pub container: ContainerSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

/// What is submitted to the scheduler when a pipeline is deployed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    /// Deployed name, `<pipeline> - <environment>`
    pub name: String,
    pub pipeline: String,
    pub tasks: Vec<TaskSpec>,
}

impl WorkflowSpec {
    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_keeps_tasks_and_dependencies() {
        let workflow = WorkflowSpec {
            name: "simples - dev".to_string(),
            pipeline: "simples".to_string(),
            tasks: vec![
                TaskSpec {
                    name: "build_greeting".to_string(),
                    k8s_name: "build-greeting".to_string(),
                    container: ContainerSpec::default(),
                    dependencies: vec![],
                },
                TaskSpec {
                    name: "adjust_greeting".to_string(),
                    k8s_name: "adjust-greeting".to_string(),
                    container: ContainerSpec::default(),
                    dependencies: vec!["build_greeting".to_string()],
                },
            ],
        };

        let yaml = workflow.to_yaml().unwrap();
        assert!(yaml.contains("name: simples - dev"));
        assert!(!yaml.contains("secrets"));

        let parsed = WorkflowSpec::from_yaml(&yaml).unwrap();
        assert_eq!(
            parsed.task("adjust_greeting").map(|t| t.dependencies.clone()),
            Some(vec!["build_greeting".to_string()])
        );
    }
}
