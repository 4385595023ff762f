// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use crate::deploy::{
    ExperimentRecord, InMemoryScheduler, JobRecord, JobRequest, PipelineRecord, SchedulerClient,
    WorkflowSpec,
};
use crate::errors::Result;

const STATE_FILE_NAME: &str = "state.yaml";
const WORKFLOWS_DIR: &str = "workflows";

/// A scheduler whose state lives in a directory, one directory per namespace.
///
/// Every successful mutation rewrites `state.yaml`. Created pipelines also
/// get their workflow written to `workflows/<id>.yaml` for inspection.
#[derive(Debug)]
pub struct DirectoryScheduler {
    root: PathBuf,
    state: InMemoryScheduler,
}

impl DirectoryScheduler {
    /// Open the scheduler at `root`, loading any previous state.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let state_path = root.join(STATE_FILE_NAME);
        let state = if state_path.is_file() {
            serde_yaml::from_str(&fs::read_to_string(&state_path)?)?
        } else {
            InMemoryScheduler::default()
        };
        Ok(Self { root, state })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> &InMemoryScheduler {
        &self.state
    }

    fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(
            self.root.join(STATE_FILE_NAME),
            serde_yaml::to_string(&self.state)?,
        )?;
        Ok(())
    }
}

impl SchedulerClient for DirectoryScheduler {
    fn find_pipeline(&self, name: &str) -> Result<Option<PipelineRecord>> {
        self.state.find_pipeline(name)
    }

    fn delete_pipeline(&mut self, id: &str) -> Result<()> {
        self.state.delete_pipeline(id)?;
        let workflow = self.root.join(WORKFLOWS_DIR).join(format!("{}.yaml", id));
        if workflow.is_file() {
            fs::remove_file(workflow)?;
        }
        self.save()
    }

    fn create_pipeline(&mut self, name: &str, workflow: &WorkflowSpec) -> Result<PipelineRecord> {
        let record = self.state.create_pipeline(name, workflow)?;
        let workflows = self.root.join(WORKFLOWS_DIR);
        fs::create_dir_all(&workflows)?;
        fs::write(
            workflows.join(format!("{}.yaml", record.id)),
            workflow.to_yaml()?,
        )?;
        self.save()?;
        Ok(record)
    }

    fn find_experiment(&self, name: &str) -> Result<Option<ExperimentRecord>> {
        self.state.find_experiment(name)
    }

    fn create_experiment(&mut self, name: &str) -> Result<ExperimentRecord> {
        let record = self.state.create_experiment(name)?;
        self.save()?;
        Ok(record)
    }

    fn find_job(&self, name: &str) -> Result<Option<JobRecord>> {
        self.state.find_job(name)
    }

    fn delete_job(&mut self, id: &str) -> Result<()> {
        self.state.delete_job(id)?;
        self.save()
    }

    fn create_job(&mut self, request: JobRequest) -> Result<JobRecord> {
        let record = self.state.create_job(request)?;
        self.save()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_state_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("kubeflow");
        let workflow = WorkflowSpec {
            name: "simples - dev".to_string(),
            pipeline: "simples".to_string(),
            tasks: vec![],
        };

        let created = {
            let mut scheduler = DirectoryScheduler::open(&root).unwrap();
            scheduler.create_experiment("simples - dev experiments").unwrap();
            scheduler.create_pipeline("simples - dev", &workflow).unwrap()
        };
        assert!(root.join("workflows").join(format!("{}.yaml", created.id)).is_file());

        let mut reopened = DirectoryScheduler::open(&root).unwrap();
        assert_eq!(reopened.find_pipeline("simples - dev").unwrap(), Some(created.clone()));
        assert_eq!(reopened.state().experiments().len(), 1);

        reopened.delete_pipeline(&created.id).unwrap();
        let again = DirectoryScheduler::open(&root).unwrap();
        assert!(again.find_pipeline("simples - dev").unwrap().is_none());
        assert!(!root.join("workflows").join(format!("{}.yaml", created.id)).exists());
    }
}
