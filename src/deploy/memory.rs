// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::deploy::{
    ExperimentRecord, JobRecord, JobRequest, PipelineRecord, SchedulerClient, WorkflowSpec,
};
use crate::errors::{EngineError, Result};

/// A scheduler that keeps its pipelines, experiments and jobs in memory.
///
/// Ids come from one counter shared by every kind (`pipeline-1`,
/// `experiment-2`, ...). The whole state is serializable so
/// [`DirectoryScheduler`](super::DirectoryScheduler) can persist it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryScheduler {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    pipelines: Vec<PipelineRecord>,
    #[serde(default)]
    experiments: Vec<ExperimentRecord>,
    #[serde(default)]
    jobs: Vec<JobRecord>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipelines(&self) -> &[PipelineRecord] {
        &self.pipelines
    }

    pub fn experiments(&self) -> &[ExperimentRecord] {
        &self.experiments
    }

    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    fn allocate(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", kind, self.next_id)
    }
}

fn remove_by_id<T>(
    records: &mut Vec<T>,
    id: &str,
    kind: &str,
    id_of: fn(&T) -> &str,
) -> Result<()> {
    let before = records.len();
    records.retain(|r| id_of(r) != id);
    if records.len() == before {
        return Err(EngineError::scheduler(format!("no {} with id '{}'", kind, id)));
    }
    Ok(())
}

impl SchedulerClient for InMemoryScheduler {
    fn find_pipeline(&self, name: &str) -> Result<Option<PipelineRecord>> {
        Ok(self.pipelines.iter().find(|p| p.name == name).cloned())
    }

    fn delete_pipeline(&mut self, id: &str) -> Result<()> {
        remove_by_id(&mut self.pipelines, id, "pipeline", |p| p.id.as_str())
    }

    fn create_pipeline(&mut self, name: &str, workflow: &WorkflowSpec) -> Result<PipelineRecord> {
        if self.pipelines.iter().any(|p| p.name == name) {
            return Err(EngineError::scheduler(format!(
                "a pipeline named '{}' already exists",
                name
            )));
        }
        let record = PipelineRecord {
            id: self.allocate("pipeline"),
            name: name.to_string(),
            workflow: workflow.clone(),
        };
        self.pipelines.push(record.clone());
        Ok(record)
    }

    fn find_experiment(&self, name: &str) -> Result<Option<ExperimentRecord>> {
        Ok(self.experiments.iter().find(|e| e.name == name).cloned())
    }

    fn create_experiment(&mut self, name: &str) -> Result<ExperimentRecord> {
        let record = ExperimentRecord {
            id: self.allocate("experiment"),
            name: name.to_string(),
        };
        self.experiments.push(record.clone());
        Ok(record)
    }

    fn find_job(&self, name: &str) -> Result<Option<JobRecord>> {
        Ok(self.jobs.iter().find(|j| j.name == name).cloned())
    }

    fn delete_job(&mut self, id: &str) -> Result<()> {
        remove_by_id(&mut self.jobs, id, "job", |j| j.id.as_str())
    }

    fn create_job(&mut self, request: JobRequest) -> Result<JobRecord> {
        if !self.pipelines.iter().any(|p| p.id == request.pipeline_id) {
            return Err(EngineError::scheduler(format!(
                "job '{}' refers to unknown pipeline '{}'",
                request.name, request.pipeline_id
            )));
        }
        if !self.experiments.iter().any(|e| e.id == request.experiment_id) {
            return Err(EngineError::scheduler(format!(
                "job '{}' refers to unknown experiment '{}'",
                request.name, request.experiment_id
            )));
        }

        let record = JobRecord {
            id: self.allocate("job"),
            name: request.name,
            pipeline_id: request.pipeline_id,
            experiment_id: request.experiment_id,
            description: request.description,
            cron: request.cron,
            enabled: request.enabled,
            max_concurrency: request.max_concurrency,
        };
        self.jobs.push(record.clone());
        Ok(record)
    }
}
