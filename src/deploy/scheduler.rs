// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deploy::WorkflowSpec;
use crate::errors::Result;

/// Deployment target environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Dev => write!(f, "dev"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}

/// Where and as whom to deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerEndpoint {
    pub host: Option<String>,
    pub client_id: Option<String>,
    pub namespace: String,
}

impl SchedulerEndpoint {
    pub fn new(host: Option<String>, client_id: Option<String>, namespace: &str) -> Self {
        Self {
            host,
            client_id,
            namespace: namespace.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub id: String,
    pub name: String,
    pub workflow: WorkflowSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub id: String,
    pub name: String,
}

/// A recurring run of a deployed pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub name: String,
    pub pipeline_id: String,
    pub experiment_id: String,
    pub description: String,
    pub cron: String,
    pub enabled: bool,
    pub max_concurrency: u32,
}

/// Everything needed to create a job; the scheduler assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub name: String,
    pub pipeline_id: String,
    pub experiment_id: String,
    pub description: String,
    pub cron: String,
    pub enabled: bool,
    pub max_concurrency: u32,
}

/// The remote scheduler API, narrowed to what deployment uses.
///
/// Names are looked up exactly. Deleting an id that does not exist is an
/// error.
pub trait SchedulerClient {
    fn find_pipeline(&self, name: &str) -> Result<Option<PipelineRecord>>;
    fn delete_pipeline(&mut self, id: &str) -> Result<()>;
    fn create_pipeline(&mut self, name: &str, workflow: &WorkflowSpec) -> Result<PipelineRecord>;

    fn find_experiment(&self, name: &str) -> Result<Option<ExperimentRecord>>;
    fn create_experiment(&mut self, name: &str) -> Result<ExperimentRecord>;

    fn find_job(&self, name: &str) -> Result<Option<JobRecord>>;
    fn delete_job(&mut self, id: &str) -> Result<()>;
    fn create_job(&mut self, request: JobRequest) -> Result<JobRecord>;
}
