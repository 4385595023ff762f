// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deployment of traced pipelines to a scheduler.

mod deployer;
mod directory;
mod memory;
mod scheduler;
mod workflow;

#[cfg(test)]
mod integration_tests;

pub use deployer::{deploy_pipeline, DeploymentReport};
pub use directory::DirectoryScheduler;
pub use memory::InMemoryScheduler;
pub use scheduler::{
    Environment, ExperimentRecord, JobRecord, JobRequest, PipelineRecord, SchedulerClient,
    SchedulerEndpoint,
};
pub use workflow::{TaskSpec, WorkflowSpec};
