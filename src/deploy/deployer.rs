// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::JOB_MAX_CONCURRENCY;
use crate::deploy::{
    Environment, ExperimentRecord, JobRecord, JobRequest, PipelineRecord, SchedulerClient,
};
use crate::errors::Result;
use crate::observability::messages::deploy::{
    DeploymentStarted, ResourceCreated, ResourceDeleted,
};
use crate::observability::messages::StructuredLog;
use crate::pipeline::{GraphCompiler, OpConfigurator, PipelineGraph};

/// What a deployment created and replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentReport {
    /// `<pipeline> - <environment>`
    pub deployed_name: String,
    pub pipeline: PipelineRecord,
    /// Id of the pipeline deleted to make room, if any
    pub replaced_pipeline: Option<String>,
    pub experiment_name: String,
    /// Only set when the pipeline has a cron
    pub experiment: Option<ExperimentRecord>,
    pub job: Option<JobRecord>,
    pub replaced_job: Option<String>,
}

/// Replace the deployed version of `graph` in `environment`.
///
/// 1. delete the pipeline named `<pipeline> - <environment>`, if present
/// 2. trace again, build the workflow and create the pipeline
/// 3. with a cron bound: find or create the experiment, delete the job named
///    `<deployed name> cron`, create a fresh enabled job
///
/// Not transactional. The first failing call aborts the deployment and
/// nothing already deleted is restored.
pub fn deploy_pipeline(
    graph: &PipelineGraph,
    environment: Environment,
    client: &mut dyn SchedulerClient,
    configurators: &[OpConfigurator],
    compiler: &dyn GraphCompiler,
) -> Result<DeploymentReport> {
    let environment_name = environment.to_string();
    let deployed_name = format!("{} - {}", graph.name(), environment_name);

    let started = DeploymentStarted {
        pipeline: graph.name(),
        environment: &environment_name,
        deployed_name: &deployed_name,
    };
    started.log();
    let span = started.span("deploy_pipeline");
    let _guard = span.enter();

    let replaced_pipeline = match client.find_pipeline(&deployed_name)? {
        Some(existing) => {
            client.delete_pipeline(&existing.id)?;
            ResourceDeleted {
                kind: "pipeline",
                name: &existing.name,
                id: &existing.id,
            }
            .log();
            Some(existing.id)
        }
        None => None,
    };

    let workflow = graph.build_workflow(&deployed_name, configurators, compiler)?;
    let pipeline = client.create_pipeline(&deployed_name, &workflow)?;
    ResourceCreated {
        kind: "pipeline",
        name: &pipeline.name,
        id: &pipeline.id,
    }
    .log();

    let experiment_name = graph
        .experiment()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} experiments", deployed_name));

    let mut report = DeploymentReport {
        deployed_name,
        pipeline,
        replaced_pipeline,
        experiment_name,
        experiment: None,
        job: None,
        replaced_job: None,
    };

    let Some(cron) = graph.cron() else {
        return Ok(report);
    };

    let experiment = match client.find_experiment(&report.experiment_name)? {
        Some(existing) => existing,
        None => {
            let created = client.create_experiment(&report.experiment_name)?;
            ResourceCreated {
                kind: "experiment",
                name: &created.name,
                id: &created.id,
            }
            .log();
            created
        }
    };

    let job_name = format!("{} cron", report.deployed_name);
    if let Some(existing) = client.find_job(&job_name)? {
        client.delete_job(&existing.id)?;
        ResourceDeleted {
            kind: "job",
            name: &existing.name,
            id: &existing.id,
        }
        .log();
        report.replaced_job = Some(existing.id);
    }

    let job = client.create_job(JobRequest {
        name: job_name,
        pipeline_id: report.pipeline.id.clone(),
        experiment_id: experiment.id.clone(),
        description: format!("{} cron job", report.deployed_name),
        cron: cron.to_string(),
        enabled: true,
        max_concurrency: JOB_MAX_CONCURRENCY,
    })?;
    ResourceCreated {
        kind: "job",
        name: &job.name,
        id: &job.id,
    }
    .log();

    report.experiment = Some(experiment);
    report.job = Some(job);
    Ok(report)
}
