// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Command surface of an application.
//!
//! ```text
//! <app> pipelines <pipeline> run-all
//! <app> pipelines <pipeline> deploy-dev  [host] [client-id] [namespace]
//! <app> pipelines <pipeline> deploy-prod [host] [client-id] [namespace]
//! <app> pipelines <pipeline> <operation> [--<param> <value>]...
//! ```
//!
//! The tree is only known once every pipeline has been traced, so it is built
//! with clap's builder API rather than derived.

use std::collections::HashMap;

use anyhow::Context;
use clap::{Arg, ArgMatches, Command};

use crate::config::consts::{CMD_DEPLOY_DEV, CMD_DEPLOY_PROD, CMD_RUN_ALL};
use crate::deploy::{Environment, SchedulerEndpoint};
use crate::pipeline::{ExecutionContext, PipelineApp};

const CMD_PIPELINES: &str = "pipelines";
const ARG_HOST: &str = "host";
const ARG_CLIENT_ID: &str = "client-id";
const ARG_NAMESPACE: &str = "namespace";

pub fn build_command(app: &PipelineApp) -> Command {
    let mut pipelines = Command::new(CMD_PIPELINES)
        .about("Run, deploy or step through a pipeline")
        .subcommand_required(true)
        .arg_required_else_help(true);

    for graph in app.pipelines() {
        let mut command = Command::new(graph.name().to_string())
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(
                Command::new(CMD_RUN_ALL).about("Run every operation locally, dependencies first"),
            )
            .subcommand(deploy_command(CMD_DEPLOY_DEV, "Deploy to the dev environment"))
            .subcommand(deploy_command(CMD_DEPLOY_PROD, "Deploy to the prod environment"));

        for node in graph.nodes() {
            let mut op = Command::new(node.name().to_string())
                .about(format!("Run the '{}' operation once", node.name()));
            for (param, _) in node.bindings().iter() {
                op = op.arg(
                    Arg::new(param.to_string())
                        .long(param.to_string())
                        .value_name("JSON")
                        .num_args(1),
                );
            }
            command = command.subcommand(op);
        }

        pipelines = pipelines.subcommand(command);
    }

    Command::new(app.name().to_string())
        .version(clap::crate_version!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(pipelines)
}

fn deploy_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(Arg::new(ARG_HOST).help("Scheduler API host"))
        .arg(Arg::new(ARG_CLIENT_ID).help("Client id used to authenticate"))
        .arg(Arg::new(ARG_NAMESPACE).help("Namespace to deploy into"))
}

/// Run the command selected by `matches`.
pub fn dispatch(
    app: &mut PipelineApp,
    matches: &ArgMatches,
    execution: &ExecutionContext,
) -> anyhow::Result<()> {
    let pipelines = matches
        .subcommand_matches(CMD_PIPELINES)
        .context("expected the 'pipelines' command")?;
    let (pipeline, pipeline_matches) = pipelines
        .subcommand()
        .context("expected a pipeline name")?;
    let (command, command_matches) = pipeline_matches
        .subcommand()
        .context("expected a pipeline command")?;

    match command {
        CMD_RUN_ALL => {
            app.run_all(pipeline, execution)?;
        }
        CMD_DEPLOY_DEV | CMD_DEPLOY_PROD => {
            let environment = if command == CMD_DEPLOY_DEV {
                Environment::Dev
            } else {
                Environment::Prod
            };
            let endpoint = SchedulerEndpoint::new(
                command_matches.get_one::<String>(ARG_HOST).cloned(),
                command_matches.get_one::<String>(ARG_CLIENT_ID).cloned(),
                command_matches
                    .get_one::<String>(ARG_NAMESPACE)
                    .map(String::as_str)
                    .unwrap_or(app.config().k8s_namespace.as_str()),
            );
            app.deploy(pipeline, environment, &endpoint)?;
        }
        operation => {
            let params: Vec<String> = app
                .pipeline(pipeline)
                .and_then(|graph| graph.node(operation))
                .map(|node| node.bindings().iter().map(|(p, _)| p.to_string()).collect())
                .unwrap_or_default();

            let raw: HashMap<String, String> = params
                .into_iter()
                .filter_map(|param| {
                    let value = command_matches.get_one::<String>(&param).cloned()?;
                    Some((param, value))
                })
                .collect();

            app.run_task(pipeline, operation, &raw, execution)?;
        }
    }
    Ok(())
}
