// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Container-local directory every deployed step writes its output document to
pub const CONTAINER_OUTPUT_DIR: &str = "/hml-outputs";
/// Directory created under the temp root for local runs
pub const LOCAL_OUTPUT_DIR: &str = "pipewright";

/// Run / workflow identifier, only present inside a scheduled container
pub const ENV_WORKFLOW_ID: &str = "KF_WORKFLOW_ID";
/// Host or pod identifier
pub const ENV_HOSTNAME: &str = "HOSTNAME";
/// Override for the local temp root
pub const ENV_TEMP_DIR: &str = "HML_TMP";
/// Prefix for application config overrides (`HML_IMAGE_URL`, ...)
pub const ENV_CONFIG_PREFIX: &str = "HML_";

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_K8S_NAMESPACE: &str = "kubeflow";
pub const DEFAULT_LAKE_PATH: &str = "./lake";
pub const DEFAULT_SCHEDULER_PATH: &str = "./.scheduler";
pub const UNKNOWN_HOST: &str = "unknown";

/// File name of the per-run artifact manifest
pub const MANIFEST_FILE_NAME: &str = "hml-package.json";

/// Pipeline subcommands an operation may not shadow
pub const CMD_RUN_ALL: &str = "run-all";
pub const CMD_DEPLOY_DEV: &str = "deploy-dev";
pub const CMD_DEPLOY_PROD: &str = "deploy-prod";
pub const RESERVED_COMMANDS: [&str; 3] = [CMD_RUN_ALL, CMD_DEPLOY_DEV, CMD_DEPLOY_PROD];

/// Scheduled jobs never overlap with themselves
pub const JOB_MAX_CONCURRENCY: u32 = 1;
