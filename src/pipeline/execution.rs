// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::consts::{ENV_HOSTNAME, ENV_TEMP_DIR, ENV_WORKFLOW_ID, UNKNOWN_HOST};

/// Values bound into every operation invocation of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    run_id: String,
    host: String,
    temp_dir: PathBuf,
    in_container: bool,
}

impl ExecutionContext {
    /// A local run with the given id, writing under `temp_dir`.
    pub fn new(run_id: &str, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_id: run_id.to_string(),
            host: UNKNOWN_HOST.to_string(),
            temp_dir: temp_dir.into(),
            in_container: false,
        }
    }

    /// Mark the run as executing inside a scheduled container.
    pub fn containerized(mut self) -> Self {
        self.in_container = true;
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn from_env() -> Self {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Build from `KF_WORKFLOW_ID`, `HOSTNAME` and `HML_TMP`.
    ///
    /// A workflow id means the process was started by the scheduler, so the run
    /// is containerized. Without one a fresh local run id is generated.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let (run_id, in_container) = match vars.get(ENV_WORKFLOW_ID) {
            Some(id) if !id.is_empty() => (id.clone(), true),
            _ => (local_run_id(), false),
        };
        let host = vars
            .get(ENV_HOSTNAME)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_HOST.to_string());
        let temp_dir = vars
            .get(ENV_TEMP_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Self {
            run_id,
            host,
            temp_dir,
            in_container,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn in_container(&self) -> bool {
        self.in_container
    }
}

/// Run id for a run not started by the scheduler.
pub fn local_run_id() -> String {
    format!("local-{}", Utc::now().format("%Y%m%d%H%M%S%3f"))
}

/// Well-known location of a task's output document inside an output directory.
pub fn output_path(output_dir: &Path, task: &str) -> PathBuf {
    output_dir.join(format!("{}.json", task))
}
