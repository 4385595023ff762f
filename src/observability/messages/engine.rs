// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for trace passes and local run lifecycle.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A trace pass finished and its graph was compiled.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use pipewright::observability::messages::engine::TraceCompleted;
///
/// let msg = TraceCompleted {
///     pipeline: "simples",
///     operation_count: 2,
///     deploying: false,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct TraceCompleted<'a> {
    pub pipeline: &'a str,
    pub operation_count: usize,
    pub deploying: bool,
}

impl Display for TraceCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Traced pipeline '{}': {} operations (deploying={})",
            self.pipeline, self.operation_count, self.deploying
        )
    }
}

impl StructuredLog for TraceCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            operation_count = self.operation_count,
            deploying = self.deploying,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "trace",
            span_name = name,
            pipeline = self.pipeline,
            deploying = self.deploying,
        )
    }
}

/// A local `run-all` started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunStarted<'a> {
    pub pipeline: &'a str,
    pub run_id: &'a str,
    pub task_count: usize,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting run '{}' of pipeline '{}': {} tasks",
            self.run_id, self.pipeline, self.task_count
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            run_id = self.run_id,
            task_count = self.task_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            pipeline = self.pipeline,
            run_id = self.run_id,
        )
    }
}

/// A local `run-all` completed every task.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunCompleted<'a> {
    pub pipeline: &'a str,
    pub run_id: &'a str,
    pub task_count: usize,
    pub duration: std::time::Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run '{}' of pipeline '{}' completed: {} tasks in {:?}",
            self.run_id, self.pipeline, self.task_count, self.duration
        )
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            run_id = self.run_id,
            task_count = self.task_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// A local `run-all` aborted. Outputs of completed tasks stay in place.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct RunFailed<'a> {
    pub pipeline: &'a str,
    pub run_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for RunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run '{}' of pipeline '{}' failed: {}",
            self.run_id, self.pipeline, self.error
        )
    }
}

impl StructuredLog for RunFailed<'_> {
    fn log(&self) {
        tracing::error!(
            pipeline = self.pipeline,
            run_id = self.run_id,
            error = %self.error,
            "{}", self
        );
    }
}
