// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for operation registration and invocation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An operation was registered against the trace being built.
///
/// # Log Level
/// `debug!` - Trace passes happen at every start-up
pub struct OperationRegistered<'a> {
    pub pipeline: &'a str,
    pub operation: &'a str,
    pub literal_count: usize,
    pub upstream_count: usize,
}

impl Display for OperationRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered operation '{}' on pipeline '{}': {} literal, {} upstream bindings",
            self.operation, self.pipeline, self.literal_count, self.upstream_count
        )
    }
}

impl StructuredLog for OperationRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            pipeline = self.pipeline,
            operation = self.operation,
            literal_count = self.literal_count,
            upstream_count = self.upstream_count,
            "{}", self
        );
    }
}

/// An operation body is about to run.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use pipewright::observability::messages::operation::OperationInvoked;
///
/// let msg = OperationInvoked {
///     pipeline: "simples",
///     operation: "adjust_greeting",
///     run_id: "local-20250101",
///     argument_count: 1,
/// };
///
/// assert!(msg.to_string().contains("adjust_greeting"));
/// ```
pub struct OperationInvoked<'a> {
    pub pipeline: &'a str,
    pub operation: &'a str,
    pub run_id: &'a str,
    pub argument_count: usize,
}

impl Display for OperationInvoked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Invoking operation '{}' of pipeline '{}' (run '{}') with {} arguments",
            self.operation, self.pipeline, self.run_id, self.argument_count
        )
    }
}

impl StructuredLog for OperationInvoked<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            operation = self.operation,
            run_id = self.run_id,
            argument_count = self.argument_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "operation",
            span_name = name,
            pipeline = self.pipeline,
            operation = self.operation,
            run_id = self.run_id,
        )
    }
}

/// An operation body returned and its output was written.
///
/// # Log Level
/// `info!` - Important operational event
pub struct OperationCompleted<'a> {
    pub operation: &'a str,
    pub output_path: &'a std::path::Path,
    pub duration: std::time::Duration,
}

impl Display for OperationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Operation '{}' completed in {:?}, output written to {}",
            self.operation,
            self.duration,
            self.output_path.display()
        )
    }
}

impl StructuredLog for OperationCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            operation = self.operation,
            output_path = %self.output_path.display(),
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// An operation body failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct OperationFailed<'a> {
    pub operation: &'a str,
    pub error: &'a dyn std::fmt::Display,
}

impl Display for OperationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Operation '{}' failed: {}", self.operation, self.error)
    }
}

impl StructuredLog for OperationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            operation = self.operation,
            error = %self.error,
            "{}", self
        );
    }
}
