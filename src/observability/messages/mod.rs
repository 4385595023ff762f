// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `engine` - tracing and local run lifecycle
//! * `operation` - single operation registration and invocation
//! * `deploy` - scheduler-side replacement of pipelines, experiments and jobs
//! * `artifact` - manifest reads and writes

use tracing::Span;

pub mod artifact;
pub mod deploy;
pub mod engine;
pub mod operation;

/// A message that knows its log level and its structured fields.
pub trait StructuredLog {
    /// Emit the message at its level, fields attached.
    fn log(&self);

    /// A span carrying the same fields, for work done on behalf of the message.
    fn span(&self, name: &str) -> Span {
        tracing::info_span!("pipewright", span_name = name)
    }
}
