// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for deployment against a remote scheduler.
//!
//! Deployment replaces rather than merges, so every delete is logged as well as
//! every create. A failure between the two leaves no active job and the log is
//! the only record of what was removed.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Deployment of one pipeline to one environment started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DeploymentStarted<'a> {
    pub pipeline: &'a str,
    pub environment: &'a str,
    pub deployed_name: &'a str,
}

impl Display for DeploymentStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Deploying {} ({}) as '{}'",
            self.pipeline, self.environment, self.deployed_name
        )
    }
}

impl StructuredLog for DeploymentStarted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            environment = self.environment,
            deployed_name = self.deployed_name,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "deploy",
            span_name = name,
            pipeline = self.pipeline,
            environment = self.environment,
        )
    }
}

/// A scheduler resource (pipeline, job) was deleted to make room for its
/// replacement.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ResourceDeleted<'a> {
    pub kind: &'a str,
    pub name: &'a str,
    pub id: &'a str,
}

impl Display for ResourceDeleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Deleted existing {}: {} ({})", self.kind, self.name, self.id)
    }
}

impl StructuredLog for ResourceDeleted<'_> {
    fn log(&self) {
        tracing::info!(kind = self.kind, name = self.name, id = self.id, "{}", self);
    }
}

/// A scheduler resource (pipeline, experiment, job) was created.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ResourceCreated<'a> {
    pub kind: &'a str,
    pub name: &'a str,
    pub id: &'a str,
}

impl Display for ResourceCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Created {}: {} ({})", self.kind, self.name, self.id)
    }
}

impl StructuredLog for ResourceCreated<'_> {
    fn log(&self) {
        tracing::info!(kind = self.kind, name = self.name, id = self.id, "{}", self);
    }
}
