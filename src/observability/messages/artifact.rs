// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// No manifest existed for the run yet, so an empty one was synthesized.
///
/// # Log Level
/// `debug!` - Expected on the first artifact of every run
pub struct ManifestSynthesized<'a> {
    pub key: &'a str,
}

impl Display for ManifestSynthesized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "No manifest at '{}', starting an empty one", self.key)
    }
}

impl StructuredLog for ManifestSynthesized<'_> {
    fn log(&self) {
        tracing::debug!(key = self.key, "{}", self);
    }
}

/// An artifact was linked into the run's manifest.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ArtifactLinked<'a> {
    pub run_id: &'a str,
    pub artifact: &'a str,
    pub path: &'a str,
    pub artifact_count: usize,
}

impl Display for ArtifactLinked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Linked artifact '{}' -> '{}' for run '{}' ({} artifacts)",
            self.artifact, self.path, self.run_id, self.artifact_count
        )
    }
}

impl StructuredLog for ArtifactLinked<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            artifact = self.artifact,
            path = self.path,
            artifact_count = self.artifact_count,
            "{}", self
        );
    }
}
