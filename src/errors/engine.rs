// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error taxonomy for tracing, executing and deploying pipelines.
//!
//! Nothing here is retried by the engine. Every variant surfaces to the caller;
//! retry, if any, belongs to whatever schedules containerized steps.

use thiserror::Error;

use super::ValidationError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Tracing context missing, or a required construction parameter is absent
    /// or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An operation was invoked twice in one run, or a task was requested that
    /// the compiled graph does not contain.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A persisted manifest is missing one of its required keys.
    #[error("artifact manifest '{key}' is corrupt: missing '{missing}'")]
    ManifestCorruption { key: String, missing: &'static str },

    /// The body of an operation failed. The underlying error is kept as the source.
    #[error("operation '{operation}' failed: {source}")]
    UpstreamFailure {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// The compiled dependency graph is not executable.
    #[error("graph validation failed: {}", join_validation(.0))]
    Validation(Vec<ValidationError>),

    /// A call into the remote scheduler API failed.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl EngineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        EngineError::Configuration(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        EngineError::InvalidState(message.into())
    }

    pub fn scheduler(message: impl Into<String>) -> Self {
        EngineError::Scheduler(message.into())
    }
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_joined() {
        let err = EngineError::Validation(vec![
            ValidationError::DuplicateTask {
                task_id: "a".to_string(),
            },
            ValidationError::CyclicDependency {
                cycle: vec!["b".into(), "c".into(), "b".into()],
            },
        ]);

        assert_eq!(
            err.to_string(),
            "graph validation failed: Duplicate task: 'a'; Cyclic dependency detected: b -> c -> b"
        );
    }

    #[test]
    fn test_upstream_failure_keeps_source() {
        let err = EngineError::UpstreamFailure {
            operation: "train".to_string(),
            source: anyhow::anyhow!("boom"),
        };

        let source = std::error::Error::source(&err).expect("source should be kept");
        assert_eq!(source.to_string(), "boom");
        assert_eq!(err.to_string(), "operation 'train' failed: boom");
    }
}
