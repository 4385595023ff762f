// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use serde_json::Value;

use crate::config::consts::RESERVED_COMMANDS;
use crate::errors::{EngineError, Result};
use crate::observability::messages::operation::OperationRegistered;
use crate::observability::messages::StructuredLog;
use crate::pipeline::{Arguments, ContainerSpec, OperationContext, OperationFn, OperationNode};
use crate::trace::{Binding, Bindings, OperationHandle};
use crate::utils::sanitize_k8s_name;

/// The operations captured so far for one pipeline.
pub struct Trace {
    pipeline: String,
    deploying: bool,
    container_template: ContainerSpec,
    nodes: Vec<OperationNode>,
}

impl Trace {
    pub fn new(pipeline: &str, container_template: ContainerSpec, deploying: bool) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            deploying,
            container_template,
            nodes: Vec::new(),
        }
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// Whether this trace was taken to build a deployment rather than to run.
    pub fn is_deploying(&self) -> bool {
        self.deploying
    }

    /// Nodes in registration order.
    pub fn nodes(&self) -> &[OperationNode] {
        &self.nodes
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.nodes.iter().any(|n| n.name() == operation)
    }

    pub fn into_nodes(self) -> Vec<OperationNode> {
        self.nodes
    }

    /// Reject handles produced by a different pipeline's trace.
    pub fn check_handle(&self, handle: &OperationHandle) -> Result<()> {
        if handle.pipeline() != self.pipeline {
            return Err(EngineError::configuration(format!(
                "operation '{}' belongs to pipeline '{}', not '{}'",
                handle.operation(),
                handle.pipeline(),
                self.pipeline
            )));
        }
        Ok(())
    }
}

/// Names end up in output file paths, CLI placeholders and container names.
fn check_operation_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EngineError::configuration("operation name must not be empty"));
    }
    if RESERVED_COMMANDS.contains(&name) {
        return Err(EngineError::configuration(format!(
            "operation name '{}' is reserved",
            name
        )));
    }
    if name.contains(['/', '\\', '{', '}']) || name.contains("..") {
        return Err(EngineError::configuration(format!(
            "operation name '{}' must not contain path separators, braces or '..'",
            name
        )));
    }
    Ok(())
}

/// Holds the trace that operation calls register against.
///
/// One context is created per trace pass and handed to the pipeline function
/// by `&mut` reference. `enter` and `exit` form a depth-one stack: entering
/// while a trace is current remembers it, exiting restores it. A second nested
/// `enter` overwrites the remembered trace.
///
/// # Example
/// ```
/// use pipewright::pipeline::ContainerSpec;
/// use pipewright::trace::{Bindings, Trace, TracingContext};
///
/// let mut ctx = TracingContext::new();
/// ctx.enter(Trace::new("simples", ContainerSpec::default(), false));
///
/// let greeting = ctx
///     .add_operation("build_greeting", |_, _| Ok(None), Bindings::new().literal("message", "hi"))
///     .unwrap();
/// assert_eq!(greeting.operation(), "build_greeting");
///
/// let trace = ctx.exit().unwrap();
/// assert_eq!(trace.nodes().len(), 1);
/// assert!(!ctx.is_active());
/// ```
#[derive(Default)]
pub struct TracingContext {
    current: Option<Trace>,
    previous: Option<Trace>,
}

impl TracingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `trace` current, remembering the trace it replaces.
    pub fn enter(&mut self, trace: Trace) {
        self.previous = self.current.replace(trace);
    }

    /// Restore the remembered trace and return the one that was current.
    pub fn exit(&mut self) -> Option<Trace> {
        let finished = self.current.take();
        self.current = self.previous.take();
        finished
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Trace> {
        self.current.as_ref()
    }

    /// Register an operation against the current trace.
    ///
    /// Fails with a configuration error when no trace is current, when the
    /// name is unusable or already taken (directly or as a container name), or
    /// when a binding refers to an operation that was not registered earlier
    /// in this trace.
    pub fn add_operation<F>(
        &mut self,
        name: &str,
        func: F,
        bindings: Bindings,
    ) -> Result<OperationHandle>
    where
        F: Fn(&OperationContext, &Arguments) -> anyhow::Result<Option<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, Arc::new(func), bindings)
    }

    pub(crate) fn register(
        &mut self,
        name: &str,
        func: OperationFn,
        bindings: Bindings,
    ) -> Result<OperationHandle> {
        let trace = self.current.as_mut().ok_or_else(|| {
            EngineError::configuration(format!(
                "no pipeline is currently being traced (operation '{}')",
                name
            ))
        })?;

        check_operation_name(name)?;
        if trace.contains(name) {
            return Err(EngineError::configuration(format!(
                "operation '{}' is already registered on pipeline '{}'",
                name, trace.pipeline
            )));
        }

        let k8s_name = sanitize_k8s_name(name);
        if k8s_name.is_empty() {
            return Err(EngineError::configuration(format!(
                "operation name '{}' has no characters usable in a container name",
                name
            )));
        }
        if let Some(clash) = trace.nodes.iter().find(|n| n.k8s_name() == k8s_name) {
            return Err(EngineError::configuration(format!(
                "operations '{}' and '{}' both map to container name '{}'",
                clash.name(),
                name,
                k8s_name
            )));
        }

        for handle in bindings.handles() {
            trace.check_handle(handle)?;
        }
        for upstream in bindings.upstream_names() {
            if !trace.contains(&upstream) {
                return Err(EngineError::configuration(format!(
                    "operation '{}' refers to '{}', which is not registered earlier on pipeline '{}'",
                    name, upstream, trace.pipeline
                )));
            }
        }

        let upstream_count = bindings
            .iter()
            .filter(|(_, b)| matches!(b, Binding::Upstream(_)))
            .count();
        OperationRegistered {
            pipeline: &trace.pipeline,
            operation: name,
            literal_count: bindings.len() - upstream_count,
            upstream_count,
        }
        .log();

        let node = OperationNode::new(
            &trace.pipeline,
            name,
            func,
            bindings,
            &trace.container_template,
        )?;
        trace.nodes.push(node);

        Ok(OperationHandle::new(&trace.pipeline, name))
    }

    /// Reject handles produced by a different pipeline's trace.
    pub fn check_handle(&self, handle: &OperationHandle) -> Result<()> {
        match &self.current {
            Some(trace) => trace.check_handle(handle),
            None => Err(EngineError::configuration(
                "no pipeline is currently being traced",
            )),
        }
    }
}
