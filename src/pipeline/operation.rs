// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};

use crate::artifacts::{ArtifactPackage, BlobStore};
use crate::errors::{EngineError, Result};
use crate::observability::messages::operation::{
    OperationCompleted, OperationFailed, OperationInvoked,
};
use crate::observability::messages::StructuredLog;
use crate::pipeline::arguments::{encode_binding, write_output};
use crate::pipeline::container::invocation_args;
use crate::pipeline::{Arguments, ContainerSpec, ExecutionContext};
use crate::trace::{Bindings, OperationHandle, TracingContext};
use crate::utils::sanitize_k8s_name;

/// Body of an operation.
pub type OperationFn =
    Arc<dyn Fn(&OperationContext, &Arguments) -> anyhow::Result<Option<Value>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    NotInvoked,
    Invoked,
}

/// One step of a traced pipeline.
///
/// Everything but the invocation state and the cached value is fixed when the
/// node is registered.
pub struct OperationNode {
    pipeline: String,
    name: String,
    k8s_name: String,
    bindings: Bindings,
    container: ContainerSpec,
    state: InvocationState,
    /// Run id of the invocation that set `state`
    invoked_in: Option<String>,
    cached: Option<Value>,
    func: OperationFn,
}

impl OperationNode {
    pub(crate) fn new(
        pipeline: &str,
        name: &str,
        func: OperationFn,
        bindings: Bindings,
        template: &ContainerSpec,
    ) -> Result<Self> {
        let encoded = bindings
            .iter()
            .map(|(param, binding)| Ok((param, encode_binding(binding)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut container = template.clone();
        container.args = invocation_args(pipeline, name, encoded);

        Ok(Self {
            pipeline: pipeline.to_string(),
            name: name.to_string(),
            k8s_name: sanitize_k8s_name(name),
            bindings,
            container,
            state: InvocationState::NotInvoked,
            invoked_in: None,
            cached: None,
            func,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Container-safe form of the name.
    pub fn k8s_name(&self) -> &str {
        &self.k8s_name
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Names of the operations this one must run after.
    pub fn dependencies(&self) -> Vec<String> {
        self.bindings.upstream_names()
    }

    pub fn container(&self) -> &ContainerSpec {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut ContainerSpec {
        &mut self.container
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    pub fn is_invoked(&self) -> bool {
        self.state == InvocationState::Invoked
    }

    /// Run id of the invocation since the last reset.
    pub fn invoked_in(&self) -> Option<&str> {
        self.invoked_in.as_deref()
    }

    /// Value returned by the last successful invocation in this run.
    pub fn cached(&self) -> Option<&Value> {
        self.cached.as_ref()
    }

    /// Run the body once and write its output to `output_path`.
    ///
    /// A body returning nothing produces an empty mapping. The node counts as
    /// invoked even when the body fails, so a failed step is not run again in
    /// the same run.
    pub fn invoke(
        &mut self,
        ctx: &OperationContext,
        args: &Arguments,
        output_path: &Path,
    ) -> Result<&Value> {
        if self.is_invoked() {
            return Err(EngineError::invalid_state(format!(
                "operation '{}' of pipeline '{}' was already invoked in run '{}' and must be reset before run '{}'",
                self.name,
                self.pipeline,
                self.invoked_in.as_deref().unwrap_or_default(),
                ctx.run_id()
            )));
        }
        self.state = InvocationState::Invoked;
        self.invoked_in = Some(ctx.run_id().to_string());

        let invoked = OperationInvoked {
            pipeline: &self.pipeline,
            operation: &self.name,
            run_id: ctx.run_id(),
            argument_count: args.len(),
        };
        invoked.log();
        let span = invoked.span("invoke");
        let _guard = span.enter();

        let started = Instant::now();
        let value = match (self.func)(ctx, args) {
            Ok(None) | Ok(Some(Value::Null)) => Value::Object(Map::new()),
            Ok(Some(value)) => value,
            Err(source) => {
                OperationFailed {
                    operation: &self.name,
                    error: &source,
                }
                .log();
                return Err(EngineError::UpstreamFailure {
                    operation: self.name.clone(),
                    source,
                });
            }
        };

        write_output(output_path, &value)?;
        OperationCompleted {
            operation: &self.name,
            output_path,
            duration: started.elapsed(),
        }
        .log();

        Ok(&*self.cached.insert(value))
    }

    /// Forget the previous run.
    pub fn reset(&mut self) {
        self.state = InvocationState::NotInvoked;
        self.invoked_in = None;
        self.cached = None;
    }
}

impl fmt::Debug for OperationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationNode")
            .field("pipeline", &self.pipeline)
            .field("name", &self.name)
            .field("k8s_name", &self.k8s_name)
            .field("bindings", &self.bindings)
            .field("state", &self.state)
            .field("invoked_in", &self.invoked_in)
            .field("cached", &self.cached)
            .finish_non_exhaustive()
    }
}

/// What an operation body sees of the run it belongs to.
#[derive(Clone)]
pub struct OperationContext {
    pipeline: String,
    operation: String,
    execution: ExecutionContext,
    output_dir: PathBuf,
    store: Option<Arc<dyn BlobStore>>,
}

impl OperationContext {
    pub fn new(
        pipeline: &str,
        operation: &str,
        execution: ExecutionContext,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            operation: operation.to_string(),
            execution,
            output_dir: output_dir.into(),
            store: None,
        }
    }

    pub fn with_store(mut self, store: Option<Arc<dyn BlobStore>>) -> Self {
        self.store = store;
        self
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn run_id(&self) -> &str {
        self.execution.run_id()
    }

    pub fn host(&self) -> &str {
        self.execution.host()
    }

    pub fn temp_dir(&self) -> &Path {
        self.execution.temp_dir()
    }

    /// Directory every step of this run writes its output document to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn execution(&self) -> &ExecutionContext {
        &self.execution
    }

    /// The artifact package of the current run.
    pub fn package(&self) -> Result<ArtifactPackage> {
        let store = self.store.clone().ok_or_else(|| {
            EngineError::configuration(format!(
                "operation '{}' asked for an artifact package but no blob store is configured",
                self.operation
            ))
        })?;
        Ok(ArtifactPackage::new(&self.pipeline, self.run_id(), store))
    }
}

/// A reusable operation definition. Calling it during a trace registers a node.
///
/// ```
/// use pipewright::pipeline::{ContainerSpec, Operation};
/// use pipewright::trace::{Bindings, Trace, TracingContext};
///
/// let step = Operation::new("build_greeting", |_, _| Ok(None));
///
/// let mut ctx = TracingContext::new();
/// ctx.enter(Trace::new("simples", ContainerSpec::default(), false));
/// let handle = step.call(&mut ctx, Bindings::new()).unwrap();
///
/// assert_eq!(handle.operation(), "build_greeting");
/// ```
#[derive(Clone)]
pub struct Operation {
    name: String,
    func: OperationFn,
}

impl Operation {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&OperationContext, &Arguments) -> anyhow::Result<Option<Value>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.to_string(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, ctx: &mut TracingContext, bindings: Bindings) -> Result<OperationHandle> {
        ctx.register(&self.name, Arc::clone(&self.func), bindings)
    }
}
