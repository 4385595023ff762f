// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::artifacts::BlobStore;
use crate::config::consts::{CONTAINER_OUTPUT_DIR, LOCAL_OUTPUT_DIR};
use crate::config::validate_task_graph;
use crate::deploy::{TaskSpec, WorkflowSpec};
use crate::errors::{EngineError, Result};
use crate::observability::messages::engine::{
    RunCompleted, RunFailed, RunStarted, TraceCompleted,
};
use crate::observability::messages::StructuredLog;
use crate::pipeline::arguments::{decode_argument, read_output};
use crate::pipeline::execution::output_path;
use crate::pipeline::{
    Arguments, CompiledGraph, ContainerSpec, ExecutionContext, GraphCompiler, OpConfigurator,
    OperationContext, OperationNode,
};
use crate::trace::{Binding, Trace, TracingContext};

/// A pipeline function: calls operation factories against the context it is
/// given.
pub type PipelineFn = Arc<dyn Fn(&mut TracingContext) -> Result<()> + Send + Sync>;

/// What a `run_all` did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub run_id: String,
    /// Task names in invocation order
    pub invoked: Vec<String>,
    pub outputs: BTreeMap<String, PathBuf>,
}

/// A traced pipeline and its compiled dependency graph.
///
/// The pipeline function is traced exactly once, when the graph is built. The
/// compiled task list is kept and reused by every run. Deployment traces the
/// function again so the workflow reflects deploy-time container settings.
///
/// # Example
/// ```
/// use serde_json::json;
/// use pipewright::pipeline::{BindingCompiler, ContainerSpec, ExecutionContext, PipelineGraph};
/// use pipewright::trace::Bindings;
///
/// let mut graph = PipelineGraph::new(
///     "simples",
///     |ctx| {
///         let a = ctx.add_operation("a", |_, _| Ok(Some(json!({"v": 1}))), Bindings::new())?;
///         ctx.add_operation("b", |_, args| {
///             let v: i64 = args.get::<serde_json::Value>("x")?["v"].as_i64().unwrap_or_default();
///             Ok(Some(json!({"w": v + 1})))
///         }, Bindings::new().upstream("x", &a))?;
///         Ok(())
///     },
///     ContainerSpec::default(),
///     &BindingCompiler,
/// )
/// .unwrap();
///
/// let temp = tempfile::TempDir::new().unwrap();
/// let summary = graph.run_all(&ExecutionContext::new("run-1", temp.path())).unwrap();
/// assert_eq!(summary.invoked, vec!["a", "b"]);
/// assert_eq!(graph.node("b").and_then(|n| n.cached()), Some(&json!({"w": 2})));
/// ```
pub struct PipelineGraph {
    name: String,
    pipeline_fn: PipelineFn,
    container_template: ContainerSpec,
    nodes: Vec<OperationNode>,
    index: HashMap<String, usize>,
    compiled: CompiledGraph,
    cron: Option<String>,
    experiment: Option<String>,
    store: Option<Arc<dyn BlobStore>>,
}

impl PipelineGraph {
    pub fn new<F>(
        name: &str,
        pipeline_fn: F,
        container_template: ContainerSpec,
        compiler: &dyn GraphCompiler,
    ) -> Result<Self>
    where
        F: Fn(&mut TracingContext) -> Result<()> + Send + Sync + 'static,
    {
        Self::from_fn(name, Arc::new(pipeline_fn), container_template, compiler)
    }

    pub fn from_fn(
        name: &str,
        pipeline_fn: PipelineFn,
        container_template: ContainerSpec,
        compiler: &dyn GraphCompiler,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(EngineError::configuration("pipeline name must not be empty"));
        }

        let (trace, compiled) =
            trace_pass(name, &pipeline_fn, &container_template, false, compiler)?;
        let nodes = trace.into_nodes();
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.name().to_string(), i))
            .collect();

        Ok(Self {
            name: name.to_string(),
            pipeline_fn,
            container_template,
            nodes,
            index,
            compiled,
            cron: None,
            experiment: None,
            store: None,
        })
    }

    /// Schedule the deployed pipeline with a cron expression.
    pub fn with_cron(&mut self, cron: &str) -> &mut Self {
        self.cron = Some(cron.to_string());
        self
    }

    /// Experiment the deployed job runs under.
    pub fn with_experiment(&mut self, experiment: &str) -> &mut Self {
        self.experiment = Some(experiment.to_string());
        self
    }

    pub(crate) fn set_store(&mut self, store: Option<Arc<dyn BlobStore>>) {
        self.store = store;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cron(&self) -> Option<&str> {
        self.cron.as_deref()
    }

    pub fn experiment(&self) -> Option<&str> {
        self.experiment.as_deref()
    }

    pub fn compiled(&self) -> &CompiledGraph {
        &self.compiled
    }

    pub fn nodes(&self) -> &[OperationNode] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&OperationNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// Where this run's output documents go.
    ///
    /// Inside a scheduled container this is the fixed container-local
    /// directory; locally it is `<temp>/pipewright/<pipeline>/<run id>`.
    pub fn default_output_dir(&self, execution: &ExecutionContext) -> PathBuf {
        if execution.in_container() {
            PathBuf::from(CONTAINER_OUTPUT_DIR)
        } else {
            execution
                .temp_dir()
                .join(LOCAL_OUTPUT_DIR)
                .join(&self.name)
                .join(execution.run_id())
        }
    }

    /// Run every task once, dependencies first.
    ///
    /// Aborts on the first failure. Outputs already written stay in place and
    /// the nodes that ran stay invoked until [`reset_run`](Self::reset_run).
    pub fn run_all(&mut self, execution: &ExecutionContext) -> Result<RunSummary> {
        let output_dir = self.default_output_dir(execution);
        let started = RunStarted {
            pipeline: &self.name,
            run_id: execution.run_id(),
            task_count: self.compiled.tasks.len(),
        };
        started.log();
        let span = started.span("run_all");
        let _guard = span.enter();

        let clock = Instant::now();
        let mut visited = HashSet::new();
        let mut summary = RunSummary {
            run_id: execution.run_id().to_string(),
            ..RunSummary::default()
        };

        let tasks = self.compiled.tasks.clone();
        for task in &tasks {
            if let Err(error) =
                self.visit(task, execution, &output_dir, &mut visited, &mut summary)
            {
                RunFailed {
                    pipeline: &self.name,
                    run_id: execution.run_id(),
                    error: &error,
                }
                .log();
                return Err(error);
            }
        }

        RunCompleted {
            pipeline: &self.name,
            run_id: execution.run_id(),
            task_count: summary.invoked.len(),
            duration: clock.elapsed(),
        }
        .log();
        Ok(summary)
    }

    fn visit(
        &mut self,
        task: &str,
        execution: &ExecutionContext,
        output_dir: &Path,
        visited: &mut HashSet<String>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        if !visited.insert(task.to_string()) {
            return Ok(());
        }
        for dependency in self.compiled.dependencies_of(task).to_vec() {
            self.visit(&dependency, execution, output_dir, visited, summary)?;
        }

        let args = self.resolve_traced(task)?;
        let path = self.invoke_task(task, &args, execution, output_dir)?;
        summary.invoked.push(task.to_string());
        summary.outputs.insert(task.to_string(), path);
        Ok(())
    }

    /// Arguments from the traced bindings, upstream values taken from the
    /// upstream nodes' cached results.
    fn resolve_traced(&self, task: &str) -> Result<Arguments> {
        let node = self.lookup(task)?;
        let mut args = Arguments::new();
        for (param, binding) in node.bindings().iter() {
            let value = match binding {
                Binding::Literal(value) => value.clone(),
                Binding::Upstream(upstream) => self.cached_output(task, upstream)?.clone(),
            };
            args.insert(param, value);
        }
        Ok(args)
    }

    fn cached_output(&self, task: &str, upstream: &str) -> Result<&Value> {
        self.lookup(upstream)?.cached().ok_or_else(|| {
            EngineError::invalid_state(format!(
                "operation '{}' needs the output of '{}', which has not run",
                task, upstream
            ))
        })
    }

    /// Invoke one operation directly, as a scheduled step does.
    ///
    /// Raw values are decoded with [`decode_argument`]. Parameters without a
    /// raw value fall back to their traced binding; an upstream binding then
    /// reads the upstream's output document of the current run.
    pub fn run_task(
        &mut self,
        task: &str,
        raw_args: &HashMap<String, String>,
        execution: &ExecutionContext,
    ) -> Result<Value> {
        if !self.compiled.contains(task) {
            return Err(EngineError::invalid_state(format!(
                "task '{}' is not part of pipeline '{}'",
                task, self.name
            )));
        }
        let output_dir = self.default_output_dir(execution);
        let node = self.lookup(task)?;

        if let Some(unknown) = raw_args.keys().find(|k| node.bindings().get(k).is_none()) {
            return Err(EngineError::configuration(format!(
                "operation '{}' has no parameter '{}'",
                task, unknown
            )));
        }

        let mut args = Arguments::new();
        for (param, binding) in node.bindings().iter() {
            let value = match (raw_args.get(param), binding) {
                (Some(raw), _) => decode_argument(raw, &output_dir)?,
                (None, Binding::Literal(value)) => value.clone(),
                (None, Binding::Upstream(upstream)) => match self.lookup(upstream)?.cached() {
                    Some(value) => value.clone(),
                    None => read_output(&output_path(&output_dir, upstream))?,
                },
            };
            args.insert(param, value);
        }

        self.invoke_task(task, &args, execution, &output_dir)?;
        self.lookup(task)?
            .cached()
            .cloned()
            .ok_or_else(|| EngineError::invalid_state(format!("task '{}' cached no output", task)))
    }

    fn invoke_task(
        &mut self,
        task: &str,
        args: &Arguments,
        execution: &ExecutionContext,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let i = self.position(task)?;
        let ctx = OperationContext::new(&self.name, task, execution.clone(), output_dir)
            .with_store(self.store.clone());
        let path = output_path(output_dir, task);
        self.nodes[i].invoke(&ctx, args, &path)?;
        Ok(path)
    }

    /// Start a new run on the same graph.
    pub fn reset_run(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    /// Trace again for deployment and describe the resulting workflow.
    ///
    /// Configurators run on each step's container after the output path is
    /// set, in registration order.
    pub fn build_workflow(
        &self,
        deployed_name: &str,
        configurators: &[OpConfigurator],
        compiler: &dyn GraphCompiler,
    ) -> Result<WorkflowSpec> {
        let (trace, compiled) = trace_pass(
            &self.name,
            &self.pipeline_fn,
            &self.container_template,
            true,
            compiler,
        )?;
        let mut nodes: HashMap<String, OperationNode> = trace
            .into_nodes()
            .into_iter()
            .map(|node| (node.name().to_string(), node))
            .collect();

        let mut tasks = Vec::with_capacity(compiled.tasks.len());
        for task in &compiled.tasks {
            let node = nodes.remove(task).ok_or_else(|| {
                EngineError::invalid_state(format!("task '{}' vanished from the trace", task))
            })?;
            let mut container = node.container().clone();
            container.output_path = Some(
                output_path(Path::new(CONTAINER_OUTPUT_DIR), task)
                    .display()
                    .to_string(),
            );
            for configure in configurators {
                configure(&mut container);
            }
            tasks.push(TaskSpec {
                name: task.clone(),
                k8s_name: node.k8s_name().to_string(),
                container,
                dependencies: compiled.dependencies_of(task).to_vec(),
            });
        }

        Ok(WorkflowSpec {
            name: deployed_name.to_string(),
            pipeline: self.name.clone(),
            tasks,
        })
    }

    fn position(&self, task: &str) -> Result<usize> {
        self.index.get(task).copied().ok_or_else(|| {
            EngineError::invalid_state(format!(
                "task '{}' is not part of pipeline '{}'",
                task, self.name
            ))
        })
    }

    fn lookup(&self, task: &str) -> Result<&OperationNode> {
        Ok(&self.nodes[self.position(task)?])
    }
}

/// Trace the pipeline function once, compile and validate the result.
fn trace_pass(
    name: &str,
    pipeline_fn: &PipelineFn,
    container_template: &ContainerSpec,
    deploying: bool,
    compiler: &dyn GraphCompiler,
) -> Result<(Trace, CompiledGraph)> {
    let mut ctx = TracingContext::new();
    ctx.enter(Trace::new(name, container_template.clone(), deploying));
    let outcome = pipeline_fn(&mut ctx);
    let trace = ctx.exit();
    outcome?;

    let trace = trace.ok_or_else(|| {
        EngineError::invalid_state(format!(
            "pipeline '{}' left the tracing context unbalanced",
            name
        ))
    })?;
    if trace.pipeline() != name || ctx.is_active() {
        return Err(EngineError::invalid_state(format!(
            "pipeline '{}' left the tracing context unbalanced",
            name
        )));
    }

    let compiled = compiler.compile(&trace)?;
    validate_task_graph(&compiled.tasks, &compiled.dependencies)
        .map_err(EngineError::Validation)?;
    if let Some(unknown) = compiled.tasks.iter().find(|t| !trace.contains(t)) {
        return Err(EngineError::configuration(format!(
            "compiled graph of '{}' names task '{}', which was never traced",
            name, unknown
        )));
    }

    TraceCompleted {
        pipeline: name,
        operation_count: compiled.tasks.len(),
        deploying,
    }
    .log();
    Ok((trace, compiled))
}
