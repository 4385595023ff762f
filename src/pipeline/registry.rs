// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::sync::Arc;

use serde_json::Value;

use crate::artifacts::{BlobStore, LocalBlobStore};
use crate::config::AppConfig;
use crate::deploy::{
    deploy_pipeline, DeploymentReport, DirectoryScheduler, Environment, SchedulerClient,
    SchedulerEndpoint,
};
use crate::errors::{EngineError, Result};
use crate::pipeline::cli;
use crate::pipeline::{
    BindingCompiler, ContainerSpec, ExecutionContext, GraphCompiler, OpConfigurator,
    PipelineGraph, RunSummary,
};
use crate::trace::TracingContext;
use crate::utils::sanitize_k8s_name;

/// Opens a scheduler client for a deploy target.
pub type SchedulerFactory =
    Arc<dyn Fn(&SchedulerEndpoint) -> Result<Box<dyn SchedulerClient>> + Send + Sync>;

/// The named pipelines of one application, plus everything they share: the
/// config, the graph compiler, the blob store, the op configurators and the
/// scheduler used for deployment.
pub struct PipelineApp {
    name: String,
    config: AppConfig,
    pipelines: BTreeMap<String, PipelineGraph>,
    op_configurators: Vec<OpConfigurator>,
    compiler: Arc<dyn GraphCompiler>,
    store: Option<Arc<dyn BlobStore>>,
    scheduler_factory: SchedulerFactory,
}

impl PipelineApp {
    /// An application with a local blob store under `lake_path` and a local
    /// scheduler under `scheduler_path/<namespace>`.
    pub fn new(name: &str, config: AppConfig) -> Self {
        let store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(&config.lake_path));
        let scheduler_root = config.scheduler_path.clone();
        let scheduler_factory: SchedulerFactory = Arc::new(move |endpoint: &SchedulerEndpoint| {
            let root = scheduler_root.join(sanitize_k8s_name(&endpoint.namespace));
            let client: Box<dyn SchedulerClient> = Box::new(DirectoryScheduler::open(root)?);
            Ok(client)
        });

        Self {
            name: name.to_string(),
            config,
            pipelines: BTreeMap::new(),
            op_configurators: Vec::new(),
            compiler: Arc::new(BindingCompiler),
            store: Some(store),
            scheduler_factory,
        }
    }

    /// Use another graph compiler for pipelines registered from now on.
    pub fn with_compiler(mut self, compiler: Arc<dyn GraphCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_store(mut self, store: Option<Arc<dyn BlobStore>>) -> Self {
        for graph in self.pipelines.values_mut() {
            graph.set_store(store.clone());
        }
        self.store = store;
        self
    }

    pub fn with_scheduler<F>(mut self, factory: F) -> Self
    where
        F: Fn(&SchedulerEndpoint) -> Result<Box<dyn SchedulerClient>> + Send + Sync + 'static,
    {
        self.scheduler_factory = Arc::new(factory);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Trace `pipeline_fn` and register the resulting graph under `name`.
    pub fn register_pipeline<F>(&mut self, name: &str, pipeline_fn: F) -> Result<&mut PipelineGraph>
    where
        F: Fn(&mut TracingContext) -> Result<()> + Send + Sync + 'static,
    {
        if self.pipelines.contains_key(name) {
            return Err(EngineError::configuration(format!(
                "pipeline '{}' is already registered on '{}'",
                name, self.name
            )));
        }

        let mut graph = PipelineGraph::new(
            name,
            pipeline_fn,
            ContainerSpec::from_config(&self.config),
            self.compiler.as_ref(),
        )?;
        graph.set_store(self.store.clone());

        Ok(self.pipelines.entry(name.to_string()).or_insert(graph))
    }

    /// Register a callback applied to every operation's container when a
    /// workflow is built for deployment.
    pub fn configure_op<F>(&mut self, configurator: F) -> &mut Self
    where
        F: Fn(&mut ContainerSpec) + Send + Sync + 'static,
    {
        self.op_configurators.push(Arc::new(configurator));
        self
    }

    pub fn pipeline(&self, name: &str) -> Option<&PipelineGraph> {
        self.pipelines.get(name)
    }

    pub fn pipelines(&self) -> impl Iterator<Item = &PipelineGraph> {
        self.pipelines.values()
    }

    fn pipeline_mut(&mut self, name: &str) -> Result<&mut PipelineGraph> {
        let app = &self.name;
        self.pipelines.get_mut(name).ok_or_else(|| {
            EngineError::configuration(format!("no pipeline '{}' in '{}'", name, app))
        })
    }

    pub fn run_all(&mut self, pipeline: &str, execution: &ExecutionContext) -> Result<RunSummary> {
        self.pipeline_mut(pipeline)?.run_all(execution)
    }

    pub fn run_task(
        &mut self,
        pipeline: &str,
        task: &str,
        raw_args: &HashMap<String, String>,
        execution: &ExecutionContext,
    ) -> Result<Value> {
        self.pipeline_mut(pipeline)?.run_task(task, raw_args, execution)
    }

    /// Replace the deployed pipeline (and job, when a cron is bound).
    pub fn deploy(
        &self,
        pipeline: &str,
        environment: Environment,
        endpoint: &SchedulerEndpoint,
    ) -> Result<DeploymentReport> {
        self.config.require_deployable()?;
        let graph = self.pipeline(pipeline).ok_or_else(|| {
            EngineError::configuration(format!("no pipeline '{}' in '{}'", pipeline, self.name))
        })?;

        let mut client = (self.scheduler_factory)(endpoint)?;
        deploy_pipeline(
            graph,
            environment,
            client.as_mut(),
            &self.op_configurators,
            self.compiler.as_ref(),
        )
    }

    /// Parse the process arguments and run the selected command.
    pub fn start(&mut self) -> anyhow::Result<()> {
        self.start_from(std::env::args_os())
    }

    pub fn start_from<I, T>(&mut self, args: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = cli::build_command(self).try_get_matches_from(args)?;
        cli::dispatch(self, &matches, &ExecutionContext::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Bindings;

    fn single(ctx: &mut TracingContext) -> Result<()> {
        ctx.add_operation("only", |_, _| Ok(None), Bindings::new())?;
        Ok(())
    }

    #[test]
    fn test_duplicate_pipeline_rejected() {
        let mut app = PipelineApp::new("demo", AppConfig::default());
        app.register_pipeline("p", single).unwrap();

        assert!(matches!(
            app.register_pipeline("p", single),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_registered_graph_uses_config_template() {
        let config = AppConfig {
            image_url: "growingdata/demo".to_string(),
            package_entrypoint: "demo".to_string(),
            ..AppConfig::default()
        };
        let mut app = PipelineApp::new("demo", config);
        app.register_pipeline("p", single).unwrap().with_cron("0 0 * * *");

        let graph = app.pipeline("p").unwrap();
        assert_eq!(graph.cron(), Some("0 0 * * *"));
        let container = graph.node("only").unwrap().container();
        assert_eq!(container.image, "growingdata/demo");
        assert_eq!(container.command, vec!["demo".to_string()]);
    }

    #[test]
    fn test_deploy_requires_image() {
        let mut app = PipelineApp::new("demo", AppConfig::default());
        app.register_pipeline("p", single).unwrap();

        let endpoint = SchedulerEndpoint::new(None, None, "kubeflow");
        assert!(matches!(
            app.deploy("p", Environment::Dev, &endpoint),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_unknown_pipeline() {
        let mut app = PipelineApp::new("demo", AppConfig::default());
        let temp = tempfile::TempDir::new().unwrap();

        assert!(matches!(
            app.run_all("missing", &ExecutionContext::new("r", temp.path())),
            Err(EngineError::Configuration(_))
        ));
    }
}
