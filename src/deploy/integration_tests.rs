#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::config::AppConfig;
    use crate::deploy::{
        deploy_pipeline, DirectoryScheduler, Environment, ExperimentRecord, InMemoryScheduler,
        JobRecord, JobRequest, PipelineRecord, SchedulerClient, SchedulerEndpoint, WorkflowSpec,
    };
    use crate::errors::{EngineError, Result};
    use crate::pipeline::{
        BindingCompiler, ContainerSpec, OpConfigurator, PipelineApp, PipelineGraph,
    };
    use crate::trace::{Bindings, TracingContext};

    fn simples(ctx: &mut TracingContext) -> Result<()> {
        let greeting = ctx.add_operation(
            "build_greeting",
            |_, _| Ok(None),
            Bindings::new().literal("message", "Hello tez!"),
        )?;
        ctx.add_operation(
            "adjust_greeting",
            |_, _| Ok(None),
            Bindings::new().upstream("greeting", &greeting),
        )?;
        Ok(())
    }

    fn graph(cron: Option<&str>) -> PipelineGraph {
        let mut graph =
            PipelineGraph::new("simples", simples, ContainerSpec::default(), &BindingCompiler)
                .unwrap();
        if let Some(cron) = cron {
            graph.with_cron(cron);
        }
        graph
    }

    /// First deployment creates pipeline, experiment and job
    #[test]
    fn test_fresh_deploy_with_cron() {
        let mut scheduler = InMemoryScheduler::new();
        let report = deploy_pipeline(
            &graph(Some("0 0 * * *")),
            Environment::Dev,
            &mut scheduler,
            &[],
            &BindingCompiler,
        )
        .unwrap();

        assert_eq!(report.deployed_name, "simples - dev");
        assert_eq!(report.experiment_name, "simples - dev experiments");
        assert!(report.replaced_pipeline.is_none());
        assert!(report.replaced_job.is_none());

        assert_eq!(scheduler.pipelines().len(), 1);
        assert_eq!(scheduler.pipelines()[0].workflow.tasks.len(), 2);
        assert_eq!(scheduler.experiments().len(), 1);

        let job = &scheduler.jobs()[0];
        assert_eq!(job.name, "simples - dev cron");
        assert_eq!(job.description, "simples - dev cron job");
        assert_eq!(job.cron, "0 0 * * *");
        assert!(job.enabled);
        assert_eq!(job.max_concurrency, 1);
        assert_eq!(job.pipeline_id, report.pipeline.id);
    }

    /// A second deployment replaces pipeline and job, reuses the experiment
    #[test]
    fn test_redeploy_replaces_pipeline_and_job() {
        let mut scheduler = InMemoryScheduler::new();
        let graph = graph(Some("0 0 * * *"));

        let first =
            deploy_pipeline(&graph, Environment::Prod, &mut scheduler, &[], &BindingCompiler)
                .unwrap();
        let second =
            deploy_pipeline(&graph, Environment::Prod, &mut scheduler, &[], &BindingCompiler)
                .unwrap();

        assert_eq!(second.replaced_pipeline, Some(first.pipeline.id.clone()));
        assert_eq!(
            second.replaced_job,
            first.job.as_ref().map(|j| j.id.clone())
        );
        assert_eq!(scheduler.pipelines().len(), 1);
        assert_eq!(scheduler.jobs().len(), 1);
        assert_eq!(scheduler.experiments().len(), 1);
        assert_eq!(scheduler.jobs()[0].pipeline_id, second.pipeline.id);
    }

    /// Without a cron only the pipeline is created
    #[test]
    fn test_deploy_without_cron() {
        let mut scheduler = InMemoryScheduler::new();
        let report = deploy_pipeline(
            &graph(None),
            Environment::Dev,
            &mut scheduler,
            &[],
            &BindingCompiler,
        )
        .unwrap();

        assert!(report.job.is_none());
        assert!(report.experiment.is_none());
        assert!(scheduler.experiments().is_empty());
        assert!(scheduler.jobs().is_empty());
    }

    /// An explicit experiment is used instead of the derived one
    #[test]
    fn test_named_experiment() {
        let mut scheduler = InMemoryScheduler::new();
        let mut graph = graph(Some("0 0 * * *"));
        graph.with_experiment("demos");

        deploy_pipeline(&graph, Environment::Dev, &mut scheduler, &[], &BindingCompiler).unwrap();
        assert_eq!(scheduler.experiments()[0].name, "demos");
    }

    /// Configurators shape every submitted step
    #[test]
    fn test_configurators_reach_the_scheduler() {
        let mut scheduler = InMemoryScheduler::new();
        let configurators: Vec<OpConfigurator> = vec![Arc::new(|op: &mut ContainerSpec| {
            op.with_empty_dir("scratch", "/scratch");
        })];

        deploy_pipeline(
            &graph(None),
            Environment::Dev,
            &mut scheduler,
            &configurators,
            &BindingCompiler,
        )
        .unwrap();

        let workflow = &scheduler.pipelines()[0].workflow;
        assert!(workflow
            .tasks
            .iter()
            .all(|t| t.container.empty_dirs[0].mount_path == "/scratch"));
    }

    /// Fails every create_pipeline call, otherwise delegates
    struct RefusingScheduler(InMemoryScheduler);

    impl SchedulerClient for RefusingScheduler {
        fn find_pipeline(&self, name: &str) -> Result<Option<PipelineRecord>> {
            self.0.find_pipeline(name)
        }
        fn delete_pipeline(&mut self, id: &str) -> Result<()> {
            self.0.delete_pipeline(id)
        }
        fn create_pipeline(&mut self, name: &str, _: &WorkflowSpec) -> Result<PipelineRecord> {
            Err(EngineError::scheduler(format!("upload of '{}' refused", name)))
        }
        fn find_experiment(&self, name: &str) -> Result<Option<ExperimentRecord>> {
            self.0.find_experiment(name)
        }
        fn create_experiment(&mut self, name: &str) -> Result<ExperimentRecord> {
            self.0.create_experiment(name)
        }
        fn find_job(&self, name: &str) -> Result<Option<JobRecord>> {
            self.0.find_job(name)
        }
        fn delete_job(&mut self, id: &str) -> Result<()> {
            self.0.delete_job(id)
        }
        fn create_job(&mut self, request: JobRequest) -> Result<JobRecord> {
            self.0.create_job(request)
        }
    }

    /// A failure after the delete leaves nothing deployed; no rollback
    #[test]
    fn test_partial_failure_leaves_gap() {
        let graph = graph(Some("0 0 * * *"));
        let mut inner = InMemoryScheduler::new();
        deploy_pipeline(&graph, Environment::Dev, &mut inner, &[], &BindingCompiler).unwrap();

        let mut refusing = RefusingScheduler(inner);
        let result = deploy_pipeline(&graph, Environment::Dev, &mut refusing, &[], &BindingCompiler);

        assert!(matches!(result, Err(EngineError::Scheduler(_))));
        assert!(refusing.0.pipelines().is_empty());
        // The old job was never reached, so it still points at the deleted pipeline
        assert_eq!(refusing.0.jobs().len(), 1);
    }

    /// The application deploys through its configured directory scheduler
    #[test]
    fn test_app_deploys_to_directory_scheduler() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            image_url: "growingdata/simple".to_string(),
            package_entrypoint: "simple".to_string(),
            scheduler_path: temp.path().join("scheduler"),
            lake_path: temp.path().join("lake"),
            ..AppConfig::default()
        };
        let mut app = PipelineApp::new("simple", config);
        app.register_pipeline("simples", simples)
            .unwrap()
            .with_cron("0 0 * * *");
        app.configure_op(|op| {
            op.with_secret("svc-account", "/secrets/gcp");
        });

        let endpoint = SchedulerEndpoint::new(None, None, "Team Namespace");
        let report = app.deploy("simples", Environment::Dev, &endpoint).unwrap();

        let scheduler =
            DirectoryScheduler::open(temp.path().join("scheduler").join("team-namespace")).unwrap();
        let deployed = scheduler.find_pipeline("simples - dev").unwrap().unwrap();
        assert_eq!(deployed.id, report.pipeline.id);

        let task = deployed.workflow.task("build_greeting").unwrap();
        assert_eq!(task.container.image, "growingdata/simple");
        assert_eq!(task.container.command, vec!["simple".to_string()]);
        assert_eq!(task.container.secrets[0].name, "svc-account");
    }
}
