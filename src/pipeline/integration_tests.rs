#[cfg(test)]
mod integration_tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};
    use tempfile::TempDir;

    use crate::artifacts::{ArtifactPackage, BlobStore, LocalBlobStore};
    use crate::config::DependencyGraph;
    use crate::errors::{EngineError, Result, ValidationError};
    use crate::pipeline::{
        read_output, BindingCompiler, CompiledGraph, ContainerSpec, ExecutionContext,
        GraphCompiler, OpConfigurator, Operation, PipelineGraph,
    };
    use crate::trace::{Bindings, Trace, TracingContext};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(log: &Log, name: &'static str, output: Value) -> Operation {
        let log = Arc::clone(log);
        Operation::new(name, move |_, _| {
            log.lock().unwrap().push(name.to_string());
            Ok(Some(output.clone()))
        })
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    /// Diamond: every node runs once, and only after its dependencies
    #[test]
    fn test_run_all_diamond_runs_each_once_in_dependency_order() {
        let temp = TempDir::new().unwrap();
        let log: Log = Arc::default();
        let (a, b, c, d) = (
            recording(&log, "a", json!(1)),
            recording(&log, "b", json!(2)),
            recording(&log, "c", json!(3)),
            recording(&log, "d", json!(4)),
        );

        let mut graph = PipelineGraph::new(
            "diamond",
            move |ctx: &mut TracingContext| {
                let ha = a.call(ctx, Bindings::new())?;
                let hb = b.call(ctx, Bindings::new().upstream("x", &ha))?;
                let hc = c.call(ctx, Bindings::new().upstream("x", &ha))?;
                d.call(ctx, Bindings::new().upstream("l", &hb).upstream("r", &hc))?;
                Ok(())
            },
            ContainerSpec::default(),
            &BindingCompiler,
        )
        .unwrap();

        let summary = graph
            .run_all(&ExecutionContext::new("run-1", temp.path()))
            .unwrap();

        let order = log.lock().unwrap().clone();
        assert_eq!(order.len(), 4);
        assert_eq!(summary.invoked, order);
        assert!(position(&order, "a") < position(&order, "b"));
        assert!(position(&order, "a") < position(&order, "c"));
        assert!(position(&order, "b") < position(&order, "d"));
        assert!(position(&order, "c") < position(&order, "d"));
    }

    /// a -> b with b reading a's output; no artifacts are linked
    #[test]
    fn test_upstream_value_flows_and_round_trips_through_output_file() {
        let temp = TempDir::new().unwrap();
        let lake = temp.path().join("lake");
        let store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(&lake));

        let mut graph = PipelineGraph::new(
            "scenario",
            |ctx: &mut TracingContext| {
                let a = ctx.add_operation(
                    "step_a",
                    |_, _| Ok(Some(json!({"v": 1}))),
                    Bindings::new(),
                )?;
                ctx.add_operation(
                    "step_b",
                    |_, args| {
                        assert_eq!(args.value("x"), Some(&json!({"v": 1})));
                        let x: Value = args.get("x")?;
                        Ok(Some(json!({"w": x["v"].as_i64().unwrap_or_default() + 1})))
                    },
                    Bindings::new().upstream("x", &a),
                )?;
                Ok(())
            },
            ContainerSpec::default(),
            &BindingCompiler,
        )
        .unwrap();
        graph.set_store(Some(Arc::clone(&store)));

        let summary = graph
            .run_all(&ExecutionContext::new("run-1", temp.path()))
            .unwrap();

        assert_eq!(summary.invoked, vec!["step_a", "step_b"]);
        assert_eq!(
            graph.node("step_b").and_then(|n| n.cached()),
            Some(&json!({"w": 2}))
        );
        assert_eq!(
            read_output(&summary.outputs["step_a"]).unwrap(),
            json!({"v": 1})
        );

        let package = ArtifactPackage::new("scenario", "run-1", store);
        assert!(package.get().unwrap().artifacts.is_empty());
    }

    /// a -> b -> c with b failing
    #[test]
    fn test_failure_stops_the_run() {
        let temp = TempDir::new().unwrap();
        let log: Log = Arc::default();
        let a = recording(&log, "a", json!({}));
        let c = recording(&log, "c", json!({}));

        let mut graph = PipelineGraph::new(
            "chain",
            move |ctx: &mut TracingContext| {
                let ha = a.call(ctx, Bindings::new())?;
                let hb = ctx.add_operation(
                    "b",
                    |_, _| Err(anyhow::anyhow!("model did not converge")),
                    Bindings::new().upstream("x", &ha),
                )?;
                c.call(ctx, Bindings::new().upstream("x", &hb))?;
                Ok(())
            },
            ContainerSpec::default(),
            &BindingCompiler,
        )
        .unwrap();

        let execution = ExecutionContext::new("run-1", temp.path());
        let result = graph.run_all(&execution);

        match result {
            Err(EngineError::UpstreamFailure { operation, .. }) => assert_eq!(operation, "b"),
            other => panic!("Expected upstream failure, got {:?}", other),
        }
        assert_eq!(*log.lock().unwrap(), vec!["a".to_string()]);
        assert!(!graph.node("c").unwrap().is_invoked());

        let output_dir = graph.default_output_dir(&execution);
        assert!(output_dir.join("a.json").exists());
        assert!(!output_dir.join("b.json").exists());
    }

    /// State persists across run_all calls until reset_run
    #[test]
    fn test_second_run_needs_reset() {
        let temp = TempDir::new().unwrap();
        let log: Log = Arc::default();
        let a = recording(&log, "a", json!({}));

        let mut graph = PipelineGraph::new(
            "again",
            move |ctx: &mut TracingContext| {
                a.call(ctx, Bindings::new())?;
                Ok(())
            },
            ContainerSpec::default(),
            &BindingCompiler,
        )
        .unwrap();
        let execution = ExecutionContext::new("run-1", temp.path());

        graph.run_all(&execution).unwrap();
        assert!(matches!(
            graph.run_all(&execution),
            Err(EngineError::InvalidState(_))
        ));

        graph.reset_run();
        graph
            .run_all(&ExecutionContext::new("run-2", temp.path()))
            .unwrap();
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    /// The graph validates whatever its compiler returns
    struct CyclicCompiler;

    impl GraphCompiler for CyclicCompiler {
        fn compile(&self, trace: &Trace) -> Result<CompiledGraph> {
            let tasks: Vec<String> = trace.nodes().iter().map(|n| n.name().to_string()).collect();
            let dependencies = DependencyGraph::from(HashMap::from([
                (tasks[0].clone(), vec![tasks[1].clone()]),
                (tasks[1].clone(), vec![tasks[0].clone()]),
            ]));
            Ok(CompiledGraph {
                tasks,
                dependencies,
            })
        }
    }

    struct InventingCompiler;

    impl GraphCompiler for InventingCompiler {
        fn compile(&self, _trace: &Trace) -> Result<CompiledGraph> {
            Ok(CompiledGraph {
                tasks: vec!["ghost".to_string()],
                dependencies: DependencyGraph::new(),
            })
        }
    }

    fn two_independent(ctx: &mut TracingContext) -> Result<()> {
        ctx.add_operation("a", |_, _| Ok(None), Bindings::new())?;
        ctx.add_operation("b", |_, _| Ok(None), Bindings::new())?;
        Ok(())
    }

    #[test]
    fn test_cyclic_compiled_graph_rejected() {
        let result = PipelineGraph::new(
            "cyclic",
            two_independent,
            ContainerSpec::default(),
            &CyclicCompiler,
        );

        match result {
            Err(EngineError::Validation(errors)) => assert!(matches!(
                errors[0],
                ValidationError::CyclicDependency { .. }
            )),
            Err(other) => panic!("Expected validation error, got {}", other),
            Ok(_) => panic!("Expected validation error"),
        }
    }

    #[test]
    fn test_untraced_task_rejected() {
        let result = PipelineGraph::new(
            "ghostly",
            two_independent,
            ContainerSpec::default(),
            &InventingCompiler,
        );
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    /// Deployment re-traces and applies configurators to every step
    #[test]
    fn test_build_workflow() {
        let template = ContainerSpec {
            image: "growingdata/simple".to_string(),
            command: vec!["simple".to_string()],
            ..ContainerSpec::default()
        };
        let graph = PipelineGraph::new(
            "simples",
            |ctx: &mut TracingContext| {
                let a = ctx.add_operation(
                    "build_greeting",
                    |_, _| Ok(None),
                    Bindings::new().literal("message", "Hello tez!"),
                )?;
                ctx.add_operation(
                    "adjust_greeting",
                    |_, _| Ok(None),
                    Bindings::new().upstream("greeting", &a),
                )?;
                Ok(())
            },
            template,
            &BindingCompiler,
        )
        .unwrap();

        let configurators: Vec<OpConfigurator> = vec![Arc::new(|op: &mut ContainerSpec| {
            op.with_secret("svc-account", "/secrets/gcp")
                .with_env("GCP_PROJECT", "grwdt-dev");
        })];
        let workflow = graph
            .build_workflow("simples - dev", &configurators, &BindingCompiler)
            .unwrap();

        assert_eq!(workflow.name, "simples - dev");
        assert_eq!(workflow.tasks.len(), 2);

        let adjust = &workflow.tasks[1];
        assert_eq!(adjust.name, "adjust_greeting");
        assert_eq!(adjust.k8s_name, "adjust-greeting");
        assert_eq!(adjust.dependencies, vec!["build_greeting".to_string()]);
        assert_eq!(
            adjust.container.args,
            vec![
                "pipelines",
                "simples",
                "adjust_greeting",
                "--greeting",
                "@{{tasks.build_greeting.output}}"
            ]
        );
        assert_eq!(
            adjust.container.output_path.as_deref(),
            Some("/hml-outputs/adjust_greeting.json")
        );
        assert_eq!(adjust.container.secrets[0].mount_path, "/secrets/gcp");
        assert_eq!(
            workflow.tasks[0].container.args[3..],
            ["--message".to_string(), "\"Hello tez!\"".to_string()]
        );

        // The locally traced nodes are untouched by deployment
        assert!(graph.node("build_greeting").unwrap().container().secrets.is_empty());
    }

    /// A step links an artifact into the run's manifest
    #[test]
    fn test_operation_links_artifact() {
        let temp = TempDir::new().unwrap();
        let store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(temp.path().join("lake")));

        let mut graph = PipelineGraph::new(
            "artifacts",
            |ctx: &mut TracingContext| {
                ctx.add_operation(
                    "summarise",
                    |op, _| {
                        op.package()?
                            .add_artifact_json("summary", &json!({"rows": 3}))?;
                        Ok(None)
                    },
                    Bindings::new(),
                )?;
                Ok(())
            },
            ContainerSpec::default(),
            &BindingCompiler,
        )
        .unwrap();
        graph.set_store(Some(Arc::clone(&store)));

        graph
            .run_all(&ExecutionContext::new("run-7", temp.path()))
            .unwrap();

        let manifest = ArtifactPackage::new("artifacts", "run-7", store).get().unwrap();
        assert_eq!(manifest.run_id, "run-7");
        assert_eq!(
            manifest.artifacts.get("summary").map(String::as_str),
            Some("artifacts/run-7/artifacts/summary.json")
        );
    }
}
