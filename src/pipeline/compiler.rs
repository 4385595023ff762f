// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::DependencyGraph;
use crate::errors::Result;
use crate::trace::Trace;

/// Canonical, executable form of a trace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledGraph {
    /// Task names, in the order the compiler emitted them
    pub tasks: Vec<String>,
    pub dependencies: DependencyGraph,
}

impl CompiledGraph {
    pub fn contains(&self, task: &str) -> bool {
        self.tasks.iter().any(|t| t == task)
    }

    pub fn dependencies_of(&self, task: &str) -> &[String] {
        self.dependencies.dependencies_of(task)
    }
}

/// Reduces a trace to a task list and a dependency graph.
///
/// Implementations only have to honour this contract. The pipeline graph
/// validates whatever comes back before using it.
pub trait GraphCompiler: Send + Sync {
    fn compile(&self, trace: &Trace) -> Result<CompiledGraph>;
}

/// Derives dependencies from upstream bindings and explicit ordering.
#[derive(Debug, Default, Clone, Copy)]
pub struct BindingCompiler;

impl GraphCompiler for BindingCompiler {
    fn compile(&self, trace: &Trace) -> Result<CompiledGraph> {
        let mut compiled = CompiledGraph::default();
        for node in trace.nodes() {
            compiled.tasks.push(node.name().to_string());
            compiled
                .dependencies
                .add_dependencies(node.name().to_string(), node.dependencies());
        }
        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ContainerSpec;
    use crate::trace::{Bindings, TracingContext};

    #[test]
    fn test_binding_compiler() {
        let mut ctx = TracingContext::new();
        ctx.enter(Trace::new("p", ContainerSpec::default(), false));
        let a = ctx.add_operation("a", |_, _| Ok(None), Bindings::new()).unwrap();
        let b = ctx
            .add_operation("b", |_, _| Ok(None), Bindings::new().upstream("x", &a))
            .unwrap();
        ctx.add_operation(
            "c",
            |_, _| Ok(None),
            Bindings::new().upstream("y", &b).after(&a),
        )
        .unwrap();
        let trace = ctx.exit().unwrap();

        let compiled = BindingCompiler.compile(&trace).unwrap();
        assert_eq!(compiled.tasks, vec!["a", "b", "c"]);
        assert!(compiled.dependencies_of("a").is_empty());
        assert_eq!(compiled.dependencies_of("b"), ["a".to_string()]);
        assert_eq!(
            compiled.dependencies_of("c"),
            ["b".to_string(), "a".to_string()]
        );
        assert!(compiled.contains("c"));
        assert!(!compiled.contains("d"));
    }
}
