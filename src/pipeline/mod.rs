// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline graphs: operation nodes, compilation, local execution and the
//! application registry that exposes them as commands.

mod arguments;
mod compiler;
mod container;
mod execution;
mod graph;
mod operation;
mod registry;

#[cfg(test)]
mod integration_tests;
pub mod cli;

pub use arguments::{
    decode_argument, encode_binding, parse_placeholder, read_output, upstream_placeholder,
    write_output, Arguments,
};
pub use compiler::{BindingCompiler, CompiledGraph, GraphCompiler};
pub use container::{invocation_args, ContainerSpec, OpConfigurator, VolumeMount};
pub use execution::{local_run_id, output_path, ExecutionContext};
pub use graph::{PipelineFn, PipelineGraph, RunSummary};
pub use operation::{InvocationState, Operation, OperationContext, OperationFn, OperationNode};
pub use registry::{PipelineApp, SchedulerFactory};
