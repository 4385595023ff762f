// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dependency_graph;
mod loader;
mod validation;

pub mod consts;

pub use dependency_graph::DependencyGraph;
pub use loader::{load_config, parse_config, AppConfig};
pub use validation::validate_task_graph;
