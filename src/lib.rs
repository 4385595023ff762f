// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod artifacts;  // run manifests + blob stores
pub mod config;     // app config + graph validation
pub mod deploy;     // scheduler contract + deployment
pub mod errors;     // error handling
pub mod logging;
pub mod observability;
pub mod pipeline;   // operation nodes, graphs, registry, CLI
pub mod trace;      // tracing context
pub mod utils;
