// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Capturing pipeline functions as operation graphs.
//!
//! A pipeline function receives a [`TracingContext`] and calls
//! [`TracingContext::add_operation`] (or [`crate::pipeline::Operation::call`])
//! once per step. Nothing runs while tracing; each call records an
//! [`crate::pipeline::OperationNode`] and hands back an [`OperationHandle`]
//! that later steps bind to as an upstream input.

mod bindings;
mod context;

pub use bindings::{Binding, Bindings, OperationHandle};
pub use context::{Trace, TracingContext};
