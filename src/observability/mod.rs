// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Every diagnostic and operational log line in the crate is produced by a
//! message type from [`messages`]. Each type implements `Display` for the human
//! readable line and [`messages::StructuredLog`] to emit it through `tracing`
//! with its fields attached, so no log text is scattered through the engine.
//!
//! # Usage
//!
//! ```rust
//! use pipewright::observability::messages::StructuredLog;
//! use pipewright::observability::messages::operation::OperationInvoked;
//!
//! let msg = OperationInvoked {
//!     pipeline: "simples",
//!     operation: "build_greeting",
//!     run_id: "local-20250101",
//!     argument_count: 1,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
