// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use serde_json::Value;

use crate::errors::Result;

/// What a registered operation returns to the pipeline function: a reference
/// to its future output, not the output itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle {
    pipeline: String,
    operation: String,
}

impl OperationHandle {
    pub(crate) fn new(pipeline: &str, operation: &str) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

/// A single named argument of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A plain JSON value, inlined into the step's invocation
    Literal(Value),
    /// The output of another operation of the same pipeline
    Upstream(String),
}

/// Named arguments for one operation call, in call-site order.
///
/// Binding the same name twice keeps the position of the first binding and the
/// value of the last.
///
/// # Example
/// ```
/// use serde_json::json;
/// use pipewright::trace::{Binding, Bindings};
///
/// let bindings = Bindings::new()
///     .literal("message", "Hello tez!")
///     .literal("retries", json!(3));
///
/// assert_eq!(bindings.len(), 2);
/// assert_eq!(bindings.get("retries"), Some(&Binding::Literal(json!(3))));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: Vec<(String, Binding)>,
    after: Vec<String>,
    handles: Vec<OperationHandle>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a literal value.
    pub fn literal(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, Binding::Literal(value.into()));
        self
    }

    /// Bind any serializable value as a literal.
    pub fn serialized<T: Serialize + ?Sized>(mut self, name: &str, value: &T) -> Result<Self> {
        self.set(name, Binding::Literal(serde_json::to_value(value)?));
        Ok(self)
    }

    /// Bind the output of an earlier operation.
    pub fn upstream(mut self, name: &str, handle: &OperationHandle) -> Self {
        self.set(name, Binding::Upstream(handle.operation.clone()));
        self.remember(handle);
        self
    }

    /// Order this operation after another one without passing its output.
    pub fn after(mut self, handle: &OperationHandle) -> Self {
        if !self.after.contains(&handle.operation) {
            self.after.push(handle.operation.clone());
        }
        self.remember(handle);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, binding)| binding)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(k, b)| (k.as_str(), b))
    }

    /// Every handle passed to `upstream` or `after`, with the pipeline that
    /// produced it.
    pub fn handles(&self) -> &[OperationHandle] {
        &self.handles
    }

    pub fn ordering(&self) -> &[String] {
        &self.after
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every operation this call depends on, upstream values first, no repeats.
    pub fn upstream_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let upstream = self.entries.iter().filter_map(|(_, b)| match b {
            Binding::Upstream(name) => Some(name),
            Binding::Literal(_) => None,
        });
        for name in upstream.chain(self.after.iter()) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    fn remember(&mut self, handle: &OperationHandle) {
        if !self.handles.contains(handle) {
            self.handles.push(handle.clone());
        }
    }

    fn set(&mut self, name: &str, binding: Binding) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = binding,
            None => self.entries.push((name.to_string(), binding)),
        }
    }
}
