// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Argument values handed to operation bodies, and their command-line encoding.
//!
//! Deployed steps receive every argument as a string on the command line.
//! Literals travel as JSON text. Upstream references travel as a placeholder
//! (`@{{tasks.<name>.output}}`) that the scheduler replaces with a reference to
//! the upstream step's output before the step starts.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::Result;
use crate::pipeline::execution::output_path;
use crate::trace::Binding;

const PLACEHOLDER_PREFIX: &str = "@{{tasks.";
const PLACEHOLDER_SUFFIX: &str = ".output}}";
const FILE_PREFIX: char = '@';

/// Resolved named arguments of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.0.insert(name.to_string(), value);
    }

    /// The raw JSON value of an argument.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Deserialize a named argument.
    ///
    /// ```
    /// use serde_json::json;
    /// use pipewright::pipeline::Arguments;
    ///
    /// let mut args = Arguments::new();
    /// args.insert("greeting", json!({"message": "hi"}));
    ///
    /// let greeting: std::collections::HashMap<String, String> = args.get("greeting").unwrap();
    /// assert_eq!(greeting["message"], "hi");
    /// assert!(args.get::<String>("missing").is_err());
    /// ```
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<T> {
        let value = self
            .0
            .get(name)
            .with_context(|| format!("missing argument '{}'", name))?;
        serde_json::from_value(value.clone())
            .with_context(|| format!("argument '{}' has an unexpected shape", name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Arguments(map)
    }
}

/// Placeholder the scheduler substitutes with a task's output.
pub fn upstream_placeholder(task: &str) -> String {
    format!("{}{}{}", PLACEHOLDER_PREFIX, task, PLACEHOLDER_SUFFIX)
}

/// The task named by an unsubstituted placeholder.
pub fn parse_placeholder(raw: &str) -> Option<&str> {
    raw.strip_prefix(PLACEHOLDER_PREFIX)?
        .strip_suffix(PLACEHOLDER_SUFFIX)
        .filter(|task| !task.is_empty())
}

/// Encode a binding as a command-line value.
pub fn encode_binding(binding: &Binding) -> Result<String> {
    match binding {
        Binding::Literal(value) => Ok(serde_json::to_string(value)?),
        Binding::Upstream(task) => Ok(upstream_placeholder(task)),
    }
}

/// Decode a command-line value.
///
/// * an unsubstituted placeholder reads the upstream's output from `output_dir`
/// * `@<path>` reads a JSON document from `<path>`
/// * anything else is parsed as JSON, or kept as a plain string
pub fn decode_argument(raw: &str, output_dir: &Path) -> Result<Value> {
    if let Some(task) = parse_placeholder(raw) {
        return read_output(&output_path(output_dir, task));
    }
    if let Some(path) = raw.strip_prefix(FILE_PREFIX) {
        return read_output(Path::new(path));
    }
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

pub fn read_output(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write an output document, creating its directory.
pub fn write_output(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
