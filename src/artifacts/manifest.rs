// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{EngineError, Result};

/// Keys a persisted manifest cannot be read without.
const REQUIRED_KEYS: [&str; 2] = ["artifacts", "name"];

/// Per-run index of artifact name -> storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub name: String,
    #[serde(default)]
    pub run_id: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated: DateTime<Utc>,
    pub artifacts: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// An empty manifest, created and updated now.
    pub fn new(name: &str, run_id: &str) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            run_id: run_id.to_string(),
            created: now,
            updated: now,
            artifacts: BTreeMap::new(),
        }
    }

    /// Parse a persisted manifest read from `key`.
    pub fn from_json(key: &str, content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content)?;
        for required in REQUIRED_KEYS {
            let present = match (required, document.get(required)) {
                (_, None | Some(Value::Null)) => false,
                ("artifacts", Some(artifacts)) => artifacts.is_object(),
                _ => true,
            };
            if !present {
                return Err(EngineError::ManifestCorruption {
                    key: key.to_string(),
                    missing: required,
                });
            }
        }
        Ok(serde_json::from_value(document)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Point `name` at `path`. `updated` never moves backwards.
    pub fn link(&mut self, name: &str, path: &str) {
        self.artifacts.insert(name.to_string(), path.to_string());
        self.updated = self.updated.max(Utc::now());
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
