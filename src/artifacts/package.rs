// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::artifacts::{ArtifactManifest, BlobStore};
use crate::config::consts::MANIFEST_FILE_NAME;
use crate::errors::{EngineError, Result};
use crate::observability::messages::artifact::{ArtifactLinked, ManifestSynthesized};
use crate::observability::messages::StructuredLog;

/// The artifacts of one pipeline run.
///
/// Every write is a whole-document read-modify-write of the run's manifest
/// with no version check. Concurrent writers to the same run lose updates;
/// the engine only ever writes from its single execution path.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use pipewright::artifacts::{ArtifactPackage, LocalBlobStore};
///
/// let lake = tempfile::TempDir::new().unwrap();
/// let package = ArtifactPackage::new("simples", "run-1", Arc::new(LocalBlobStore::new(lake.path())));
///
/// let key = package.add_artifact_json("greeting", &json!({"message": "hi"})).unwrap();
/// assert_eq!(key, "simples/run-1/artifacts/greeting.json");
/// assert_eq!(package.get().unwrap().artifacts["greeting"], key);
/// ```
#[derive(Clone)]
pub struct ArtifactPackage {
    pipeline: String,
    run_id: String,
    store: Arc<dyn BlobStore>,
}

impl ArtifactPackage {
    pub fn new(pipeline: &str, run_id: &str, store: Arc<dyn BlobStore>) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            run_id: run_id.to_string(),
            store,
        }
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn manifest_key(&self) -> String {
        format!("{}/{}/{}", self.pipeline, self.run_id, MANIFEST_FILE_NAME)
    }

    /// Storage key of an artifact; `suffix` is appended to the name as-is.
    pub fn artifact_key(&self, name: &str, suffix: &str) -> String {
        format!("{}/{}/artifacts/{}{}", self.pipeline, self.run_id, name, suffix)
    }

    /// The run's manifest, or an empty one when nothing was linked yet.
    pub fn get(&self) -> Result<ArtifactManifest> {
        let key = self.manifest_key();
        let scratch = NamedTempFile::new()?;

        if !self.store.download(&key, scratch.path())? {
            ManifestSynthesized { key: &key }.log();
            return Ok(ArtifactManifest::new(&self.pipeline, &self.run_id));
        }

        let content = fs::read_to_string(scratch.path())?;
        ArtifactManifest::from_json(&key, &content)
    }

    /// Point `name` at `path` in the run's manifest and persist it.
    pub fn link(&self, name: &str, path: &str) -> Result<ArtifactManifest> {
        let mut manifest = self.get()?;
        manifest.link(name, path);
        self.put(&self.manifest_key(), manifest.to_json()?.as_bytes())?;

        ArtifactLinked {
            run_id: &self.run_id,
            artifact: name,
            path,
            artifact_count: manifest.len(),
        }
        .log();
        Ok(manifest)
    }

    /// Store a value as a JSON document and link it. Returns the storage key.
    pub fn add_artifact_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<String> {
        check_name(name)?;
        let key = self.artifact_key(name, ".json");
        self.put(&key, serde_json::to_string_pretty(value)?.as_bytes())?;
        self.link(name, &key)?;
        Ok(key)
    }

    /// Store a local file, keeping its extension, and link it.
    pub fn add_artifact_file(&self, name: &str, local_path: &Path) -> Result<String> {
        check_name(name)?;
        let suffix = local_path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let key = self.artifact_key(name, &suffix);
        self.store.upload(&key, local_path)?;
        self.link(name, &key)?;
        Ok(key)
    }

    /// Store tabular rows as JSON lines and link them.
    pub fn add_artifact_dataframe<T: Serialize>(&self, name: &str, rows: &[T]) -> Result<String> {
        check_name(name)?;
        let mut lines = String::new();
        for row in rows {
            lines.push_str(&serde_json::to_string(row)?);
            lines.push('\n');
        }
        let key = self.artifact_key(name, ".jsonl");
        self.put(&key, lines.as_bytes())?;
        self.link(name, &key)?;
        Ok(key)
    }

    fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        let mut scratch = NamedTempFile::new()?;
        scratch.write_all(content)?;
        scratch.flush()?;
        self.store.upload(key, scratch.path())
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(EngineError::configuration(format!(
            "artifact name '{}' must be non-empty and contain no path separators",
            name
        )));
    }
    Ok(())
}
