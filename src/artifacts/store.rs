// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::errors::{EngineError, Result};

/// Key/value blob storage that artifacts and manifests are written to.
///
/// Keys are `/`-separated relative paths. Transfers go through local files so
/// large payloads never have to sit in memory.
pub trait BlobStore: Send + Sync {
    /// Store the contents of `local_path` under `key`, replacing any previous blob.
    fn upload(&self, key: &str, local_path: &Path) -> Result<()>;

    /// Copy the blob at `key` to `local_path`. `Ok(false)` when no such blob exists.
    fn download(&self, key: &str, local_path: &Path) -> Result<bool>;
}

/// A blob store rooted in a local directory ("the lake").
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a file under the root, refusing keys that would escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(EngineError::configuration(format!(
                "blob key '{}' must be a relative path inside the store",
                key
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for LocalBlobStore {
    fn upload(&self, key: &str, local_path: &Path) -> Result<()> {
        let target = self.resolve(key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(local_path, &target)?;
        Ok(())
    }

    fn download(&self, key: &str, local_path: &Path) -> Result<bool> {
        let source = self.resolve(key)?;
        if !source.is_file() {
            return Ok(false);
        }
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, local_path)?;
        Ok(true)
    }
}
