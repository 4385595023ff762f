// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::consts::{
    DEFAULT_K8S_NAMESPACE, DEFAULT_LAKE_PATH, DEFAULT_LOG_LEVEL, DEFAULT_SCHEDULER_PATH,
    ENV_CONFIG_PREFIX,
};
use crate::errors::{EngineError, Result};

/// Application-wide configuration shared by every pipeline in a registry.
///
/// Loaded from YAML or TOML (chosen by file extension), then overridden from
/// `HML_*` environment variables.
///
/// # Example
/// ```yaml
/// image_url: growingdata/simple-pipeline
/// package_entrypoint: simple-pipeline
/// lake_path: ./lake
/// k8s_namespace: kubeflow
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Container image every operation runs in when deployed
    pub image_url: String,
    /// Command installed in the image that exposes this application's CLI
    pub package_entrypoint: String,
    /// Root directory of the local blob store
    pub lake_path: PathBuf,
    /// Root directory of the local scheduler state
    pub scheduler_path: PathBuf,
    /// Namespace used when a deploy command does not name one
    pub k8s_namespace: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            image_url: String::new(),
            package_entrypoint: String::new(),
            lake_path: PathBuf::from(DEFAULT_LAKE_PATH),
            scheduler_path: PathBuf::from(DEFAULT_SCHEDULER_PATH),
            k8s_namespace: DEFAULT_K8S_NAMESPACE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Apply `HML_*` overrides from the given variables.
    ///
    /// Takes the variables explicitly so callers (and tests) decide where they
    /// come from; `load_config` passes the process environment.
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) {
        let var = |key: &str| vars.get(&format!("{}{}", ENV_CONFIG_PREFIX, key)).cloned();

        if let Some(v) = var("IMAGE_URL") {
            self.image_url = v;
        }
        if let Some(v) = var("PACKAGE_ENTRYPOINT") {
            self.package_entrypoint = v;
        }
        if let Some(v) = var("LAKE_PATH") {
            self.lake_path = PathBuf::from(v);
        }
        if let Some(v) = var("SCHEDULER_PATH") {
            self.scheduler_path = PathBuf::from(v);
        }
        if let Some(v) = var("K8S_NAMESPACE") {
            self.k8s_namespace = v;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.log_level = v;
        }
    }

    /// Check the fields deployment cannot do without.
    pub fn require_deployable(&self) -> Result<()> {
        if self.image_url.is_empty() {
            return Err(EngineError::configuration("image_url is required to deploy"));
        }
        if self.package_entrypoint.is_empty() {
            return Err(EngineError::configuration(
                "package_entrypoint is required to deploy",
            ));
        }
        Ok(())
    }
}

/// Parse a config document. `.toml` files are read as TOML, anything else as YAML.
pub fn parse_config(content: &str, path: &Path) -> Result<AppConfig> {
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        Ok(toml::from_str(content)?)
    } else {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Load a config file and apply overrides from the process environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut cfg = parse_config(&content, path)?;
    cfg.apply_overrides(&std::env::vars().collect());
    Ok(cfg)
}
