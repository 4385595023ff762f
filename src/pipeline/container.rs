// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Adjusts every operation's container before a workflow is submitted, e.g. to
/// mount credentials.
pub type OpConfigurator = Arc<dyn Fn(&mut ContainerSpec) + Send + Sync>;

/// A named volume mounted into the step's container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
}

/// How one operation runs when deployed: image, command line, environment and
/// volumes.
///
/// Builder methods take `&mut self` and return it so op configurators can chain
/// them on a borrowed descriptor:
///
/// ```
/// use pipewright::pipeline::ContainerSpec;
///
/// let mut spec = ContainerSpec::default();
/// spec.with_env("GCP_PROJECT", "grwdt-dev")
///     .with_secret("svc-account", "/secrets/gcp")
///     .with_empty_dir("tmp", "/tmp/scratch");
///
/// assert_eq!(spec.env.get("GCP_PROJECT").map(String::as_str), Some("grwdt-dev"));
/// assert_eq!(spec.secrets[0].name, "svc-account");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<VolumeMount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub empty_dirs: Vec<VolumeMount>,
    /// File the step's output document is collected from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

impl ContainerSpec {
    /// Template shared by every operation of an application: the configured
    /// image running the configured entrypoint.
    pub fn from_config(config: &AppConfig) -> Self {
        let command = if config.package_entrypoint.is_empty() {
            Vec::new()
        } else {
            vec![config.package_entrypoint.clone()]
        };
        Self {
            image: config.image_url.clone(),
            command,
            ..Self::default()
        }
    }

    pub fn with_image(&mut self, image: &str) -> &mut Self {
        self.image = image.to_string();
        self
    }

    /// Replace both the command and its arguments.
    pub fn with_command(&mut self, command: &str, args: Vec<String>) -> &mut Self {
        self.command = vec![command.to_string()];
        self.args = args;
        self
    }

    pub fn with_env(&mut self, name: &str, value: impl ToString) -> &mut Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }

    /// Mount a secret as a volume named after the secret.
    pub fn with_secret(&mut self, secret_name: &str, mount_path: &str) -> &mut Self {
        self.secrets.push(VolumeMount {
            name: secret_name.to_string(),
            mount_path: mount_path.to_string(),
        });
        self
    }

    /// Mount an empty writable directory.
    pub fn with_empty_dir(&mut self, name: &str, mount_path: &str) -> &mut Self {
        self.empty_dirs.push(VolumeMount {
            name: name.to_string(),
            mount_path: mount_path.to_string(),
        });
        self
    }
}

/// Command line arguments that make the application's CLI run exactly one
/// operation: `pipelines <pipeline> <operation> --<param> <encoded value> ...`.
pub fn invocation_args<'a, I>(pipeline: &str, operation: &str, encoded: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut args = vec![
        "pipelines".to_string(),
        pipeline.to_string(),
        operation.to_string(),
    ];
    for (name, value) in encoded {
        args.push(format!("--{}", name));
        args.push(value);
    }
    args
}
