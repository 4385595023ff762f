// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pipewright::config::consts::CONTAINER_OUTPUT_DIR;
use pipewright::config::{load_config, AppConfig};
use pipewright::logging;
use pipewright::pipeline::{Arguments, OperationContext, PipelineApp};
use pipewright::trace::{Bindings, TracingContext};

const APP_NAME: &str = "simple-pipeline";
/// Path of an optional YAML/TOML config file
const ENV_CONFIG_PATH: &str = "HML_CONFIG";

#[derive(Debug, Serialize, Deserialize)]
struct Greeting {
    message: String,
}

fn build_greeting(_ctx: &OperationContext, args: &Arguments) -> anyhow::Result<Option<Value>> {
    let message: String = args.get("message")?;
    Ok(Some(serde_json::to_value(Greeting { message })?))
}

fn adjust_greeting(ctx: &OperationContext, args: &Arguments) -> anyhow::Result<Option<Value>> {
    let greeting: Greeting = args.get("greeting")?;
    let adjusted = Greeting {
        message: format!("{} (adjusted on {}, run {})", greeting.message, ctx.host(), ctx.run_id()),
    };

    ctx.package()?.add_artifact_json("greeting", &adjusted)?;
    Ok(Some(serde_json::to_value(adjusted)?))
}

fn simples(ctx: &mut TracingContext) -> pipewright::errors::Result<()> {
    let greeting = ctx.add_operation(
        "build_greeting",
        build_greeting,
        Bindings::new().literal("message", "Hello tez!"),
    )?;
    ctx.add_operation(
        "adjust_greeting",
        adjust_greeting,
        Bindings::new().upstream("greeting", &greeting),
    )?;
    Ok(())
}

fn load_app_config() -> anyhow::Result<AppConfig> {
    match env::var(ENV_CONFIG_PATH) {
        Ok(path) => load_config(&path).with_context(|| format!("Failed to load config {}", path)),
        Err(_) => {
            let mut config = AppConfig::default();
            config.apply_overrides(&env::vars().collect());
            Ok(config)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config = load_app_config()?;
    logging::init(&config.log_level);

    let mut app = PipelineApp::new(APP_NAME, config);
    app.register_pipeline("simples", simples)?
        .with_cron("0 0 * * *")
        .with_experiment("demos");
    app.configure_op(|op| {
        op.with_empty_dir("hml-outputs", CONTAINER_OUTPUT_DIR);
    });

    app.start()
}
