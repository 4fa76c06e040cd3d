//! The `weave config` command: prints the resolved configuration.

use anyhow::{Context, Result};
use colored::Colorize;
use weave_infrastructure::{ConfigService, SecretStorage, WeavePaths};

pub fn show() -> Result<()> {
    let config = ConfigService::new()
        .get_config()
        .context("Failed to load configuration")?;

    if let Ok(path) = WeavePaths::config_file() {
        println!("{}", format!("Config file: {}", path.display()).bright_black());
    }
    println!();

    println!("{}", "[model]".bright_cyan());
    println!("endpoint    = {}", value_or_unset(&config.model.endpoint));
    println!("deployment  = {}", value_or_unset(&config.model.deployment));
    println!("api_version = {}", config.model.api_version);
    println!("max_tokens  = {}", config.model.max_tokens);
    println!();

    println!("{}", "[publish]".bright_cyan());
    println!("repo_url  = {}", value_or_unset(&config.publish.repo_url));
    println!("branch    = {}", config.publish.branch);
    println!("file_name = {}", config.publish.file_name);
    println!("author    = {} <{}>", config.publish.author_name, config.publish.author_email);
    println!();

    println!("{}", "[pipeline]".bright_cyan());
    println!("max_revisions   = {}", config.pipeline.max_revisions);
    println!("simulation_mode = {}", config.pipeline.simulation_mode);
    println!();

    // Secret values are never printed, only their presence.
    let secrets = SecretStorage::new()
        .ok()
        .and_then(|storage| storage.load().ok())
        .unwrap_or_default();
    println!("{}", "[secrets]".bright_cyan());
    println!("azure api key = {}", presence(secrets.azure.is_some()));
    println!("github token  = {}", presence(secrets.github.is_some()));

    Ok(())
}

fn value_or_unset(value: &str) -> String {
    if value.is_empty() {
        "(unset)".to_string()
    } else {
        value.to_string()
    }
}

fn presence(present: bool) -> colored::ColoredString {
    if present {
        "configured".green()
    } else {
        "missing".yellow()
    }
}
