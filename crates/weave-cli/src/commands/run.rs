//! The `weave run` command: one full pipeline run at the terminal.
//!
//! Drives a session from request to review, prints the agent
//! conversation, and gates publishing behind an explicit `APPROVED`
//! typed by the operator.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use weave_core::backend::ModelBackend;
use weave_core::config::{GithubSecret, RootConfig, SecretConfig};
use weave_core::persona::default_profiles;
use weave_core::publish::PublishStatus;
use weave_core::session::{HumanDecision, PipelineState, SessionHub};
use weave_core::transcript::{AgentRole, Turn};
use weave_infrastructure::git_publisher::{github_file_url, github_pages_url, github_raw_url};
use weave_infrastructure::{ConfigService, GitPublisher, SecretStorage};
use weave_interaction::{AzureOpenAiAgent, SimulationAgent};

#[derive(Args)]
pub struct RunArgs {
    /// The web-app request; prompted for interactively when omitted
    pub request: Option<String>,

    /// Run against the deterministic simulation backend (no network)
    #[arg(long)]
    pub simulate: bool,

    /// Override the configured revision limit
    #[arg(long)]
    pub max_revisions: Option<u32>,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let mut config = ConfigService::new()
        .get_config()
        .context("Failed to load configuration")?;
    if args.simulate {
        config.pipeline.simulation_mode = true;
    }
    if let Some(max_revisions) = args.max_revisions {
        config.pipeline.max_revisions = max_revisions;
    }

    let secrets = SecretStorage::new()
        .ok()
        .and_then(|storage| storage.load().ok())
        .unwrap_or_default();

    let backend = build_backend(&config, &secrets)?;
    let work_dir = std::env::current_dir().context("Failed to resolve working directory")?;
    let publisher = GitPublisher::new(
        config.publish.clone(),
        github_credentials(&secrets),
        work_dir,
    );

    let hub = SessionHub::new(
        backend,
        Arc::new(publisher),
        default_profiles(),
        config.pipeline.clone(),
        config.publish.clone(),
    );

    let mut editor = DefaultEditor::new()?;

    let request = match args.request {
        Some(request) => request,
        None => match prompt(&mut editor, "Describe the web app to build: ")? {
            Some(line) => line,
            None => return Ok(()),
        },
    };
    if request.trim().is_empty() {
        bail!("The request must not be empty");
    }

    if config.pipeline.simulation_mode {
        println!("{}", "Simulation mode: no model endpoint will be called and nothing will be pushed.".bright_black());
    }

    let id = hub.submit_request(request).await;
    let state = hub
        .drive(&id)
        .await
        .context("The agent pipeline failed; run the command again to retry")?;

    print_transcript(&hub.get_transcript(&id).await?);

    match state {
        PipelineState::Approved => {}
        PipelineState::Failed(reason) => {
            println!("{}", format!("Pipeline failed: {reason}").red());
            return Ok(());
        }
        other => {
            println!("{}", format!("Pipeline stopped in state: {other}").red());
            return Ok(());
        }
    }

    println!("{}", "The Product Owner approved the implementation.".bright_green());
    println!(
        "{}",
        "Type APPROVED to publish to the configured repository; anything else cancels."
            .bright_yellow()
    );

    let answer = prompt(&mut editor, ">> ")?.unwrap_or_default();
    if answer.trim().to_uppercase() != "APPROVED" {
        hub.confirm_approval(&id, HumanDecision::Reject).await?;
        println!("{}", "Publish cancelled; nothing was pushed.".yellow());
        return Ok(());
    }

    hub.confirm_approval(&id, HumanDecision::Approve).await?;
    let result = hub.confirm_publish(&id).await?;
    match result.status {
        PublishStatus::Published => {
            println!("{}", format!("Published: {}", result.detail).bright_green());
            print_published_urls(&config);
        }
        PublishStatus::Skipped => {
            println!("{}", format!("Skipped: {}", result.detail).yellow());
        }
        PublishStatus::Failed => {
            println!("{}", format!("Publish failed: {}", result.detail).red());
            println!(
                "{}",
                "The approved result is kept; run the command again to retry publishing."
                    .bright_black()
            );
        }
    }

    Ok(())
}

fn build_backend(config: &RootConfig, secrets: &SecretConfig) -> Result<Arc<dyn ModelBackend>> {
    if config.pipeline.simulation_mode {
        return Ok(Arc::new(SimulationAgent::new()));
    }

    if config.model.endpoint.is_empty() || config.model.deployment.is_empty() {
        bail!(
            "Model endpoint is not configured. Set model.endpoint and model.deployment in \
             the config file, or export AZURE_OPENAI_ENDPOINT and \
             AZURE_OPENAI_CHAT_DEPLOYMENT_NAME, or pass --simulate."
        );
    }

    let api_key = secrets
        .azure
        .as_ref()
        .map(|azure| azure.api_key.clone())
        .or_else(|| std::env::var("AZURE_OPENAI_API_KEY").ok())
        .context(
            "AZURE_OPENAI_API_KEY not found in ~/.config/weave/secret.json or environment variables",
        )?;

    Ok(Arc::new(AzureOpenAiAgent::from_config(
        &config.model,
        api_key,
    )))
}

/// secret.json takes priority; GITHUB_USERNAME/GITHUB_PAT are the
/// environment fallback.
fn github_credentials(secrets: &SecretConfig) -> Option<GithubSecret> {
    if let Some(github) = &secrets.github {
        return Some(github.clone());
    }
    let username = std::env::var("GITHUB_USERNAME").ok()?;
    let token = std::env::var("GITHUB_PAT").ok()?;
    Some(GithubSecret { username, token })
}

fn prompt(editor: &mut DefaultEditor, text: &str) -> Result<Option<String>> {
    match editor.readline(text) {
        Ok(line) => {
            let _ = editor.add_history_entry(&line);
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
            println!("{}", "Exiting...".bright_black());
            Ok(None)
        }
        Err(err) => Err(err).context("Failed to read input"),
    }
}

fn print_transcript(transcript: &[Turn]) {
    for turn in transcript {
        let header = format!("[{}]", turn.role.display_name());
        let colored_header = match turn.role {
            AgentRole::User => header.green(),
            AgentRole::Analyst => header.bright_yellow(),
            AgentRole::Engineer => header.bright_blue(),
            AgentRole::Owner => header.bright_magenta(),
        };
        println!("{colored_header}");
        println!("{}", turn.content);
        println!();
    }
}

fn print_published_urls(config: &RootConfig) {
    let repo_url = &config.publish.repo_url;
    let file_name = &config.publish.file_name;
    let branch = &config.publish.branch;

    if let Some(url) = github_file_url(repo_url, file_name, branch) {
        println!("File:  {url}");
    }
    if let Some(url) = github_raw_url(repo_url, file_name, branch) {
        println!("Raw:   {url}");
    }
    if let Some(url) = github_pages_url(repo_url, file_name) {
        println!("Pages: {url}");
    }
}
