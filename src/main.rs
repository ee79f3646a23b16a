// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use uuid::Uuid;

use cli::{Cli, Commands};
use jot_config::Config;
use jot_core::{AgentContext, AgentSpawner, Observer, TaskOrchestrator, TracingSink};
use jot_registry::{AgentTypeRegistry, TaskType};
use jot_store::{FileCredentialStore, KeywordRetriever, MemoryContextStore, UserId};
use jot_tools::builtin::{
    BridgeTool, ContextSaveTool, FileWorkspace, TabularFileTool, WorkspaceTool,
};
use jot_tools::{ToolIntegration, ToolRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match &cli.command {
        Commands::ShowConfig => {
            let config = jot_config::load(cli.config.as_deref())?;
            println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
            Ok(())
        }
        Commands::Validate { file } => validate_registry(file.as_deref()),
        Commands::ListProviders { json } => list_providers(*json),
        Commands::ListAgents { capability, json } => {
            let config = jot_config::load(cli.config.as_deref())?;
            list_agents(&config, capability.as_deref(), *json)
        }
        Commands::Run { task_type, text, instruction, urls, user, json } => {
            let config = jot_config::load(cli.config.as_deref())?;
            run_task(
                &config,
                task_type,
                text.clone(),
                instruction.clone(),
                urls.clone(),
                user.as_deref(),
                *json,
            )
            .await
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("jot={default}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_agent_registry(config: &Config) -> anyhow::Result<AgentTypeRegistry> {
    match &config.registry.path {
        Some(path) => AgentTypeRegistry::load(path)
            .with_context(|| format!("loading registry {}", path.display())),
        None => AgentTypeRegistry::builtin().context("loading built-in registry"),
    }
}

/// Single canonical place where the orchestrator is wired up: tools,
/// integration, stores, spawner.  Adding a tool here makes it resolvable
/// for every blueprint.
fn build_orchestrator(config: &Config) -> anyhow::Result<TaskOrchestrator> {
    let registry = Arc::new(load_agent_registry(config)?);
    let reasoner = jot_reason::from_config(&config.reasoner)?;

    let context_store = Arc::new(MemoryContextStore::new());

    let mut tools = ToolRegistry::new();
    tools.register(TabularFileTool::new(&config.storage.artifact_dir));
    tools.register(WorkspaceTool::new(Arc::new(FileWorkspace::new(
        &config.storage.workspace_dir,
    ))));
    tools.register(BridgeTool::new(Arc::new(FileWorkspace::new(
        config.storage.workspace_dir.join("bridge"),
    ))));
    tools.register(ContextSaveTool::new(context_store.clone()));

    let integration = Arc::new(ToolIntegration::new(
        Arc::new(tools),
        config.tools.timeout_secs,
    ));

    let observer = if config.observability.enabled {
        Observer::new(Arc::new(TracingSink))
    } else {
        Observer::disabled()
    };

    let knowledge = Arc::new(KeywordRetriever::new(context_store));
    let spawner = AgentSpawner::new(
        integration,
        reasoner,
        knowledge,
        config.storage.artifact_dir.clone(),
        config.reasoner.timeout_secs,
        observer.clone(),
    );

    let credentials_path = config
        .credentials
        .path
        .clone()
        .unwrap_or_else(|| ".jot/credentials.toml".into());
    let credentials = Arc::new(FileCredentialStore::new(credentials_path));

    Ok(TaskOrchestrator::new(registry, spawner, credentials, observer))
}

async fn run_task(
    config: &Config,
    task_type: &str,
    text: Option<String>,
    instruction: Option<String>,
    urls: Vec<String>,
    user: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;

    let text = match text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading task input from stdin")?;
            buf
        }
    };

    let user = match user {
        Some(raw) => UserId(Uuid::from_str(raw).with_context(|| format!("bad user id '{raw}'"))?),
        None => UserId::new(),
    };

    let mut ctx = AgentContext::new(user).with_raw_text(text).with_urls(urls);
    if let Some(instruction) = instruction {
        ctx = ctx.with_instruction(instruction);
    }

    let result = orchestrator
        .orchestrate(&TaskType::new(task_type), ctx)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("status: {:?}", result.execution_status);
        for (i, agent_result) in result.per_agent_results.iter().enumerate() {
            match &agent_result.error {
                Some(e) => println!(
                    "  step {}: {:?} ({:?}: {})",
                    i + 1,
                    agent_result.status,
                    e.kind,
                    e.message
                ),
                None => println!("  step {}: {:?}", i + 1, agent_result.status),
            }
        }
        for key in ["artifact_path", "page_url", "answer", "summary"] {
            if let Some(value) = result.aggregated_payload.get(key) {
                println!("{key}: {}", value.as_str().unwrap_or_default());
            }
        }
    }

    Ok(())
}

/// Validate a registry file: load it and report the registered task types.
fn validate_registry(file: Option<&std::path::Path>) -> anyhow::Result<()> {
    let registry = match file {
        Some(path) => AgentTypeRegistry::load(path)
            .with_context(|| format!("validating {}", path.display()))?,
        None => AgentTypeRegistry::builtin().context("validating built-in registry")?,
    };
    println!("Registry: OK ({} task types)", registry.len());
    for bp in registry.blueprints() {
        match &bp.agent_kind {
            Some(kind) => println!("  {} -> {kind}", bp.task_type),
            None => println!(
                "  {} -> composite [{}]",
                bp.task_type,
                bp.subtasks
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
    Ok(())
}

fn list_agents(config: &Config, capability: Option<&str>, json: bool) -> anyhow::Result<()> {
    let registry = load_agent_registry(config)?;
    let blueprints: Vec<_> = match capability {
        Some(cap) => registry.list_by_capability(cap),
        None => registry.blueprints().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&blueprints)?);
        return Ok(());
    }

    for bp in &blueprints {
        let kind = bp.agent_kind.as_deref().unwrap_or("(composite)");
        println!("{:<24} {:<18} {}", bp.task_type.to_string(), kind, bp.description);
        if !bp.capabilities.is_empty() {
            let caps: Vec<&str> = bp.capabilities.iter().map(String::as_str).collect();
            println!("{:<24} {:<18} capabilities: {}", "", "", caps.join(", "));
        }
    }
    Ok(())
}

fn list_providers(json: bool) -> anyhow::Result<()> {
    let drivers = jot_reason::registry::list_drivers();

    if json {
        let entries: Vec<serde_json::Value> = drivers
            .iter()
            .map(|d| {
                serde_json::json!({
                    "id": d.id,
                    "name": d.name,
                    "description": d.description,
                    "api_key_env": d.default_api_key_env,
                    "requires_api_key": d.requires_api_key,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for d in drivers {
        let key = d.default_api_key_env.unwrap_or("-");
        println!("{:<12} {:<16} {:<22} {}", d.id, d.name, key, d.description);
    }
    Ok(())
}
