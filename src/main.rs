//! Research Assistant: web research agent with an MCP tool server.
//!
//! Usage:
//!   research-assistant                 Interactive research session (default)
//!   research-assistant serve           Serve the tools over MCP on stdio
//!   research-assistant tools           List the tool catalog
//!   research-assistant call <tool>     Invoke one tool with JSON arguments
//!   research-assistant config init     Write a default config file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use research_assistant::agent::{self, ResearchAgent};
use research_assistant::collab::{self, ConnectionManager, McpHttpConnector, TokioSleeper};
use research_assistant::config::{self, ResearchConfig};
use research_assistant::llm::{InferenceClient, InferenceSettings};
use research_assistant::server;
use research_assistant::state::{ActivityStore, JsonFileStore, MemoryStore};
use research_assistant::tools::{register_builtins, BuiltinDeps, ToolRegistry};
use research_assistant::types::ConnectionState;
use research_assistant::web::{DuckDuckGo, HttpFetcher, DEFAULT_USER_AGENT};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "research-assistant")]
#[command(version)]
#[command(about = "Research assistant agent with web, tracking and report tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the config file [default: ~/.research-assistant/config.toml].
    #[arg(long)]
    config: Option<String>,

    /// Log level (debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive research session.
    Chat,

    /// Serve the built-in tools over MCP on stdin/stdout.
    Serve,

    /// List the built-in tools.
    Tools {
        /// Print the JSON definitions instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Invoke a single tool and print the result.
    Call {
        /// Tool name.
        name: String,

        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Manage the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write the default configuration.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = config::resolve_config_path(cli.config.as_deref());

    let mut cfg = config::load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config::apply_env(&mut cfg);

    // Logs go to stderr: stdout carries the MCP stream in serve mode.
    let level = cli.log_level.clone().unwrap_or_else(|| cfg.log_level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Config { action: ConfigAction::Init { force } } => cmd_config_init(&config_path, force),
        Commands::Chat => cmd_chat(validated(cfg)?).await,
        Commands::Serve => cmd_serve(validated(cfg)?).await,
        Commands::Tools { json } => cmd_tools(validated(cfg)?, json),
        Commands::Call { name, args } => cmd_call(validated(cfg)?, &name, &args).await,
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_chat(cfg: ResearchConfig) -> Result<()> {
    println!("{}", "=".repeat(60));
    println!("{} {}", ">>>".green().bold(), cfg.agent_name.bold());
    println!("{}", "=".repeat(60));

    let mut registry = build_registry(&cfg)?;

    let endpoint = cfg
        .endpoint()
        .map(|url| collab::collab_url(url, &cfg.agent_id, &cfg.agent_description))
        .transpose()?;
    if endpoint.is_none() {
        println!("{} No collaboration endpoint set; running standalone", "!".yellow().bold());
    }

    let connector = McpHttpConnector::new(cfg.collab_transport, &cfg.agent_id, cfg.collab_timeout());
    let mut manager = ConnectionManager::new(cfg.retry, Arc::new(connector), Arc::new(TokioSleeper));
    let outcome = manager.connect(endpoint.as_deref()).await;

    let remote_count = outcome.remote_tools.len();
    let rejected = registry.register_all(outcome.remote_tools);
    match outcome.state {
        ConnectionState::Connected => println!(
            "{} Connected to collaboration server ({} remote tools)",
            "✓".green().bold(),
            remote_count - rejected.len()
        ),
        ConnectionState::Degraded => println!(
            "{} Could not connect to the collaboration server; using built-in tools only",
            "!".yellow().bold()
        ),
        _ => {}
    }

    let system_prompt = agent::build_system_prompt(&registry.describe_text(), &cfg.agent_id, outcome.state);
    let inference = InferenceClient::new(
        &cfg.inference_url,
        &cfg.inference_api_key,
        InferenceSettings {
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        },
        cfg.http_timeout(),
    )?;
    if cfg.inference_api_key.is_empty() {
        warn!("No inference API key configured (OPENAI_API_KEY)");
    }

    println!("\nModel: {}    Tools: {}\n", inference.model(), registry.len());

    let mut research_agent = ResearchAgent::new(
        Arc::new(inference),
        Arc::new(registry),
        system_prompt,
        cfg.max_iterations,
        cfg.history_limit,
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let stdin = BufReader::new(tokio::io::stdin());
    agent::run_interactive(&mut research_agent, stdin, cancel).await?;

    // A pending stdin read would keep the runtime from shutting down.
    std::process::exit(0)
}

async fn cmd_serve(cfg: ResearchConfig) -> Result<()> {
    let registry = build_registry(&cfg)?;
    let stdin = BufReader::new(tokio::io::stdin());
    server::serve(&registry, stdin, tokio::io::stdout()).await
}

fn cmd_tools(cfg: ResearchConfig, json: bool) -> Result<()> {
    let registry = build_registry(&cfg)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
        return Ok(());
    }

    for spec in registry.describe_all() {
        println!("{}  {}", spec.name.bold(), spec.description);
        for p in &spec.params {
            let kind = p.param_type.map(|t| t.to_string()).unwrap_or_else(|| "any".into());
            let note = match (&p.default, p.required) {
                (_, true) => "required".to_string(),
                (Some(d), false) => format!("default {}", d),
                (None, false) => "optional".to_string(),
            };
            println!("    {:<14} {:<8} {}", p.name, kind, note.dimmed());
        }
    }
    Ok(())
}

async fn cmd_call(cfg: ResearchConfig, name: &str, args: &str) -> Result<()> {
    let registry = build_registry(&cfg)?;
    let arguments: serde_json::Value =
        serde_json::from_str(args).context("--args must be a JSON object")?;

    let result = registry.invoke(name, &arguments).await;
    println!("{}", result.text);
    if !result.success {
        bail!("Tool '{}' failed", name);
    }
    Ok(())
}

fn cmd_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    config::save_config(&ResearchConfig::default(), path)?;
    println!("{} Wrote {}", "✓".green().bold(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Startup configuration errors end the process with a non-zero status.
fn validated(cfg: ResearchConfig) -> Result<ResearchConfig> {
    config::validate(&cfg).context("Invalid configuration")?;
    Ok(cfg)
}

/// Registry with every built-in tool, wired from the config.
fn build_registry(cfg: &ResearchConfig) -> Result<ToolRegistry> {
    let store: Arc<dyn ActivityStore> = match cfg.resolved_activity_log() {
        Some(path) => {
            info!("Activity log: {}", path.display());
            Arc::new(JsonFileStore::new(path))
        }
        None => {
            info!("Activity log kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let deps = BuiltinDeps {
        search: Arc::new(DuckDuckGo::new(&cfg.search_url, DEFAULT_USER_AGENT, cfg.http_timeout())?),
        fetcher: Arc::new(HttpFetcher::new(DEFAULT_USER_AGENT, cfg.http_timeout())?),
        store,
        reports_dir: cfg.resolved_reports_dir(),
        agent_name: cfg.agent_name.clone(),
    };

    let mut registry = ToolRegistry::new(cfg.argument_policy);
    register_builtins(&mut registry, deps)?;
    Ok(registry)
}
