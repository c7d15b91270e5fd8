//! CLI entrypoint for agent-relay
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use relay_application::{
    ConversationStore, RunChatUseCase, ToolCatalogStore, ToolDispatcher, ToolRegistry,
    TraceRecorder, TraceStore,
};
use relay_domain::{SpanNode, ToolDefinition, TraceId};
use relay_infrastructure::{
    AnthropicConfig, AnthropicGateway, ConfigLoader, ConfiguredAgents, FileConfig,
    FileLoggingConfig, MemoryStore, SqliteStore, StaticTokenResolver, StorageBackend,
    TraceStatsTool,
};
use relay_presentation::{AppState, Cli, Command};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_ref())
        .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(cli.verbose, &config.logging);

    match cli.command {
        Command::Serve { bind } => serve(config, bind).await,
        Command::CheckConfig => check_config(&config, cli.config.as_ref()),
        Command::Trace { trace_id, json } => print_trace(&config, trace_id, json).await,
    }
}

fn init_logging(verbose: u8, logging: &FileLoggingConfig) -> Option<WorkerGuard> {
    // RUST_LOG wins unless verbosity was requested explicitly
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            builder.with_writer(writer).with_ansi(false).init();
            Some(guard)
        }
        None => {
            builder.init();
            None
        }
    }
}

/// The storage backend behind every store port.
struct Stores {
    catalog: Arc<dyn ToolCatalogStore>,
    traces: Arc<dyn TraceStore>,
    conversations: Arc<dyn ConversationStore>,
}

/// Open the configured backend. `catalog` seeds the tool catalog when given.
async fn open_stores(config: &FileConfig, catalog: Option<Vec<ToolDefinition>>) -> Result<Stores> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let store = SqliteStore::open(&config.storage.path)
                .await
                .with_context(|| {
                    format!("Failed to open database {}", config.storage.path.display())
                })?;
            if let Some(tools) = catalog {
                store
                    .upsert_tools(tools)
                    .await
                    .context("Failed to seed tool catalog")?;
            }
            info!(path = %store.path().display(), "Using SQLite storage");
            let store = Arc::new(store);
            Ok(Stores {
                catalog: store.clone(),
                traces: store.clone(),
                conversations: store,
            })
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; conversations and traces are lost on exit");
            let store = Arc::new(MemoryStore::new().with_tools(catalog.unwrap_or_default()));
            Ok(Stores {
                catalog: store.clone(),
                traces: store.clone(),
                conversations: store,
            })
        }
    }
}

/// Built-in tool rows followed by the configured ones; a configured row
/// replaces a built-in row of the same name.
fn tool_catalog(config: &FileConfig) -> Vec<ToolDefinition> {
    let mut tools = vec![TraceStatsTool::definition()];
    for tool in &config.tools {
        tools.retain(|t| t.name != tool.name);
        tools.push(tool.clone());
    }
    tools
}

async fn serve(config: FileConfig, bind: Option<String>) -> Result<()> {
    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config error: {}", issue);
        }
        bail!("Configuration is invalid ({} issue(s))", issues.len());
    }
    if config.agents.is_empty() {
        warn!("No agents configured; every chat request will be rejected");
    }

    // === Dependency Injection ===
    let stores = open_stores(&config, Some(tool_catalog(&config))).await?;
    let params = config.chat_params();

    let recorder = Arc::new(TraceRecorder::new(stores.traces));
    let registry = Arc::new(ToolRegistry::new(stores.catalog, params.registry_ttl));

    let mut dispatcher = ToolDispatcher::new(recorder.clone());
    dispatcher.register(Arc::new(TraceStatsTool::new(recorder.clone())));
    info!(handlers = ?dispatcher.tool_names(), "Registered tool handlers");

    let gateway = AnthropicGateway::new(AnthropicConfig {
        base_url: config.model.base_url.clone(),
        api_version: config.model.api_version.clone(),
        api_key: config.model.resolve_api_key(),
        timeout: Duration::from_secs(config.model.timeout_secs),
    })?;

    let credentials = StaticTokenResolver::from_config(&config.auth.tokens);
    if credentials.is_empty() {
        warn!("No auth tokens configured; every request will be rejected");
    }

    let chat = RunChatUseCase::new(
        Arc::new(gateway),
        registry,
        Arc::new(dispatcher),
        recorder.clone(),
        stores.conversations.clone(),
        Arc::new(ConfiguredAgents::new(config.agents.clone())),
        Arc::new(credentials),
    )
    .with_params(params);

    let shutdown = CancellationToken::new();
    let state = AppState::new(
        Arc::new(chat),
        recorder,
        stores.conversations,
        shutdown.clone(),
    );

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    println!("agent-relay listening on http://{}", listener.local_addr()?);

    tokio::spawn(wait_for_shutdown(shutdown.clone()));
    relay_presentation::serve(listener, state, shutdown).await?;
    Ok(())
}

async fn wait_for_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
    token.cancel();
}

fn check_config(config: &FileConfig, explicit: Option<&PathBuf>) -> Result<()> {
    println!("Configuration sources (highest priority first, after AGENT_RELAY_* env):");
    for (source, exists) in ConfigLoader::config_sources(explicit) {
        let marker = if exists { "found" } else { "missing" };
        println!("  [{:>7}] {}", marker, source);
    }
    println!();
    println!("server.bind      = {}", config.server.bind);
    println!("storage.backend  = {:?}", config.storage.backend);
    println!("dispatch.mode    = {:?}", config.dispatch.mode);
    println!("agents           = {}", config.agents.len());
    println!("tools            = {}", config.tools.len());
    println!("auth tokens      = {}", config.auth.tokens.len());
    println!(
        "model api key    = {}",
        if config.model.resolve_api_key().is_some() {
            "set"
        } else {
            "missing"
        }
    );

    let issues = config.validate();
    if issues.is_empty() {
        println!();
        println!("Configuration OK");
        return Ok(());
    }

    println!();
    for issue in &issues {
        println!("  error: {}", issue);
    }
    bail!("{} configuration issue(s) found", issues.len())
}

async fn print_trace(config: &FileConfig, trace_id: String, json: bool) -> Result<()> {
    let stores = open_stores(config, None).await?;
    let recorder = TraceRecorder::new(stores.traces);
    let nodes = recorder.reconstruct(&TraceId::new(trace_id.clone())).await?;
    if nodes.is_empty() {
        bail!("No spans found for trace {}", trace_id);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
    } else {
        for node in &nodes {
            println!("{}", format_node(node));
        }
    }
    Ok(())
}

fn format_node(node: &SpanNode) -> String {
    let span = &node.span;
    let mut line = format!(
        "{}{} [{}] {}ms",
        "  ".repeat(node.depth),
        span.action,
        span.severity,
        span.duration_ms
    );
    if let Some(error) = &span.error_message {
        line.push_str(&format!(" error: {}", error));
    }
    line
}
