//! port-mcp: MCP server exposing Port.io as tools.
//!
//! Subcommands:
//! - `port-mcp stdio`: STDIO transport for desktop MCP clients
//! - `port-mcp serve`: Streamable HTTP MCP server
//! - `port-mcp list-tools`: print every tool the server would expose

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use clap::{Parser, Subcommand};
use port_mcp::{PortClient, PortMcpConfig, PortMcpServer, ToolRegistry};
use rmcp::ServiceExt;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt as TowerServiceExt;
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "port-mcp.toml";

#[derive(Parser)]
#[command(name = "port-mcp", version, about = "MCP server for Port.io")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve Port tools over STDIO
    Stdio {
        /// Path to port-mcp.toml [default: ./port-mcp.toml or <config dir>/port-mcp/port-mcp.toml]
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Serve Port tools over Streamable HTTP
    Serve {
        /// Path to port-mcp.toml [default: ./port-mcp.toml or <config dir>/port-mcp/port-mcp.toml]
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// HTTP port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Print the tools the server exposes, including discovered action tools
    ListTools {
        /// Path to port-mcp.toml [default: ./port-mcp.toml or <config dir>/port-mcp/port-mcp.toml]
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    fn config_flag(&self) -> Option<PathBuf> {
        match self {
            Commands::Stdio { config }
            | Commands::Serve { config, .. }
            | Commands::ListTools { config } => config.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.command.config_flag()).await?;
    init_tracing(&config)?;

    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutting down port-mcp...");
        cancel_for_signal.cancel();
    });

    let registry = build_registry(&config)?;
    match cli.command {
        Commands::Stdio { .. } => run_stdio(registry, cancel).await,
        Commands::Serve { host, port, .. } => run_serve(registry, host, port, cancel).await,
        Commands::ListTools { .. } => list_tools(registry).await,
    }
}

/// Build the Port client and the tool registry from validated config.
fn build_registry(config: &PortMcpConfig) -> Result<Arc<ToolRegistry>> {
    let client = PortClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("Failed to create Port client: {}", e))?;
    tracing::info!(
        api_base = %client.api_base(),
        dynamic_actions = config.dynamic_actions,
        "Port client ready"
    );
    let registry = ToolRegistry::for_client(Arc::new(client), config.dynamic_actions);
    Ok(Arc::new(registry))
}

/// Start discovery in the background so the first `tools/list` is fast.
fn warm_up(registry: &Arc<ToolRegistry>) {
    let registry = registry.clone();
    tokio::spawn(async move {
        registry.ensure_dynamic_tools_loaded().await;
    });
}

async fn run_stdio(registry: Arc<ToolRegistry>, cancel: CancellationToken) -> Result<()> {
    warm_up(&registry);
    let server = PortMcpServer::from_shared(registry);

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let running = server
        .serve_with_ct(transport, cancel.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize stdio transport: {:?}", e))?;

    tracing::info!("port-mcp stdio transport initialized, waiting for messages");

    tokio::select! {
        result = running.waiting() => {
            match result {
                Ok(reason) => {
                    tracing::info!(?reason, "stdio transport completed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "stdio transport error");
                    return Err(anyhow::anyhow!("stdio transport error: {}", e));
                }
            }
        }
        _ = cancel.cancelled() => {
            tracing::info!("stdio transport cancelled");
        }
    }

    Ok(())
}

async fn run_serve(
    registry: Arc<ToolRegistry>,
    host: String,
    port: u16,
    cancel: CancellationToken,
) -> Result<()> {
    warm_up(&registry);
    let server = PortMcpServer::from_shared(registry);

    let session_manager = Arc::new(LocalSessionManager::default());
    let http_config = StreamableHttpServerConfig {
        cancellation_token: cancel.clone(),
        ..Default::default()
    };
    let mcp_service = StreamableHttpService::new(
        move || Ok(server.clone()),
        session_manager,
        http_config,
    );

    let app = Router::new().fallback(move |req: Request<axum::body::Body>| {
        let svc = mcp_service.clone();
        async move {
            match svc.oneshot(req).await {
                Ok(response) => response.into_response(),
                Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
            }
        }
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(host = %host, port = %port, "port-mcp HTTP server listening");
    tracing::info!("Connect your MCP client to http://{}:{}/mcp", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    tracing::info!("port-mcp HTTP server stopped");
    Ok(())
}

async fn list_tools(registry: Arc<ToolRegistry>) -> Result<()> {
    registry.ensure_dynamic_tools_loaded().await;
    let tools = registry.get_tools(None).await?;
    for tool in &tools {
        let summary = tool.description().lines().next().unwrap_or_default();
        println!("{:<40} {}", tool.name(), summary);
    }
    println!("\n{} tools ({:?})", tools.len(), registry.discovery_state());
    Ok(())
}

/// Resolve the config file: explicit flag, ./port-mcp.toml, <config dir>/port-mcp/port-mcp.toml.
///
/// `None` means no file was found and configuration comes from the environment alone.
fn resolve_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }

    let local = Path::new(CONFIG_FILE);
    if local.exists() {
        return Some(local.to_path_buf());
    }

    dirs::config_dir()
        .map(|dir| dir.join("port-mcp").join(CONFIG_FILE))
        .filter(|path| path.exists())
}

async fn load_config(explicit: Option<PathBuf>) -> Result<PortMcpConfig> {
    let config = match resolve_config(explicit) {
        Some(path) => PortMcpConfig::load(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load config file {:?}: {}", path, e))?,
        None => PortMcpConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
///
/// Logs never go to stdout, which carries the STDIO transport.
fn init_tracing(config: &PortMcpConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_ascii_lowercase()));

    match &config.log_path {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open log file {:?}: {}", path, e))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
