//! `elpris-server` binary entry point.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use elpris::chat::Orchestrator;
use elpris::cli::Cli;
use elpris::config::ServiceConfig;
use elpris::error::ChatError;
use elpris::mcp::MCPTransport;
use elpris::server::{router, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "elpris-server stopped");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ChatError> {
    let mut config = ServiceConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    let addr = config.server.socket_addr()?;

    let orchestrator = Orchestrator::from_config(&config)?;
    info!(
        model = %config.gemini.model,
        fallback = ?config.gemini.fallback(),
        tool_server = %config.mcp.endpoint().describe(),
        "Chat orchestrator ready"
    );

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, router(AppState::new(orchestrator)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for ctrl-c");
    }
}
