use anyhow::Result;
use clap::{Parser, Subcommand};
use screen_stream_mcp::config::ServerConfig;
use screen_stream_mcp::session::manager::spawn_cleanup;
use screen_stream_mcp::transport::{http_router, stdio, HttpRouterOptions};
use std::time::Duration;
use tracing::info;

/// Screen capture streaming MCP server: exposes display/window capture as
/// MCP tools and resources, with live frame streaming over stdio, SSE, or
/// WebSocket.
#[derive(Parser, Debug)]
#[command(name = "cap-mcp")]
#[command(about = "MCP server for screen capture and live frame streaming")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve over HTTP instead of the default stdio transport.
    Serve {
        /// Bind address, overrides $HOST.
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overrides $PORT.
        #[arg(long)]
        port: Option<u16>,

        /// Mount the SSE transport (`/sse`, `/messages`).
        #[arg(long)]
        enable_sse: bool,

        /// Mount the WebSocket transport (`/ws`).
        #[arg(long)]
        enable_ws: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        None => {
            info!("starting cap-mcp over stdio");
            let ctx = screen_stream_mcp::build_context(config).await?;
            let cleanup = spawn_cleanup(
                ctx.manager.clone(),
                Duration::from_secs(ctx.config.cleanup_interval_secs),
            );
            let result = stdio::run(ctx.clone()).await;
            cleanup.abort();
            ctx.manager.stop_all().await;
            result
        }
        Some(Command::Serve {
            host,
            port,
            enable_sse,
            enable_ws,
        }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            config.validate()?;

            let addr = format!("{}:{}", config.host, config.port);
            let ctx = screen_stream_mcp::build_context(config).await?;
            let cleanup = spawn_cleanup(
                ctx.manager.clone(),
                Duration::from_secs(ctx.config.cleanup_interval_secs),
            );

            let options = HttpRouterOptions {
                enable_sse,
                enable_ws,
            };
            let router = http_router(ctx.clone(), options);

            info!(%addr, enable_sse, enable_ws, "starting cap-mcp over HTTP");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await;

            cleanup.abort();
            ctx.manager.stop_all().await;
            result.map_err(anyhow::Error::from)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl_c handler");
    }
    info!("shutdown signal received");
}
