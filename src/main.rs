use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use account_functions::{app, config, state::AppState};

#[derive(Parser)]
#[command(name = "account-functions")]
#[command(about = "Account deletion and password recovery functions")]
#[command(version)]
struct Args {
    #[arg(long, help = "Listen address (overrides ACCOUNT_FUNCTIONS_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Listen port (overrides ACCOUNT_FUNCTIONS_PORT / PORT)")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL and friends
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = config::config();
    tracing::info!("Starting account functions in {:?} mode", config.environment);

    let state = AppState::from_config(config);
    let router = app(state).layer(DefaultBodyLimit::max(config.server.max_request_size_bytes));

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Account functions listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
