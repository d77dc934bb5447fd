use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use banking_api::config::DbConfig;
use banking_api::db::DbConnection;
use banking_api::error;
use banking_api::rest::{self, AppState};

/// Banking API server.
///
/// Serves account and transaction CRUD over the database named by the
/// DATABASE_* environment variables.
#[derive(Parser, Debug)]
#[command(name = "banking-api")]
struct Args {
    /// HTTP listen address
    #[arg(long, default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// Include raw database error text in 500 response bodies
    #[arg(long)]
    debug_errors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.debug_errors || std::env::var("DEBUG_ERRORS").is_ok_and(|v| v == "1") {
        error::enable_debug_errors();
    }

    // Startup failures are fatal: no retry, no degraded mode.
    let config = DbConfig::from_env().context("reading database configuration")?;
    info!(
        "connecting to database {} at {}:{}",
        config.database, config.host, config.port
    );
    let db = DbConnection::connect(&config)
        .await
        .context("connecting to database")?;
    info!("database connection established");

    let app = rest::router(AppState::new(db.clone()));
    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("binding {}", args.addr))?;
    info!("listening on {}", args.addr);

    let served = axum::serve(listener, app).await;

    // Release the pool on the fall-through exit path before reporting why
    // the server loop ended.
    db.close().await;
    served.context("server terminated")?;
    Ok(())
}
