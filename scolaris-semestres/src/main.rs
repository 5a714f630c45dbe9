//! scolaris-semestres - Semestre records microservice
//!
//! Configuration priority: command line / environment, then the TOML file,
//! then compiled defaults.

use anyhow::{Context, Result};
use clap::Parser;
use scolaris_common::config::{ConfigOverrides, RelinkScope, ServiceConfig, TomlConfig};
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scolaris_semestres::{build_router, AppState, MODULE_NAME};

/// Command-line arguments for scolaris-semestres
#[derive(Parser, Debug)]
#[command(name = "scolaris-semestres")]
#[command(about = "Semestre records service for Scolaris")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/scolaris/scolaris-semestres.toml)
    #[arg(short, long, env = "SCOLARIS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "SCOLARIS_DATABASE")]
    database: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long, env = "SCOLARIS_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SCOLARIS_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, env = "SCOLARIS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Records relinked on update: "all" or "referenced"
    #[arg(long, env = "SCOLARIS_RELINK_SCOPE")]
    relink_scope: Option<RelinkScope>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = TomlConfig::load_or_default(args.config.as_deref(), MODULE_NAME)
        .context("Failed to load configuration file")?;
    let config = ServiceConfig::resolve(
        ConfigOverrides {
            database_path: args.database,
            bind_address: args.bind,
            port: args.port,
            log_level: args.log_level,
            relink_scope: args.relink_scope,
        },
        toml,
    );

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any database delay
    info!(
        "Starting Scolaris semestres ({}) v{} [{}] built {} ({})",
        MODULE_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Relink scope: {}", config.relink_scope);

    let addr = config.socket_addr()?;

    info!("Database path: {}", config.database_path.display());
    let pool = scolaris_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(pool, config.relink_scope);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("{} listening on http://{}", MODULE_NAME, addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
