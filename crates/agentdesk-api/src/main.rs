//! agentdesk entry point.
//!
//! Binary name: `agentdesk`
//!
//! Parses CLI arguments, sets up tracing, resolves configuration, opens the
//! database, then runs migrations or starts the REST API server.

mod cli;

use std::path::Path;

use anyhow::Context;
use clap::Parser;

use agentdesk_api::http;
use agentdesk_api::state::AppState;
use agentdesk_infra::config::{
    database_config_from_env, load_server_config, resolve_data_dir, sqlite_path,
};
use agentdesk_infra::sqlite::pool::DatabasePool;
use agentdesk_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use cli::{Cli, Commands};

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(TracingOptions {
        verbosity: cli.verbose,
        json: cli.log_json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let db_config = database_config_from_env(&data_dir, |name| std::env::var(name).ok())?;
    tracing::debug!(backend = db_config.backend_name(), "Database configuration resolved");
    let db_path = sqlite_path(&db_config)?;

    match cli.command {
        Commands::Migrate => {
            open_pool(db_path).await?;
            tracing::info!(path = %db_path.display(), "Migrations applied");
        }

        Commands::Serve { port, host } => {
            let config = load_server_config(&data_dir).await;
            let seed = config.seed_defaults;
            let pool = open_pool(db_path).await?;
            let state = AppState::new(pool, config)?;

            if seed {
                let password = std::env::var("AGENTDESK_ADMIN_PASSWORD")
                    .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());
                state
                    .user_service
                    .seed_defaults(&password)
                    .await
                    .context("failed to seed default roles and admin user")?;
            }

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            tracing::info!(%addr, "agentdesk API listening");

            let router = http::router::build_router(state);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            tracing::info!("Server stopped");
        }
    }

    Ok(())
}

async fn open_pool(path: &Path) -> anyhow::Result<DatabasePool> {
    DatabasePool::open(path)
        .await
        .with_context(|| format!("failed to open database {}", path.display()))
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
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
}
