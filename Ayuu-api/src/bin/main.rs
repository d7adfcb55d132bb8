use std::sync::Arc;
use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use ayuu_api::api::{create_application, handlers::health::initialize_server_start_time, AppState};
use ayuu_api::config::ServerConfig;
use ayuu_data::database::{self, DatabaseConfig, DatabaseType};
use ayuu_domain::auth::directory::InMemoryUserDirectory;
use ayuu_domain::auth::{self, AuthConfig};

/// The main entry point for the Ayuu API server
///
/// Loads `.env`, installs tracing, opens the configured storage backend,
/// builds the router and serves it until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_ansi(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stdout),
        )
        .with(env_filter)
        .init();

    info!("Starting Ayuu API server");

    let server_config = ServerConfig::from_env()?;

    let mut db_config = DatabaseConfig::from_env().context("invalid database configuration")?;
    if db_config.db_type == DatabaseType::Sqlite && db_config.sqlite_path.is_none() {
        if !server_config.data_dir.exists() {
            info!("Creating data directory: {}", server_config.data_dir.display());
            std::fs::create_dir_all(&server_config.data_dir)
                .with_context(|| format!("cannot create {}", server_config.data_dir.display()))?;
        }
        let path = server_config.default_sqlite_path();
        info!("DB_SQLITE_PATH not set, using {}", path.display());
        db_config.sqlite_path = Some(path.to_string_lossy().to_string());
    }

    let pool = database::initialize_database_pool(&db_config).context("failed to initialize database")?;
    match &pool {
        Some(pool) => info!("Storage backend: {}", database::get_connection_info(pool)?),
        None => warn!("Storage backend: in-memory; records are lost on restart"),
    }

    let auth_config = AuthConfig::from_env()?;
    let directory = Arc::new(InMemoryUserDirectory::new());
    match auth::admin_bootstrap_from_env() {
        Some(request) => {
            if let Some(account) = auth::bootstrap_admin(directory.as_ref(), request).await? {
                info!("Created administrator account {}", account.username);
            }
        }
        None => warn!("ADMIN_USERNAME, ADMIN_EMAIL and ADMIN_PASSWORD not set; no administrator account"),
    }

    initialize_server_start_time();

    let state = AppState::new(pool, directory, auth_config).with_environment(server_config.environment.clone());
    let app = create_application(state);

    let addr = server_config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutting down server...");
}
