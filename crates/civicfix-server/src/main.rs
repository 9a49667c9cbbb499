mod config;

use std::sync::Arc;

use tracing::{info, warn};

use civicfix_api::auth::{self, AppState, AppStateInner};
use civicfix_api::middleware::SessionConfig;
use civicfix_api::routes;
use civicfix_api::storage::Storage;

use crate::config::ServerConfig;

const ADMIN_USERNAME: &str = "Admin";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "civicfix=debug,civicfix_api=debug,civicfix_db=info,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    if config.has_placeholder_secret() {
        warn!("CIVICFIX_SESSION_SECRET is unset or a placeholder; sessions can be forged");
    }
    if !config.cookie_secure {
        warn!("Session cookies are sent without the Secure attribute");
    }

    // Init database and provision the administrator
    let db = civicfix_db::Database::open(&config.db_path)?;
    let seed_db = db.clone();
    let (admin_email, admin_password) = (config.admin_email.clone(), config.admin_password.clone());
    let created = tokio::task::spawn_blocking(move || {
        auth::seed_admin(&seed_db, ADMIN_USERNAME, &admin_email, &admin_password)
    })
    .await??;
    if created {
        info!("Provisioned administrator {}", config.admin_email);
    }

    let storage = Storage::new(config.upload_dir.clone()).await?;
    info!("Serving uploads from {}", storage.dir().display());

    let state: AppState = Arc::new(AppStateInner {
        db,
        storage,
        session: SessionConfig {
            secret: config.session_secret.clone(),
            secure_cookie: config.cookie_secure,
        },
        max_upload_bytes: config.max_upload_bytes,
    });

    let app = routes::app(state);

    let addr = config.addr()?;
    info!("CivicFix listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
