//! # TaskDesk API Server
//!
//! Personal task tracking over HTTP: accounts, cookie sessions, tasks with
//! optional file attachments, and a small dashboard.
//!
//! ## Usage
//!
//! ```bash
//! SESSION_SECRET=$(openssl rand -hex 32) cargo run -p taskdesk-api
//! ```

use anyhow::Context;
use taskdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskdesk_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::session::Session,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskdesk_api=debug,taskdesk_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskDesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to open database")?;

    run_migrations(&pool).await.context("Failed to run migrations")?;

    let purged = Session::purge_expired(&pool).await?;
    if purged > 0 {
        tracing::info!(purged, "Removed expired sessions");
    }

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config);
    state
        .uploads
        .ensure_dir()
        .await
        .context("Failed to prepare upload directory")?;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // keep serving; the process can still be killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
