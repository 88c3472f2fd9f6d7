use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkwatch::{
    config::AppConfig,
    db,
    uptime::{HttpProber, UptimeMonitor},
    AppState,
};

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present; env vars may already be set
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linkwatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting linkwatch on {}:{}", config.host, config.port);
    tracing::info!("Base URL: {}", config.base_url);

    let pool = db::connect(&config.database_url, 10).await?;
    db::migrate(&pool).await?;
    tracing::info!("Database migrations applied");

    let prober = Arc::new(HttpProber::new(config.probe_timeout)?);

    let monitor = UptimeMonitor::new(pool.clone(), prober.clone(), config.monitor_settings());
    if config.monitor_enabled {
        monitor.start().await;
    } else {
        tracing::warn!("Uptime monitor disabled by MONITOR_ENABLED");
    }

    let bind_addr = format!("{}:{}", config.host, config.port);

    let state = AppState::new(pool, config, prober);
    db::warm_cache(&state.db, &state.cache).await?;

    let app = linkwatch::router(Arc::new(state));

    // ── Serve ──────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.stop().await;
    tracing::info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
