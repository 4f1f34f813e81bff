mod app;
mod cache;
mod config;
mod handlers;
mod rate_limit;
mod state;
mod upstream;

#[cfg(test)]
mod mock_upstream;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agendakit_core::cache::Cache;

use crate::{
    app::create_app,
    cache::{RedisCache, TieredCache},
    config::{CacheConfig, Config},
    state::AppState,
};

const REDIS_RECONNECT_INTERVAL: Duration = Duration::from_secs(30);

/// Agendakit - caching proxy for embeddable event agenda widgets
#[derive(Parser, Debug)]
#[command(name = "agendakit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3004", env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agendakit=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env(cli.port)?;
    if config.default_event_id.is_none() {
        tracing::warn!("DEFAULT_EVENT_ID is not set; embed-code requests must name an event");
    }
    tracing::info!(
        environment = %config.environment,
        widget_domain = %config.widget_domain,
        redis_enabled = config.cache.redis_enabled,
        "Configuration loaded"
    );

    let cache = build_cache(&config.cache).await?;
    cache.spawn_reconnect_monitor(REDIS_RECONNECT_INTERVAL);

    let state = AppState::new(config, cache);
    state.rate_limiter.spawn_cleanup_task();

    let app = create_app(state);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    // Client addresses feed the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Builds the two-tier cache. When Redis is enabled but unreachable, the
/// service starts degraded on the memory cache and the reconnect monitor keeps
/// trying in the background.
async fn build_cache(config: &CacheConfig) -> Result<Arc<TieredCache>> {
    if !config.redis_enabled {
        tracing::info!("Redis disabled, using memory cache only");
        return Ok(Arc::new(TieredCache::new(None, config.clone())?));
    }

    let redis = match RedisCache::open(&config.redis_url) {
        Ok(redis) => redis,
        Err(err) => {
            tracing::warn!(
                url = %config.redis_url_redacted(),
                error = %err,
                "Invalid Redis URL, using memory cache only"
            );
            return Ok(Arc::new(TieredCache::new(None, config.clone())?));
        }
    };

    let startup_ping = redis.ping().await;
    let cache = Arc::new(TieredCache::new(
        Some(Arc::new(redis) as Arc<dyn Cache>),
        config.clone(),
    )?);

    match startup_ping {
        Ok(()) => tracing::info!(url = %config.redis_url_redacted(), "Connected to Redis"),
        Err(err) => {
            tracing::warn!(
                url = %config.redis_url_redacted(),
                error = %err,
                "Redis unavailable, falling back to memory cache"
            );
            cache.mark_degraded(&err);
        }
    }

    Ok(cache)
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
