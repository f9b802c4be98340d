mod cleanup;

use std::net::SocketAddr;
use std::path::PathBuf;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use blogger_api::config::AppConfig;
use blogger_api::routes::router;
use blogger_api::state::AppStateInner;
use blogger_db::Database;

/// Janitor period.
const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "blogger_server=debug,blogger_api=debug,blogger_db=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    // Config
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e}");
            eprintln!("       Set BLOGGER_ACCESS_TOKEN_SECRET and BLOGGER_REFRESH_TOKEN_SECRET");
            eprintln!("       to two different random strings in your .env file and restart.");
            std::process::exit(1);
        }
    };
    let host = std::env::var("BLOGGER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("BLOGGER_PORT")
        .unwrap_or_else(|_| "3003".into())
        .parse()?;
    let db_path: PathBuf = std::env::var("BLOGGER_DB_PATH")
        .unwrap_or_else(|_| "blogger.db".into())
        .into();

    let state = AppStateInner::new(Database::open(&db_path)?, config);

    // Prune expired sessions and guest accounts in the background
    tokio::spawn(cleanup::run_cleanup_loop(state.clone(), CLEANUP_INTERVAL_SECS));

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Blogger server listening on {}", addr);

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
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("No SIGTERM handler ({}), waiting for Ctrl+C only", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
