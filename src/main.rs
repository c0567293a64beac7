//! heirloom: family photo face tagging service
//!
//! Startup order: tracing, configuration, media tree, database, orphan
//! reconciliation, detector, HTTP server. Any failure aborts startup.

use anyhow::{Context, Result};
use clap::Parser;
use heirloom::config::{Cli, Config};
use heirloom::detect::scrfd::ScrfdDetector;
use heirloom::AppState;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting heirloom v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = Config::resolve(&cli)?;
    info!(media_root = %config.media_root.display(), "media root resolved");
    if config.oauth.is_none() {
        info!("Google OAuth client not configured; drive routes will prompt for setup");
    }

    std::fs::create_dir_all(&config.media_root)
        .with_context(|| format!("creating media root {}", config.media_root.display()))?;

    let db_pool = heirloom::db::init_database_pool(&config.database_path).await?;
    info!(path = %config.database_path.display(), "database ready");

    let detector = ScrfdDetector::load(&config.model_path)
        .with_context(|| "loading face detection model")?;

    let state = AppState::new(db_pool, Arc::new(config.clone()), Box::new(detector));
    state
        .workflow
        .storage()
        .ensure_layout()
        .context("creating media directories")?;

    // Crash between a crop move and its record insert leaves a file with no
    // record; sweep those before serving.
    let removed = state.workflow.reconcile().await?;
    if removed > 0 {
        info!(removed, "startup reconciliation removed orphaned crops");
    }

    let app = heirloom::build_router(state);

    let address = format!("127.0.0.1:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on http://{address}");

    axum::serve(listener, app).await?;

    Ok(())
}
