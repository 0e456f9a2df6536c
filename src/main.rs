//! fast3d-print: text-to-3D generation server.
//!
//! Loads the Shap-E diffusion pipeline once at startup, then serves
//! prompt-to-mesh requests over HTTP, exporting binary PLY files that
//! are handed back as static URLs.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use fast3d_print::config::{Cli, Config};
use fast3d_print::engine::generator::AiEngine;
use fast3d_print::server::api::{build_router, AppState};
use fast3d_print::server::metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "fast3d_print=debug,tower_http=debug"
    } else {
        "fast3d_print=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("fast3d-print v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?;
    let config = Arc::new(config);

    info!(
        weights = %config.pipeline.weights_dir.display(),
        output = %config.generation.output_dir.display(),
        fp16 = config.pipeline.use_fp16,
        "Configuration loaded"
    );

    // Initialize metrics.
    metrics::init_metrics();

    // Ensure the output directory exists before anything is served from it.
    tokio::fs::create_dir_all(&config.generation.output_dir).await?;

    // Load the generation engine (picks a device, loads weights once).
    let engine = AiEngine::new(config.clone());

    // Build application state.
    let state = Arc::new(AppState {
        engine,
        config: config.clone(),
    });

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = cli
        .listen
        .unwrap_or_else(|| config.server.listen.clone());
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
