use std::error::Error;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

mod batch;
mod config;
mod handlers;
mod llm;
mod outfits;
mod overlay;
mod state;
mod tools;
mod utils;

use batch::compose::{parse_compose_args, run_compose};
use batch::lookbook::{parse_lookbook_args, run_lookbook};
use config::CONFIG;
use state::AppState;
use utils::logging::init_logging;

type MainResult = Result<(), Box<dyn Error + Send + Sync>>;

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {err}");
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> MainResult {
    dotenv().ok();
    let _guards = init_logging();
    for warning in &CONFIG.warnings {
        warn!("{warning}");
    }

    let args: Vec<String> = std::env::args().collect();
    if let Some(compose_args) = parse_compose_args(&args)? {
        let summary = run_compose(compose_args).await?;
        info!(
            "Compose summary: out={} x={:.0} y={:.0} diameter={:.0} shared={:?}",
            summary.out.display(),
            summary.overlay.position.x,
            summary.overlay.position.y,
            summary.overlay.diameter,
            summary.share
        );
        return Ok(());
    }
    if let Some(lookbook_args) = parse_lookbook_args(&args)? {
        let summary = run_lookbook(lookbook_args).await?;
        info!(
            "Lookbook summary: outfits={} images={} failures={} warning={:?}",
            summary.outfits,
            summary.images_written,
            summary.generation_failures,
            summary.warning
        );
        return Ok(());
    }

    if !CONFIG.openai_configured() {
        info!("OPENAI_API_KEY is not set; only sample recommendations and compose will work");
    }

    let state = AppState::new(CONFIG.overlay_limits());
    let app = handlers::build_router(state, CONFIG.max_upload_bytes);

    let listener = TcpListener::bind(CONFIG.bind_addr).await?;
    info!("Outfit overlay service listening on {}", CONFIG.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
