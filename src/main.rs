use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use gmshooter::clients::{CameraClient, CoachingClient, InferenceClient};
use gmshooter::config::DashboardConfig;
use gmshooter::db::Database;
use gmshooter::live::LiveController;
use gmshooter::telemetry::CaptureTelemetry;
use gmshooter::{server, AppState};

/// Baseline timeout for the short camera requests (start/close/latest); the
/// long-poll frame fetch sets its own.
const CAMERA_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(author, version, about = "GMShooter dashboard backend")]
struct Args {
    /// Path to the JSON settings file
    #[arg(long, default_value = "gmshooter.json")]
    config: PathBuf,
    /// Override the configured bind address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = DashboardConfig::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    let config = Arc::new(config);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;

    let db = Database::new(config.storage.db_path.clone())?;
    let camera = CameraClient::new(config.camera.base_url.clone(), CAMERA_REQUEST_TIMEOUT)?;
    let inference = InferenceClient::new(
        config.inference.endpoint.clone(),
        config.inference.model_id.clone(),
        config.inference.api_key.clone(),
    )?;
    let coaching = match &config.coaching.endpoint {
        Some(endpoint) => Some(CoachingClient::new(
            endpoint.clone(),
            config.coaching.api_key.clone(),
        )?),
        None => None,
    };

    let telemetry = CaptureTelemetry::new();
    let live = LiveController::new(
        db.clone(),
        camera.clone(),
        inference,
        coaching,
        telemetry.clone(),
        config.clone(),
    );

    let state = AppState {
        config: config.clone(),
        db,
        live: live.clone(),
        camera,
        telemetry,
    };

    let routes = server::api_routes(state);
    let (bound, serving) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        let _ = tokio::signal::ctrl_c().await;
    });

    info!("GMShooter dashboard listening on {bound}");
    serving.await;

    // Leave the camera in a clean state if a run was still going.
    if let Err(err) = live.discard().await {
        warn!("failed to discard live session during shutdown: {err:#}");
    }
    info!("shut down");

    Ok(())
}
