pub mod advice;
pub mod capture;
pub mod clients;
pub mod config;
pub mod db;
pub mod live;
pub mod server;
pub mod stats;
pub mod telemetry;

use std::sync::Arc;

use clients::CameraClient;
use config::DashboardConfig;
use db::Database;
use live::LiveController;
use telemetry::CaptureTelemetry;

/// Shared handles the route handlers work against.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DashboardConfig>,
    pub db: Database,
    pub live: LiveController,
    pub camera: CameraClient,
    pub telemetry: CaptureTelemetry,
}
