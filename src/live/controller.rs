use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::advice;
use crate::capture::{CaptureContext, CaptureController};
use crate::clients::{CameraClient, CoachingClient, InferenceClient};
use crate::config::DashboardConfig;
use crate::db::models::{SessionDraft, SessionRecord, Shot, ShotMetrics};
use crate::db::Database;
use crate::stats;
use crate::telemetry::CaptureTelemetry;

use super::state::{LiveState, LiveStatus};

/// Read-only view of the current run for the live page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub status: LiveStatus,
    pub run_id: Option<String>,
    pub camera_session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_secs: u64,
    pub shot_count: usize,
    pub shots: Vec<Shot>,
    pub metrics: ShotMetrics,
    pub last_frame_id: Option<u64>,
}

/// Owns the live-session lifecycle: camera session, capture loop, the
/// in-memory shot list, and the save-at-end step.
#[derive(Clone)]
pub struct LiveController {
    state: Arc<Mutex<LiveState>>,
    db: Database,
    camera: CameraClient,
    inference: InferenceClient,
    coaching: Option<CoachingClient>,
    telemetry: CaptureTelemetry,
    capture: Arc<Mutex<CaptureController>>,
    config: Arc<DashboardConfig>,
}

impl LiveController {
    pub fn new(
        db: Database,
        camera: CameraClient,
        inference: InferenceClient,
        coaching: Option<CoachingClient>,
        telemetry: CaptureTelemetry,
        config: Arc<DashboardConfig>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(LiveState::new())),
            db,
            camera,
            inference,
            coaching,
            telemetry,
            capture: Arc::new(Mutex::new(CaptureController::new())),
            config,
        }
    }

    pub async fn snapshot(&self) -> LiveSnapshot {
        let mut state = self.state.lock().await;
        state.sync_active_from_anchor();

        let metrics = stats::compute(
            &state.shots,
            state.reference_center(),
            state.elapsed_secs(),
        );

        LiveSnapshot {
            status: state.status,
            run_id: state.run_id.clone(),
            camera_session_id: state.camera_session_id.clone(),
            started_at: state.started_at,
            elapsed_secs: state.elapsed_secs(),
            shot_count: state.shots.len(),
            shots: state.shots.clone(),
            metrics,
            last_frame_id: state.last_frame_id,
        }
    }

    pub async fn start(&self) -> Result<LiveSnapshot> {
        {
            let state = self.state.lock().await;
            if state.status != LiveStatus::Idle {
                return Err(anyhow!("a live session is already active"));
            }
        }

        let camera_session_id = self
            .camera
            .start_session(self.config.camera.fps)
            .await
            .map_err(|err| anyhow!("failed to start camera session: {err:#}"))?;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        {
            let mut state = self.state.lock().await;
            state.begin_run(
                run_id.clone(),
                camera_session_id.clone(),
                started_at,
                Instant::now(),
            );
        }

        self.telemetry.reset().await;

        let capture_result = self.capture.lock().await.start(CaptureContext {
            state: self.state.clone(),
            camera: self.camera.clone(),
            inference: self.inference.clone(),
            telemetry: self.telemetry.clone(),
            poll_interval: Duration::from_secs(self.config.camera.poll_interval_secs),
            long_poll_timeout: Duration::from_secs(self.config.camera.frame_timeout_secs),
            capture_timeout: Duration::from_secs(self.config.camera.capture_timeout_secs),
        });
        if let Err(err) = capture_result {
            self.state.lock().await.reset();
            if let Err(close_err) = self.camera.close_session().await {
                warn!("failed to close camera session after aborted start: {close_err:#}");
            }
            return Err(err);
        }

        info!("live session {run_id} started (camera session {camera_session_id})");
        Ok(self.snapshot().await)
    }

    pub async fn pause(&self) -> Result<LiveSnapshot> {
        {
            let mut state = self.state.lock().await;
            if state.status != LiveStatus::Running {
                return Err(anyhow!("no running session to pause"));
            }
            state.pause();
        }
        info!("live session paused");
        Ok(self.snapshot().await)
    }

    pub async fn resume(&self) -> Result<LiveSnapshot> {
        {
            let mut state = self.state.lock().await;
            if state.status != LiveStatus::Paused {
                return Err(anyhow!("no paused session to resume"));
            }
            state.resume(Instant::now());
        }
        info!("live session resumed");
        Ok(self.snapshot().await)
    }

    /// Ends the run and persists it. Refuses to save a session with no
    /// shots; the run keeps going so the shooter can land one first.
    pub async fn finish(&self) -> Result<SessionRecord> {
        {
            let state = self.state.lock().await;
            if state.status == LiveStatus::Idle {
                return Err(anyhow!("no active session to finish"));
            }
            if state.shots.is_empty() {
                return Err(anyhow!(
                    "session has no recorded shots; capture at least one before finishing"
                ));
            }
        }

        // Stop the capture loop before reading the final shot list, so a
        // capture landing mid-teardown is either fully in or fully out.
        self.capture.lock().await.stop().await?;
        if let Err(err) = self.camera.close_session().await {
            warn!("failed to close camera session: {err:#}");
        }

        let finished_at = Utc::now();
        let (shots, elapsed_secs, reference) = {
            let mut state = self.state.lock().await;
            state.sync_active_from_anchor();
            (
                state.shots.clone(),
                state.elapsed_secs(),
                state.reference_center(),
            )
        };

        let metrics = stats::compute(&shots, reference, elapsed_secs);
        let skill_level = self.config.coaching.skill_level;
        let advice =
            advice::generate(self.coaching.as_ref(), skill_level, &shots, &metrics).await;

        let record = self
            .db
            .insert_session(SessionDraft {
                date: finished_at,
                shots,
                metrics,
                advice,
                skill_level,
            })
            .await?;

        self.state.lock().await.reset();

        info!(
            "live session saved as session {} ({} shot(s), {}s)",
            record.id,
            record.shots.len(),
            record.metrics.elapsed_secs
        );
        Ok(record)
    }

    /// Abandons the run without saving anything. A no-op when idle.
    pub async fn discard(&self) -> Result<()> {
        {
            let state = self.state.lock().await;
            if state.status == LiveStatus::Idle {
                return Ok(());
            }
        }

        self.capture.lock().await.stop().await?;
        if let Err(err) = self.camera.close_session().await {
            warn!("failed to close camera session: {err:#}");
        }

        self.state.lock().await.reset();
        info!("live session discarded");
        Ok(())
    }
}
