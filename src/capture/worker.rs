use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{info, warn};
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::clients::{CameraClient, InferenceClient};
use crate::live::state::{LiveState, LiveStatus};
use crate::telemetry::{CaptureStats, CaptureTelemetry};

use super::framehash::{frame_hash, hash_distance};

/// Hamming distance below which a frame counts as unchanged and inference is
/// skipped.
const HASH_CHANGE_THRESHOLD: u32 = 8;

/// Everything a capture run needs; cloned into the spawned loop task.
pub struct CaptureContext {
    pub state: Arc<Mutex<LiveState>>,
    pub camera: CameraClient,
    pub inference: InferenceClient,
    pub telemetry: CaptureTelemetry,
    pub poll_interval: Duration,
    pub long_poll_timeout: Duration,
    pub capture_timeout: Duration,
}

/// Polls the camera for new frames and feeds them through shot detection.
/// One capture runs at a time by construction: each tick performs fetch,
/// hash, and inference sequentially under a timeout before the next tick is
/// taken.
pub async fn capture_loop(ctx: CaptureContext, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(ctx.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_analyzed_hash: Option<String> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let running = {
                    ctx.state.lock().await.status == LiveStatus::Running
                };
                if !running {
                    continue;
                }

                let fut = perform_capture(&ctx, &mut last_analyzed_hash);
                match tokio::time::timeout(ctx.capture_timeout, fut).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => warn!("capture failed: {err:#}"),
                    Err(_) => warn!(
                        "capture timed out (> {}s)",
                        ctx.capture_timeout.as_secs()
                    ),
                }
            }
            _ = cancel_token.cancelled() => {
                info!("capture loop shutting down");
                break;
            }
        }
    }
}

async fn perform_capture(
    ctx: &CaptureContext,
    last_analyzed_hash: &mut Option<String>,
) -> Result<()> {
    let capture_start = Instant::now();
    let since = { ctx.state.lock().await.last_frame_id };

    let frame_start = Instant::now();
    let frame = ctx
        .camera
        .next_frame(since, ctx.long_poll_timeout)
        .await
        .context("frame fetch failed")?;
    let frame_ms = frame_start.elapsed().as_millis() as u64;

    let Some(frame) = frame else {
        ctx.telemetry
            .record_capture(CaptureStats {
                timestamp: Utc::now(),
                frame_id: None,
                frame_ms,
                frame_bytes: 0,
                hash_ms: 0,
                inference_ms: None,
                skipped_reason: Some("no new frame".to_string()),
                new_shots: 0,
                total_ms: capture_start.elapsed().as_millis() as u64,
            })
            .await;
        return Ok(());
    };

    let observed_at = Utc::now();
    {
        ctx.state.lock().await.note_frame(frame.frame_id);
    }

    // Share the JPEG between the hashing task and the inference call without
    // copying it.
    let jpeg = Arc::new(frame.jpeg);

    let hash_start = Instant::now();
    let hash = tokio::task::spawn_blocking({
        let bytes = Arc::clone(&jpeg);
        move || frame_hash(&bytes)
    })
    .await
    .context("frame hash worker join failed")?
    .map_err(|err| anyhow!("frame {} could not be hashed: {err}", frame.frame_id))?;
    let hash_ms = hash_start.elapsed().as_millis() as u64;

    let unchanged = last_analyzed_hash
        .as_deref()
        .map(|prev| hash_distance(&hash, prev) < HASH_CHANGE_THRESHOLD)
        .unwrap_or(false);
    if unchanged {
        ctx.telemetry
            .record_capture(CaptureStats {
                timestamp: observed_at,
                frame_id: Some(frame.frame_id),
                frame_ms,
                frame_bytes: jpeg.len(),
                hash_ms,
                inference_ms: None,
                skipped_reason: Some("unchanged frame".to_string()),
                new_shots: 0,
                total_ms: capture_start.elapsed().as_millis() as u64,
            })
            .await;
        return Ok(());
    }

    let inference_start = Instant::now();
    let analysis = ctx
        .inference
        .detect_shots(&jpeg)
        .await
        .with_context(|| format!("shot detection failed for frame {}", frame.frame_id))?;
    let inference_ms = inference_start.elapsed().as_millis() as u64;
    *last_analyzed_hash = Some(hash);

    let new_shots = {
        let mut state = ctx.state.lock().await;
        if let Some(image) = analysis.image {
            state.note_image_size(image.width, image.height);
        }
        state.record_detections(&analysis.predictions, observed_at)
    };

    if new_shots > 0 {
        info!(
            "{new_shots} new shot(s) detected on frame {} ({} prediction(s) total)",
            frame.frame_id,
            analysis.predictions.len()
        );
    }

    ctx.telemetry
        .record_capture(CaptureStats {
            timestamp: observed_at,
            frame_id: Some(frame.frame_id),
            frame_ms,
            frame_bytes: jpeg.len(),
            hash_ms,
            inference_ms: Some(inference_ms),
            skipped_reason: None,
            new_shots,
            total_ms: capture_start.elapsed().as_millis() as u64,
        })
        .await;

    Ok(())
}
