//! Capture telemetry for the status endpoint: a bounded history of
//! per-capture timings plus process CPU/memory sampled via sysinfo.

mod types;

pub use types::{CaptureStats, ProcessStats, TelemetrySnapshot};

use std::sync::Arc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::Mutex;

const MAX_RECENT_CAPTURES: usize = 20;

pub struct CaptureTelemetry {
    inner: Arc<Mutex<TelemetryState>>,
}

struct TelemetryState {
    recent_captures: Vec<CaptureStats>,
    capture_count: u64,
    inference_count: u64,
    skip_count: u64,
    system: System,
    pid: Pid,
}

impl CaptureTelemetry {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // First refresh establishes the baseline for CPU deltas.
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(TelemetryState {
                recent_captures: Vec::with_capacity(MAX_RECENT_CAPTURES),
                capture_count: 0,
                inference_count: 0,
                skip_count: 0,
                system,
                pid,
            })),
        }
    }

    pub async fn record_capture(&self, stats: CaptureStats) {
        let mut state = self.inner.lock().await;

        state.capture_count += 1;

        if stats.inference_ms.is_some() {
            state.inference_count += 1;
        } else if stats.skipped_reason.is_some() {
            state.skip_count += 1;
        }

        state.recent_captures.push(stats);

        if state.recent_captures.len() > MAX_RECENT_CAPTURES {
            state.recent_captures.remove(0);
        }
    }

    pub async fn snapshot(&self) -> TelemetrySnapshot {
        let mut state = self.inner.lock().await;
        let pid = state.pid;

        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        let process = if let Some(process) = state.system.process(pid) {
            ProcessStats {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            }
        } else {
            ProcessStats {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            }
        };

        TelemetrySnapshot {
            process,
            recent_captures: state.recent_captures.clone(),
            capture_count: state.capture_count,
            inference_count: state.inference_count,
            skip_count: state.skip_count,
        }
    }

    /// Clears capture history at the start of a new live run.
    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.recent_captures.clear();
        state.capture_count = 0;
        state.inference_count = 0;
        state.skip_count = 0;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }
}

impl Clone for CaptureTelemetry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn capture(inference_ms: Option<u64>, skipped_reason: Option<&str>) -> CaptureStats {
        CaptureStats {
            timestamp: Utc::now(),
            frame_id: Some(1),
            frame_ms: 40,
            frame_bytes: 20_000,
            hash_ms: 3,
            inference_ms,
            skipped_reason: skipped_reason.map(str::to_string),
            new_shots: 0,
            total_ms: 50,
        }
    }

    #[tokio::test]
    async fn counters_split_analyzed_and_skipped_captures() {
        let telemetry = CaptureTelemetry::new();
        telemetry.record_capture(capture(Some(120), None)).await;
        telemetry.record_capture(capture(None, Some("unchanged frame"))).await;
        telemetry.record_capture(capture(None, Some("no new frame"))).await;

        let snapshot = telemetry.snapshot().await;
        assert_eq!(snapshot.capture_count, 3);
        assert_eq!(snapshot.inference_count, 1);
        assert_eq!(snapshot.skip_count, 2);
        assert_eq!(snapshot.recent_captures.len(), 3);
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let telemetry = CaptureTelemetry::new();
        for _ in 0..(MAX_RECENT_CAPTURES + 5) {
            telemetry.record_capture(capture(None, None)).await;
        }
        let snapshot = telemetry.snapshot().await;
        assert_eq!(snapshot.recent_captures.len(), MAX_RECENT_CAPTURES);
        assert_eq!(snapshot.capture_count, (MAX_RECENT_CAPTURES + 5) as u64);
    }

    #[tokio::test]
    async fn reset_clears_history_and_counters() {
        let telemetry = CaptureTelemetry::new();
        telemetry.record_capture(capture(Some(90), None)).await;
        telemetry.reset().await;

        let snapshot = telemetry.snapshot().await;
        assert_eq!(snapshot.capture_count, 0);
        assert!(snapshot.recent_captures.is_empty());
    }
}
