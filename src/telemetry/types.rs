use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStats {
    pub timestamp: DateTime<Utc>,
    pub frame_id: Option<u64>,
    pub frame_ms: u64,
    pub frame_bytes: usize,
    pub hash_ms: u64,
    pub inference_ms: Option<u64>,
    pub skipped_reason: Option<String>,
    pub new_shots: usize,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStats {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub process: ProcessStats,
    pub recent_captures: Vec<CaptureStats>,
    pub capture_count: u64,
    pub inference_count: u64,
    pub skip_count: u64,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            process: ProcessStats {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            },
            recent_captures: Vec::new(),
            capture_count: 0,
            inference_count: 0,
            skip_count: 0,
        }
    }
}
