//! Shot data model.
//!
//! A shot is one detected bullet impact on the target image. Shots are
//! immutable once recorded; during a live run they are deduplicated by
//! detection id before they ever reach the list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shot {
    pub x: f64,
    pub y: f64,
    pub detection_id: String,
    pub fired_at: DateTime<Utc>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub confidence: Option<f64>,
}
