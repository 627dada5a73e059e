//! Session-related data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shot::Shot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl Default for SkillLevel {
    fn default() -> Self {
        SkillLevel::Intermediate
    }
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "beginner" => Some(SkillLevel::Beginner),
            "intermediate" => Some(SkillLevel::Intermediate),
            "advanced" => Some(SkillLevel::Advanced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Aggregate derived from a session's shot list. Holds no independent state;
/// always recomputed in full from the shots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotMetrics {
    pub group_size: f64,
    pub group_center: Point,
    pub group_offset: f64,
    pub consistency: f64,
    pub elapsed_secs: u64,
    pub cadence: f64,
}

impl Default for ShotMetrics {
    fn default() -> Self {
        Self {
            group_size: 0.0,
            group_center: Point::new(0.0, 0.0),
            group_offset: 0.0,
            consistency: 0.0,
            elapsed_secs: 0,
            cadence: 0.0,
        }
    }
}

/// Everything needed to persist a finished run; the store assigns the id.
#[derive(Debug, Clone)]
pub struct SessionDraft {
    pub date: DateTime<Utc>,
    pub shots: Vec<Shot>,
    pub metrics: ShotMetrics,
    pub advice: Vec<String>,
    pub skill_level: SkillLevel,
}

/// One completed practice run. Created exactly once, at session end, and
/// never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub shots: Vec<Shot>,
    pub metrics: ShotMetrics,
    pub advice: Vec<String>,
    pub skill_level: SkillLevel,
    pub created_at: DateTime<Utc>,
}

/// Row shape for the dashboard's session history table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub shot_count: usize,
    pub group_size: f64,
    pub group_offset: f64,
    pub consistency: f64,
    pub cadence: f64,
    pub elapsed_secs: u64,
}
