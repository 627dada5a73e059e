use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::SkillLevel;

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_skill_level(value: &str) -> Result<SkillLevel> {
    SkillLevel::parse(value).ok_or_else(|| anyhow!("unknown skill level {value}"))
}

/// Advice is stored as a JSON array in a single TEXT column; NULL and empty
/// both decode to no advice.
pub fn parse_advice(value: Option<String>) -> Result<Vec<String>> {
    match value {
        Some(raw) if !raw.is_empty() => {
            serde_json::from_str(&raw).context("failed to parse advice column")
        }
        _ => Ok(Vec::new()),
    }
}
