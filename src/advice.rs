//! Coaching tips.
//!
//! The tip table is selected by skill level, then extended when the metrics
//! point at a specific weakness. A remote coaching service, when configured,
//! takes the same inputs and its output wins; this table is the fallback so
//! a report always has something to say.

use log::warn;

use crate::clients::CoachingClient;
use crate::db::models::{Shot, ShotMetrics, SkillLevel};

/// Group offset (in image pixels) past which the aim-point tip is added.
const OFFSET_TIP_THRESHOLD: f64 = 40.0;
/// Consistency (std dev of center distances, pixels) past which the
/// trigger-control tip is added.
const CONSISTENCY_TIP_THRESHOLD: f64 = 25.0;

const BEGINNER_TIPS: [&str; 3] = [
    "Focus on aligning your sights properly.",
    "Practice your stance for better stability.",
    "Dry fire practice can help improve trigger control.",
];

const INTERMEDIATE_TIPS: [&str; 3] = [
    "Work on reducing trigger anticipation.",
    "Refine your grip for better recoil management.",
    "Incorporate breathing techniques for steadier aim.",
];

const ADVANCED_TIPS: [&str; 3] = [
    "Practice rapid target acquisition.",
    "Analyze your shot patterns to identify subtle errors.",
    "Experiment with different shooting positions for versatility.",
];

pub fn applicable_tips(skill_level: SkillLevel, metrics: &ShotMetrics) -> Vec<String> {
    let base: &[&str] = match skill_level {
        SkillLevel::Beginner => &BEGINNER_TIPS,
        SkillLevel::Intermediate => &INTERMEDIATE_TIPS,
        SkillLevel::Advanced => &ADVANCED_TIPS,
    };
    let mut tips: Vec<String> = base.iter().map(|tip| tip.to_string()).collect();

    if metrics.group_offset > OFFSET_TIP_THRESHOLD {
        tips.push("Focus on consistent sight alignment and trigger pull.".to_string());
    }
    if metrics.consistency > CONSISTENCY_TIP_THRESHOLD {
        tips.push(
            "Practice dry firing to improve trigger control and reduce movement.".to_string(),
        );
    }

    tips
}

/// Advice for a finished session. Prefers the remote coaching service; falls
/// back to the rule table when it is unconfigured, failing, or empty-handed.
pub async fn generate(
    coaching: Option<&CoachingClient>,
    skill_level: SkillLevel,
    shots: &[Shot],
    metrics: &ShotMetrics,
) -> Vec<String> {
    if let Some(client) = coaching {
        match client.generate_advice(shots, metrics, skill_level).await {
            Ok(advice) if !advice.is_empty() => return advice,
            Ok(_) => warn!("coaching service returned no advice, using built-in tips"),
            Err(err) => warn!("coaching service failed, using built-in tips: {err:#}"),
        }
    }

    applicable_tips(skill_level, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Point;

    fn metrics(group_offset: f64, consistency: f64) -> ShotMetrics {
        ShotMetrics {
            group_size: 10.0,
            group_center: Point::new(0.0, 0.0),
            group_offset,
            consistency,
            elapsed_secs: 60,
            cadence: 10.0,
        }
    }

    #[test]
    fn tips_follow_skill_level() {
        let tight = metrics(0.0, 0.0);
        assert_eq!(
            applicable_tips(SkillLevel::Beginner, &tight),
            BEGINNER_TIPS.map(String::from).to_vec()
        );
        assert_eq!(
            applicable_tips(SkillLevel::Advanced, &tight),
            ADVANCED_TIPS.map(String::from).to_vec()
        );
    }

    #[test]
    fn wide_offset_adds_the_aim_point_tip() {
        let tips = applicable_tips(SkillLevel::Intermediate, &metrics(80.0, 0.0));
        assert_eq!(tips.len(), INTERMEDIATE_TIPS.len() + 1);
        assert!(tips.last().unwrap().contains("sight alignment"));
    }

    #[test]
    fn loose_consistency_adds_the_dry_fire_tip() {
        let tips = applicable_tips(SkillLevel::Intermediate, &metrics(0.0, 60.0));
        assert_eq!(tips.len(), INTERMEDIATE_TIPS.len() + 1);
        assert!(tips.last().unwrap().contains("dry firing"));
    }

    #[tokio::test]
    async fn generate_without_remote_service_uses_rule_table() {
        let advice = generate(None, SkillLevel::Beginner, &[], &metrics(0.0, 0.0)).await;
        assert_eq!(advice, BEGINNER_TIPS.map(String::from).to_vec());
    }
}
