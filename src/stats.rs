//! Shot-group statistics.
//!
//! Everything here is a pure function of the shot list. The live view and the
//! final report both call [`compute`] from scratch whenever the list changes;
//! nothing is maintained incrementally. Session shot counts are small (tens
//! of shots), so the O(n²) pairwise scan in [`group_size`] is fine.

use crate::db::models::{Point, Shot, ShotMetrics};

pub fn distance(a: Point, b: Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn position(shot: &Shot) -> Point {
    Point::new(shot.x, shot.y)
}

/// Maximum distance between any two shots. Zero for fewer than two shots.
pub fn group_size(shots: &[Shot]) -> f64 {
    let mut max = 0.0f64;
    for i in 0..shots.len() {
        for j in (i + 1)..shots.len() {
            let d = distance(position(&shots[i]), position(&shots[j]));
            if d > max {
                max = d;
            }
        }
    }
    max
}

/// Mean point of impact. The origin when there are no shots; for a single
/// shot the center is that shot.
pub fn group_center(shots: &[Shot]) -> Point {
    if shots.is_empty() {
        return Point::new(0.0, 0.0);
    }
    let n = shots.len() as f64;
    let sum_x: f64 = shots.iter().map(|s| s.x).sum();
    let sum_y: f64 = shots.iter().map(|s| s.y).sum();
    Point::new(sum_x / n, sum_y / n)
}

/// Population standard deviation of each shot's distance from the group
/// center. Zero for fewer than two shots.
pub fn consistency(shots: &[Shot], center: Point) -> f64 {
    if shots.len() < 2 {
        return 0.0;
    }
    let n = shots.len() as f64;
    let distances: Vec<f64> = shots
        .iter()
        .map(|s| distance(position(s), center))
        .collect();
    let mean = distances.iter().sum::<f64>() / n;
    let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Shots per minute derived from inter-shot timing. Shots are ordered by
/// timestamp first; zero for fewer than two shots or a zero mean split.
pub fn cadence(shots: &[Shot]) -> f64 {
    if shots.len() < 2 {
        return 0.0;
    }
    let mut fired: Vec<_> = shots.iter().map(|s| s.fired_at).collect();
    fired.sort();

    let splits: Vec<f64> = fired
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds() as f64 / 1000.0)
        .collect();
    let mean_split = splits.iter().sum::<f64>() / splits.len() as f64;
    if mean_split > 0.0 {
        60.0 / mean_split
    } else {
        0.0
    }
}

/// Full metrics snapshot for a shot list. `reference` is the target center
/// (taken from the analyzed image dimensions); without one the group offset
/// is zero. `elapsed_secs` comes from the session clock, not the shots.
pub fn compute(shots: &[Shot], reference: Option<Point>, elapsed_secs: u64) -> ShotMetrics {
    let center = group_center(shots);
    let offset = match (shots.is_empty(), reference) {
        (false, Some(target)) => distance(center, target),
        _ => 0.0,
    };

    ShotMetrics {
        group_size: group_size(shots),
        group_center: center,
        group_offset: offset,
        consistency: consistency(shots, center),
        elapsed_secs,
        cadence: cadence(shots),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn shot(x: f64, y: f64, offset_secs: i64) -> Shot {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Shot {
            x,
            y,
            detection_id: format!("det-{x}-{y}-{offset_secs}"),
            fired_at: base + Duration::seconds(offset_secs),
            width: None,
            height: None,
            confidence: None,
        }
    }

    #[test]
    fn empty_list_yields_zeroed_metrics() {
        let metrics = compute(&[], None, 30);
        assert_eq!(metrics.group_size, 0.0);
        assert_eq!(metrics.consistency, 0.0);
        assert_eq!(metrics.cadence, 0.0);
        assert_eq!(metrics.group_offset, 0.0);
        assert_eq!(metrics.elapsed_secs, 30);
    }

    #[test]
    fn single_shot_center_is_the_shot() {
        let shots = vec![shot(4.0, -2.5, 0)];
        let metrics = compute(&shots, None, 10);
        assert_eq!(metrics.group_center, Point::new(4.0, -2.5));
        assert_eq!(metrics.group_size, 0.0);
        assert_eq!(metrics.consistency, 0.0);
        assert_eq!(metrics.cadence, 0.0);
    }

    #[test]
    fn group_center_is_componentwise_mean() {
        let shots = vec![shot(0.0, 0.0, 0), shot(10.0, 0.0, 1)];
        assert_eq!(group_center(&shots), Point::new(5.0, 0.0));
    }

    #[test]
    fn group_size_is_max_pairwise_distance() {
        let shots = vec![shot(0.0, 0.0, 0), shot(3.0, 4.0, 1)];
        assert!((group_size(&shots) - 5.0).abs() < 1e-9);

        // An interior point must not change the extreme pair.
        let shots = vec![shot(0.0, 0.0, 0), shot(1.0, 1.0, 1), shot(3.0, 4.0, 2)];
        assert!((group_size(&shots) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn group_offset_is_distance_to_reference() {
        let shots = vec![shot(0.0, 0.0, 0), shot(10.0, 0.0, 1)];
        let metrics = compute(&shots, Some(Point::new(5.0, 12.0)), 0);
        assert!((metrics.group_offset - 12.0).abs() < 1e-9);
    }

    #[test]
    fn consistency_is_population_std_dev_of_center_distances() {
        // Center (0,0); distances from center are 1, 1, 3, 3.
        let shots = vec![
            shot(1.0, 0.0, 0),
            shot(-1.0, 0.0, 1),
            shot(3.0, 0.0, 2),
            shot(-3.0, 0.0, 3),
        ];
        let metrics = compute(&shots, None, 0);
        assert_eq!(metrics.group_center, Point::new(0.0, 0.0));
        assert!((metrics.consistency - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cadence_for_one_second_splits_is_sixty() {
        let shots = vec![shot(0.0, 0.0, 0), shot(1.0, 1.0, 1)];
        assert!((cadence(&shots) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn cadence_sorts_by_timestamp_before_computing_splits() {
        // Deliberately out of order: 4s, 0s, 2s. Splits are 2s each.
        let shots = vec![shot(0.0, 0.0, 4), shot(1.0, 1.0, 0), shot(2.0, 2.0, 2)];
        assert!((cadence(&shots) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn simultaneous_shots_do_not_blow_up_cadence() {
        let shots = vec![shot(0.0, 0.0, 0), shot(1.0, 1.0, 0)];
        assert_eq!(cadence(&shots), 0.0);
    }
}
