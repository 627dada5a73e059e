use std::collections::HashSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clients::Prediction;
use crate::db::models::{Point, Shot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiveStatus {
    Idle,
    Running,
    Paused,
}

impl Default for LiveStatus {
    fn default() -> Self {
        LiveStatus::Idle
    }
}

/// In-memory state of the current live run. Shots accumulate here for the
/// duration of the run and are only persisted when the session is finished.
#[derive(Debug, Clone)]
pub struct LiveState {
    pub status: LiveStatus,
    pub run_id: Option<String>,
    pub camera_session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub shots: Vec<Shot>,
    pub last_frame_id: Option<u64>,
    pub image_size: Option<(u32, u32)>,
    pub active_ms: u64,
    /// Time accumulated from earlier running windows; combines with
    /// `running_anchor` to compute the true active duration.
    active_ms_baseline: u64,
    running_anchor: Option<Instant>,
    seen_detections: HashSet<String>,
}

impl Default for LiveState {
    fn default() -> Self {
        Self {
            status: LiveStatus::Idle,
            run_id: None,
            camera_session_id: None,
            started_at: None,
            shots: Vec::new(),
            last_frame_id: None,
            image_size: None,
            active_ms: 0,
            active_ms_baseline: 0,
            running_anchor: None,
            seen_detections: HashSet::new(),
        }
    }
}

impl LiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_run(
        &mut self,
        run_id: String,
        camera_session_id: String,
        started_at: DateTime<Utc>,
        now: Instant,
    ) {
        *self = Self {
            status: LiveStatus::Running,
            run_id: Some(run_id),
            camera_session_id: Some(camera_session_id),
            started_at: Some(started_at),
            running_anchor: Some(now),
            ..Self::default()
        };
    }

    pub fn pause(&mut self) {
        self.sync_active_from_anchor();
        self.status = LiveStatus::Paused;
        self.running_anchor = None;
        self.active_ms_baseline = self.active_ms;
    }

    pub fn resume(&mut self, now: Instant) {
        self.status = LiveStatus::Running;
        self.running_anchor = Some(now);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn current_active_ms(&self) -> u64 {
        if let (LiveStatus::Running, Some(anchor)) = (self.status, self.running_anchor) {
            self.active_ms_baseline
                .saturating_add(anchor.elapsed().as_millis() as u64)
        } else {
            self.active_ms
        }
    }

    pub fn sync_active_from_anchor(&mut self) {
        if let (LiveStatus::Running, Some(anchor)) = (self.status, self.running_anchor) {
            self.active_ms = self
                .active_ms_baseline
                .saturating_add(anchor.elapsed().as_millis() as u64);
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.current_active_ms() / 1000
    }

    pub fn note_frame(&mut self, frame_id: u64) {
        self.last_frame_id = Some(frame_id);
    }

    pub fn note_image_size(&mut self, width: u32, height: u32) {
        self.image_size = Some((width, height));
    }

    /// Target center derived from the most recently analyzed image. None
    /// until the first analysis lands.
    pub fn reference_center(&self) -> Option<Point> {
        self.image_size
            .map(|(width, height)| Point::new(f64::from(width) / 2.0, f64::from(height) / 2.0))
    }

    /// Appends shots for predictions whose detection id has not been seen in
    /// this run. Returns how many were actually new.
    pub fn record_detections(
        &mut self,
        predictions: &[Prediction],
        observed_at: DateTime<Utc>,
    ) -> usize {
        let mut added = 0;
        for prediction in predictions {
            if !self.seen_detections.insert(prediction.detection_id.clone()) {
                continue;
            }
            self.shots.push(Shot {
                x: prediction.x,
                y: prediction.y,
                detection_id: prediction.detection_id.clone(),
                fired_at: observed_at,
                width: prediction.width,
                height: prediction.height,
                confidence: prediction.confidence,
            });
            added += 1;
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(id: &str, x: f64, y: f64) -> Prediction {
        Prediction {
            x,
            y,
            width: None,
            height: None,
            confidence: Some(0.8),
            class: Some("bullet_hole".to_string()),
            detection_id: id.to_string(),
        }
    }

    fn running_state() -> LiveState {
        let mut state = LiveState::new();
        state.begin_run(
            "run-1".to_string(),
            "cam-1".to_string(),
            Utc::now(),
            Instant::now(),
        );
        state
    }

    #[test]
    fn begin_run_clears_previous_shots() {
        let mut state = running_state();
        state.record_detections(&[prediction("a", 1.0, 1.0)], Utc::now());
        state.begin_run(
            "run-2".to_string(),
            "cam-2".to_string(),
            Utc::now(),
            Instant::now(),
        );
        assert!(state.shots.is_empty());
        assert_eq!(state.run_id.as_deref(), Some("run-2"));
    }

    #[test]
    fn duplicate_detection_ids_are_not_recorded_twice() {
        let mut state = running_state();
        let added = state.record_detections(
            &[prediction("a", 1.0, 1.0), prediction("b", 2.0, 2.0)],
            Utc::now(),
        );
        assert_eq!(added, 2);

        // The same frame analyzed again must not duplicate anything.
        let added = state.record_detections(
            &[prediction("a", 1.0, 1.0), prediction("c", 3.0, 3.0)],
            Utc::now(),
        );
        assert_eq!(added, 1);
        assert_eq!(state.shots.len(), 3);
    }

    #[test]
    fn pause_freezes_the_active_clock() {
        let mut state = running_state();
        state.pause();
        assert_eq!(state.status, LiveStatus::Paused);
        let frozen = state.current_active_ms();
        assert_eq!(state.current_active_ms(), frozen);

        state.resume(Instant::now());
        assert_eq!(state.status, LiveStatus::Running);
    }

    #[test]
    fn reference_center_tracks_the_analyzed_image() {
        let mut state = running_state();
        assert!(state.reference_center().is_none());
        state.note_image_size(640, 480);
        assert_eq!(state.reference_center(), Some(Point::new(320.0, 240.0)));
    }
}
