//! Post-fall motion window.
//!
//! Once a fall is tentatively confirmed the subject is observed for a fixed
//! window. Every frame contributes one sample: the mean 3D displacement of
//! the key joints since the previous frame. At window end the mean of all
//! samples decides whether the subject moved enough to cancel the alert.

use serde::{Deserialize, Serialize};
use vigil_core::{PoseLandmark, PoseLandmarks, Timestamp};

use crate::settings::MotionConfig;

/// Outcome of one motion-window tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionCheckResult {
    pub is_complete: bool,
    /// Seconds left in the window, never negative
    pub time_remaining: f64,
    pub movement_detected: bool,
    pub avg_movement: f64,
    /// Only ever true on the completing tick, with enough samples
    pub should_trigger_alert: bool,
}

/// Single-shot motion monitor, reset at the end of every window
pub struct MotionMonitor {
    config: MotionConfig,
    samples: Vec<f64>,
    start_time: Option<Timestamp>,
    previous: Option<PoseLandmarks>,
}

impl MotionMonitor {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            samples: Vec::new(),
            start_time: None,
            previous: None,
        }
    }

    /// Open a new window anchored at `timestamp`
    pub fn start_monitoring(&mut self, initial: &PoseLandmarks, timestamp: Timestamp) {
        self.samples.clear();
        self.start_time = Some(timestamp);
        self.previous = Some(initial.clone());
        tracing::debug!(window_ms = self.config.window_ms, "motion window opened");
    }

    pub fn check_motion(&mut self, current: &PoseLandmarks, timestamp: Timestamp) -> MotionCheckResult {
        let Some(start_time) = self.start_time else {
            tracing::warn!("check_motion called without an open motion window");
            return MotionCheckResult::default();
        };

        let sample = self
            .previous
            .as_ref()
            .and_then(|previous| self.joint_displacement(previous, current));
        if let Some(sample) = sample {
            self.samples.push(sample);
        }
        self.previous = Some(current.clone());

        let window_ms = self.config.window_ms as f64;
        let elapsed_ms = timestamp.saturating_elapsed_since(start_time);
        let time_remaining = ((window_ms - elapsed_ms) / 1000.0).max(0.0);

        if elapsed_ms >= window_ms {
            let sample_count = self.samples.len();
            let avg_movement = if sample_count == 0 {
                0.0
            } else {
                self.samples.iter().sum::<f64>() / sample_count as f64
            };
            let movement_detected = avg_movement > self.config.movement_threshold;
            let should_trigger_alert = !movement_detected && sample_count >= self.config.min_samples;

            tracing::info!(
                avg_movement,
                sample_count,
                movement_detected,
                should_trigger_alert,
                "motion window complete"
            );

            self.reset();

            return MotionCheckResult {
                is_complete: true,
                time_remaining: 0.0,
                movement_detected,
                avg_movement,
                should_trigger_alert,
            };
        }

        let frame_movement = sample.unwrap_or(0.0);
        MotionCheckResult {
            is_complete: false,
            time_remaining,
            movement_detected: frame_movement > self.config.movement_threshold,
            avg_movement: frame_movement,
            should_trigger_alert: false,
        }
    }

    /// Mean displacement over the key joints visible in both frames.
    /// Non-finite displacements are ignored. `None` when no joint qualifies.
    fn joint_displacement(&self, previous: &PoseLandmarks, current: &PoseLandmarks) -> Option<f64> {
        let threshold = self.config.visibility_threshold;
        let (total, count) = PoseLandmark::MOTION_JOINTS
            .iter()
            .map(|&joint| (previous.get(joint), current.get(joint)))
            .filter(|(prev, curr)| prev.is_visible(threshold) && curr.is_visible(threshold))
            .map(|(prev, curr)| curr.distance_to(prev))
            .filter(|d| d.is_finite())
            .fold((0.0, 0usize), |(total, count), d| (total + d, count + 1));

        if count == 0 {
            None
        } else {
            Some(total / count as f64)
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.start_time = None;
        self.previous = None;
    }

    pub fn is_active(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }
}

impl Default for MotionMonitor {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::tests::standing_pose;
    use vigil_core::Landmark;

    fn shifted(pose: &PoseLandmarks, dx: f64) -> PoseLandmarks {
        let mut out = pose.clone();
        for joint in PoseLandmark::MOTION_JOINTS {
            let mut p = *out.get(joint);
            p.x += dx;
            out.set(joint, p);
        }
        out
    }

    #[test]
    fn test_still_subject_triggers_alert() {
        let mut monitor = MotionMonitor::default();
        let pose = standing_pose();
        monitor.start_monitoring(&pose, Timestamp::from_millis(0));

        let mut current = pose.clone();
        let mut last = MotionCheckResult::default();
        for i in 1..=10 {
            current = shifted(&current, 0.005);
            last = monitor.check_motion(&current, Timestamp::from_millis(i * 1_000));
            if i < 10 {
                assert!(!last.is_complete);
                assert!(!last.should_trigger_alert);
            }
        }

        assert!(last.is_complete);
        assert!(!last.movement_detected);
        assert!(last.should_trigger_alert);
        assert!((last.avg_movement - 0.005).abs() < 1e-9);
        assert_eq!(last.time_remaining, 0.0);
        assert!(!monitor.is_active());
        assert_eq!(monitor.sample_count(), 0);
    }

    #[test]
    fn test_moving_subject_cancels_alert() {
        let mut monitor = MotionMonitor::default();
        let pose = standing_pose();
        monitor.start_monitoring(&pose, Timestamp::from_millis(0));

        let mut current = pose.clone();
        let mut last = MotionCheckResult::default();
        for i in 1..=5 {
            current = shifted(&current, if i % 2 == 0 { 0.05 } else { -0.05 });
            last = monitor.check_motion(&current, Timestamp::from_millis(i * 2_000));
        }

        assert!(last.is_complete);
        assert!(last.movement_detected);
        assert!(!last.should_trigger_alert);
    }

    #[test]
    fn test_minimum_sample_guard() {
        let mut monitor = MotionMonitor::default();
        let pose = standing_pose();
        monitor.start_monitoring(&pose, Timestamp::from_millis(0));

        monitor.check_motion(&pose, Timestamp::from_millis(3_000));
        monitor.check_motion(&pose, Timestamp::from_millis(6_000));
        let result = monitor.check_motion(&pose, Timestamp::from_millis(10_000));

        assert!(result.is_complete);
        assert_eq!(result.avg_movement, 0.0);
        assert!(!result.movement_detected);
        assert!(!result.should_trigger_alert);
    }

    #[test]
    fn test_invisible_joints_are_not_sampled() {
        let mut monitor = MotionMonitor::default();
        let mut hidden = standing_pose();
        for joint in PoseLandmark::MOTION_JOINTS {
            let p = *hidden.get(joint);
            hidden.set(joint, p.with_visibility(0.1));
        }
        monitor.start_monitoring(&hidden, Timestamp::from_millis(0));

        for i in 1..=9 {
            let result = monitor.check_motion(&hidden, Timestamp::from_millis(i * 1_000));
            assert_eq!(result.avg_movement, 0.0);
        }
        assert_eq!(monitor.sample_count(), 0);

        let result = monitor.check_motion(&hidden, Timestamp::from_millis(10_000));
        assert!(result.is_complete);
        assert!(!result.should_trigger_alert);
    }

    #[test]
    fn test_partial_visibility_averages_visible_joints() {
        let mut monitor = MotionMonitor::default();
        let pose = standing_pose();
        monitor.start_monitoring(&pose, Timestamp::from_millis(0));

        let mut moved = pose.clone();
        moved.set(PoseLandmark::Nose, Landmark::new(0.5, 0.45, 0.0).with_visibility(0.2));
        let mut ankle = *moved.get(PoseLandmark::LeftAnkle);
        ankle.y -= 0.06;
        moved.set(PoseLandmark::LeftAnkle, ankle);

        // Nose is ignored; one of six visible joints moved 0.06
        let result = monitor.check_motion(&moved, Timestamp::from_millis(500));
        assert!((result.avg_movement - 0.01).abs() < 1e-9);
        assert!(!result.movement_detected);
        assert!((result.time_remaining - 9.5).abs() < 1e-9);
    }

    #[test]
    fn test_provisional_result_reflects_single_frame() {
        let mut monitor = MotionMonitor::default();
        let pose = standing_pose();
        monitor.start_monitoring(&pose, Timestamp::from_millis(0));

        let result = monitor.check_motion(&shifted(&pose, 0.1), Timestamp::from_millis(1_000));
        assert!(!result.is_complete);
        assert!(result.movement_detected);
        assert!((result.avg_movement - 0.1).abs() < 1e-9);
        assert!(!result.should_trigger_alert);
    }

    #[test]
    fn test_non_finite_coordinates_are_not_sampled() {
        let mut monitor = MotionMonitor::default();
        let pose = standing_pose();
        monitor.start_monitoring(&pose, Timestamp::from_millis(0));

        let mut corrupt = pose.clone();
        for joint in PoseLandmark::MOTION_JOINTS {
            let mut p = *corrupt.get(joint);
            p.x = f64::NAN;
            corrupt.set(joint, p);
        }
        let result = monitor.check_motion(&corrupt, Timestamp::from_millis(1_000));
        assert_eq!(result.avg_movement, 0.0);
        assert_eq!(monitor.sample_count(), 0);

        // One corrupt joint among valid ones is dropped from the mean
        let mut partly = pose.clone();
        let mut nose = *partly.get(PoseLandmark::Nose);
        nose.y = f64::INFINITY;
        partly.set(PoseLandmark::Nose, nose);
        let mut ankle = *partly.get(PoseLandmark::LeftAnkle);
        ankle.y -= 0.06;
        partly.set(PoseLandmark::LeftAnkle, ankle);

        monitor.start_monitoring(&pose, Timestamp::from_millis(0));
        let result = monitor.check_motion(&partly, Timestamp::from_millis(500));
        assert!((result.avg_movement - 0.01).abs() < 1e-9);
        assert_eq!(monitor.sample_count(), 1);

        for i in 1..=9 {
            monitor.check_motion(&corrupt, Timestamp::from_millis(500 + i * 1_000));
        }
        let result = monitor.check_motion(&corrupt, Timestamp::from_millis(10_000));
        assert!(result.is_complete);
        assert!(result.avg_movement.is_finite());
        assert!(!result.should_trigger_alert);
    }

    #[test]
    fn test_check_without_window_is_inert() {
        let mut monitor = MotionMonitor::default();
        let result = monitor.check_motion(&standing_pose(), Timestamp::from_millis(20_000));
        assert_eq!(result, MotionCheckResult::default());
        assert_eq!(monitor.sample_count(), 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut monitor = MotionMonitor::default();
        monitor.reset();
        monitor.reset();
        assert!(!monitor.is_active());
        assert_eq!(monitor.sample_count(), 0);
        assert!(monitor.start_time().is_none());
    }
}
