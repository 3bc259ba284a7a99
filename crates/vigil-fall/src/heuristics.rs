//! Per-frame fall scoring.
//!
//! Five independent signals are evaluated on every frame. Each one that
//! fires adds its fixed weight to the frame's confidence and records a
//! human-readable reason:
//!
//! | Signal              | Measure                                   | Fires when        |
//! |---------------------|-------------------------------------------|-------------------|
//! | Vertical velocity   | `(nose_y - last_nose_y) / dt`             | `> 0.5 /s`        |
//! | Body horizontality  | shoulder-mid → hip-mid angle (degrees)    | `< 30` or `> 150` |
//! | Aspect ratio        | body height / shoulder width              | `< 1.5`           |
//! | Head below hips     | `hip_y - nose_y`                          | `< -0.1`          |
//! | Low in frame        | `(nose_y + hip_y) / 2`                    | `> 0.6`           |
//!
//! Image y grows downward, so positive velocity means the head is dropping.

use serde::{Deserialize, Serialize};
use vigil_core::{average_y, horizontal_span, midpoint, segment_angle_degrees};
use vigil_core::{PoseLandmark, PoseLandmarks, Timestamp};

use crate::settings::HeuristicsConfig;

/// Raw signal values measured on one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeypointMetrics {
    pub vertical_velocity: f64,
    pub body_angle: f64,
    pub aspect_ratio: f64,
    pub head_to_hip_distance: f64,
    pub vertical_position: f64,
}

/// Result of scoring a single frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallAnalysis {
    pub is_fall: bool,
    /// Sum of fired signal weights, clamped to `[0, 100]`
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub metrics: KeypointMetrics,
}

/// Temporal state the velocity signal depends on
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvaluatorMemory {
    pub last_nose_y: Option<f64>,
    pub last_timestamp: Option<Timestamp>,
}

impl EvaluatorMemory {
    pub fn is_empty(&self) -> bool {
        self.last_nose_y.is_none() && self.last_timestamp.is_none()
    }
}

/// Heuristic fall evaluator
pub struct FallHeuristics {
    config: HeuristicsConfig,
    memory: EvaluatorMemory,
}

impl FallHeuristics {
    pub fn new(config: HeuristicsConfig) -> Self {
        Self {
            config,
            memory: EvaluatorMemory::default(),
        }
    }

    /// Score `current`, using `previous` only to decide whether a velocity
    /// reading is meaningful. Without a previous frame the velocity signal
    /// reads zero and cannot fire.
    pub fn analyze(
        &mut self,
        current: &PoseLandmarks,
        previous: Option<&PoseLandmarks>,
        timestamp: Timestamp,
    ) -> FallAnalysis {
        let cfg = &self.config;

        let nose = current.get(PoseLandmark::Nose);
        let left_shoulder = current.get(PoseLandmark::LeftShoulder);
        let right_shoulder = current.get(PoseLandmark::RightShoulder);
        let left_hip = current.get(PoseLandmark::LeftHip);
        let right_hip = current.get(PoseLandmark::RightHip);
        let left_ankle = current.get(PoseLandmark::LeftAnkle);
        let right_ankle = current.get(PoseLandmark::RightAnkle);

        let mut confidence = 0.0;
        let mut reasons = Vec::new();

        // 1. Vertical velocity
        let vertical_velocity = match (previous, self.memory.last_nose_y, self.memory.last_timestamp) {
            (Some(_), Some(last_y), Some(last_ts)) => {
                let dt = timestamp.as_nanos().saturating_sub(last_ts.as_nanos()) as f64 / 1e9;
                if dt > 0.0 {
                    (nose.y - last_y) / dt
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };
        self.memory.last_nose_y = Some(nose.y);
        self.memory.last_timestamp = Some(timestamp);

        if vertical_velocity > cfg.velocity_threshold {
            confidence += cfg.velocity_weight;
            reasons.push(format!("Rapid downward movement ({:.2}/s)", vertical_velocity));
        }

        // 2. Body horizontality
        let shoulder_mid = midpoint(left_shoulder, right_shoulder);
        let hip_mid = midpoint(left_hip, right_hip);
        let body_angle = segment_angle_degrees(&shoulder_mid, &hip_mid);
        let abs_angle = body_angle.abs();

        if abs_angle < cfg.horizontal_angle_deg || abs_angle > 180.0 - cfg.horizontal_angle_deg {
            confidence += cfg.angle_weight;
            reasons.push(format!("Body horizontal ({:.0}°)", body_angle));
        }

        // 3. Aspect ratio
        let body_height = (average_y(left_shoulder, right_shoulder)
            - average_y(left_ankle, right_ankle))
        .abs();
        let shoulder_width = horizontal_span(left_shoulder, right_shoulder);
        let aspect_ratio = body_height / shoulder_width.max(cfg.aspect_ratio_epsilon);

        if aspect_ratio < cfg.aspect_ratio_threshold {
            confidence += cfg.aspect_ratio_weight;
            reasons.push(format!("Collapsed posture (aspect ratio {:.2})", aspect_ratio));
        }

        // 4. Head below hips
        let hip_y = average_y(left_hip, right_hip);
        let head_to_hip_distance = hip_y - nose.y;

        if head_to_hip_distance < cfg.head_below_hip_threshold {
            confidence += cfg.head_below_hip_weight;
            reasons.push("Head below hips".to_string());
        }

        // 5. Low in frame
        let vertical_position = (nose.y + hip_y) / 2.0;

        if vertical_position > cfg.low_position_threshold {
            confidence += cfg.low_position_weight;
            reasons.push(format!("Body low in frame ({:.2})", vertical_position));
        }

        let confidence = f64::clamp(confidence, 0.0, 100.0);
        let is_fall = confidence >= cfg.fall_confidence;

        tracing::trace!(
            confidence,
            is_fall,
            vertical_velocity,
            body_angle,
            aspect_ratio,
            "frame scored"
        );

        FallAnalysis {
            is_fall,
            confidence,
            reasons,
            metrics: KeypointMetrics {
                vertical_velocity,
                body_angle,
                aspect_ratio,
                head_to_hip_distance,
                vertical_position,
            },
        }
    }

    /// Forget velocity history
    pub fn reset(&mut self) {
        self.memory = EvaluatorMemory::default();
    }

    pub fn memory(&self) -> &EvaluatorMemory {
        &self.memory
    }

    pub fn config(&self) -> &HeuristicsConfig {
        &self.config
    }
}

impl Default for FallHeuristics {
    fn default() -> Self {
        Self::new(HeuristicsConfig::default())
    }
}
