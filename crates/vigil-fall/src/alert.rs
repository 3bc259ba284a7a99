//! Fall alert payload handed to downstream collaborators.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::heuristics::{FallAnalysis, KeypointMetrics};
use crate::motion::MotionCheckResult;

/// Unique identifier for an emitted alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub Uuid);

impl AlertId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Fall,
}

/// Summary of the observation window that preceded the alert
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub movement_detected: bool,
    pub avg_movement: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Latest vital signs known to the host, if any
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_bpm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spo2_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respiration_rate: Option<f64>,
}

/// Host-supplied context stamped onto every alert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertContext {
    pub location: Option<String>,
    pub vitals: Option<Vitals>,
    pub gps_coordinates: Option<GpsCoordinates>,
}

/// Terminal artifact of a confirmed fall episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallAlert {
    pub id: AlertId,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub keypoint_metrics: KeypointMetrics,
    pub motion_window: MotionWindow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitals: Option<Vitals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_coordinates: Option<GpsCoordinates>,
    /// Encoded still image of the scene, attached by the host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
}

impl FallAlert {
    /// Assemble an alert from the analysis frozen at detection time and the
    /// completed motion window. Values are copied as-is.
    pub fn build(
        analysis: Option<&FallAnalysis>,
        motion: &MotionCheckResult,
        window_ms: u64,
        now: DateTime<Utc>,
    ) -> Self {
        let window = Duration::from_std(std::time::Duration::from_millis(window_ms))
            .unwrap_or_else(|_| Duration::zero());

        Self {
            id: AlertId::new(),
            timestamp: now,
            confidence: analysis.map(|a| a.confidence).unwrap_or(0.0),
            alert_type: AlertType::Fall,
            keypoint_metrics: analysis.map(|a| a.metrics).unwrap_or_default(),
            motion_window: MotionWindow {
                start_time: now - window,
                end_time: now,
                movement_detected: motion.movement_detected,
                avg_movement: motion.avg_movement,
            },
            location: None,
            vitals: None,
            gps_coordinates: None,
            snapshot: None,
        }
    }

    pub fn with_context(mut self, context: &AlertContext) -> Self {
        self.location = context.location.clone();
        self.vitals = context.vitals;
        self.gps_coordinates = context.gps_coordinates;
        self
    }

    pub fn with_snapshot(mut self, snapshot: impl Into<String>) -> Self {
        self.snapshot = Some(snapshot.into());
        self
    }
}
