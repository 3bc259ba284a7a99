//! Detector configuration.
//!
//! Every threshold below is empirical. The defaults reproduce the tuned
//! values the detector shipped with; deployments may override them from a
//! file or from `VIGIL_`-prefixed environment variables.

use serde::{Deserialize, Serialize};
use vigil_core::{Error, Result};

/// Complete detector configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Per-frame fall scoring
    pub heuristics: HeuristicsConfig,

    /// Consecutive-frame confirmation and alert grace delay
    pub confirmation: ConfirmationConfig,

    /// Post-fall motion window
    pub motion: MotionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Downward nose velocity (normalized units / s)
    pub velocity_threshold: f64,
    pub velocity_weight: f64,

    /// Torso within this many degrees of horizontal counts as lying
    pub horizontal_angle_deg: f64,
    pub angle_weight: f64,

    /// Body height / shoulder width below this reads as collapsed
    pub aspect_ratio_threshold: f64,
    pub aspect_ratio_weight: f64,
    /// Floor applied to shoulder width before dividing
    pub aspect_ratio_epsilon: f64,

    /// `hip_y - nose_y` below this means the head is under the hips
    pub head_below_hip_threshold: f64,
    pub head_below_hip_weight: f64,

    /// Mean of nose and hip y above this means the body is low in frame
    pub low_position_threshold: f64,
    pub low_position_weight: f64,

    /// Confidence at or above which a frame is classified as a fall
    pub fall_confidence: f64,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 0.5,
            velocity_weight: 30.0,
            horizontal_angle_deg: 30.0,
            angle_weight: 25.0,
            aspect_ratio_threshold: 1.5,
            aspect_ratio_weight: 20.0,
            aspect_ratio_epsilon: 0.001,
            head_below_hip_threshold: -0.1,
            head_below_hip_weight: 15.0,
            low_position_threshold: 0.6,
            low_position_weight: 10.0,
            fall_confidence: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Fall-positive frames needed before the motion window opens
    pub required_frames: u32,

    /// How long the alert state is held before detection resumes (ms)
    pub alert_grace_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            required_frames: 3,
            alert_grace_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Observation window after a confirmed fall (ms)
    pub window_ms: u64,

    /// Mean joint displacement above which the subject counts as moving
    pub movement_threshold: f64,

    /// Samples required before an alert may be raised
    pub min_samples: usize,

    /// Joints below this visibility are ignored
    pub visibility_threshold: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            window_ms: 10_000,
            movement_threshold: 0.02,
            min_samples: 5,
            visibility_threshold: 0.5,
        }
    }
}

/// `VIGIL_MOTION__WINDOW_MS=8000` overrides `motion.window_ms`
fn environment() -> config::Environment {
    config::Environment::with_prefix("VIGIL")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl DetectorConfig {
    /// Load configuration from file, with environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let h = &self.heuristics;
        if !(h.fall_confidence > 0.0 && h.fall_confidence <= 100.0) {
            return Err(Error::Config(format!(
                "fall_confidence must be in (0, 100], got {}",
                h.fall_confidence
            )));
        }
        if h.aspect_ratio_epsilon <= 0.0 {
            return Err(Error::Config("aspect_ratio_epsilon must be positive".into()));
        }
        if !(0.0..=90.0).contains(&h.horizontal_angle_deg) {
            return Err(Error::Config(format!(
                "horizontal_angle_deg must be in [0, 90], got {}",
                h.horizontal_angle_deg
            )));
        }
        if self.confirmation.required_frames == 0 {
            return Err(Error::Config("required_frames must be at least 1".into()));
        }
        if self.motion.window_ms == 0 {
            return Err(Error::Config("motion window_ms must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.motion.visibility_threshold) {
            return Err(Error::Config(format!(
                "visibility_threshold must be in [0, 1], got {}",
                self.motion.visibility_threshold
            )));
        }
        Ok(())
    }
}
