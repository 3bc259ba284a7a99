//! Fundamental types for the Vigil pose pipeline.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Monotonic frame timestamp with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, never negative
    pub fn saturating_elapsed_since(&self, earlier: Timestamp) -> f64 {
        (self.0.saturating_sub(earlier.0) as f64 / 1_000_000.0).max(0.0)
    }

    /// Saturates at `i64::MAX` instead of wrapping
    pub fn add_millis(&self, millis: u64) -> Self {
        let millis = i64::try_from(millis).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(millis.saturating_mul(1_000_000)))
    }
}

/// 33-point body landmark layout produced by the pose source (BlazePose topology)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    pub const COUNT: usize = 33;

    /// Joints sampled when measuring post-fall movement
    pub const MOTION_JOINTS: [PoseLandmark; 7] = [
        PoseLandmark::Nose,
        PoseLandmark::LeftShoulder,
        PoseLandmark::RightShoulder,
        PoseLandmark::LeftHip,
        PoseLandmark::RightHip,
        PoseLandmark::LeftAnkle,
        PoseLandmark::RightAnkle,
    ];

    const ALL: [PoseLandmark; 33] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// A single tracked keypoint in normalized image coordinates.
///
/// `x` and `y` are in `[0, 1]` relative to frame width/height, with `y`
/// growing downward. `visibility` is the pose source's confidence that the
/// point is actually visible; sources that do not report it leave it unset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Unreported visibility counts as fully visible
    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility.unwrap_or(1.0) >= threshold
    }

    pub fn to_nalgebra(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        nalgebra::distance(&self.to_nalgebra(), &other.to_nalgebra())
    }
}

/// Complete landmark set for one detected person, indexed by [`PoseLandmark`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct PoseLandmarks {
    points: [Landmark; PoseLandmark::COUNT],
}

impl PoseLandmarks {
    pub fn new(points: Vec<Landmark>) -> Result<Self> {
        let actual = points.len();
        let points: [Landmark; PoseLandmark::COUNT] =
            points.try_into().map_err(|_| Error::LandmarkCount {
                expected: PoseLandmark::COUNT,
                actual,
            })?;
        Ok(Self { points })
    }

    pub fn from_array(points: [Landmark; PoseLandmark::COUNT]) -> Self {
        Self { points }
    }

    pub fn get(&self, landmark: PoseLandmark) -> &Landmark {
        &self.points[landmark.index()]
    }

    pub fn set(&mut self, landmark: PoseLandmark, point: Landmark) {
        self.points[landmark.index()] = point;
    }
}

impl TryFrom<Vec<Landmark>> for PoseLandmarks {
    type Error = Error;

    fn try_from(points: Vec<Landmark>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<PoseLandmarks> for Vec<Landmark> {
    fn from(landmarks: PoseLandmarks) -> Self {
        landmarks.points.to_vec()
    }
}

/// One video frame as delivered by the pose source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub timestamp: Timestamp,
    /// `None` when no person was detected in the frame
    #[serde(default)]
    pub landmarks: Option<PoseLandmarks>,
}

impl PoseFrame {
    pub fn new(timestamp: Timestamp, landmarks: PoseLandmarks) -> Self {
        Self {
            timestamp,
            landmarks: Some(landmarks),
        }
    }

    pub fn empty(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            landmarks: None,
        }
    }

    pub fn has_person(&self) -> bool {
        self.landmarks.is_some()
    }
}
