//! Pose fixtures shared by the integration tests.

#![allow(dead_code)]

use vigil_core::{Landmark, PoseFrame, PoseLandmark, PoseLandmarks, Timestamp};

fn visible(x: f64, y: f64) -> Landmark {
    Landmark::new(x, y, 0.0).with_visibility(0.9)
}

/// Upright subject centred in frame. Scores 0.
pub fn standing_pose() -> PoseLandmarks {
    let mut points = vec![visible(0.5, 0.5); PoseLandmark::COUNT];
    points[PoseLandmark::Nose.index()] = visible(0.5, 0.15);
    points[PoseLandmark::LeftShoulder.index()] = visible(0.4, 0.25);
    points[PoseLandmark::RightShoulder.index()] = visible(0.6, 0.25);
    points[PoseLandmark::LeftHip.index()] = visible(0.42, 0.5);
    points[PoseLandmark::RightHip.index()] = visible(0.58, 0.5);
    points[PoseLandmark::LeftAnkle.index()] = visible(0.42, 0.9);
    points[PoseLandmark::RightAnkle.index()] = visible(0.58, 0.9);
    PoseLandmarks::new(points).expect("33 landmarks")
}

/// Lying flat, head level with the hips: horizontal body and collapsed
/// aspect ratio only. Scores 45.
pub fn lying_pose() -> PoseLandmarks {
    let mut pose = standing_pose();
    pose.set(PoseLandmark::LeftShoulder, visible(0.30, 0.4));
    pose.set(PoseLandmark::RightShoulder, visible(0.32, 0.4));
    pose.set(PoseLandmark::LeftHip, visible(0.60, 0.4));
    pose.set(PoseLandmark::RightHip, visible(0.62, 0.4));
    pose.set(PoseLandmark::LeftAnkle, visible(0.90, 0.42));
    pose.set(PoseLandmark::RightAnkle, visible(0.92, 0.42));
    pose.set(PoseLandmark::Nose, visible(0.20, 0.4));
    pose
}

/// [`lying_pose`] with the head dropped below the hips. Scores 60.
pub fn fallen_pose() -> PoseLandmarks {
    let mut pose = lying_pose();
    pose.set(PoseLandmark::Nose, visible(0.20, 0.55));
    pose
}

/// Move every motion joint by `dx` along x
pub fn shifted(pose: &PoseLandmarks, dx: f64) -> PoseLandmarks {
    let mut out = pose.clone();
    for joint in PoseLandmark::MOTION_JOINTS {
        let mut p = *out.get(joint);
        p.x += dx;
        out.set(joint, p);
    }
    out
}

/// Same pose with every motion joint below the visibility cutoff
pub fn occluded(pose: &PoseLandmarks) -> PoseLandmarks {
    let mut out = pose.clone();
    for joint in PoseLandmark::MOTION_JOINTS {
        let p = *out.get(joint);
        out.set(joint, p.with_visibility(0.1));
    }
    out
}

pub fn frame(ms: i64, pose: &PoseLandmarks) -> PoseFrame {
    PoseFrame::new(Timestamp::from_millis(ms), pose.clone())
}
