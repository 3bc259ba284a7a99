//! Recorded sessions driven end to end through `FallDetector::run`.

mod common;

use common::{fallen_pose, frame, standing_pose};
use vigil_core::{Error, PoseFrame};
use vigil_fall::{DetectorConfig, DetectorEvent, DetectorState, FallDetector, ReplaySource};

fn write_recording(frames: &[PoseFrame]) -> tempfile::NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    for f in frames {
        writeln!(file, "{}", serde_json::to_string(f).unwrap()).unwrap();
    }
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_recorded_fall_raises_one_alert() {
    let fallen = fallen_pose();
    let mut frames: Vec<PoseFrame> = (0..3).map(|i| frame(i * 33, &fallen)).collect();
    frames.extend((1..=10).map(|i| frame(66 + i * 1_000, &fallen)));
    frames.push(PoseFrame::empty(vigil_core::Timestamp::from_millis(12_000)));
    frames.push(frame(16_000, &standing_pose()));
    let recording = write_recording(&frames);

    let source = ReplaySource::from_file(recording.path()).await.unwrap();
    assert_eq!(source.remaining(), frames.len());

    let mut detector = FallDetector::new(DetectorConfig::default(), source);
    let (_, mut rx) = detector.subscribe_channel();
    detector.initialize().await.unwrap();
    detector.run().await.unwrap();

    assert_eq!(detector.state(), DetectorState::Monitoring);
    let stats = detector.stats();
    assert_eq!(stats.alerts, 1);
    assert_eq!(stats.frames_skipped, 1);
    assert_eq!(stats.frames_processed, frames.len() as u64 - 1);

    detector.destroy().await.unwrap();

    let mut kinds = Vec::new();
    while let Some(event) = rx.recv().await {
        kinds.push(match event {
            DetectorEvent::StateChange { state } => format!("state:{:?}", state),
            other => other.kind().to_string(),
        });
    }

    let mut expected = vec![
        "state:Monitoring".to_string(),
        "fall_detected".to_string(),
        "state:FallDetected".to_string(),
        "state:MotionCheck".to_string(),
    ];
    expected.extend(std::iter::repeat("motion_check_update".to_string()).take(10));
    expected.extend([
        "alert_triggered".to_string(),
        "state:AlertTriggered".to_string(),
        "state:Monitoring".to_string(),
    ]);
    assert_eq!(kinds, expected);
}

#[tokio::test]
async fn test_run_requires_initialization() {
    let mut detector = FallDetector::new(DetectorConfig::default(), ReplaySource::new(Vec::new()));
    assert!(matches!(detector.run().await, Err(Error::NotInitialized)));
}

#[tokio::test]
async fn test_malformed_recording_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.jsonl");
    tokio::fs::write(&path, "{\"timestamp\": 0}\nnot json\n").await.unwrap();

    match ReplaySource::from_file(&path).await {
        Err(Error::Serialization(msg)) => assert!(msg.starts_with("line 2")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("malformed recording was accepted"),
    }
}
