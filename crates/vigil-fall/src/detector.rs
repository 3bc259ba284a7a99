//! Fall confirmation state machine.
//!
//! ```text
//! Idle ──initialize──▶ Monitoring ──N fall frames──▶ FallDetected ──▶ MotionCheck
//!                          ▲                                              │
//!                          ├──────────── false alarm (moved) ◀────────────┤
//!                          │                                              ▼
//!                          └──────── grace delay elapsed ◀──────── AlertTriggered
//! ```
//!
//! The detector is driven one frame at a time by its owner. Nothing runs in
//! the background: the post-alert grace delay is a deadline checked whenever
//! a frame arrives or the owner calls [`FallDetector::poll`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vigil_core::{Error, PoseFrame, PoseLandmarks, Result, Timestamp};

use crate::alert::{AlertContext, FallAlert};
use crate::events::{DetectorEvent, EventBus, SubscriptionId};
use crate::heuristics::{FallAnalysis, FallHeuristics};
use crate::motion::{MotionCheckResult, MotionMonitor};
use crate::settings::DetectorConfig;
use crate::source::PoseSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorState {
    /// Pose source not yet initialized
    Idle,
    Monitoring,
    /// Transient: a fall was confirmed and the motion window is opening
    FallDetected,
    MotionCheck,
    AlertTriggered,
}

/// Running counters for one detector instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorStats {
    pub frames_processed: u64,
    /// Frames without a detected person
    pub frames_skipped: u64,
    /// Falls confirmed by consecutive frames
    pub episodes: u64,
    pub alerts: u64,
    pub false_alarms: u64,
}

/// Scheduled return to monitoring after an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRevert {
    pub due: Timestamp,
}

impl PendingRevert {
    pub fn is_due(&self, now: Timestamp) -> bool {
        now >= self.due
    }
}

/// Complete fall detector for one camera feed
pub struct FallDetector {
    config: DetectorConfig,
    source: Box<dyn PoseSource>,
    initialized: bool,
    state: DetectorState,

    heuristics: FallHeuristics,
    motion: MotionMonitor,
    events: EventBus,

    consecutive_fall_frames: u32,
    /// Analysis that confirmed the current episode
    fall_analysis: Option<FallAnalysis>,
    previous_landmarks: Option<PoseLandmarks>,
    pending_revert: Option<PendingRevert>,

    alert_context: AlertContext,
    stats: DetectorStats,
}

impl FallDetector {
    pub fn new(config: DetectorConfig, source: impl PoseSource + 'static) -> Self {
        Self {
            heuristics: FallHeuristics::new(config.heuristics.clone()),
            motion: MotionMonitor::new(config.motion.clone()),
            config,
            source: Box::new(source),
            initialized: false,
            state: DetectorState::Idle,
            events: EventBus::new(),
            consecutive_fall_frames: 0,
            fall_analysis: None,
            previous_landmarks: None,
            pending_revert: None,
            alert_context: AlertContext::default(),
            stats: DetectorStats::default(),
        }
    }

    /// Initialize the pose source and start monitoring.
    ///
    /// Calling this again after success is a no-op. On failure the detector
    /// stays [`DetectorState::Idle`] and must not be fed frames.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        if let Err(e) = self.source.initialize().await {
            warn!(source = self.source.name(), "pose source initialization failed: {}", e);
            return Err(match e {
                Error::PoseSourceInit(msg) => Error::PoseSourceInit(msg),
                other => Error::PoseSourceInit(other.to_string()),
            });
        }

        self.initialized = true;
        info!(source = self.source.name(), "fall detector initialized");
        self.set_state(DetectorState::Monitoring);
        Ok(())
    }

    /// Feed one frame. Frames must arrive in capture order.
    pub fn process_frame(&mut self, frame: &PoseFrame) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        self.poll(frame.timestamp);

        let Some(landmarks) = frame.landmarks.as_ref() else {
            self.stats.frames_skipped += 1;
            return Ok(());
        };
        self.stats.frames_processed += 1;

        match self.state {
            DetectorState::Monitoring => self.evaluate_fall(landmarks, frame.timestamp),
            DetectorState::MotionCheck => self.evaluate_motion(landmarks, frame.timestamp),
            DetectorState::Idle | DetectorState::FallDetected | DetectorState::AlertTriggered => {}
        }

        Ok(())
    }

    /// Fire the post-alert revert if its deadline has passed
    pub fn poll(&mut self, now: Timestamp) {
        if let Some(pending) = self.pending_revert {
            if pending.is_due(now) {
                info!("alert grace period elapsed, resuming monitoring");
                self.reset();
            }
        }
    }

    /// Drain the pose source through the detector until it is exhausted
    pub async fn run(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        while let Some(frame) = self.source.next_frame().await? {
            self.process_frame(&frame)?;
        }

        info!(
            source = self.source.name(),
            frames = self.stats.frames_processed,
            alerts = self.stats.alerts,
            "pose source exhausted"
        );
        Ok(())
    }

    fn evaluate_fall(&mut self, landmarks: &PoseLandmarks, timestamp: Timestamp) {
        let analysis = self
            .heuristics
            .analyze(landmarks, self.previous_landmarks.as_ref(), timestamp);

        if analysis.is_fall {
            self.consecutive_fall_frames += 1;
        } else {
            self.consecutive_fall_frames = self.consecutive_fall_frames.saturating_sub(1);
        }
        self.previous_landmarks = Some(landmarks.clone());

        debug!(
            confidence = analysis.confidence,
            consecutive = self.consecutive_fall_frames,
            "fall heuristics evaluated"
        );

        if self.consecutive_fall_frames >= self.config.confirmation.required_frames {
            info!(
                confidence = analysis.confidence,
                reasons = ?analysis.reasons,
                "fall confirmed, opening motion window"
            );
            self.stats.episodes += 1;
            self.events.emit(&DetectorEvent::FallDetected {
                analysis: analysis.clone(),
            });
            self.fall_analysis = Some(analysis);
            self.set_state(DetectorState::FallDetected);

            self.motion.start_monitoring(landmarks, timestamp);
            self.set_state(DetectorState::MotionCheck);
        }
    }

    fn evaluate_motion(&mut self, landmarks: &PoseLandmarks, timestamp: Timestamp) {
        let result = self.motion.check_motion(landmarks, timestamp);

        self.events.emit(&DetectorEvent::MotionCheckUpdate {
            time_remaining: result.time_remaining,
            movement_detected: result.movement_detected,
            avg_movement: result.avg_movement,
        });

        if !result.is_complete {
            return;
        }

        if result.should_trigger_alert {
            self.trigger_alert(&result, timestamp);
        } else {
            let reason = if result.movement_detected {
                "Movement detected"
            } else {
                "Insufficient motion samples"
            };
            info!(avg_movement = result.avg_movement, reason, "false alarm");
            self.stats.false_alarms += 1;
            self.events.emit(&DetectorEvent::FalseAlarm {
                reason: reason.to_string(),
            });
            self.reset();
        }
    }

    fn trigger_alert(&mut self, result: &MotionCheckResult, timestamp: Timestamp) {
        let alert = FallAlert::build(
            self.fall_analysis.as_ref(),
            result,
            self.config.motion.window_ms,
            Utc::now(),
        )
        .with_context(&self.alert_context);

        warn!(
            alert_id = %alert.id.0,
            confidence = alert.confidence,
            avg_movement = alert.motion_window.avg_movement,
            "fall alert raised"
        );

        self.stats.alerts += 1;
        self.events.emit(&DetectorEvent::AlertTriggered { alert });
        self.set_state(DetectorState::AlertTriggered);
        self.pending_revert = Some(PendingRevert {
            due: timestamp.add_millis(self.config.confirmation.alert_grace_ms),
        });
    }

    fn set_state(&mut self, state: DetectorState) {
        if self.state == state {
            return;
        }
        debug!(from = ?self.state, to = ?state, "detector state change");
        self.state = state;
        self.events.emit(&DetectorEvent::StateChange { state });
    }

    /// Clear all episode state and return to monitoring
    pub fn reset(&mut self) {
        self.pending_revert = None;
        self.consecutive_fall_frames = 0;
        self.fall_analysis = None;
        self.previous_landmarks = None;
        self.heuristics.reset();
        self.motion.reset();

        if self.initialized {
            self.set_state(DetectorState::Monitoring);
        }
    }

    /// Tear down: cancel the pending revert, drop listeners, close the source
    pub async fn destroy(&mut self) -> Result<()> {
        self.events.clear();
        self.reset();

        let closed = if self.initialized {
            self.source.close().await
        } else {
            Ok(())
        };
        self.initialized = false;
        self.state = DetectorState::Idle;
        info!(source = self.source.name(), "fall detector destroyed");
        closed
    }

    /// Register an event listener
    pub fn on<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&DetectorEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn subscribe_channel(
        &mut self,
    ) -> (SubscriptionId, tokio::sync::mpsc::UnboundedReceiver<DetectorEvent>) {
        self.events.subscribe_channel()
    }

    pub fn set_alert_context(&mut self, context: AlertContext) {
        self.alert_context = context;
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn consecutive_fall_frames(&self) -> u32 {
        self.consecutive_fall_frames
    }

    pub fn fall_analysis(&self) -> Option<&FallAnalysis> {
        self.fall_analysis.as_ref()
    }

    pub fn pending_revert(&self) -> Option<PendingRevert> {
        self.pending_revert
    }

    pub fn heuristics(&self) -> &FallHeuristics {
        &self.heuristics
    }

    pub fn motion_monitor(&self) -> &MotionMonitor {
        &self.motion
    }

    pub fn listener_count(&self) -> usize {
        self.events.len()
    }

    pub fn stats(&self) -> DetectorStats {
        self.stats
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}
