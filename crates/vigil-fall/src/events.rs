//! Detector events and their synchronous multicast.
//!
//! Listeners run in registration order on the detector's own thread. A
//! listener that panics is logged and skipped; delivery to the remaining
//! listeners continues.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::alert::FallAlert;
use crate::detector::DetectorState;
use crate::heuristics::FallAnalysis;

/// Everything the detector tells the outside world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorEvent {
    StateChange {
        state: DetectorState,
    },
    FallDetected {
        analysis: FallAnalysis,
    },
    #[serde(rename_all = "camelCase")]
    MotionCheckUpdate {
        time_remaining: f64,
        movement_detected: bool,
        avg_movement: f64,
    },
    AlertTriggered {
        alert: FallAlert,
    },
    FalseAlarm {
        reason: String,
    },
}

impl DetectorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DetectorEvent::StateChange { .. } => "state_change",
            DetectorEvent::FallDetected { .. } => "fall_detected",
            DetectorEvent::MotionCheckUpdate { .. } => "motion_check_update",
            DetectorEvent::AlertTriggered { .. } => "alert_triggered",
            DetectorEvent::FalseAlarm { .. } => "false_alarm",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&DetectorEvent) + Send + Sync>;

/// Ordered listener registry with per-listener fault isolation
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
    failures: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&DetectorEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Forward every event into an unbounded channel for async consumers.
    /// The forwarding listener goes quiet once the receiver is dropped.
    pub fn subscribe_channel(&mut self) -> (SubscriptionId, mpsc::UnboundedReceiver<DetectorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &DetectorEvent) {
        for (id, listener) in &self.listeners {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                self.failures += 1;
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(
                    subscription = id.0,
                    event = event.kind(),
                    "event listener failed: {}",
                    message
                );
            }
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listener invocations that panicked since creation
    pub fn failure_count(&self) -> u64 {
        self.failures
    }
}
