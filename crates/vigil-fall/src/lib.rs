//! # Vigil-Fall
//!
//! Fall detection over a stream of pose landmark frames.
//!
//! ## Pipeline
//!
//! 1. **Heuristics**: every frame is scored against five posture and
//!    velocity signals ([`FallHeuristics`]).
//! 2. **Confirmation**: a fall is only taken seriously after several
//!    consecutive fall-positive frames; isolated flickers decay away
//!    ([`FallDetector`]).
//! 3. **Motion window**: after confirmation the subject is watched for a
//!    fixed window. Sustained stillness escalates, movement cancels
//!    ([`MotionMonitor`]).
//! 4. **Alert**: a [`FallAlert`] is multicast to every registered listener
//!    through the detector's [`EventBus`].
//!
//! The pipeline is synchronous and frame-driven. Pose inference, rendering,
//! persistence and dispatch live outside this crate and talk to it through
//! [`PoseSource`] and [`DetectorEvent`].

pub mod alert;
pub mod detector;
pub mod events;
pub mod heuristics;
pub mod motion;
pub mod settings;
pub mod source;

pub use alert::*;
pub use detector::*;
pub use events::*;
pub use heuristics::*;
pub use motion::*;
pub use settings::*;
pub use source::*;
