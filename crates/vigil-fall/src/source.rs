//! Pose source interfaces.
//!
//! The detector does not run pose inference itself. A [`PoseSource`] wraps
//! whatever produces landmark frames (a camera plus a pose model, a network
//! feed, a recording) and hands them over one at a time, in capture order.

use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use vigil_core::{Error, PoseFrame, Result};

/// Trait for pose landmark providers
#[async_trait]
pub trait PoseSource: Send {
    /// Human-readable source name, used in logs
    fn name(&self) -> &str;

    /// Prepare the source (load models, open devices). Must be idempotent.
    async fn initialize(&mut self) -> Result<()>;

    /// Next frame in temporal order, or `None` once the source is exhausted
    async fn next_frame(&mut self) -> Result<Option<PoseFrame>>;

    /// Release any held resources
    async fn close(&mut self) -> Result<()>;
}

/// Replays pre-recorded frames, either built in memory or loaded from a
/// JSON-lines recording (one [`PoseFrame`] per line).
pub struct ReplaySource {
    name: String,
    frames: VecDeque<PoseFrame>,
    initialized: bool,
    fail_init: Option<String>,
}

impl ReplaySource {
    pub fn new(frames: Vec<PoseFrame>) -> Self {
        Self {
            name: "replay".to_string(),
            frames: frames.into(),
            initialized: false,
            fail_init: None,
        }
    }

    pub fn from_json_lines(input: &str) -> Result<Self> {
        let frames = input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<PoseFrame>(line)
                    .map_err(|e| Error::Serialization(format!("line {}: {}", n + 1, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(frames))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        let mut source = Self::from_json_lines(&contents)?;
        source.name = path.display().to_string();
        Ok(source)
    }

    /// Make `initialize` fail with the given message
    pub fn failing_init(mut self, message: &str) -> Self {
        self.fail_init = Some(message.to_string());
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl PoseSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(&mut self) -> Result<()> {
        if let Some(message) = &self.fail_init {
            return Err(Error::PoseSourceInit(message.clone()));
        }
        self.initialized = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<PoseFrame>> {
        if !self.initialized {
            return Err(Error::PoseSource("Replay source not initialized".into()));
        }
        Ok(self.frames.pop_front())
    }

    async fn close(&mut self) -> Result<()> {
        self.initialized = false;
        self.frames.clear();
        Ok(())
    }
}
