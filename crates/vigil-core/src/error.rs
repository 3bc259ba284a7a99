//! Error types for the Vigil fall-detection pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Landmark count mismatch: expected {expected}, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("Pose source initialization failed: {0}")]
    PoseSourceInit(String),

    #[error("Pose source error: {0}")]
    PoseSource(String),

    #[error("Detector not initialized")]
    NotInitialized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
