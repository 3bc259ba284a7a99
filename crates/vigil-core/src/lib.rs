//! # Vigil-Core
//!
//! Core types shared by the Vigil fall-detection pipeline: the 33-point pose
//! landmark layout, per-frame pose input, monotonic timestamps and the
//! geometric helpers the fall heuristics are built on.

pub mod error;
pub mod geometry;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use types::*;
