//! # Visage-Core
//!
//! Core types for the visage gesture evaluation engine: landmark snapshots
//! produced by an external landmark provider, the detections derived from
//! them, composite scores and the analysis moments handed to narrative and
//! persistence collaborators.

pub mod detection;
pub mod error;
pub mod geometry;
pub mod landmarks;
pub mod types;

pub use detection::*;
pub use error::{Error, Result};
pub use geometry::*;
pub use types::*;
