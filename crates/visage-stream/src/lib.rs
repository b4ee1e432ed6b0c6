//! # Visage-Stream
//!
//! Runs the engine over continuous video. Each [`StreamSession`] owns its
//! significance gate, fidget tracker, stress history and expression history;
//! the catalog and scorers inside [`VisageEngine`] are shared read-only.
//!
//! ## Per-frame flow
//!
//! ```text
//! FrameLandmarks
//!     ↓ GestureEvaluator (face, pose, hands)
//! DetectionSet + fidgeting + body-language patterns
//!     ↓ StressScorer (region cues, history)
//!     ↓ SignificanceGate
//! accepted → DeceptionScorer → pending slot → NarrativeOracle → MomentSink
//! ```

pub mod config;
pub mod engine;
pub mod gate;
pub mod session;
pub mod sink;
pub mod summary;

pub use config::*;
pub use engine::*;
pub use gate::*;
pub use session::*;
pub use sink::*;
pub use summary::*;
