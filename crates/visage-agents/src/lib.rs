//! # Visage-Agents
//!
//! The narrative boundary of the engine. Once the significance gate accepts
//! a moment, its label list is handed to a [`NarrativeOracle`] that returns
//! free-form commentary. The engine stores that text verbatim and never
//! parses it.
//!
//! ## Flow
//!
//! ```text
//! accepted AnalysisMoment
//!     ↓ labels (+ optional frame image)
//! [NarrativeRequest] → prompt selection (facial vs facial + body)
//!     ↓
//! [NarrativeOracle::narrate] (remote LLM, or InterpretiveNarrator offline)
//!     ↓
//! narrative text → AnalysisMoment.narrative
//! ```

pub mod agent;
pub mod narrator;
pub mod prompts;

pub use agent::*;
pub use narrator::*;
pub use prompts::*;
