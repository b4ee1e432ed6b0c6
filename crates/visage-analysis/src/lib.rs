//! # Visage-Analysis
//!
//! Composite scorers layered over the gesture catalog's detections.
//!
//! - **Body language**: weighted categories over pose/hand primitives
//! - **Deception**: four sub-analyses fused into one probability band
//! - **Stress**: four facial/postural regions fused into a percentage
//!
//! Every weighted sum goes through [`WeightTable`], validated once at
//! construction so scores stay within [0, 1]. The scorers hold no hidden
//! state: anything temporal (fidget history, stress history, expression
//! history) is an explicit value owned by the caller.

pub mod body_language;
pub mod deception;
pub mod fidget;
pub mod stress;
pub mod weighted;

pub use body_language::*;
pub use deception::*;
pub use fidget::*;
pub use stress::*;
pub use weighted::*;
