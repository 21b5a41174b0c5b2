//! Induction heating simulation: a pure per-frame temperature model,
//! visual parameters derived from it, and the frame loop that drives both.

pub mod material;
pub mod model;
pub mod runner;
pub mod visuals;

pub use material::{Material, MaterialClass};
pub use model::{HeatingParams, InductionModel, ModelSnapshot};
pub use runner::{FrameSnapshot, SimulationHandle};
pub use visuals::{derive_frame, VisualFrame};
