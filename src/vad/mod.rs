//! Voice activity: from per-frame scores to bounded speech chunks.

pub mod binarize;
pub mod energy;
pub mod merge;
pub mod trace;

pub use binarize::{Hysteresis, binarize};
pub use energy::{ActivityModel, EnergyActivityModel, calculate_rms};
pub use merge::{Chunk, merge_chunks};
pub use trace::{ActivityTrace, Interval};
