//! Adaptive governance of the Hamiltonian weights.
//!
//! The controller is a discrete feedback loop over the most recent window of
//! performance records; it holds no state of its own between steps.

pub mod adaptive;
pub mod history;

pub use adaptive::{Adaptation, AdaptiveWeightController, LoadRegime, WeightLimits, WeightRange};
pub use history::{PerformanceHistory, PerformanceRecord, WINDOW};
