// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite

//! Self-tuning network parameter simulation.
//!
//! Per-node protocol parameters evolve under a capped Hamiltonian cost via
//! gradient descent, successor-Laplacian smoothing and Langevin noise, while
//! an adaptive controller retunes the cost weights from recent performance
//! and a path-integral router picks minimum-action routes.

pub mod config;
pub mod distribution;
pub mod field;
pub mod governor;
pub mod gradient;
pub mod graph;
pub mod hamiltonian;
pub mod imbalance;
pub mod laplacian;
pub mod routing;
pub mod simulation;
pub mod types;
pub mod update;
pub mod validation;

pub use config::{ConfigError, Dynamics, GradientKind, ParameterConfig, SimulationConfig};
pub use distribution::{TruncatedGaussian, UncertaintyRelation};
pub use field::{ParamId, Parameter, ParameterField};
pub use governor::{AdaptiveWeightController, PerformanceHistory, PerformanceRecord, WeightLimits};
pub use gradient::{AnalyticalGradient, GradientContext, GradientStrategy, NumericalGradient};
pub use graph::NetworkGraph;
pub use hamiltonian::{Energy, Hamiltonian, HamiltonianWeights, H_MAX};
pub use imbalance::ImbalanceField;
pub use routing::{PathIntegralRouter, Route, RoutingError};
pub use simulation::{SimulationCore, StepReport};
pub use types::{EdgeAttrs, NodeId, NodeValues};
pub use update::{BoundDecision, UpdateRule};
pub use validation::{BlockCandidate, BlockGate};
