// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Simulation Core

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::config::{ConfigError, Dynamics, SimulationConfig};
use crate::field::{ParamId, ParameterField};
use crate::governor::{Adaptation, AdaptiveWeightController, PerformanceHistory, PerformanceRecord};
use crate::gradient::{GradientContext, GradientStrategy};
use crate::graph::NetworkGraph;
use crate::hamiltonian::{Energy, Hamiltonian, HamiltonianWeights};
use crate::imbalance::{ImbalanceField, ImbalanceSummary};
use crate::laplacian::laplacian;
use crate::routing::{PathIntegralRouter, Route, RoutingError};
use crate::types::{NodeId, NodeValues};
use crate::update::{gaussian, DecisionCounts, UpdateRule};
use crate::validation::{BlockCandidate, BlockGate};

/// Confirmation time per unit of mean throughput parameter.
const CONFIRMATION_SCALE: f64 = 5.0;
const MIN_CONFIRMATION_TIME: f64 = 0.1;

// ─── StepReport ──────────────────────────────────────────────────────────────

/// Everything observable about one completed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: u64,
    /// Energy of the post-update state, under the weights the step ran with.
    pub energy: Energy,
    pub decisions: DecisionCounts,
    pub imbalance: ImbalanceSummary,
    pub record: PerformanceRecord,
    /// `None` until the controller has history to read.
    pub adaptation: Option<Adaptation>,
}

// ─── SimulationCore ──────────────────────────────────────────────────────────

/// Owns the full state of one run: topology, fields, weights, history and
/// the single random source.
#[derive(Debug)]
pub struct SimulationCore {
    graph: NetworkGraph,
    field: ParameterField,
    imbalance: ImbalanceField,
    hamiltonian: Hamiltonian,
    weights: HamiltonianWeights,
    history: PerformanceHistory,
    strategy: Box<dyn GradientStrategy>,
    rule: UpdateRule,
    controller: AdaptiveWeightController,
    router: PathIntegralRouter,
    gate: BlockGate,
    dynamics: Dynamics,
    rng: ChaCha8Rng,
    step: u64,
    cap_events: u64,
    imbalance_saturations: u64,
}

impl SimulationCore {
    /// Seed a run over `graph`. Parameters are laid out in graph node order.
    pub fn new(graph: NetworkGraph, config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let field = ParameterField::new(graph.node_ids(), &config.parameters)?;
        let hamiltonian = Hamiltonian::new(&field, &config.throughput_param, &config.fee_param)?;
        Ok(Self {
            imbalance: ImbalanceField::new(graph.len()),
            field,
            hamiltonian,
            weights: config.weights,
            history: PerformanceHistory::new(),
            strategy: config.gradient.build(&config.dynamics),
            rule: UpdateRule::from_dynamics(&config.dynamics),
            controller: AdaptiveWeightController::new(config.weight_limits),
            router: config.routing,
            gate: BlockGate::new(config.block_gate_threshold),
            dynamics: config.dynamics,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            step: 0,
            cap_events: 0,
            imbalance_saturations: 0,
            graph,
        })
    }

    /// Replace the configured gradient strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn GradientStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    // ─── Step ────────────────────────────────────────────────────────────────

    /// Update parameters, then adapt weights.
    pub fn step(&mut self) -> StepReport {
        let mut report = self.update_parameters();
        report.adaptation = self.adapt_weights();
        report
    }

    /// One stochastic update of every parameter and the imbalance field,
    /// followed by a history append. Weights are left unchanged.
    pub fn update_parameters(&mut self) -> StepReport {
        self.step += 1;
        let snapshot = self.field.clone();
        let ctx = GradientContext {
            field: &snapshot,
            imbalance: &self.imbalance,
            hamiltonian: &self.hamiltonian,
            weights: &self.weights,
        };

        let mut decisions = DecisionCounts::default();
        for param in snapshot.param_ids() {
            let gradient = self.strategy.gradient(&ctx, param);
            let old = snapshot.values(param);
            let lap = laplacian(&self.graph, old);
            let parameter = snapshot.parameter(param);
            for (idx, node) in snapshot.node_ids().iter().enumerate() {
                let g = gradient.get(node).copied().unwrap_or(0.0);
                let noise = self.rule.sample_noise(&mut self.rng);
                let proposal = self.rule.propose(old[idx], g, parameter.smoothing(), lap[idx], noise);
                let (value, decision) = self.rule.bound(old[idx], proposal, parameter);
                decisions.record(decision);
                self.field.values_mut(param)[idx] = value;
            }
        }

        self.field.recentre_distributions();

        self.imbalance.inject_noise(&mut self.rng, self.dynamics.imbalance_noise);
        let imbalance = self.imbalance.apply_correction(
            &self.graph,
            self.dynamics.imbalance_correction,
            self.dynamics.imbalance_limit,
        );
        if imbalance.saturated > 0 {
            self.imbalance_saturations += 1;
            if self.imbalance_saturations == 1 {
                warn!(
                    step = self.step,
                    nodes = imbalance.saturated,
                    limit = self.dynamics.imbalance_limit,
                    "imbalance saturated; further saturations are counted, not logged"
                );
            } else {
                trace!(step = self.step, nodes = imbalance.saturated, "imbalance saturated");
            }
        }

        let energy = self.energy();
        if energy.capped {
            self.cap_events += 1;
            warn!(step = self.step, raw = energy.raw, cap_events = self.cap_events, "hamiltonian capped");
        }

        let throughput_mean = self.field.mean_of(self.hamiltonian.throughput());
        let confirmation_time = (CONFIRMATION_SCALE * throughput_mean
            + gaussian(&mut self.rng, self.dynamics.confirmation_noise))
        .max(MIN_CONFIRMATION_TIME);
        let record = PerformanceRecord {
            step: self.step,
            confirmation_time,
            path_latency: self.graph.mean_latency(),
            quantity_imbalance: imbalance.mean,
            hamiltonian: energy.value,
        };
        self.history.push(record.clone());

        trace!(
            step = self.step,
            energy = energy.value,
            clamped = decisions.clamped(),
            confirmation_time,
            "step complete"
        );
        StepReport { step: self.step, energy, decisions, imbalance, record, adaptation: None }
    }

    /// Run the weight controller over the current history.
    pub fn adapt_weights(&mut self) -> Option<Adaptation> {
        let throughput_mean = self.field.mean_of(self.hamiltonian.throughput());
        let uncertainty = self.hamiltonian.uncertainty_product(&self.field);
        self.controller.adapt(&mut self.weights, &self.history, throughput_mean, uncertainty)
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    /// Capped energy of the current state.
    pub fn energy(&self) -> Energy {
        self.hamiltonian.evaluate(&self.field, &self.imbalance, &self.weights)
    }

    /// Per-node gradient of `param` on the current state.
    pub fn gradient(&self, param: ParamId) -> NodeValues {
        let ctx = GradientContext {
            field: &self.field,
            imbalance: &self.imbalance,
            hamiltonian: &self.hamiltonian,
            weights: &self.weights,
        };
        self.strategy.gradient(&ctx, param)
    }

    /// Minimum-action route priced at the current mean fee.
    pub fn route(&self, from: &NodeId, to: &NodeId) -> Result<Route, RoutingError> {
        let fee_mean = self.field.mean_of(self.hamiltonian.fee());
        self.router.find_route(&self.graph, from, to, fee_mean)
    }

    /// Draw a block proposal from the parameter distributions, centred on
    /// the field means as of the last step. Uses the caller's random source.
    pub fn propose_block<R: Rng + ?Sized>(&self, rng: &mut R) -> BlockCandidate {
        BlockCandidate::sample(&self.field, &self.hamiltonian, rng)
    }

    pub fn admit_block(&self, block: &BlockCandidate) -> bool {
        self.gate.admits(&self.field, &self.hamiltonian, block)
    }

    // ─── Collaborator hooks ──────────────────────────────────────────────────

    /// Add a signed settlement perturbation to `receiver`'s imbalance.
    /// Panics on an unknown node.
    pub fn apply_transfer_perturbation(&mut self, receiver: &NodeId, value: f64) {
        let Some(idx) = self.graph.index_of(receiver) else {
            panic!("unknown node `{receiver}`");
        };
        self.imbalance.perturb(idx, value);
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    pub fn graph(&self) -> &NetworkGraph { &self.graph }
    /// Edge edits between steps. The node set is fixed.
    pub fn graph_mut(&mut self) -> &mut NetworkGraph { &mut self.graph }
    pub fn field(&self) -> &ParameterField { &self.field }
    /// Direct writes bypass bound enforcement.
    pub fn field_mut(&mut self) -> &mut ParameterField { &mut self.field }
    pub fn imbalance(&self) -> &ImbalanceField { &self.imbalance }
    pub fn hamiltonian(&self) -> &Hamiltonian { &self.hamiltonian }
    pub fn weights(&self) -> &HamiltonianWeights { &self.weights }
    pub fn history(&self) -> &PerformanceHistory { &self.history }
    pub fn strategy_name(&self) -> &'static str { self.strategy.name() }
    pub fn step_count(&self) -> u64 { self.step }
    pub fn cap_events(&self) -> u64 { self.cap_events }
    /// Steps on which the imbalance correction hit `Dynamics::imbalance_limit`.
    pub fn imbalance_saturations(&self) -> u64 { self.imbalance_saturations }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
