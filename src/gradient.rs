// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Gradient Estimation

//! Per-node partial derivatives of the Hamiltonian.
//!
//! Two interchangeable strategies sit behind [`GradientStrategy`]:
//! a central finite difference that re-evaluates the full Hamiltonian twice
//! per node, and a closed form that exploits the mean-only structure of the
//! cost (every node gets `dH/d(mean) / N`). They must agree to within
//! finite-difference error on any snapshot.

use std::fmt;

use crate::field::{ParamId, ParameterField};
use crate::hamiltonian::{Hamiltonian, HamiltonianWeights};
use crate::imbalance::ImbalanceField;
use crate::types::NodeValues;

/// Read-only view of a snapshot the gradient is taken on.
#[derive(Clone, Copy)]
pub struct GradientContext<'a> {
    pub field: &'a ParameterField,
    pub imbalance: &'a ImbalanceField,
    pub hamiltonian: &'a Hamiltonian,
    pub weights: &'a HamiltonianWeights,
}

pub trait GradientStrategy: fmt::Debug {
    fn name(&self) -> &'static str;

    /// `dH / d value[node]` of `param` for every node. Empty for an empty field.
    fn gradient(&self, ctx: &GradientContext<'_>, param: ParamId) -> NodeValues;
}

// ---------------------------------------------------------------------------
// Numerical
// ---------------------------------------------------------------------------

/// Central finite difference, O(nodes) Hamiltonian evaluations per call.
#[derive(Debug, Clone, Copy)]
pub struct NumericalGradient {
    delta: f64,
}

impl Default for NumericalGradient {
    fn default() -> Self {
        Self { delta: 0.001 }
    }
}

impl NumericalGradient {
    pub fn new(delta: f64) -> Self {
        Self { delta }
    }
}

impl GradientStrategy for NumericalGradient {
    fn name(&self) -> &'static str {
        "numerical"
    }

    fn gradient(&self, ctx: &GradientContext<'_>, param: ParamId) -> NodeValues {
        let mut out = NodeValues::with_capacity(ctx.field.node_count());
        if ctx.field.node_count() == 0 {
            return out;
        }
        let mut scratch = ctx.field.clone();
        for (idx, node) in ctx.field.node_ids().iter().enumerate() {
            let original = ctx.field.values(param)[idx];

            scratch.values_mut(param)[idx] = original + self.delta;
            let plus = ctx.hamiltonian.evaluate(&scratch, ctx.imbalance, ctx.weights).value;
            scratch.values_mut(param)[idx] = original - self.delta;
            let minus = ctx.hamiltonian.evaluate(&scratch, ctx.imbalance, ctx.weights).value;
            scratch.values_mut(param)[idx] = original;

            out.insert(node.clone(), (plus - minus) / (2.0 * self.delta));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Analytical
// ---------------------------------------------------------------------------

/// Closed-form gradient; uniform across nodes.
///
/// Above the cap the capped Hamiltonian is flat, so the derivative is 0 there,
/// which is what the finite difference observes as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticalGradient;

impl GradientStrategy for AnalyticalGradient {
    fn name(&self) -> &'static str {
        "analytical"
    }

    fn gradient(&self, ctx: &GradientContext<'_>, param: ParamId) -> NodeValues {
        let n = ctx.field.node_count();
        if n == 0 {
            return NodeValues::new();
        }
        let per_node = if ctx.hamiltonian.evaluate(ctx.field, ctx.imbalance, ctx.weights).capped {
            0.0
        } else {
            ctx.hamiltonian.mean_derivative(ctx.field, ctx.weights, param) / n as f64
        };
        ctx.field.node_ids().iter().map(|node| (node.clone(), per_node)).collect()
    }
}
