//! Optimization pass traits and pass metadata.

use crate::Result;
use crate::ir::{IrGraph, IrNodeId};
use std::fmt;

/// What kind of rewrite a pass performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassType {
    /// Merges several nodes (or a node and a constant) into one.
    Fuse,

    /// Removes nodes that have no effect.
    Nop,

    /// Splits a node into several simpler ones.
    Separate,

    /// Reads the graph without changing it.
    Immutable,

    /// Replaces a node with an equivalent one.
    Replace,

    Other,
}

/// Whether one sweep of a pass is guaranteed to reach its fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassEfficiency {
    /// Another sweep may find more to rewrite.
    Partial,

    /// One sweep is enough.
    Complete,
}

/// What a pass optimizes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassOptimizationType {
    None,
    Compute,
    Memory,
    ComputeMemory,
    Stability,
}

/// Result of running a pass over a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassAnalysis {
    /// Number of rewrites committed.
    pub rewrites: usize,
}

impl PassAnalysis {
    /// Whether the pass changed the graph.
    pub fn changed(&self) -> bool {
        self.rewrites > 0
    }
}

/// Trait for implementing optimizer passes.
///
/// A pass is a graph transformation. Passes are standalone objects so they
/// can rewrite across operator types.
///
/// # Example
///
/// ```
/// use onnxopt_core::{IrGraph, Pass, PassAnalysis, PassType, Result};
///
/// struct DeadCodeEliminationPass;
///
/// impl Pass for DeadCodeEliminationPass {
///     fn name(&self) -> &str {
///         "dead_code_elimination"
///     }
///
///     fn pass_type(&self) -> PassType {
///         PassType::Nop
///     }
///
///     fn run(&self, _graph: &mut IrGraph) -> Result<PassAnalysis> {
///         // Remove nodes whose outputs are never used...
///         Ok(PassAnalysis::default())
///     }
/// }
///
/// let analysis = DeadCodeEliminationPass.run(&mut IrGraph::new())?;
/// assert!(!analysis.changed());
/// # Ok::<(), onnxopt_core::Error>(())
/// ```
pub trait Pass: Send + Sync {
    /// Get the pass name (used for logging and registry lookup).
    fn name(&self) -> &str;

    fn pass_type(&self) -> PassType;

    fn efficiency(&self) -> PassEfficiency {
        PassEfficiency::Complete
    }

    fn optimization_type(&self) -> PassOptimizationType {
        PassOptimizationType::None
    }

    /// Run the pass on the given graph.
    ///
    /// # Returns
    ///
    /// * `Ok(analysis)` describing how many rewrites were committed.
    /// * `Err(_)` if the graph is structurally broken.
    fn run(&self, graph: &mut IrGraph) -> Result<PassAnalysis>;
}

/// How many nodes the driver should destroy after a committed transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeDestroyType {
    /// Keep the current node.
    DestroyZero,

    /// Remove the current node.
    DestroyOne,
}

/// Outcome of [`PredicateBasedPass::run_transform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome<R> {
    /// The graph was rewritten.
    Committed { destroy: NodeDestroyType },

    /// Nothing was changed, for the given reason.
    Declined(R),
}

impl<R> TransformOutcome<R> {
    pub fn is_committed(&self) -> bool {
        matches!(self, TransformOutcome::Committed { .. })
    }
}

/// A pass made of a per-node predicate and a transform.
///
/// The predicate must not mutate anything. The transform either commits a
/// complete rewrite or returns [`TransformOutcome::Declined`] with the graph
/// untouched.
pub trait PredicateBasedPass: Send + Sync {
    /// Why a transform can decline.
    type Decline: fmt::Display;

    fn name(&self) -> &str;

    fn pass_type(&self) -> PassType;

    fn efficiency(&self) -> PassEfficiency;

    fn optimization_type(&self) -> PassOptimizationType;

    /// Whether `node` is a candidate for this rewrite.
    fn pattern_match_predicate(&self, graph: &IrGraph, node: IrNodeId) -> bool;

    /// Rewrite the graph around a matched node.
    fn run_transform(
        &self,
        graph: &mut IrGraph,
        node: IrNodeId,
    ) -> Result<TransformOutcome<Self::Decline>>;
}

/// Runs a [`PredicateBasedPass`] over every node of a graph.
///
/// Nodes are visited in topological order. A node destroyed by an earlier
/// rewrite in the same sweep is skipped.
pub struct PredicatePass<P> {
    inner: P,
}

impl<P: PredicateBasedPass> PredicatePass<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// The wrapped rule.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: PredicateBasedPass> Pass for PredicatePass<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn pass_type(&self) -> PassType {
        self.inner.pass_type()
    }

    fn efficiency(&self) -> PassEfficiency {
        self.inner.efficiency()
    }

    fn optimization_type(&self) -> PassOptimizationType {
        self.inner.optimization_type()
    }

    fn run(&self, graph: &mut IrGraph) -> Result<PassAnalysis> {
        let mut analysis = PassAnalysis::default();

        for node_id in graph.topological_order() {
            if !graph.contains_node(node_id) {
                continue;
            }
            if !self.inner.pattern_match_predicate(graph, node_id) {
                continue;
            }

            match self.inner.run_transform(graph, node_id)? {
                TransformOutcome::Committed { destroy } => {
                    if destroy == NodeDestroyType::DestroyOne {
                        graph.remove_node(node_id)?;
                    }
                    analysis.rewrites += 1;
                }
                TransformOutcome::Declined(reason) => {
                    tracing::debug!(pass = self.inner.name(), node = ?node_id, %reason, "declined");
                }
            }
        }

        Ok(analysis)
    }
}
