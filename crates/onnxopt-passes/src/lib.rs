//! Graph optimization passes for onnxopt.
//!
//! This crate holds the rewrite rules and the pipeline that runs them:
//! - `fuse_cast_into_initializer` folds a `Cast` of a constant into a new,
//!   converted initializer
//! - `PassRegistry` builds passes by name
//! - `Optimizer` runs a list of passes, repeating sweeps until the graph
//!   stops changing
//!
//! # Example
//!
//! ```
//! use onnxopt_core::{AttributeValue, DataType, IrGraph, IrNode, IrValue};
//! use onnxopt_core::{TensorConstant, TensorData, TensorShape};
//! use onnxopt_passes::Optimizer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = IrGraph::new();
//! let a = graph.add_initializer_and_input(TensorConstant::new(
//!     "a",
//!     DataType::I64,
//!     vec![2],
//!     TensorData::I64(vec![7, 8]),
//! )?)?;
//! let x = graph.add_value(IrValue::new("x", DataType::F32, TensorShape::Static(vec![2])))?;
//!
//! let mut cast = IrNode::new("Cast".to_string());
//! cast.add_input(a);
//! cast.add_output(x);
//! cast.set_attribute("to", AttributeValue::Int(DataType::F32.onnx_code()));
//! graph.add_node(cast)?;
//!
//! let summary = Optimizer::new().optimize(&mut graph)?;
//! assert_eq!(summary.total_rewrites(), 1);
//! assert_eq!(graph.node_count(), 0);
//! # Ok(())
//! # }
//! ```

pub mod passes;
pub mod registry;

pub use passes::{FuseCastDecline, FuseCastIntoInitializer};
pub use registry::{PassFactory, PassRegistry};

use onnxopt_core::{IrGraph, Pass, PassEfficiency, Result};
use tracing::warn;

/// Pipeline settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Repeat sweeps while a partial-efficiency pass keeps changing the graph.
    pub fixed_point: bool,

    /// Upper bound on sweeps when `fixed_point` is set.
    pub max_iterations: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            fixed_point: true,
            max_iterations: 16,
        }
    }
}

/// What a pipeline run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeSummary {
    /// Number of sweeps over the pass list.
    pub sweeps: usize,

    /// Rewrites committed per pass, in pipeline order.
    pub rewrites: Vec<(String, usize)>,

    /// Whether the last sweep left the graph unchanged.
    pub reached_fixed_point: bool,
}

impl OptimizeSummary {
    /// Rewrites committed by all passes.
    pub fn total_rewrites(&self) -> usize {
        self.rewrites.iter().map(|(_, count)| count).sum()
    }

    /// Rewrites committed by the named pass.
    pub fn rewrites_for(&self, name: &str) -> usize {
        self.rewrites
            .iter()
            .filter(|(pass, _)| pass == name)
            .map(|(_, count)| count)
            .sum()
    }
}

/// Optimizer pipeline with pluggable passes.
///
/// Passes run in the order they were added. With `fixed_point` enabled the
/// whole list is swept again as long as a pass with
/// [`PassEfficiency::Partial`] committed a rewrite in the previous sweep.
pub struct Optimizer {
    passes: Vec<Box<dyn Pass>>,
    config: OptimizerConfig,
}

impl Optimizer {
    /// Create a pipeline with every built-in pass and the default config.
    pub fn new() -> Self {
        Self::with_config(OptimizerConfig::default())
    }

    /// Create a pipeline with every built-in pass.
    pub fn with_config(config: OptimizerConfig) -> Self {
        let registry = PassRegistry::builtin();
        let mut optimizer = Self::empty(config);
        for name in registry.pass_names() {
            if let Ok(pass) = registry.create(name) {
                optimizer.passes.push(pass);
            }
        }
        optimizer
    }

    /// Create a pipeline without passes.
    pub fn empty(config: OptimizerConfig) -> Self {
        Self {
            passes: Vec::new(),
            config,
        }
    }

    /// Create a pipeline from pass names.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownPass` for a name missing from `registry`.
    pub fn with_passes(
        registry: &PassRegistry,
        names: &[&str],
        config: OptimizerConfig,
    ) -> Result<Self> {
        let passes = names
            .iter()
            .map(|name| registry.create(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { passes, config })
    }

    /// Add a custom pass to the end of the pipeline.
    ///
    /// Returns a mutable reference to self for method chaining.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Names of the passes, in pipeline order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Run the pipeline on a graph.
    ///
    /// # Errors
    ///
    /// Returns an error if a pass finds the graph structurally broken.
    /// Rewrites a pass declines are not errors.
    #[tracing::instrument(skip_all, fields(num_nodes = graph.node_count(), num_initializers = graph.initializers().len()))]
    pub fn optimize(&self, graph: &mut IrGraph) -> Result<OptimizeSummary> {
        let mut summary = OptimizeSummary {
            rewrites: self
                .passes
                .iter()
                .map(|pass| (pass.name().to_string(), 0))
                .collect(),
            ..Default::default()
        };

        loop {
            summary.sweeps += 1;
            let mut partial_changed = false;

            for (slot, pass) in summary.rewrites.iter_mut().zip(&self.passes) {
                let _span =
                    tracing::debug_span!("pass", name = pass.name(), pass_type = ?pass.pass_type())
                        .entered();
                let analysis = pass.run(graph)?;
                slot.1 += analysis.rewrites;

                if analysis.changed() && pass.efficiency() == PassEfficiency::Partial {
                    partial_changed = true;
                }
            }

            if !partial_changed {
                summary.reached_fixed_point = true;
                break;
            }
            if !self.config.fixed_point {
                break;
            }
            if summary.sweeps >= self.config.max_iterations {
                warn!(
                    sweeps = summary.sweeps,
                    "optimizer stopped before reaching a fixed point"
                );
                break;
            }
        }

        tracing::debug!(
            sweeps = summary.sweeps,
            rewrites = summary.total_rewrites(),
            "optimization finished"
        );

        Ok(summary)
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function: run the default pipeline on a graph.
pub fn optimize(graph: &mut IrGraph) -> Result<OptimizeSummary> {
    Optimizer::new().optimize(graph)
}
