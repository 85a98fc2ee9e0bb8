//! Fold a `Cast` of an initializer into a new initializer.
//!
//! ```text
//! Before:
//!   A is in the initializer list
//!   X = Cast(A, to=T)
//!   Z = Add(X, Y)
//! After:
//!   B = A converted to T is in the initializer list
//!   Z = Add(B, Y)
//! ```
//!
//! `A` is left in place; removing it once unused is the job of a dead
//! initializer pass. Casts whose input is computed at runtime, and casts to
//! the input's own type, are not touched.

use onnxopt_core::convert;
use onnxopt_core::{
    DataType, Error, IrGraph, IrNode, IrNodeId, NodeDestroyType, PassEfficiency,
    PassOptimizationType, PassType, PredicateBasedPass, Result, TensorConstant, TransformOutcome,
};
use tracing::{debug, trace};

/// Why [`FuseCastIntoInitializer`] left a matched `Cast` alone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FuseCastDecline {
    /// The cast input is a graph input without constant data.
    #[error("no initializer named '{0}'")]
    NoMatchingInitializer(String),

    /// The element type pair has no conversion kernel.
    #[error("cannot convert {from} to {to}")]
    UnsupportedConversion { from: DataType, to: DataType },

    /// Some consumer of the cast output cannot take the folded constant.
    #[error("uses of '{0}' cannot be redirected to the folded constant")]
    RewireFailure(String),
}

/// Rewrite rule replacing `Cast(initializer)` with a converted initializer.
#[derive(Debug, Default, Clone, Copy)]
pub struct FuseCastIntoInitializer;

impl FuseCastIntoInitializer {
    pub const NAME: &'static str = "fuse_cast_into_initializer";

    /// Create the rule.
    pub fn new() -> Self {
        Self
    }
}

/// The destination type named by a Cast node's `to` attribute.
fn cast_target(node: &IrNode) -> Option<DataType> {
    node.attr_int("to").ok().and_then(DataType::from_onnx_code)
}

impl PredicateBasedPass for FuseCastIntoInitializer {
    type Decline = FuseCastDecline;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn pass_type(&self) -> PassType {
        PassType::Fuse
    }

    fn efficiency(&self) -> PassEfficiency {
        PassEfficiency::Partial
    }

    fn optimization_type(&self) -> PassOptimizationType {
        PassOptimizationType::Compute
    }

    fn pattern_match_predicate(&self, graph: &IrGraph, node_id: IrNodeId) -> bool {
        let Ok(node) = graph.node(node_id) else {
            return false;
        };
        if node.op_type() != "Cast" {
            return false;
        }

        let &[input] = node.inputs() else {
            return false;
        };
        if !graph.is_param(input) {
            trace!(node = %node.name, "cast input is computed at runtime");
            return false;
        }

        match (graph.value(input), cast_target(node)) {
            (Ok(value), Some(to)) => value.dtype != to,
            _ => false,
        }
    }

    fn run_transform(
        &self,
        graph: &mut IrGraph,
        node_id: IrNodeId,
    ) -> Result<TransformOutcome<FuseCastDecline>> {
        let node = graph.node(node_id)?;
        let (&[input], &[output]) = (node.inputs(), node.outputs()) else {
            return Err(Error::InvalidGraph(format!(
                "Cast node '{}' must have exactly one input and one output",
                node.name
            )));
        };
        let to_code = node.attr_int("to")?;
        let to = DataType::from_onnx_code(to_code).ok_or_else(|| {
            Error::Attribute(format!(
                "Cast node '{}' has unknown target type code {}",
                node.name, to_code
            ))
        })?;

        // Lookup: the cast input must name an initializer.
        let input_name = &graph.value(input)?.name;
        let Some(source) = graph.initializer(input_name) else {
            return Ok(TransformOutcome::Declined(
                FuseCastDecline::NoMatchingInitializer(input_name.clone()),
            ));
        };

        // Convert: nothing is mutated until the new buffer exists.
        let converted =
            convert::find_conversion(source.dtype, to).and_then(|kernel| kernel(&source.data));
        let Some(data) = converted else {
            return Ok(TransformOutcome::Declined(
                FuseCastDecline::UnsupportedConversion {
                    from: source.dtype,
                    to,
                },
            ));
        };
        let source_name = source.name.clone();
        let name = graph.fresh_value_name(&format!("{}_{}", source_name, to));
        let folded = TensorConstant::new(name, to, source.shape.clone(), data)?;

        // Install, then rewire; undo the install if any use cannot move.
        let folded_value = graph.add_initializer_and_input(folded)?;
        if !graph.try_replace_all_uses_with(output, folded_value)? {
            graph.discard_initializer(folded_value)?;
            let output_name = graph.value(output)?.name.clone();
            return Ok(TransformOutcome::Declined(FuseCastDecline::RewireFailure(
                output_name,
            )));
        }

        debug!(
            source = %source_name,
            folded = %graph.value(folded_value)?.name,
            to = %to,
            "fused cast into initializer"
        );

        Ok(TransformOutcome::Committed {
            destroy: NodeDestroyType::DestroyOne,
        })
    }
}
