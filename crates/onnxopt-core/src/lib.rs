//! Core intermediate representation, tensor constants and pass traits for onnxopt.
//!
//! This crate provides the foundational abstractions the optimizer passes build on:
//! - Graph-based IR (`IrGraph`, `IrNode`, `IrValue`) with initializers
//! - Constant tensors (`TensorConstant`, `TensorData`) and element types
//! - The element type conversion table used to fold casts (`convert`)
//! - Pass traits (`Pass`, `PredicateBasedPass`) and pass metadata

pub mod convert;
pub mod ir;
pub mod pass;
pub mod types;

// Re-export commonly used types
pub use ir::{IrGraph, IrNode, IrNodeId, IrValue, IrValueId, Producer};
pub use pass::{
    NodeDestroyType, Pass, PassAnalysis, PassEfficiency, PassOptimizationType, PassType,
    PredicateBasedPass, PredicatePass, TransformOutcome,
};
pub use types::{
    AttributeValue, DataType, StorageKind, TensorConstant, TensorData, TensorShape,
    checked_count_elements, count_elements,
};

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for onnxopt-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Attribute error: {0}")]
    Attribute(String),

    #[error("Invalid tensor: {0}")]
    InvalidTensor(String),

    #[error("Unsupported conversion from {from} to {to}")]
    UnsupportedConversion { from: types::DataType, to: types::DataType },

    #[error("Unknown pass: {0}")]
    UnknownPass(String),
}
