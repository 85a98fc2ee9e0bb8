//! Common test utilities for pass tests.
//!
//! Graph builders shared by the integration tests.

#![allow(dead_code)]

use onnxopt_core::{
    AttributeValue, DataType, IrGraph, IrNode, IrNodeId, IrValue, IrValueId, TensorConstant,
    TensorData, TensorShape,
};

/// Install a tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Handles into a `Z = Add(Cast(A, to), Y)` graph.
pub struct CastAddGraph {
    pub graph: IrGraph,
    /// Initializer feeding the cast.
    pub a: IrValueId,
    /// Cast output.
    pub x: IrValueId,
    /// Runtime input added to the cast output.
    pub y: IrValueId,
    /// Graph output.
    pub z: IrValueId,
    pub cast: IrNodeId,
    pub add: IrNodeId,
}

/// Build a `Cast` node converting `input` to `to`.
pub fn cast_node(name: &str, input: IrValueId, output: IrValueId, to: DataType) -> IrNode {
    let mut node = IrNode::new("Cast".to_string());
    node.name = name.to_string();
    node.add_input(input);
    node.add_output(output);
    node.set_attribute("to", AttributeValue::Int(to.onnx_code()));
    node
}

/// Build a binary node.
pub fn binary_node(
    op_type: &str,
    name: &str,
    lhs: IrValueId,
    rhs: IrValueId,
    output: IrValueId,
) -> IrNode {
    let mut node = IrNode::new(op_type.to_string());
    node.name = name.to_string();
    node.add_input(lhs);
    node.add_input(rhs);
    node.add_output(output);
    node
}

/// Build `A -> Cast(to) -> X`, `Z = Add(X, Y)` with `Z` as graph output.
///
/// `X`, `Y` and `Z` are declared with type `to` and `A`'s shape.
pub fn cast_then_add(source: TensorConstant, to: DataType) -> CastAddGraph {
    let shape = TensorShape::Static(source.shape.clone());
    let mut graph = IrGraph::new();

    let a = graph.add_initializer_and_input(source).unwrap();
    let x = graph
        .add_value(IrValue::new("X", to, shape.clone()))
        .unwrap();
    let y = graph
        .add_graph_input(IrValue::new("Y", to, shape.clone()))
        .unwrap();
    let z = graph.add_value(IrValue::new("Z", to, shape)).unwrap();

    let cast = graph.add_node(cast_node("cast_x", a, x, to)).unwrap();
    let add = graph.add_node(binary_node("Add", "add_z", x, y, z)).unwrap();
    graph.outputs.push(z);

    CastAddGraph {
        graph,
        a,
        x,
        y,
        z,
        cast,
        add,
    }
}

/// A valid two-element constant of any element type.
pub fn two_element_constant(name: &str, dtype: DataType) -> TensorConstant {
    let data = match dtype {
        DataType::F32 => TensorData::F32(vec![1.5, -2.5]),
        DataType::Complex64 => TensorData::F32(vec![1.0, 0.0, -1.0, 0.5]),
        DataType::Bool => TensorData::I32(vec![1, 0]),
        DataType::U8 | DataType::U16 | DataType::F16 | DataType::BF16 => {
            TensorData::I32(vec![7, 200])
        }
        DataType::I8 | DataType::I16 | DataType::I32 => TensorData::I32(vec![-7, 100]),
        DataType::String => TensorData::Strings(vec![b"a".to_vec(), b"b".to_vec()]),
        DataType::I64 => TensorData::I64(vec![-7, 300]),
        DataType::F64 => TensorData::F64(vec![2.75, -0.25]),
        DataType::Complex128 => TensorData::F64(vec![1.0, 0.0, -1.0, 0.5]),
        DataType::U32 | DataType::U64 => TensorData::U64(vec![7, 300]),
    };
    TensorConstant::new(name, dtype, vec![2], data).unwrap()
}
