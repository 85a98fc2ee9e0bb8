//! Intermediate representation for the optimizer graph.
//!
//! The IR is a directed graph where:
//! - **Nodes** (`IrNode`) are operators (e.g., Cast, Add, MatMul)
//! - **Values** (`IrValue`) are tensor flows between operators
//!
//! Values without a producing node are *params*: graph inputs and
//! initializers. Initializer data lives in the graph's initializer list and
//! is tied to its value by name.

use crate::types::{AttributeValue, DataType, TensorConstant, TensorShape};
use crate::{Error, Result};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::Topo;

use std::collections::HashMap;

/// Type alias for IR node identifiers (backed by petgraph NodeIndex).
pub type IrNodeId = NodeIndex;

/// Unique identifier for a value (tensor flow) in the IR graph.
///
/// This is an index into the graph's value table. Unlike node IDs (which use
/// petgraph's stable NodeIndex), value IDs are plain indices that stay valid
/// across node removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IrValueId(pub usize);

impl IrValueId {
    /// Create a new value ID.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the underlying index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What produces a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Producer {
    /// A graph input or initializer.
    Param,

    /// An operator node.
    Node(IrNodeId),
}

// ──────────────────────────────── IrGraph ────────────────────────────────

/// Intermediate representation graph.
///
/// Nodes are operators; values are stored in a side-table. petgraph edges
/// exist solely for topological ordering.
pub struct IrGraph {
    /// The graph structure (nodes only, no edge data).
    graph: StableGraph<IrNode, ()>,

    /// Value metadata side-table.
    values: Vec<IrValue>,

    /// Lookup table: value name -> value ID.
    value_by_name: HashMap<String, IrValueId>,

    /// Lookup table: value ID -> producing node ID.
    value_producer: HashMap<IrValueId, IrNodeId>,

    /// Lookup table: value ID -> consuming node IDs, one entry per use.
    value_consumers: HashMap<IrValueId, Vec<IrNodeId>>,

    /// Constant tensors, in insertion order. Names are unique.
    initializers: Vec<TensorConstant>,

    /// Graph input value IDs (initializers included).
    pub inputs: Vec<IrValueId>,

    /// Graph output value IDs.
    pub outputs: Vec<IrValueId>,
}

impl IrGraph {
    /// Create a new empty IR graph.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            values: Vec::new(),
            value_by_name: HashMap::new(),
            value_producer: HashMap::new(),
            value_consumers: HashMap::new(),
            initializers: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    // ── Node access ──

    /// Get an immutable reference to a node.
    pub fn node(&self, id: IrNodeId) -> Result<&IrNode> {
        self.graph
            .node_weight(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Node {:?} not found", id)))
    }

    /// Check whether a node is still part of the graph.
    pub fn contains_node(&self, id: IrNodeId) -> bool {
        self.graph.contains_node(id)
    }

    /// Iterate over all nodes in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = (IrNodeId, &IrNode)> {
        self.graph
            .node_indices()
            .filter_map(|id| self.graph.node_weight(id).map(|node| (id, node)))
    }

    /// Get the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    // ── Value access ──

    /// Get an immutable reference to a value.
    pub fn value(&self, id: IrValueId) -> Result<&IrValue> {
        self.values
            .get(id.index())
            .ok_or_else(|| Error::InvalidGraph(format!("Value {:?} not found", id)))
    }

    /// Look up a value by name.
    pub fn value_by_name(&self, name: &str) -> Option<IrValueId> {
        self.value_by_name.get(name).copied()
    }

    /// Get the number of values in the graph.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Get the node that produces a value, if any.
    pub fn value_producer(&self, id: IrValueId) -> Option<IrNodeId> {
        self.value_producer.get(&id).copied()
    }

    /// Describe what produces a value.
    ///
    /// Returns `None` for a dangling value (neither produced by a node nor a
    /// graph input).
    pub fn producer(&self, id: IrValueId) -> Option<Producer> {
        match self.value_producer(id) {
            Some(node_id) => Some(Producer::Node(node_id)),
            None if self.inputs.contains(&id) => Some(Producer::Param),
            None => None,
        }
    }

    /// Check if a value is a graph input or initializer.
    pub fn is_param(&self, id: IrValueId) -> bool {
        self.producer(id) == Some(Producer::Param)
    }

    /// Get the nodes that consume a value, one entry per use.
    pub fn value_consumers(&self, id: IrValueId) -> Vec<IrNodeId> {
        self.value_consumers.get(&id).cloned().unwrap_or_default()
    }

    /// Check if a value is a graph output.
    pub fn is_output(&self, id: IrValueId) -> bool {
        self.outputs.contains(&id)
    }

    // ── Initializers ──

    /// All initializers, in insertion order.
    pub fn initializers(&self) -> &[TensorConstant] {
        &self.initializers
    }

    /// Find an initializer by name.
    pub fn initializer(&self, name: &str) -> Option<&TensorConstant> {
        self.initializers.iter().find(|init| init.name == name)
    }

    /// Generate a value name not yet used in the graph.
    ///
    /// Returns `hint` itself when it is free, otherwise `hint` with the first
    /// free numeric suffix.
    pub fn fresh_value_name(&self, hint: &str) -> String {
        if !self.value_by_name.contains_key(hint) {
            return hint.to_string();
        }

        (1..)
            .map(|n| format!("{}_{}", hint, n))
            .find(|name| !self.value_by_name.contains_key(name))
            .unwrap_or_default()
    }

    // ── Graph mutation ──

    /// Add a value to the graph and return its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if a value with the same name already exists.
    pub fn add_value(&mut self, value: IrValue) -> Result<IrValueId> {
        if self.value_by_name.contains_key(&value.name) {
            return Err(Error::InvalidGraph(format!(
                "Value '{}' already exists",
                value.name
            )));
        }

        let id = IrValueId::new(self.values.len());
        self.value_by_name.insert(value.name.clone(), id);
        self.values.push(value);
        Ok(id)
    }

    /// Add a runtime graph input (a param without constant data).
    pub fn add_graph_input(&mut self, value: IrValue) -> Result<IrValueId> {
        let id = self.add_value(value)?;
        self.inputs.push(id);
        Ok(id)
    }

    /// Register a constant as an initializer and graph input.
    ///
    /// The returned value carries the constant's name, element type and
    /// shape, and is produced by [`Producer::Param`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken.
    pub fn add_initializer_and_input(&mut self, tensor: TensorConstant) -> Result<IrValueId> {
        let value = IrValue::new(
            tensor.name.clone(),
            tensor.dtype,
            TensorShape::Static(tensor.shape.clone()),
        );
        let id = self.add_graph_input(value)?;
        self.initializers.push(tensor);
        Ok(id)
    }

    /// Undo [`add_initializer_and_input`](Self::add_initializer_and_input)
    /// for a value that nothing consumes.
    ///
    /// Removes the initializer, the graph input entry and the name binding.
    /// The value slot itself is released when it is the most recently added
    /// value, otherwise it is left orphaned.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an initializer or still has
    /// consumers or is a graph output.
    pub fn discard_initializer(&mut self, id: IrValueId) -> Result<TensorConstant> {
        let name = self.value(id)?.name.clone();

        if !self.value_consumers(id).is_empty() || self.is_output(id) {
            return Err(Error::InvalidGraph(format!(
                "Cannot discard initializer '{}' while it is in use",
                name
            )));
        }

        let position = self
            .initializers
            .iter()
            .position(|init| init.name == name)
            .ok_or_else(|| Error::InvalidGraph(format!("'{}' is not an initializer", name)))?;

        let tensor = self.initializers.remove(position);
        self.inputs.retain(|&input| input != id);
        self.value_consumers.remove(&id);
        self.value_by_name.remove(&name);

        if id.index() + 1 == self.values.len() {
            self.values.pop();
        }

        Ok(tensor)
    }

    /// Add a new node to the graph and return its ID.
    ///
    /// This also updates the producer/consumer lookup tables and
    /// adds petgraph edges for topological ordering.
    ///
    /// # Errors
    ///
    /// Returns an error if the node references an unknown value or an output
    /// that already has a producer or is a graph input.
    pub fn add_node(&mut self, mut node: IrNode) -> Result<IrNodeId> {
        for &id in node.inputs.iter().chain(&node.outputs) {
            self.value(id)?;
        }
        for &output_id in &node.outputs {
            if self.value_producer.contains_key(&output_id) || self.inputs.contains(&output_id) {
                return Err(Error::InvalidGraph(format!(
                    "Value '{}' already has a producer",
                    self.value(output_id)?.name
                )));
            }
        }

        let node_id = self.graph.add_node(IrNode::new(String::new()));
        node.node_index = node_id;

        // Register producer/consumer relationships
        for &output_id in &node.outputs {
            self.value_producer.insert(output_id, node_id);
        }

        for &input_id in &node.inputs {
            self.value_consumers
                .entry(input_id)
                .or_default()
                .push(node_id);

            // Add petgraph edge for topological ordering
            if let Some(&producer_id) = self.value_producer.get(&input_id) {
                self.graph.add_edge(producer_id, node_id, ());
            }
        }

        // Consumers added before their producer still need ordering edges
        for &output_id in &node.outputs {
            for consumer_id in self.value_consumers(output_id) {
                if consumer_id != node_id {
                    self.graph.add_edge(node_id, consumer_id, ());
                }
            }
        }

        if let Some(slot) = self.graph.node_weight_mut(node_id) {
            *slot = node;
        }

        Ok(node_id)
    }

    /// Remove a node from the graph.
    ///
    /// This also removes the node from producer/consumer lookup tables. With
    /// `StableGraph`, other node indices remain valid. Values the node
    /// produced stay in the value table without a producer.
    pub fn remove_node(&mut self, id: IrNodeId) -> Result<IrNode> {
        let node = self.node(id)?.clone();

        // Remove from producer lookup
        for &output_id in &node.outputs {
            self.value_producer.remove(&output_id);
        }

        // Remove from consumer lookup
        for &input_id in &node.inputs {
            if let Some(consumers) = self.value_consumers.get_mut(&input_id) {
                consumers.retain(|&c| c != id);
            }
        }

        // Remove node from graph (automatically removes petgraph edges)
        self.graph.remove_node(id);

        Ok(node)
    }

    /// Check whether every use of `old` could be redirected to `new`.
    ///
    /// Fails when the element types differ, when both shapes are static and
    /// differ, or when `old` is a graph output and `new` is a param.
    pub fn can_replace_all_uses_with(&self, old: IrValueId, new: IrValueId) -> Result<bool> {
        let old_value = self.value(old)?;
        let new_value = self.value(new)?;

        if old_value.dtype != new_value.dtype {
            return Ok(false);
        }

        if let (Some(a), Some(b)) = (old_value.shape.as_static(), new_value.shape.as_static()) {
            if a != b {
                return Ok(false);
            }
        }

        if self.is_output(old) && self.is_param(new) {
            return Ok(false);
        }

        Ok(true)
    }

    /// Redirect every use of `old` to `new`.
    ///
    /// All checks run before any mutation, so on `Ok(false)` the graph is
    /// unchanged. On `Ok(true)` `old` has no consumers left.
    pub fn try_replace_all_uses_with(&mut self, old: IrValueId, new: IrValueId) -> Result<bool> {
        if old == new {
            return Ok(true);
        }
        if !self.can_replace_all_uses_with(old, new)? {
            return Ok(false);
        }

        let uses = self.value_consumers.remove(&old).unwrap_or_default();
        let mut rewired: Vec<IrNodeId> = Vec::new();

        for &consumer_id in &uses {
            if rewired.contains(&consumer_id) {
                continue;
            }
            rewired.push(consumer_id);

            if let Some(consumer) = self.graph.node_weight_mut(consumer_id) {
                for input in consumer.inputs.iter_mut().filter(|input| **input == old) {
                    *input = new;
                }
            }

            if let Some(old_producer) = self.value_producer(old) {
                while let Some(edge) = self.graph.find_edge(old_producer, consumer_id) {
                    self.graph.remove_edge(edge);
                }
            }
            if let Some(new_producer) = self.value_producer(new) {
                self.graph.add_edge(new_producer, consumer_id, ());
            }
        }

        self.value_consumers.entry(new).or_default().extend(uses);

        for output in self.outputs.iter_mut().filter(|output| **output == old) {
            *output = new;
        }

        Ok(true)
    }

    // ── Graph queries ──

    /// Get the topological order of nodes in the graph.
    ///
    /// Returns nodes in an order such that all inputs to a node are produced
    /// before the node itself.
    pub fn topological_order(&self) -> Vec<IrNodeId> {
        let mut topo = Topo::new(&self.graph);
        let mut order = Vec::new();

        while let Some(id) = topo.next(&self.graph) {
            if self.graph.node_weight(id).is_some() {
                order.push(id);
            }
        }

        order
    }
}

impl Default for IrGraph {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────── IrNode ─────────────────────────────────

/// A node in the IR graph: an operator that transforms tensor values.
#[derive(Debug, Clone)]
pub struct IrNode {
    /// Node name (may be empty).
    pub name: String,

    /// ONNX operator type (e.g., "Cast", "Add").
    pub op_type: String,

    /// Operator attributes (e.g., the Cast `to` code).
    pub attributes: HashMap<String, AttributeValue>,

    /// Input value IDs.
    pub inputs: Vec<IrValueId>,

    /// Output value IDs.
    pub outputs: Vec<IrValueId>,

    /// The graph node index (for efficient graph traversal).
    pub node_index: IrNodeId,
}

impl IrNode {
    /// Create a new operator node.
    pub fn new(op_type: String) -> Self {
        Self {
            name: String::new(),
            op_type,
            attributes: HashMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            node_index: NodeIndex::default(),
        }
    }

    /// Get the operator type.
    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    /// Get input value IDs.
    pub fn inputs(&self) -> &[IrValueId] {
        &self.inputs
    }

    /// Get output value IDs.
    pub fn outputs(&self) -> &[IrValueId] {
        &self.outputs
    }

    /// Add an input value.
    pub fn add_input(&mut self, value_id: IrValueId) {
        self.inputs.push(value_id);
    }

    /// Add an output value.
    pub fn add_output(&mut self, value_id: IrValueId) {
        self.outputs.push(value_id);
    }

    /// Set an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(key.into(), value);
    }

    /// Get an attribute.
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Get an integer attribute.
    ///
    /// # Errors
    ///
    /// Returns `Error::Attribute` if the attribute is missing or not an int.
    pub fn attr_int(&self, key: &str) -> Result<i64> {
        let value = self.get_attribute(key).ok_or_else(|| {
            Error::Attribute(format!("Node '{}' has no attribute '{}'", self.name, key))
        })?;

        i64::try_from(value.clone()).map_err(|e| {
            Error::Attribute(format!(
                "Attribute '{}' of node '{}': {}",
                key, self.name, e
            ))
        })
    }
}

// ──────────────────────────────── IrValue ────────────────────────────────

/// A value (tensor flow) in the IR graph.
#[derive(Debug, Clone, PartialEq)]
pub struct IrValue {
    /// Value name (unique within the graph).
    pub name: String,

    /// Element type.
    pub dtype: DataType,

    /// Shape (static or not yet inferred).
    pub shape: TensorShape,
}

impl IrValue {
    /// Create a new value.
    pub fn new(name: impl Into<String>, dtype: DataType, shape: TensorShape) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TensorData;

    fn value(name: &str, dtype: DataType, dims: &[usize]) -> IrValue {
        IrValue::new(name, dtype, TensorShape::Static(dims.to_vec()))
    }

    fn op(op_type: &str, inputs: &[IrValueId], outputs: &[IrValueId]) -> IrNode {
        let mut node = IrNode::new(op_type.to_string());
        node.inputs = inputs.to_vec();
        node.outputs = outputs.to_vec();
        node
    }

    #[test]
    fn test_create_empty_graph() {
        let graph = IrGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.value_count(), 0);
        assert!(graph.initializers().is_empty());
    }

    #[test]
    fn test_add_value_rejects_duplicate_names() {
        let mut graph = IrGraph::new();
        graph.add_value(value("x", DataType::F32, &[2])).unwrap();
        assert!(graph.add_value(value("x", DataType::F32, &[2])).is_err());
    }

    #[test]
    fn test_add_node_tracks_producers_and_consumers() {
        let mut graph = IrGraph::new();
        let input = graph.add_graph_input(value("input", DataType::F32, &[1, 2])).unwrap();
        let output = graph.add_value(value("output", DataType::F32, &[1, 2])).unwrap();

        let node_id = graph.add_node(op("Relu", &[input], &[output])).unwrap();

        assert_eq!(graph.node(node_id).unwrap().op_type(), "Relu");
        assert_eq!(graph.value_producer(output), Some(node_id));
        assert_eq!(graph.producer(output), Some(Producer::Node(node_id)));
        assert_eq!(graph.producer(input), Some(Producer::Param));
        assert_eq!(graph.value_consumers(input), vec![node_id]);
    }

    #[test]
    fn test_dangling_value_has_no_producer() {
        let mut graph = IrGraph::new();
        let v = graph.add_value(value("v", DataType::F32, &[1])).unwrap();
        assert_eq!(graph.producer(v), None);
        assert!(!graph.is_param(v));
    }

    #[test]
    fn test_add_node_rejects_second_producer() {
        let mut graph = IrGraph::new();
        let a = graph.add_graph_input(value("a", DataType::F32, &[1])).unwrap();
        let b = graph.add_value(value("b", DataType::F32, &[1])).unwrap();
        graph.add_node(op("Relu", &[a], &[b])).unwrap();
        assert!(graph.add_node(op("Neg", &[a], &[b])).is_err());
        assert!(graph.add_node(op("Neg", &[b], &[a])).is_err());
    }

    #[test]
    fn test_consumer_index_counts_each_use() {
        let mut graph = IrGraph::new();
        let x = graph.add_graph_input(value("x", DataType::F32, &[2])).unwrap();
        let y = graph.add_value(value("y", DataType::F32, &[2])).unwrap();
        let node_id = graph.add_node(op("Add", &[x, x], &[y])).unwrap();
        assert_eq!(graph.value_consumers(x), vec![node_id, node_id]);
    }

    #[test]
    fn test_remove_node() {
        let mut graph = IrGraph::new();
        let input = graph.add_graph_input(value("input", DataType::F32, &[2, 2])).unwrap();
        let output = graph.add_value(value("output", DataType::F32, &[2, 2])).unwrap();
        let node_id = graph.add_node(op("Add", &[input], &[output])).unwrap();

        let removed = graph.remove_node(node_id).unwrap();

        assert_eq!(removed.op_type, "Add");
        assert_eq!(graph.node_count(), 0);
        assert!(!graph.contains_node(node_id));
        assert_eq!(graph.value_producer(output), None);
        assert!(graph.value_consumers(input).is_empty());
    }

    #[test]
    fn test_topological_order() {
        let mut graph = IrGraph::new();
        let t0 = graph.add_graph_input(value("t0", DataType::F32, &[2])).unwrap();
        let t1 = graph.add_value(value("t1", DataType::F32, &[2])).unwrap();
        let t2 = graph.add_value(value("t2", DataType::F32, &[2])).unwrap();
        let t3 = graph.add_value(value("t3", DataType::F32, &[2])).unwrap();

        // Added out of order on purpose
        let id_c = graph.add_node(op("C", &[t2], &[t3])).unwrap();
        let id_a = graph.add_node(op("A", &[t0], &[t1])).unwrap();
        let id_b = graph.add_node(op("B", &[t1], &[t2])).unwrap();

        assert_eq!(graph.topological_order(), vec![id_a, id_b, id_c]);
    }

    #[test]
    fn test_initializer_is_param() {
        let mut graph = IrGraph::new();
        let tensor =
            TensorConstant::new("w", DataType::I64, vec![2], TensorData::I64(vec![1, 2])).unwrap();
        let id = graph.add_initializer_and_input(tensor).unwrap();

        assert!(graph.is_param(id));
        assert_eq!(graph.value(id).unwrap().dtype, DataType::I64);
        assert_eq!(graph.initializer("w").unwrap().shape, vec![2]);
        assert_eq!(graph.initializers().len(), 1);
    }

    #[test]
    fn test_fresh_value_name() {
        let mut graph = IrGraph::new();
        assert_eq!(graph.fresh_value_name("w"), "w");
        graph.add_value(value("w", DataType::F32, &[1])).unwrap();
        graph.add_value(value("w_1", DataType::F32, &[1])).unwrap();
        assert_eq!(graph.fresh_value_name("w"), "w_2");
    }

    #[test]
    fn test_discard_initializer() {
        let mut graph = IrGraph::new();
        let tensor =
            TensorConstant::new("w", DataType::F32, vec![1], TensorData::F32(vec![1.0])).unwrap();
        let id = graph.add_initializer_and_input(tensor.clone()).unwrap();

        let discarded = graph.discard_initializer(id).unwrap();

        assert_eq!(discarded, tensor);
        assert!(graph.initializers().is_empty());
        assert!(graph.inputs.is_empty());
        assert_eq!(graph.value_by_name("w"), None);
        assert_eq!(graph.value_count(), 0);
    }

    #[test]
    fn test_discard_initializer_in_use_fails() {
        let mut graph = IrGraph::new();
        let tensor =
            TensorConstant::new("w", DataType::F32, vec![1], TensorData::F32(vec![1.0])).unwrap();
        let w = graph.add_initializer_and_input(tensor).unwrap();
        let out = graph.add_value(value("out", DataType::F32, &[1])).unwrap();
        graph.add_node(op("Relu", &[w], &[out])).unwrap();

        assert!(graph.discard_initializer(w).is_err());
        assert_eq!(graph.initializers().len(), 1);
    }

    #[test]
    fn test_replace_all_uses() {
        let mut graph = IrGraph::new();
        let a = graph.add_graph_input(value("a", DataType::F32, &[2])).unwrap();
        let b = graph.add_graph_input(value("b", DataType::F32, &[2])).unwrap();
        let x = graph.add_value(value("x", DataType::F32, &[2])).unwrap();
        let z = graph.add_value(value("z", DataType::F32, &[2])).unwrap();
        let w = graph.add_value(value("w", DataType::F32, &[2])).unwrap();

        graph.add_node(op("Relu", &[a], &[x])).unwrap();
        let add = graph.add_node(op("Add", &[x, x], &[z])).unwrap();
        let neg = graph.add_node(op("Neg", &[x], &[w])).unwrap();

        assert!(graph.try_replace_all_uses_with(x, b).unwrap());

        assert!(graph.value_consumers(x).is_empty());
        assert_eq!(graph.value_consumers(b), vec![add, add, neg]);
        assert_eq!(graph.node(add).unwrap().inputs(), &[b, b]);
        assert_eq!(graph.node(neg).unwrap().inputs(), &[b]);
    }

    #[test]
    fn test_replace_refuses_type_mismatch() {
        let mut graph = IrGraph::new();
        let a = graph.add_graph_input(value("a", DataType::F32, &[2])).unwrap();
        let b = graph.add_graph_input(value("b", DataType::I32, &[2])).unwrap();
        let out = graph.add_value(value("out", DataType::F32, &[2])).unwrap();
        let node_id = graph.add_node(op("Relu", &[a], &[out])).unwrap();

        assert!(!graph.try_replace_all_uses_with(a, b).unwrap());
        assert_eq!(graph.node(node_id).unwrap().inputs(), &[a]);
        assert_eq!(graph.value_consumers(a), vec![node_id]);
    }

    #[test]
    fn test_replace_refuses_shape_mismatch() {
        let mut graph = IrGraph::new();
        let a = graph.add_graph_input(value("a", DataType::F32, &[2])).unwrap();
        let b = graph.add_graph_input(value("b", DataType::F32, &[3])).unwrap();
        let c = graph
            .add_graph_input(IrValue::new("c", DataType::F32, TensorShape::Unknown))
            .unwrap();

        assert!(!graph.can_replace_all_uses_with(a, b).unwrap());
        assert!(graph.can_replace_all_uses_with(a, c).unwrap());
    }

    #[test]
    fn test_graph_output_cannot_become_param() {
        let mut graph = IrGraph::new();
        let a = graph.add_graph_input(value("a", DataType::F32, &[2])).unwrap();
        let b = graph.add_graph_input(value("b", DataType::F32, &[2])).unwrap();
        let x = graph.add_value(value("x", DataType::F32, &[2])).unwrap();
        let y = graph.add_value(value("y", DataType::F32, &[2])).unwrap();
        graph.add_node(op("Relu", &[a], &[x])).unwrap();
        graph.add_node(op("Neg", &[a], &[y])).unwrap();
        graph.outputs.push(x);

        assert!(!graph.try_replace_all_uses_with(x, b).unwrap());
        assert_eq!(graph.outputs, vec![x]);

        // A computed value may take over the output slot
        assert!(graph.try_replace_all_uses_with(x, y).unwrap());
        assert_eq!(graph.outputs, vec![y]);
    }

    #[test]
    fn test_attr_int() {
        let mut node = IrNode::new("Cast".to_string());
        node.set_attribute("to", AttributeValue::Int(2));
        node.set_attribute("name", AttributeValue::String("x".to_string()));

        assert_eq!(node.attr_int("to").unwrap(), 2);
        assert!(matches!(node.attr_int("name"), Err(Error::Attribute(_))));
        assert!(matches!(node.attr_int("missing"), Err(Error::Attribute(_))));
    }
}
