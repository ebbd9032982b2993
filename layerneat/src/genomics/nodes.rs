use crate::genomics::{Activation, ConnectionGene};
use crate::{Innovation, NodeId};

use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Nodes are the compute units of a genome, between
/// which connections are created.
///
/// Besides its identity, a node carries the transient state
/// used during feed-forward (an input accumulator and an output
/// cache) and the innovation numbers of its outgoing connections.
/// None of the transient state is serialized.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    layer: usize,
    activation: Activation,
    #[serde(skip)]
    pub(crate) input_sum: f64,
    #[serde(skip)]
    pub(crate) output_value: f64,
    #[serde(skip)]
    pub(crate) outgoing: Vec<Innovation>,
}

impl Node {
    /// Generate a new node with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{Activation, Node};
    ///
    /// let node = Node::new(5, 1, Activation::Tanh);
    /// assert_eq!(node.layer(), 1);
    /// ```
    pub fn new(id: NodeId, layer: usize, activation: Activation) -> Node {
        Node {
            id,
            layer,
            activation,
            input_sum: 0.0,
            output_value: 0.0,
            outgoing: Vec::new(),
        }
    }

    /// Sets the output to the activated input sum.
    /// Input nodes (layer 0) keep the value they were given.
    pub fn activate(&mut self) {
        if self.layer > 0 {
            self.output_value = self.activation.apply(self.input_sum);
        }
    }

    /// Yields `(target, weight · output)` for every enabled
    /// outgoing connection.
    pub fn propagate<'a>(
        &'a self,
        connections: &'a BTreeMap<Innovation, ConnectionGene>,
    ) -> impl Iterator<Item = (NodeId, f64)> + 'a {
        self.outgoing
            .iter()
            .filter_map(move |innovation| connections.get(innovation))
            .filter(|connection| connection.enabled())
            .map(move |connection| (connection.to(), connection.weight() * self.output_value))
    }

    /// Zeroes the input accumulator. The output cache is kept,
    /// as input nodes hold their values there.
    pub fn reset(&mut self) {
        self.input_sum = 0.0;
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's layer. 0 is the input layer.
    pub fn layer(&self) -> usize {
        self.layer
    }

    pub(crate) fn set_layer(&mut self, layer: usize) {
        self.layer = layer;
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn set_activation(&mut self, activation: Activation) {
        self.activation = activation;
    }

    /// Returns the most recently computed output.
    pub fn output(&self) -> f64 {
        self.output_value
    }

    /// Returns the innovation numbers of the node's outgoing connections.
    pub fn outgoing(&self) -> &[Innovation] {
        &self.outgoing
    }

    /// Structural equality: id, layer, activation and the set
    /// of outgoing connections. Transient state is ignored.
    pub(crate) fn same_as(&self, other: &Node) -> bool {
        self.id == other.id
            && self.layer == other.layer
            && self.activation == other.activation
            && self.outgoing.iter().collect::<HashSet<_>>()
                == other.outgoing.iter().collect::<HashSet<_>>()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[L{}, {}, OUT: {:?}]",
            self.id, self.layer, self.activation, self.outgoing,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_nodes_bypass_activation() {
        let mut node = Node::new(0, 0, Activation::Sigmoid);
        node.output_value = 3.0;
        node.input_sum = -1.0;
        node.activate();
        assert_eq!(node.output(), 3.0);
    }

    #[test]
    fn propagate_skips_disabled() {
        let mut connections = BTreeMap::new();
        connections.insert(1, ConnectionGene::new(1, 0, 2, 2.0));
        let mut disabled = ConnectionGene::new(2, 0, 3, 5.0);
        disabled.set_enabled(false);
        connections.insert(2, disabled);

        let mut node = Node::new(0, 0, Activation::Linear);
        node.outgoing = vec![1, 2];
        node.output_value = 1.5;

        let signals: Vec<_> = node.propagate(&connections).collect();
        assert_eq!(signals, vec![(2, 3.0)]);
    }

    #[test]
    fn reset_keeps_output() {
        let mut node = Node::new(4, 1, Activation::Linear);
        node.input_sum = 2.0;
        node.activate();
        node.reset();
        assert_eq!(node.input_sum, 0.0);
        assert_eq!(node.output(), 2.0);
    }

    #[test]
    fn serialized_fields() {
        let mut node = Node::new(4, 2, Activation::LeakyRelu);
        node.outgoing.push(9);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json, serde_json::json!({"id": 4, "layer": 2, "activation": "leaky_relu"}));
    }
}
