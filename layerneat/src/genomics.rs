//! Genomes are the focus of evolution in NEAT.
//! They are a collection of connection genes and nodes, arranged
//! in layers, that double as their own phenotype: a genome can be
//! fed forward directly. Genomes can be progressively mutated,
//! thus adding complexity and functionality.

mod activations;
mod config;
mod errors;
mod genes;
mod history;
mod nodes;

pub use activations::Activation;
pub use config::{GeneticConfig, InitialConnections, WeightInit};
pub use errors::{GeneValidityError, MutationError};
pub use genes::ConnectionGene;
pub use history::{InnovationLedger, LedgerEntry};
pub use nodes::Node;

use crate::errors::{NeatError, Result};
use crate::rng::NeatRng;
use crate::{Innovation, NodeId};

use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, HashSet};
use std::convert::TryFrom;
use std::fmt;
use std::fs;
use std::path::Path;

/// Length of the random tag identifying each genome.
const GENOME_TAG_LEN: usize = 8;
/// Random node pairs tried by add-connection before
/// falling back to enumerating every viable pair.
const MAX_PAIR_SAMPLES: usize = 64;
/// Chance that crossover takes a matching gene from the less fit parent.
const MATCHING_GENE_SWAP_CHANCE: f64 = 0.5;
/// Chance that a matching gene disabled in either parent
/// stays disabled in the child.
const INHERITED_DISABLE_CHANCE: f64 = 0.75;
/// Species size above which unmatched genes start being normalized.
const DISTANCE_NORMALIZATION_OFFSET: usize = 20;
/// Weight term of the distance between genomes without matching genes.
const NO_MATCH_WEIGHT_TERM: f64 = 100.0;

/// A mutable, layered collection of connection genes and nodes.
///
/// Nodes `0..inputs` are the inputs and lie on layer 0; nodes
/// `inputs..inputs + outputs` are the outputs and lie on the last
/// layer. Every connection points from a lower to a strictly higher
/// layer, so a genome can always be evaluated in layer order.
///
/// Suports Serde for convenient genome saving and loading.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "GenomeRecord", into = "GenomeRecord")]
pub struct Genome {
    id: String,
    inputs: usize,
    outputs: usize,
    layers: usize,
    next_node_id: NodeId,
    pub(crate) fitness: f64,
    nodes: BTreeMap<NodeId, Node>,
    connections: BTreeMap<Innovation, ConnectionGene>,
    eval_order: Vec<NodeId>,
}

impl Genome {
    /// Create a new, unconnected genome with the specified configuration.
    ///
    /// The genome has `2 + num_hidden_layers` layers. Each hidden layer
    /// is seeded with `num_inputs` nodes, numbered after the outputs.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome};
    /// use layerneat::NeatRng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     num_inputs: NonZeroUsize::new(3).unwrap(),
    ///     num_outputs: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = Genome::new(&config, &mut NeatRng::seeded(0));
    ///
    /// assert_eq!(genome.nodes().count(), 3 + 2);
    /// assert_eq!(genome.layers(), 2);
    /// assert_eq!(genome.connections().count(), 0);
    /// ```
    pub fn new(config: &GeneticConfig, rng: &mut NeatRng) -> Genome {
        let inputs = config.num_inputs.get();
        let outputs = config.num_outputs.get();
        let layers = 2 + config.num_hidden_layers;

        let mut nodes = BTreeMap::new();
        for id in 0..inputs {
            nodes.insert(id, Node::new(id, 0, config.activation_default));
        }
        for id in inputs..inputs + outputs {
            nodes.insert(id, Node::new(id, layers - 1, config.activation_default));
        }
        let mut next_node_id = inputs + outputs;
        for layer in 1..layers - 1 {
            for _ in 0..inputs {
                nodes.insert(
                    next_node_id,
                    Node::new(next_node_id, layer, config.activation_default),
                );
                next_node_id += 1;
            }
        }

        let mut genome = Genome {
            id: rng.tag(GENOME_TAG_LEN),
            inputs,
            outputs,
            layers,
            next_node_id,
            fitness: 0.0,
            nodes,
            connections: BTreeMap::new(),
            eval_order: Vec::new(),
        };
        genome.rebuild_eval_order();
        genome
    }

    /// Create a new genome and wire it as dictated by
    /// [`initial_connections`].
    ///
    /// [`initial_connections`]: GeneticConfig::initial_connections
    pub fn initial(
        config: &GeneticConfig,
        ledger: &mut InnovationLedger,
        rng: &mut NeatRng,
    ) -> Genome {
        let mut genome = Genome::new(config, rng);
        if config.initial_connections == InitialConnections::Full {
            genome.fully_connect(config, ledger, rng);
        }
        genome
    }

    /// Connects every node of each non-final layer to every node
    /// of the next layer, skipping pairs that are already connected.
    /// New connections are enabled and get freshly sampled weights.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome, InnovationLedger};
    /// use layerneat::NeatRng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     num_inputs: NonZeroUsize::new(3).unwrap(),
    ///     num_outputs: NonZeroUsize::new(2).unwrap(),
    ///     num_hidden_layers: 1,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = NeatRng::seeded(0);
    /// let mut genome = Genome::new(&config, &mut rng);
    /// genome.fully_connect(&config, &mut InnovationLedger::new(), &mut rng);
    ///
    /// // 3 inputs -> 3 hidden -> 2 outputs.
    /// assert_eq!(genome.connections().count(), 3 * 3 + 3 * 2);
    /// ```
    pub fn fully_connect(
        &mut self,
        config: &GeneticConfig,
        ledger: &mut InnovationLedger,
        rng: &mut NeatRng,
    ) {
        let by_layer = self.nodes_by_layer();
        let existing = self.connected_pairs();
        for pair in by_layer.windows(2) {
            for &from in &pair[0] {
                for &to in &pair[1] {
                    if existing.contains(&(from, to)) {
                        continue;
                    }
                    let innovation = ledger.innovation_for(from, to);
                    let weight = ConnectionGene::initial_weight(config, rng);
                    self.insert_unchecked(ConnectionGene::new(innovation, from, to, weight));
                }
            }
        }
        self.rebuild_eval_order();
    }

    /// Returns a clone of the genome with a new id and zero fitness,
    /// to be used as offspring.
    pub(crate) fn offspring(&self, rng: &mut NeatRng) -> Genome {
        let mut child = self.clone();
        child.id = rng.tag(GENOME_TAG_LEN);
        child.fitness = 0.0;
        child
    }

    /// Adds a hidden node with a fresh id on the specified layer.
    /// Returns the new node's id.
    ///
    /// # Errors
    /// Fails if `layer` is the input or output layer, or does not exist.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{Activation, GeneticConfig, Genome};
    /// use layerneat::NeatRng;
    ///
    /// let config = GeneticConfig {
    ///     num_hidden_layers: 1,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut genome = Genome::new(&config, &mut NeatRng::seeded(0));
    ///
    /// let id = genome.add_hidden_node(1, Activation::Relu).unwrap();
    /// assert_eq!(genome.node(id).unwrap().layer(), 1);
    ///
    /// assert!(genome.add_hidden_node(0, Activation::Relu).is_err());
    /// assert!(genome.add_hidden_node(2, Activation::Relu).is_err());
    /// ```
    pub fn add_hidden_node(
        &mut self,
        layer: usize,
        activation: Activation,
    ) -> std::result::Result<NodeId, GeneValidityError> {
        if layer == 0 || layer + 1 >= self.layers {
            return Err(GeneValidityError::NotHiddenLayer(layer));
        }
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes.insert(id, Node::new(id, layer, activation));
        self.rebuild_eval_order();
        Ok(id)
    }

    /// Adds an enabled `from -> to` connection with the specified weight,
    /// taking its innovation number from the ledger.
    /// Returns the connection's innovation number.
    ///
    /// # Errors
    /// Fails if either endpoint is missing, the connection would be a
    /// self-loop or not point to a higher layer, or the endpoints are
    /// already connected in either direction.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome, InnovationLedger};
    /// use layerneat::NeatRng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     num_inputs: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut ledger = InnovationLedger::new();
    /// let mut genome = Genome::new(&config, &mut NeatRng::seeded(0));
    ///
    /// let innovation = genome.connect(0, 2, 0.5, &mut ledger).unwrap();
    /// assert_eq!(genome.connection(innovation).unwrap().weight(), 0.5);
    ///
    /// // Outputs cannot feed inputs.
    /// assert!(genome.connect(2, 1, 0.5, &mut ledger).is_err());
    /// // Nor can an edge be duplicated.
    /// assert!(genome.connect(0, 2, 0.1, &mut ledger).is_err());
    /// ```
    pub fn connect(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
        ledger: &mut InnovationLedger,
    ) -> std::result::Result<Innovation, GeneValidityError> {
        self.check_endpoints(from, to)?;
        let innovation = ledger.innovation_for(from, to);
        if self.connections.contains_key(&innovation) {
            return Err(GeneValidityError::DuplicateInnovation(innovation));
        }
        self.insert_unchecked(ConnectionGene::new(innovation, from, to, weight));
        Ok(innovation)
    }

    /// Sets the weight of the connection with the given innovation number.
    /// Returns `false` if the genome has no such connection.
    pub fn set_weight(&mut self, innovation: Innovation, weight: f64) -> bool {
        match self.connections.get_mut(&innovation) {
            Some(connection) => {
                connection.set_weight(weight);
                true
            }
            None => false,
        }
    }

    fn check_endpoints(
        &self,
        from: NodeId,
        to: NodeId,
    ) -> std::result::Result<(), GeneValidityError> {
        let (from_node, to_node) = match (self.nodes.get(&from), self.nodes.get(&to)) {
            (Some(f), Some(t)) => (f, t),
            _ => return Err(GeneValidityError::NonexistantEndpoints(from, to)),
        };
        if from == to {
            return Err(GeneValidityError::SelfLoop(from));
        }
        if from_node.layer() >= to_node.layer() {
            return Err(GeneValidityError::NotFeedForward(from, to));
        }
        if self
            .connections
            .values()
            .any(|c| c.endpoints() == (from, to) || c.endpoints() == (to, from))
        {
            return Err(GeneValidityError::DuplicateEndpoints(from, to));
        }
        Ok(())
    }

    fn insert_unchecked(&mut self, connection: ConnectionGene) {
        debug_assert!(!self.connections.contains_key(&connection.innovation()));
        if let Some(node) = self.nodes.get_mut(&connection.from()) {
            node.outgoing.push(connection.innovation());
        }
        self.connections.insert(connection.innovation(), connection);
    }

    fn remove_connection(&mut self, innovation: Innovation) -> Option<ConnectionGene> {
        let connection = self.connections.remove(&innovation)?;
        if let Some(node) = self.nodes.get_mut(&connection.from()) {
            node.outgoing.retain(|i| *i != innovation);
        }
        Some(connection)
    }

    /// Evaluates the network on `inputs`, returning one value per output node.
    ///
    /// Input values are copied into the input nodes, every node is then
    /// activated and propagated in layer order, and the outputs are read
    /// back. Accumulators are cleared afterwards, so repeated calls with
    /// the same input give the same result.
    ///
    /// # Errors
    /// Returns [`NeatError::ShapeMismatch`] if `inputs` does not have
    /// exactly one value per input node.
    ///
    /// # Panics
    /// Panics if a node produces NaN, which finite inputs never cause.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome};
    /// use layerneat::NeatRng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     num_inputs: NonZeroUsize::new(2).unwrap(),
    ///     num_outputs: NonZeroUsize::new(3).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut genome = Genome::new(&config, &mut NeatRng::seeded(0));
    ///
    /// // Unconnected sigmoid outputs sit at sigmoid(0).
    /// assert_eq!(genome.feed_forward(&[1.0, -1.0]).unwrap(), vec![0.5; 3]);
    /// assert!(genome.feed_forward(&[1.0]).is_err());
    /// ```
    pub fn feed_forward(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.inputs {
            return Err(NeatError::ShapeMismatch {
                expected: self.inputs,
                actual: inputs.len(),
            });
        }

        for (id, value) in inputs.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.output_value = *value;
            }
        }

        let mut signals = Vec::new();
        for id in &self.eval_order {
            let node = match self.nodes.get_mut(id) {
                Some(node) => node,
                None => continue,
            };
            node.activate();
            if node.output_value.is_nan() {
                log::error!("genome {}: node {} produced NaN", self.id, id);
                panic!("NaN produced by node {} of genome {}", id, self.id);
            }
            signals.extend(node.propagate(&self.connections));
            for (target, signal) in signals.drain(..) {
                if let Some(target) = self.nodes.get_mut(&target) {
                    target.input_sum += signal;
                }
            }
        }

        let outputs = (self.inputs..self.inputs + self.outputs)
            .map(|id| self.nodes.get(&id).map_or(0.0, Node::output))
            .collect();

        for node in self.nodes.values_mut() {
            node.reset();
        }

        Ok(outputs)
    }

    /// Applies every mutation operator, each gated by its configured
    /// probability: activation mutation, connection weight/enabled
    /// mutation, then add-connection, remove-connection, add-node and
    /// remove-node, in that order. A genome without connections
    /// first gets one added.
    ///
    /// Structural operators that cannot apply are skipped.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome, InnovationLedger};
    /// use layerneat::NeatRng;
    ///
    /// let config = GeneticConfig {
    ///     node_add_prob: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut ledger = InnovationLedger::new();
    /// let mut rng = NeatRng::seeded(3);
    /// let mut genome = Genome::initial(&config, &mut ledger, &mut rng);
    ///
    /// genome.mutate(&config, &mut ledger, &mut rng);
    /// assert_eq!(genome.nodes().count(), 3);
    /// ```
    pub fn mutate(
        &mut self,
        config: &GeneticConfig,
        ledger: &mut InnovationLedger,
        rng: &mut NeatRng,
    ) {
        if self.connections.is_empty() {
            if let Err(e) = self.mutate_add_connection(config, ledger, rng) {
                log::trace!("genome {}: {}", self.id, e);
            }
        }

        self.mutate_activations(config, rng);
        self.mutate_weights(config, rng);

        if rng.chance(config.conn_add_prob) {
            if let Err(e) = self.mutate_add_connection(config, ledger, rng) {
                log::trace!("genome {}: {}", self.id, e);
            }
        }
        if rng.chance(config.conn_delete_prob) {
            self.mutate_remove_connection(rng);
        }
        if rng.chance(config.node_add_prob) {
            if let Err(e) = self.mutate_add_node(config, ledger, rng) {
                log::trace!("genome {}: {}", self.id, e);
            }
        }
        if rng.chance(config.node_delete_prob) {
            if let Err(e) = self.mutate_remove_node(rng) {
                log::trace!("genome {}: {}", self.id, e);
            }
        }
    }

    /// Replaces the activation of each non-input node by a random one,
    /// with probability [`activation_mutate_rate`] per node.
    ///
    /// [`activation_mutate_rate`]: GeneticConfig::activation_mutate_rate
    pub fn mutate_activations(&mut self, config: &GeneticConfig, rng: &mut NeatRng) {
        for node in self.nodes.values_mut().filter(|n| n.layer() > 0) {
            if rng.chance(config.activation_mutate_rate) {
                node.set_activation(Activation::ALL[rng.below(Activation::ALL.len())]);
            }
        }
    }

    /// Mutates every connection's weight and enabled flag.
    /// See [`ConnectionGene::mutate`].
    pub fn mutate_weights(&mut self, config: &GeneticConfig, rng: &mut NeatRng) {
        for connection in self.connections.values_mut() {
            connection.mutate(config, rng);
        }
    }

    /// Adds a connection between two randomly chosen unconnected
    /// nodes on different layers, oriented towards the higher layer.
    /// Returns the new connection's innovation number.
    ///
    /// # Errors
    /// Fails if the genome already has as many connections as there
    /// are adjacent-layer node pairs, or no unconnected pair exists.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome, InnovationLedger, MutationError};
    /// use layerneat::NeatRng;
    ///
    /// let config = GeneticConfig::zero();
    /// let mut ledger = InnovationLedger::new();
    /// let mut rng = NeatRng::seeded(0);
    /// let mut genome = Genome::new(&config, &mut rng);
    ///
    /// let innovation = genome.mutate_add_connection(&config, &mut ledger, &mut rng).unwrap();
    /// assert_eq!(genome.connection(innovation).unwrap().endpoints(), (0, 1));
    ///
    /// assert_eq!(
    ///     genome.mutate_add_connection(&config, &mut ledger, &mut rng),
    ///     Err(MutationError::FullyConnected),
    /// );
    /// ```
    pub fn mutate_add_connection(
        &mut self,
        config: &GeneticConfig,
        ledger: &mut InnovationLedger,
        rng: &mut NeatRng,
    ) -> std::result::Result<Innovation, MutationError> {
        let capacity: usize = self
            .nodes_by_layer()
            .windows(2)
            .map(|pair| pair[0].len() * pair[1].len())
            .sum();
        if capacity <= self.connections.len() {
            return Err(MutationError::FullyConnected);
        }

        let (from, to) = self.find_unconnected_pair(rng)?;
        let innovation = ledger.innovation_for(from, to);
        let mut connection =
            ConnectionGene::new(innovation, from, to, ConnectionGene::initial_weight(config, rng));
        connection.set_enabled(config.enabled_default);
        self.insert_unchecked(connection);
        Ok(innovation)
    }

    fn find_unconnected_pair(
        &self,
        rng: &mut NeatRng,
    ) -> std::result::Result<(NodeId, NodeId), MutationError> {
        let existing = self.connected_pairs();
        let viable = |a: &Node, b: &Node| {
            a.layer() != b.layer()
                && !existing.contains(&(a.id(), b.id()))
                && !existing.contains(&(b.id(), a.id()))
        };
        let oriented = |a: &Node, b: &Node| {
            if a.layer() < b.layer() {
                (a.id(), b.id())
            } else {
                (b.id(), a.id())
            }
        };

        let nodes: Vec<&Node> = self.nodes.values().collect();
        for _ in 0..MAX_PAIR_SAMPLES {
            let a = nodes[rng.below(nodes.len())];
            let b = nodes[rng.below(nodes.len())];
            if viable(a, b) {
                return Ok(oriented(a, b));
            }
        }

        let candidates: Vec<(NodeId, NodeId)> = nodes
            .iter()
            .flat_map(|a| nodes.iter().map(move |b| (*a, *b)))
            .filter(|(a, b)| a.layer() < b.layer() && viable(*a, *b))
            .map(|(a, b)| oriented(a, b))
            .collect();
        if candidates.is_empty() {
            Err(MutationError::NoViablePair)
        } else {
            Ok(candidates[rng.below(candidates.len())])
        }
    }

    /// Deletes a randomly chosen connection.
    ///
    /// Returns `None` if the genome has no connections,
    /// or `Some(connection)` otherwise.
    pub fn mutate_remove_connection(&mut self, rng: &mut NeatRng) -> Option<ConnectionGene> {
        let innovation = random_key(&self.connections, rng)?;
        self.remove_connection(innovation)
    }

    /// Splits a randomly chosen connection with a new node.
    ///
    /// The split connection is disabled, and replaced by a connection
    /// into the new node with weight 1 and one out of it carrying the
    /// old weight. The new node lies one layer above the split
    /// connection's source; if that is the target's layer, every layer
    /// from there up is shifted to make room.
    ///
    /// Returns the new node's id, or `None` if the genome had no
    /// connections, in which case one was added instead.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome, InnovationLedger};
    /// use layerneat::NeatRng;
    ///
    /// let config = GeneticConfig::zero();
    /// let mut ledger = InnovationLedger::new();
    /// let mut rng = NeatRng::seeded(0);
    /// let mut genome = Genome::new(&config, &mut rng);
    /// genome.connect(0, 1, 0.7, &mut ledger).unwrap();
    ///
    /// let new_node = genome.mutate_add_node(&config, &mut ledger, &mut rng).unwrap().unwrap();
    ///
    /// assert_eq!(genome.layers(), 3);
    /// assert_eq!(genome.node(new_node).unwrap().layer(), 1);
    /// assert_eq!(genome.connections().filter(|c| c.enabled()).count(), 2);
    /// ```
    pub fn mutate_add_node(
        &mut self,
        config: &GeneticConfig,
        ledger: &mut InnovationLedger,
        rng: &mut NeatRng,
    ) -> std::result::Result<Option<NodeId>, MutationError> {
        let split = match random_key(&self.connections, rng) {
            Some(split) => split,
            None => {
                self.mutate_add_connection(config, ledger, rng)?;
                self.rebuild_eval_order();
                return Ok(None);
            }
        };

        let (from, to, weight) = match self.connections.get_mut(&split) {
            Some(connection) => {
                connection.set_enabled(false);
                (connection.from(), connection.to(), connection.weight())
            }
            None => return Err(MutationError::NoConnections),
        };

        let layer = self.nodes.get(&from).map_or(0, Node::layer) + 1;
        if self.nodes.get(&to).map(Node::layer) == Some(layer) {
            for node in self.nodes.values_mut().filter(|n| n.layer() >= layer) {
                node.set_layer(node.layer() + 1);
            }
            self.layers += 1;
        }

        let id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes
            .insert(id, Node::new(id, layer, config.activation_default));

        let into = ledger.innovation_for(from, id);
        self.insert_unchecked(ConnectionGene::new(into, from, id, 1.0));
        let out_of = ledger.innovation_for(id, to);
        self.insert_unchecked(ConnectionGene::new(out_of, id, to, weight));

        self.rebuild_eval_order();
        Ok(Some(id))
    }

    /// Deletes a randomly chosen hidden node and every
    /// connection incident to it. If its layer is left
    /// empty, the layer is removed.
    ///
    /// Returns the removed node's id.
    pub fn mutate_remove_node(
        &mut self,
        rng: &mut NeatRng,
    ) -> std::result::Result<NodeId, MutationError> {
        let hidden: Vec<NodeId> = self
            .nodes
            .keys()
            .copied()
            .filter(|id| *id >= self.inputs + self.outputs)
            .collect();
        if hidden.is_empty() {
            return Err(MutationError::NoHiddenNodes);
        }
        let id = hidden[rng.below(hidden.len())];

        let incident: Vec<Innovation> = self
            .connections
            .values()
            .filter(|c| c.from() == id || c.to() == id)
            .map(ConnectionGene::innovation)
            .collect();
        for innovation in incident {
            self.remove_connection(innovation);
        }

        if let Some(node) = self.nodes.remove(&id) {
            let layer = node.layer();
            if self.nodes.values().all(|n| n.layer() != layer) {
                for node in self.nodes.values_mut().filter(|n| n.layer() > layer) {
                    node.set_layer(node.layer() - 1);
                }
                self.layers -= 1;
            }
        }

        self.rebuild_eval_order();
        Ok(id)
    }

    /// Crosses the genome with `other`, which is assumed to be
    /// the less fit parent, and returns the child.
    ///
    /// The child inherits the structure of `self`. For genes present
    /// in both parents, the weight and enabled flag come from either
    /// parent with equal chance; if either parent's copy is disabled,
    /// the child's copy is disabled with a 75% chance.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome, InnovationLedger};
    /// use layerneat::NeatRng;
    ///
    /// let config = GeneticConfig::zero();
    /// let mut ledger = InnovationLedger::new();
    /// let mut rng = NeatRng::seeded(0);
    ///
    /// let mut fitter = Genome::new(&config, &mut rng);
    /// let mut other = Genome::new(&config, &mut rng);
    /// let shared = fitter.connect(0, 1, 1.0, &mut ledger).unwrap();
    /// other.connect(0, 1, -1.0, &mut ledger).unwrap();
    ///
    /// let child = fitter.crossover(&other, &mut rng);
    /// let weight = child.connection(shared).unwrap().weight();
    /// assert!(weight == 1.0 || weight == -1.0);
    /// ```
    pub fn crossover(&self, other: &Genome, rng: &mut NeatRng) -> Genome {
        let mut child = self.offspring(rng);
        for (innovation, connection) in child.connections.iter_mut() {
            if let Some(theirs) = other.connections.get(innovation) {
                let either_disabled = !connection.enabled() || !theirs.enabled();
                if rng.chance(MATCHING_GENE_SWAP_CHANCE) {
                    connection.set_weight(theirs.weight());
                    connection.set_enabled(theirs.enabled());
                }
                if either_disabled {
                    connection.set_enabled(!rng.chance(INHERITED_DISABLE_CHANCE));
                }
            }
        }
        child
    }

    /// Returns the compatibility distance between two genomes:
    /// `c_disjoint · unmatched / N + c_weight · W`, where `unmatched`
    /// counts connections present in only one genome, `W` is the mean
    /// absolute weight difference of matching connections, and
    /// `N = max(1, member_count - 20)`.
    ///
    /// If the genomes share no connections, the weight term is 100
    /// (or 0, if neither has any connections).
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome, InnovationLedger};
    /// use layerneat::NeatRng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     num_inputs: NonZeroUsize::new(2).unwrap(),
    ///     compatibility_disjoint_coefficient: 1.0,
    ///     compatibility_weight_coefficient: 0.5,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut ledger = InnovationLedger::new();
    /// let mut rng = NeatRng::seeded(0);
    ///
    /// let mut a = Genome::new(&config, &mut rng);
    /// let mut b = Genome::new(&config, &mut rng);
    /// a.connect(0, 2, 1.0, &mut ledger).unwrap();
    /// b.connect(0, 2, -1.0, &mut ledger).unwrap();
    /// a.connect(1, 2, 1.0, &mut ledger).unwrap();
    ///
    /// // One unmatched connection, mean weight difference of 2.
    /// assert_eq!(Genome::distance(&a, &b, &config, 5), 1.0 + 0.5 * 2.0);
    /// ```
    pub fn distance(a: &Genome, b: &Genome, config: &GeneticConfig, member_count: usize) -> f64 {
        let mut matching = 0usize;
        let mut weight_difference = 0.0;
        let mut unmatched = 0usize;
        for (innovation, connection) in &a.connections {
            match b.connections.get(innovation) {
                Some(theirs) => {
                    matching += 1;
                    weight_difference += (connection.weight() - theirs.weight()).abs();
                }
                None => unmatched += 1,
            }
        }
        unmatched += b
            .connections
            .keys()
            .filter(|innovation| !a.connections.contains_key(innovation))
            .count();

        let normalizer = member_count
            .saturating_sub(DISTANCE_NORMALIZATION_OFFSET)
            .max(1) as f64;
        let weight_term = if matching > 0 {
            config.compatibility_weight_coefficient * weight_difference / matching as f64
        } else {
            NO_MATCH_WEIGHT_TERM
        };

        config.compatibility_disjoint_coefficient * unmatched as f64 / normalizer + weight_term
    }

    /// Structural and parametric equality: same input, output and
    /// layer counts, same nodes, and same connections with the same
    /// weights and enabled flags. Ids and fitness are ignored.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome, InnovationLedger};
    /// use layerneat::NeatRng;
    ///
    /// let config = GeneticConfig::zero();
    /// let mut rng = NeatRng::seeded(0);
    /// let genome = Genome::initial(&config, &mut InnovationLedger::new(), &mut rng);
    ///
    /// assert!(genome.clone().is_equal(&genome));
    /// assert!(Genome::from_json(&genome.to_json().unwrap()).unwrap().is_equal(&genome));
    /// ```
    pub fn is_equal(&self, other: &Genome) -> bool {
        self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.layers == other.layers
            && self.nodes.len() == other.nodes.len()
            && self
                .nodes
                .iter()
                .all(|(id, node)| other.nodes.get(id).map_or(false, |o| node.same_as(o)))
            && self.connections == other.connections
    }

    /// Serializes the genome to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuilds a genome from a JSON string.
    ///
    /// # Errors
    /// Returns [`NeatError::CorruptSnapshot`] if fields are missing or
    /// the genome is inconsistent (unknown node ids, misplaced input or
    /// output nodes, connections that do not point to a higher layer).
    pub fn from_json(json: &str) -> Result<Genome> {
        serde_json::from_str(json).map_err(|e| NeatError::CorruptSnapshot(e.to_string()))
    }

    /// Writes the genome to `path` as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads a genome saved with [`Genome::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Genome> {
        Genome::from_json(&fs::read_to_string(path)?)
    }

    /// Records every connection of the genome in `ledger`.
    pub(crate) fn register_innovations(&self, ledger: &mut InnovationLedger) {
        for connection in self.connections.values() {
            ledger.record(connection.from(), connection.to(), connection.innovation());
        }
    }

    fn nodes_by_layer(&self) -> Vec<Vec<NodeId>> {
        let mut by_layer = vec![Vec::new(); self.layers];
        for node in self.nodes.values() {
            if let Some(layer) = by_layer.get_mut(node.layer()) {
                layer.push(node.id());
            }
        }
        by_layer
    }

    fn connected_pairs(&self) -> HashSet<(NodeId, NodeId)> {
        self.connections.values().map(ConnectionGene::endpoints).collect()
    }

    fn rebuild_eval_order(&mut self) {
        let mut order: Vec<(usize, NodeId)> =
            self.nodes.values().map(|n| (n.layer(), n.id())).collect();
        order.sort_unstable();
        self.eval_order = order.into_iter().map(|(_, id)| id).collect();
    }

    /// Returns the genome's random identifying tag.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// Returns the number of layers, input and output layers included.
    pub fn layers(&self) -> usize {
        self.layers
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Returns an iterator over the genome's nodes, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns an iterator over the genome's connections,
    /// in innovation order.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    pub fn connection(&self, innovation: Innovation) -> Option<&ConnectionGene> {
        self.connections.get(&innovation)
    }

    /// Returns the order nodes are evaluated in during feed-forward.
    pub fn eval_order(&self) -> &[NodeId] {
        &self.eval_order
    }
}

fn random_key<K: Copy, V>(map: &BTreeMap<K, V>, rng: &mut NeatRng) -> Option<K> {
    if map.is_empty() {
        None
    } else {
        map.keys().nth(rng.below(map.len())).copied()
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connections: Vec<_> = self.connections.values().map(|c| c.to_string()).collect();
        let nodes: Vec<_> = self.nodes.values().map(|n| n.to_string()).collect();
        f.debug_struct("Genome")
            .field("Id", &self.id)
            .field("Layers", &self.layers)
            .field("Connections", &connections)
            .field("Nodes", &nodes)
            .field("Fitness", &self.fitness)
            .finish()
    }
}

/// Serialized form of a [`Genome`].
#[derive(Serialize, Deserialize)]
struct GenomeRecord {
    id: String,
    inputs: usize,
    outputs: usize,
    layers: usize,
    next_node_id: NodeId,
    #[serde(with = "crate::serde_float")]
    fitness: f64,
    nodes: Vec<Node>,
    connections: Vec<ConnectionGene>,
}

impl From<Genome> for GenomeRecord {
    fn from(genome: Genome) -> GenomeRecord {
        GenomeRecord {
            id: genome.id,
            inputs: genome.inputs,
            outputs: genome.outputs,
            layers: genome.layers,
            next_node_id: genome.next_node_id,
            fitness: genome.fitness,
            nodes: genome.nodes.into_values().collect(),
            connections: genome.connections.into_values().collect(),
        }
    }
}

impl TryFrom<GenomeRecord> for Genome {
    type Error = NeatError;

    fn try_from(record: GenomeRecord) -> Result<Genome> {
        let id = record.id;
        let corrupt = |message: String| NeatError::CorruptSnapshot(format!("genome {}: {}", id, message));

        if record.inputs == 0 || record.outputs == 0 {
            return Err(corrupt("genome needs inputs and outputs".to_string()));
        }
        if record.layers < 2 {
            return Err(corrupt(format!("{} layers", record.layers)));
        }

        let io_count = record.inputs + record.outputs;
        let last_layer = record.layers - 1;
        let mut nodes = BTreeMap::new();
        for node in record.nodes {
            let expected_layer = match node.id() {
                n if n < record.inputs => Some(0),
                n if n < io_count => Some(last_layer),
                _ => None,
            };
            let misplaced = match expected_layer {
                Some(layer) => node.layer() != layer,
                None => node.layer() == 0 || node.layer() >= last_layer,
            };
            if misplaced {
                return Err(corrupt(format!("node {} misplaced on layer {}", node.id(), node.layer())));
            }
            if nodes
                .insert(node.id(), Node::new(node.id(), node.layer(), node.activation()))
                .is_some()
            {
                return Err(corrupt(format!("duplicate node {}", node.id())));
            }
        }
        if let Some(missing) = (0..io_count).find(|id| !nodes.contains_key(id)) {
            return Err(corrupt(format!("missing input/output node {}", missing)));
        }

        let highest = nodes.keys().next_back().copied().unwrap_or(0);
        let mut genome = Genome {
            id: id.clone(),
            inputs: record.inputs,
            outputs: record.outputs,
            layers: record.layers,
            next_node_id: record.next_node_id.max(highest + 1),
            fitness: record.fitness,
            nodes,
            connections: BTreeMap::new(),
            eval_order: Vec::new(),
        };

        for connection in record.connections {
            genome
                .check_endpoints(connection.from(), connection.to())
                .map_err(|e| corrupt(e.to_string()))?;
            if genome.connections.contains_key(&connection.innovation()) {
                return Err(corrupt(
                    GeneValidityError::DuplicateInnovation(connection.innovation()).to_string(),
                ));
            }
            genome.insert_unchecked(connection);
        }

        genome.rebuild_eval_order();
        Ok(genome)
    }
}
