use crate::{Innovation, NodeId};

use thiserror::Error;

/// An error type indicating the connection being
/// added to a genome is invalid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneValidityError {
    /// One or both endpoints are not nodes of the genome.
    #[error("connection between nonexistant endpoint(s) {0} -> {1}")]
    NonexistantEndpoints(NodeId, NodeId),
    /// Both endpoints are the same node.
    #[error("self-loop on node {0}")]
    SelfLoop(NodeId),
    /// The source node does not lie on a lower layer than the target.
    #[error("connection {0} -> {1} does not point to a higher layer")]
    NotFeedForward(NodeId, NodeId),
    /// The endpoints are already joined, in either direction.
    #[error("connection {0} -> {1} shadows an existing connection")]
    DuplicateEndpoints(NodeId, NodeId),
    /// The innovation number is already used in the genome.
    #[error("duplicate connection insertion with innovation {0}")]
    DuplicateInnovation(Innovation),
    /// Hidden nodes can only be placed strictly between
    /// the input and output layers.
    #[error("layer {0} is not a hidden layer")]
    NotHiddenLayer(usize),
}

/// An error type indicating a structural
/// mutation could not be carried out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// Every pair of adjacent-layer nodes is already connected.
    #[error("connection mutation on fully-connected genome")]
    FullyConnected,
    /// No pair of nodes was found to connect.
    #[error("no viable node pair found for connection mutation")]
    NoViablePair,
    /// The genome has no connections to split or remove.
    #[error("mutation on genome without connections")]
    NoConnections,
    /// The genome has no hidden nodes to remove.
    #[error("node removal on genome without hidden nodes")]
    NoHiddenNodes,
}
