use crate::errors::NeatError;
use crate::genomics::Activation;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;
use std::str::FromStr;

/// How a genome is wired when it is first created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialConnections {
    /// Every node is connected to every node of the next layer.
    Full,
    /// No connections; the first mutation adds one.
    None,
}

impl FromStr for InitialConnections {
    type Err = NeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(InitialConnections::Full),
            "none" => Ok(InitialConnections::None),
            _ => Err(NeatError::InvalidConfig(format!(
                "unknown initial connections {:?}",
                s
            ))),
        }
    }
}

/// Distribution new connection weights are drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// Gaussian(`weight_init_mean`, `weight_init_stdev`), clamped to the weight bounds.
    Normal,
    /// Uniform over `[weight_min_value, weight_max_value]`.
    Uniform,
    /// Always zero.
    Zero,
}

impl FromStr for WeightInit {
    type Err = NeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(WeightInit::Normal),
            "uniform" => Ok(WeightInit::Uniform),
            "zero" => Ok(WeightInit::Zero),
            _ => Err(NeatError::InvalidConfig(format!(
                "unknown weight init type {:?}",
                s
            ))),
        }
    }
}

/// Configuration data for genome generation
/// and genome-level operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub num_inputs: NonZeroUsize,
    /// Number of outputs in a genome.
    pub num_outputs: NonZeroUsize,
    /// Number of hidden layers in a new genome. Each
    /// hidden layer is seeded with `num_inputs` nodes.
    pub num_hidden_layers: usize,
    /// Activation of new nodes.
    pub activation_default: Activation,
    /// Chance, per node, that its activation is replaced
    /// by a random one during mutation.
    pub activation_mutate_rate: f64,
    /// Weight of unmatched connections in compatibility distance.
    pub compatibility_disjoint_coefficient: f64,
    /// Weight of the mean matching-weight difference in compatibility distance.
    pub compatibility_weight_coefficient: f64,
    /// Chance of an add-connection mutation.
    pub conn_add_prob: f64,
    /// Chance of a remove-connection mutation.
    pub conn_delete_prob: f64,
    /// Whether connections created by add-connection start enabled.
    pub enabled_default: bool,
    /// Chance, per connection, that its enabled flag is toggled.
    pub enabled_mutate_rate: f64,
    /// Wiring of new genomes.
    pub initial_connections: InitialConnections,
    /// Chance of an add-node mutation.
    pub node_add_prob: f64,
    /// Chance of a remove-node mutation.
    pub node_delete_prob: f64,
    pub weight_init_mean: f64,
    pub weight_init_stdev: f64,
    pub weight_init_type: WeightInit,
    pub weight_max_value: f64,
    pub weight_min_value: f64,
    /// Chance, per connection, that its weight is perturbed.
    pub weight_mutate_rate: f64,
    /// Chance, per connection, that its weight is redrawn.
    pub weight_replace_rate: f64,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All numeric values are 0, or in the case of
    /// `NonZeroUsize`s, 1. Nodes default to [`Sigmoid`],
    /// genomes start fully connected with enabled
    /// connections, and weights start at zero.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// [`Sigmoid`]: crate::genomics::Activation
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::GeneticConfig;
    ///
    /// let cfg = GeneticConfig {
    ///     // Specify some values here...
    ///     conn_add_prob: 0.5,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            num_inputs: NonZeroUsize::MIN,
            num_outputs: NonZeroUsize::MIN,
            num_hidden_layers: 0,
            activation_default: Activation::Sigmoid,
            activation_mutate_rate: 0.0,
            compatibility_disjoint_coefficient: 0.0,
            compatibility_weight_coefficient: 0.0,
            conn_add_prob: 0.0,
            conn_delete_prob: 0.0,
            enabled_default: true,
            enabled_mutate_rate: 0.0,
            initial_connections: InitialConnections::Full,
            node_add_prob: 0.0,
            node_delete_prob: 0.0,
            weight_init_mean: 0.0,
            weight_init_stdev: 0.0,
            weight_init_type: WeightInit::Zero,
            weight_max_value: 0.0,
            weight_min_value: 0.0,
            weight_mutate_rate: 0.0,
            weight_replace_rate: 0.0,
        }
    }

    /// Clamps `weight` to `[weight_min_value, weight_max_value]`.
    pub(crate) fn clamp_weight(&self, weight: f64) -> f64 {
        weight.max(self.weight_min_value).min(self.weight_max_value)
    }
}
