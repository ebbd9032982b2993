use crate::genomics::{GeneticConfig, WeightInit};
use crate::rng::NeatRng;
use crate::{Innovation, NodeId};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Connection genes are the directed, weighted edges of a genome.
/// They are identified across genomes by their innovation number,
/// which is shared by every connection with the same endpoints.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionGene {
    innovation: Innovation,
    from: NodeId,
    to: NodeId,
    enabled: bool,
    weight: f64,
}

impl ConnectionGene {
    /// Returns a new _enabled_ connection with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(42, 3, 9, 2.0);
    /// assert!(gene.enabled());
    /// ```
    pub fn new(innovation: Innovation, from: NodeId, to: NodeId, weight: f64) -> ConnectionGene {
        ConnectionGene {
            innovation,
            from,
            to,
            enabled: true,
            weight,
        }
    }

    /// Samples a weight for a newly created connection,
    /// according to the configured [`WeightInit`].
    pub(crate) fn initial_weight(config: &GeneticConfig, rng: &mut NeatRng) -> f64 {
        match config.weight_init_type {
            WeightInit::Normal => {
                config.clamp_weight(rng.normal(config.weight_init_mean, config.weight_init_stdev))
            }
            WeightInit::Uniform => rng.uniform(config.weight_min_value, config.weight_max_value),
            WeightInit::Zero => 0.0,
        }
    }

    /// Mutates the connection's weight and enabled flag.
    ///
    /// The weight is either redrawn uniformly from the weight
    /// bounds (with probability [`weight_replace_rate`]) or, failing
    /// that, perturbed by a Gaussian sample scaled down by 50 (with
    /// probability [`weight_mutate_rate`]) and clamped to the bounds.
    /// Independently, the enabled flag is toggled with probability
    /// [`enabled_mutate_rate`].
    ///
    /// [`weight_replace_rate`]: crate::genomics::GeneticConfig::weight_replace_rate
    /// [`weight_mutate_rate`]: crate::genomics::GeneticConfig::weight_mutate_rate
    /// [`enabled_mutate_rate`]: crate::genomics::GeneticConfig::enabled_mutate_rate
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{ConnectionGene, GeneticConfig};
    /// use layerneat::NeatRng;
    ///
    /// let config = GeneticConfig {
    ///     weight_replace_rate: 1.0,
    ///     weight_min_value: -5.0,
    ///     weight_max_value: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut gene = ConnectionGene::new(42, 3, 9, 20.0);
    /// gene.mutate(&config, &mut NeatRng::seeded(0));
    ///
    /// assert!(gene.weight().abs() <= 5.0);
    /// ```
    pub fn mutate(&mut self, config: &GeneticConfig, rng: &mut NeatRng) {
        if rng.chance(config.weight_replace_rate) {
            self.weight = rng.uniform(config.weight_min_value, config.weight_max_value);
        } else if rng.chance(config.weight_mutate_rate) {
            let nudge = rng.normal(config.weight_init_mean, config.weight_init_stdev) / 50.0;
            self.weight = config.clamp_weight(self.weight + nudge);
        }
        if rng.chance(config.enabled_mutate_rate) {
            self.enabled = !self.enabled;
        }
    }

    /// Returns the connection's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the id of the node the connection leaves.
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// Returns the id of the node the connection enters.
    pub fn to(&self) -> NodeId {
        self.to
    }

    /// Returns the connection's endpoints as `(from, to)`.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.from, self.to)
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.from,
            self.to,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}
