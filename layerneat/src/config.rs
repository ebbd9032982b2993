//! Loading of `key = value` configuration files.
//!
//! A configuration file holds every genome-level and population-level
//! key in a single section, one pair per line. Lines starting with `#`
//! and blank lines are ignored:
//!
//! ```text
//! # XOR experiment
//! population_size = 150
//! fitness_threshold = 3.9
//! num_inputs = 2
//! ...
//! ```

use crate::errors::{NeatError, Result};
use crate::genomics::GeneticConfig;
use crate::populations::PopulationConfig;

use ::config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Genome-level and population-level configuration,
/// as read from a configuration file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NeatConfig {
    pub genetic: GeneticConfig,
    pub population: PopulationConfig,
}

impl NeatConfig {
    /// Reads and validates the configuration file at `path`.
    ///
    /// # Errors
    /// Returns [`NeatError::InvalidConfig`] if the file cannot be read,
    /// a required key is missing, a value cannot be parsed, or the
    /// values fail [validation](NeatConfig::validate).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<NeatConfig> {
        let source = File::from(path.as_ref()).format(FileFormat::Ini);
        NeatConfig::from_source(source)
    }

    /// Parses and validates configuration text.
    ///
    /// # Examples
    /// ```
    /// use layerneat::NeatConfig;
    ///
    /// let text = "
    /// ; population
    /// population_size = 50
    /// fitness_threshold = 3.9
    /// no_fitness_termination = false
    /// reset_on_extinction = true
    /// max_stagnation = 15
    /// species_elitism = 2
    /// elitism = 1
    /// survival_threshold = 0.2
    /// min_species_size = 2
    /// compatibility_threshold = 3.0
    /// bad_species_threshold = 0.2
    ///
    /// ; genome
    /// num_inputs = 2
    /// num_outputs = 1
    /// activation_default = sigmoid
    /// activation_mutate_rate = 0.0
    /// compatibility_disjoint_coefficient = 1.0
    /// compatibility_weight_coefficient = 0.5
    /// conn_add_prob = 0.5
    /// conn_delete_prob = 0.2
    /// enabled_default = true
    /// enabled_mutate_rate = 0.01
    /// initial_connections = full
    /// node_add_prob = 0.2
    /// node_delete_prob = 0.1
    /// weight_init_mean = 0.0
    /// weight_init_stdev = 1.0
    /// weight_init_type = normal
    /// weight_max_value = 30
    /// weight_min_value = -30
    /// weight_mutate_rate = 0.8
    /// weight_replace_rate = 0.1
    /// ";
    ///
    /// let config = NeatConfig::parse(text).unwrap();
    /// assert_eq!(config.population.population_size.get(), 50);
    /// assert_eq!(config.genetic.num_hidden_layers, 0);
    /// ```
    pub fn parse(text: &str) -> Result<NeatConfig> {
        NeatConfig::from_source(File::from_str(text, FileFormat::Ini))
    }

    fn from_source<S>(source: S) -> Result<NeatConfig>
    where
        S: ::config::Source + Send + Sync + 'static,
    {
        let values = Config::builder()
            .add_source(source)
            .build()
            .and_then(|c| c.try_deserialize::<BTreeMap<String, String>>())
            .map_err(|e| NeatError::InvalidConfig(e.to_string()))?;

        let mut entries = Entries::new(values);
        let config = NeatConfig {
            genetic: GeneticConfig {
                num_inputs: entries.required("num_inputs")?,
                num_outputs: entries.required("num_outputs")?,
                num_hidden_layers: entries.optional("num_hidden_layers", 0)?,
                activation_default: entries.required("activation_default")?,
                activation_mutate_rate: entries.required("activation_mutate_rate")?,
                compatibility_disjoint_coefficient: entries
                    .required("compatibility_disjoint_coefficient")?,
                compatibility_weight_coefficient: entries
                    .required("compatibility_weight_coefficient")?,
                conn_add_prob: entries.required("conn_add_prob")?,
                conn_delete_prob: entries.required("conn_delete_prob")?,
                enabled_default: entries.flag("enabled_default")?,
                enabled_mutate_rate: entries.required("enabled_mutate_rate")?,
                initial_connections: entries.required("initial_connections")?,
                node_add_prob: entries.required("node_add_prob")?,
                node_delete_prob: entries.required("node_delete_prob")?,
                weight_init_mean: entries.required("weight_init_mean")?,
                weight_init_stdev: entries.required("weight_init_stdev")?,
                weight_init_type: entries.required("weight_init_type")?,
                weight_max_value: entries.required("weight_max_value")?,
                weight_min_value: entries.required("weight_min_value")?,
                weight_mutate_rate: entries.required("weight_mutate_rate")?,
                weight_replace_rate: entries.required("weight_replace_rate")?,
            },
            population: PopulationConfig {
                population_size: entries.required("population_size")?,
                fitness_threshold: entries.required("fitness_threshold")?,
                no_fitness_termination: entries.flag("no_fitness_termination")?,
                reset_on_extinction: entries.flag("reset_on_extinction")?,
                max_stagnation: entries.required("max_stagnation")?,
                species_elitism: entries.required("species_elitism")?,
                elitism: entries.required("elitism")?,
                survival_threshold: entries.required("survival_threshold")?,
                min_species_size: entries.required("min_species_size")?,
                compatibility_threshold: entries.required("compatibility_threshold")?,
                bad_species_threshold: entries.required("bad_species_threshold")?,
            },
        };

        for key in entries.unused() {
            log::warn!("ignoring unknown configuration key {:?}", key);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the weight bounds are ordered, that probabilities
    /// lie in [0, 1], and that the compatibility threshold is positive.
    pub fn validate(&self) -> Result<()> {
        let g = &self.genetic;
        let p = &self.population;
        if !(g.weight_min_value <= g.weight_max_value) {
            return Err(NeatError::InvalidConfig(format!(
                "weight_min_value ({}) exceeds weight_max_value ({})",
                g.weight_min_value, g.weight_max_value
            )));
        }
        if !(g.weight_init_stdev >= 0.0) {
            return Err(NeatError::InvalidConfig(format!(
                "negative weight_init_stdev ({})",
                g.weight_init_stdev
            )));
        }
        let probabilities = [
            ("activation_mutate_rate", g.activation_mutate_rate),
            ("conn_add_prob", g.conn_add_prob),
            ("conn_delete_prob", g.conn_delete_prob),
            ("enabled_mutate_rate", g.enabled_mutate_rate),
            ("node_add_prob", g.node_add_prob),
            ("node_delete_prob", g.node_delete_prob),
            ("weight_mutate_rate", g.weight_mutate_rate),
            ("weight_replace_rate", g.weight_replace_rate),
            ("survival_threshold", p.survival_threshold),
        ];
        for (key, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(NeatError::InvalidConfig(format!(
                    "{} must lie in [0, 1], got {}",
                    key, value
                )));
            }
        }
        if !(p.compatibility_threshold > 0.0) {
            return Err(NeatError::InvalidConfig(format!(
                "compatibility_threshold must be positive, got {}",
                p.compatibility_threshold
            )));
        }
        Ok(())
    }
}

/// Raw configuration values, keeping track of
/// which keys have been consumed.
struct Entries {
    values: BTreeMap<String, String>,
    used: BTreeSet<String>,
}

impl Entries {
    fn new(values: BTreeMap<String, String>) -> Entries {
        Entries {
            values,
            used: BTreeSet::new(),
        }
    }

    fn raw(&mut self, key: &str) -> Option<&str> {
        self.used.insert(key.to_string());
        self.values.get(key).map(|v| v.trim())
    }

    fn required<T>(&mut self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.raw(key) {
            Some(value) => parse_value(key, value),
            None => Err(NeatError::InvalidConfig(format!("missing key {}", key))),
        }
    }

    fn optional<T>(&mut self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.raw(key) {
            Some(value) => parse_value(key, value),
            None => Ok(default),
        }
    }

    fn flag(&mut self, key: &str) -> Result<bool> {
        let value = self
            .raw(key)
            .ok_or_else(|| NeatError::InvalidConfig(format!("missing key {}", key)))?;
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(NeatError::InvalidConfig(format!(
                "{}: expected a boolean, got {:?}",
                key, value
            ))),
        }
    }

    fn unused(&self) -> impl Iterator<Item = &String> {
        self.values.keys().filter(move |k| !self.used.contains(*k))
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| NeatError::InvalidConfig(format!("{} = {:?}: {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Activation, InitialConnections, WeightInit};

    const BASE: &str = "
population_size = 20
fitness_threshold = 10
no_fitness_termination = False
reset_on_extinction = True
max_stagnation = 5
species_elitism = 1
elitism = 2
survival_threshold = 0.3
min_species_size = 1
compatibility_threshold = 2.5
bad_species_threshold = 0.1
num_inputs = 3
num_outputs = 2
num_hidden_layers = 1
activation_default = tanh
activation_mutate_rate = 0.05
compatibility_disjoint_coefficient = 1.0
compatibility_weight_coefficient = 0.4
conn_add_prob = 0.3
conn_delete_prob = 0.1
enabled_default = true
enabled_mutate_rate = 0.01
initial_connections = none
node_add_prob = 0.1
node_delete_prob = 0.05
weight_init_mean = 0.0
weight_init_stdev = 1.0
weight_init_type = uniform
weight_max_value = 5
weight_min_value = -5
weight_mutate_rate = 0.8
weight_replace_rate = 0.1
";

    fn without(key: &str) -> String {
        BASE.lines()
            .filter(|l| !l.starts_with(&format!("{} ", key)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn replaced(key: &str, value: &str) -> String {
        format!("{}\n{} = {}\n", without(key), key, value)
    }

    #[test]
    fn parses_every_key() {
        let config = NeatConfig::parse(BASE).unwrap();
        assert_eq!(config.population.population_size.get(), 20);
        assert!(config.population.reset_on_extinction);
        assert!(!config.population.no_fitness_termination);
        assert_eq!(config.population.elitism, 2);
        assert_eq!(config.genetic.num_inputs.get(), 3);
        assert_eq!(config.genetic.num_hidden_layers, 1);
        assert_eq!(config.genetic.activation_default, Activation::Tanh);
        assert_eq!(config.genetic.initial_connections, InitialConnections::None);
        assert_eq!(config.genetic.weight_init_type, WeightInit::Uniform);
        assert_eq!(config.genetic.weight_min_value, -5.0);
    }

    #[test]
    fn comments_and_unknown_keys_are_ignored() {
        let text = format!("# a comment\n\n{}\nmystery_key = 4\n", BASE);
        assert!(NeatConfig::parse(&text).is_ok());
    }

    #[test]
    fn hidden_layers_default_to_zero() {
        let config = NeatConfig::parse(&without("num_hidden_layers")).unwrap();
        assert_eq!(config.genetic.num_hidden_layers, 0);
    }

    #[test]
    fn missing_required_key() {
        match NeatConfig::parse(&without("conn_add_prob")) {
            Err(NeatError::InvalidConfig(message)) => assert!(message.contains("conn_add_prob")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn ill_typed_values() {
        for (key, value) in [
            ("population_size", "0"),
            ("population_size", "many"),
            ("activation_default", "gaussian"),
            ("initial_connections", "partial"),
            ("weight_init_type", "xavier"),
            ("enabled_default", "maybe"),
        ] {
            assert!(
                matches!(
                    NeatConfig::parse(&replaced(key, value)),
                    Err(NeatError::InvalidConfig(_))
                ),
                "{} = {} was accepted",
                key,
                value
            );
        }
    }

    #[test]
    fn validation() {
        assert!(NeatConfig::parse(&replaced("weight_min_value", "6")).is_err());
        assert!(NeatConfig::parse(&replaced("conn_add_prob", "1.5")).is_err());
        assert!(NeatConfig::parse(&replaced("compatibility_threshold", "0")).is_err());
    }
}
