//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Genomes are sparse, layered, strictly feed-forward networks: every
//! connection goes from a lower layer to a higher one, and evaluation
//! visits nodes layer by layer. Structural mutations keep this invariant
//! by shifting layers when a node is inserted between adjacent layers.
//!
//! Fitness evaluation runs in parallel across genomes; everything else
//! (speciation, selection, mutation, crossover) draws from a single
//! seedable random source owned by the [`Population`], so seeded runs
//! with a deterministic evaluator are reproducible.
//!
//! The library logs through the [`log`](https://docs.rs/log) facade and
//! never installs a logger itself.
//!
//! # Example usage: Evolution of an XOR function approximator
//! ```
//! use layerneat::genomics::{GeneticConfig, Genome, WeightInit};
//! use layerneat::{Population, PopulationConfig, Result};
//! use std::num::NonZeroUsize;
//! use std::ops::ControlFlow;
//!
//! fn evaluate_xor(genome: &mut Genome, _generation: usize) -> Result<f64> {
//!     let cases = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!     let mut error = 0.0;
//!     for (input, expected) in cases.iter() {
//!         error += (genome.feed_forward(input)?[0] - expected).powi(2);
//!     }
//!     Ok(4.0 - error)
//! }
//!
//! let genetic_config = GeneticConfig {
//!     num_inputs: NonZeroUsize::new(2).unwrap(),
//!     num_outputs: NonZeroUsize::new(1).unwrap(),
//!     compatibility_disjoint_coefficient: 1.0,
//!     compatibility_weight_coefficient: 0.5,
//!     conn_add_prob: 0.5,
//!     conn_delete_prob: 0.2,
//!     node_add_prob: 0.2,
//!     node_delete_prob: 0.1,
//!     weight_init_type: WeightInit::Normal,
//!     weight_init_stdev: 1.0,
//!     weight_min_value: -30.0,
//!     weight_max_value: 30.0,
//!     weight_mutate_rate: 0.8,
//!     weight_replace_rate: 0.1,
//!     ..GeneticConfig::zero()
//! };
//!
//! let population_config = PopulationConfig {
//!     population_size: NonZeroUsize::new(150).unwrap(),
//!     fitness_threshold: 3.9,
//!     reset_on_extinction: true,
//!     max_stagnation: 20,
//!     species_elitism: 2,
//!     elitism: 2,
//!     survival_threshold: 0.2,
//!     min_species_size: 2,
//!     compatibility_threshold: 3.0,
//!     bad_species_threshold: 0.2,
//!     ..PopulationConfig::zero()
//! };
//!
//! let mut population = Population::with_seed(population_config, genetic_config, 42);
//! let champion = population
//!     .run(evaluate_xor, 20, |population, generation| {
//!         println!("generation {}: best fitness {}", generation, population.best_fitness());
//!         ControlFlow::Continue(())
//!     })
//!     .unwrap();
//!
//! if let Some(champion) = champion {
//!     println!("{}", champion.to_json().unwrap());
//! }
//! ```

mod config;
mod errors;
pub mod genomics;
pub mod populations;
mod rng;
mod serde_float;

pub use config::NeatConfig;
pub use errors::{NeatError, Result};
pub use populations::logging;
pub use populations::{Population, PopulationConfig};
pub use rng::NeatRng;

/// Identifies a structural edge (a `from -> to` pair)
/// across every genome of a process.
pub type Innovation = usize;

/// Identifies a node within a genome.
pub type NodeId = usize;
