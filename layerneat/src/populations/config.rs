use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing fractions
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of genomes in each generation.
    pub population_size: NonZeroUsize,
    /// Best fitness at which evolution stops.
    pub fitness_threshold: f64,
    /// Ignore `fitness_threshold`, and run until the
    /// generation budget is exhausted (or fitness is +inf).
    pub no_fitness_termination: bool,
    /// Refill the population with fresh genomes when
    /// every species has been removed, instead of failing.
    pub reset_on_extinction: bool,
    /// Generations without improvement after which
    /// a species is removed.
    pub max_stagnation: usize,
    /// Number of top-ranked species protected
    /// from stagnation removal.
    pub species_elitism: usize,
    /// Top n of each species copied as-is to the next
    /// generation. The species champion is always kept.
    pub elitism: usize,
    /// Top fraction of each species which survives culling.
    pub survival_threshold: f64,
    /// Minimum number of members kept by culling.
    pub min_species_size: usize,
    /// Genetic distance under which genomes are
    /// considered to belong to the same species.
    pub compatibility_threshold: f64,
    /// Fraction of the mean species fitness under
    /// which a species is removed as weak.
    pub bad_species_threshold: f64,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, false, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use layerneat::populations::PopulationConfig;
    ///
    /// let cfg = PopulationConfig {
    ///     // Specify some values here...
    ///     survival_threshold: 0.2,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            population_size: NonZeroUsize::MIN,
            fitness_threshold: 0.0,
            no_fitness_termination: false,
            reset_on_extinction: false,
            max_stagnation: 0,
            species_elitism: 0,
            elitism: 0,
            survival_threshold: 0.0,
            min_species_size: 0,
            compatibility_threshold: 0.0,
            bad_species_threshold: 0.0,
        }
    }
}
