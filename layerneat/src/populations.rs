//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
mod config;
pub mod logging;
mod offspring_factory;
mod species;

pub use config::PopulationConfig;
use offspring_factory::OffspringFactory;
pub use species::{Species, SpeciesID};

use crate::errors::{NeatError, Result};
use crate::genomics::{GeneticConfig, Genome, InnovationLedger, LedgerEntry};
use crate::rng::NeatRng;
use crate::NeatConfig;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::fs;
use std::iter;
use std::ops::ControlFlow;
use std::path::Path;

/// A population of genomes.
#[derive(Clone, Debug)]
pub struct Population {
    genomes: Vec<Genome>,
    species: Vec<Species>,
    ledger: InnovationLedger,
    best_genome: Option<Genome>,
    best_fitness: f64,
    average_fitness: f64,
    generation: usize,
    last_fitnesses: Vec<f64>,
    rng: NeatRng,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
}

impl Population {
    /// Creates a new population using the passed configurations.
    /// Randomness is seeded from the OS; see [`Population::with_seed`]
    /// for reproducible runs.
    ///
    /// The initial genomes are wired as dictated by
    /// [`initial_connections`], and no species exist
    /// until the first call to [`evolve`].
    ///
    /// [`initial_connections`]: GeneticConfig::initial_connections
    /// [`evolve`]: Population::evolve
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::GeneticConfig;
    /// use layerneat::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let pop_config = PopulationConfig {
    ///     population_size: NonZeroUsize::new(30).unwrap(),
    ///     // Set desired configuration
    ///     ..PopulationConfig::zero()
    /// };
    ///
    /// let population = Population::new(pop_config, GeneticConfig::zero());
    /// assert_eq!(population.genomes().count(), 30);
    /// assert_eq!(population.species().count(), 0);
    /// ```
    pub fn new(population_config: PopulationConfig, genetic_config: GeneticConfig) -> Population {
        Population::with_rng(population_config, genetic_config, NeatRng::from_entropy())
    }

    /// Creates a new population whose random draws
    /// all derive from `seed`.
    pub fn with_seed(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        seed: u64,
    ) -> Population {
        Population::with_rng(population_config, genetic_config, NeatRng::seeded(seed))
    }

    /// Creates a new population from a loaded [`NeatConfig`].
    pub fn from_config(config: NeatConfig) -> Population {
        Population::new(config.population, config.genetic)
    }

    fn with_rng(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        mut rng: NeatRng,
    ) -> Population {
        let mut ledger = InnovationLedger::new();
        let genomes = fresh_genomes(&population_config, &genetic_config, &mut ledger, &mut rng);
        Population {
            genomes,
            species: vec![],
            ledger,
            best_genome: None,
            best_fitness: f64::NEG_INFINITY,
            average_fitness: 0.0,
            generation: 0,
            last_fitnesses: vec![],
            rng,
            population_config,
            genetic_config,
        }
    }

    /// Replaces the population's random number generator
    /// with one seeded from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = NeatRng::seeded(seed);
    }

    /// Evaluates the fitness of each genome in the population,
    /// in parallel. The evaluator receives the genome and the
    /// current generation index, and returns the genome's fitness.
    ///
    /// Genomes whose evaluation fails keep their previous fitness.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::GeneticConfig;
    /// use layerneat::{Population, PopulationConfig};
    ///
    /// let mut population = Population::with_seed(PopulationConfig::zero(), GeneticConfig::zero(), 0);
    /// population.evaluate_fitness(|genome, _| {
    ///     let output = genome.feed_forward(&[1.0])?;
    ///     Ok(output[0])
    /// });
    ///
    /// // Sigmoid of a zero-weighted sum.
    /// assert!(population.genomes().all(|g| g.fitness() == 0.5));
    /// ```
    pub fn evaluate_fitness<E>(&mut self, evaluator: E)
    where
        E: Fn(&mut Genome, usize) -> Result<f64> + Sync,
    {
        let generation = self.generation;
        self.genomes
            .par_iter_mut()
            .for_each(|genome| match evaluator(genome, generation) {
                Ok(fitness) => genome.fitness = fitness,
                Err(e) => log::warn!("evaluation of genome {} failed: {}", genome.id(), e),
            });
    }

    /// Evolves the population by one generation: genomes are
    /// sorted into species, species are culled and have their
    /// fitness shared, stagnant and weak species are removed,
    /// and the survivors produce the next generation.
    ///
    /// If every species is removed, the population is refilled
    /// with new genomes when [`reset_on_extinction`] is set.
    ///
    /// # Errors
    /// Returns [`NeatError::EmptyPopulation`] if no species
    /// survive and [`reset_on_extinction`] is not set.
    ///
    /// # Panics
    /// Panics if any genome's fitness is NaN.
    ///
    /// [`reset_on_extinction`]: PopulationConfig::reset_on_extinction
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::GeneticConfig;
    /// use layerneat::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let population_config = PopulationConfig {
    ///     population_size: NonZeroUsize::new(20).unwrap(),
    ///     compatibility_threshold: 3.0,
    ///     max_stagnation: 15,
    ///     survival_threshold: 0.2,
    ///     ..PopulationConfig::zero()
    /// };
    /// let mut population = Population::with_seed(population_config, GeneticConfig::zero(), 7);
    ///
    /// population.evaluate_fitness(|_, _| Ok(1.0));
    /// population.evolve().unwrap();
    ///
    /// assert_eq!(population.generation(), 1);
    /// assert_eq!(population.genomes().count(), 20);
    /// assert_eq!(population.best_fitness(), 1.0);
    /// ```
    pub fn evolve(&mut self) -> Result<()> {
        self.last_fitnesses = self.genomes.iter().map(Genome::fitness).collect();

        self.speciate();
        for species in &mut self.species {
            species.update_champion();
            species.cull(&self.population_config);
            species.share_fitness();
        }
        self.update_best();
        self.average_fitness = mean(self.species.iter().map(Species::average_fitness));

        self.species
            .sort_by(|a, b| b.best_fitness().total_cmp(&a.best_fitness()));
        let stagnant = self.remove_stagnant_species();
        let weak = self.remove_weak_species();

        log::debug!(
            "generation {}: {} species ({} stagnant, {} weak removed), best fitness {}, average fitness {}",
            self.generation,
            self.species.len(),
            stagnant,
            weak,
            self.best_fitness,
            self.average_fitness,
        );

        if self.species.is_empty() {
            if !self.population_config.reset_on_extinction {
                return Err(NeatError::EmptyPopulation);
            }
            log::warn!(
                "all species went extinct in generation {}, resetting population",
                self.generation
            );
            self.genomes = fresh_genomes(
                &self.population_config,
                &self.genetic_config,
                &mut self.ledger,
                &mut self.rng,
            );
        } else {
            self.genomes = OffspringFactory::new(
                &self.species,
                &mut self.ledger,
                &self.genetic_config,
                &self.population_config,
                &mut self.rng,
            )
            .generate_offspring(self.best_genome.as_ref());
        }

        self.generation += 1;
        Ok(())
    }

    /// Evaluates and evolves the population until the best fitness
    /// reaches [`fitness_threshold`] (unless [`no_fitness_termination`]
    /// is set), a genome reaches infinite fitness, `on_generation`
    /// breaks, or `max_generations` generations have passed.
    ///
    /// `on_generation` is called after each generation is evolved,
    /// with the index of the generation that was just evaluated.
    ///
    /// Returns the best genome found, if any.
    ///
    /// [`fitness_threshold`]: PopulationConfig::fitness_threshold
    /// [`no_fitness_termination`]: PopulationConfig::no_fitness_termination
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::GeneticConfig;
    /// use layerneat::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    /// use std::ops::ControlFlow;
    ///
    /// let population_config = PopulationConfig {
    ///     population_size: NonZeroUsize::new(10).unwrap(),
    ///     compatibility_threshold: 3.0,
    ///     max_stagnation: 15,
    ///     no_fitness_termination: true,
    ///     ..PopulationConfig::zero()
    /// };
    /// let mut population = Population::with_seed(population_config, GeneticConfig::zero(), 7);
    ///
    /// let best = population
    ///     .run(|_, _| Ok(2.0), 3, |_, _| ControlFlow::Continue(()))
    ///     .unwrap();
    ///
    /// assert_eq!(best.map(|g| g.fitness()), Some(2.0));
    /// assert_eq!(population.generation(), 3);
    /// ```
    pub fn run<E, F>(
        &mut self,
        evaluator: E,
        max_generations: usize,
        mut on_generation: F,
    ) -> Result<Option<&Genome>>
    where
        E: Fn(&mut Genome, usize) -> Result<f64> + Sync,
        F: FnMut(&Population, usize) -> ControlFlow<()>,
    {
        for _ in 0..max_generations {
            let evaluated = self.generation;
            self.evaluate_fitness(&evaluator);
            self.evolve()?;
            if on_generation(&*self, evaluated).is_break() || self.should_terminate() {
                break;
            }
        }
        Ok(self.best_genome.as_ref())
    }

    fn should_terminate(&self) -> bool {
        self.best_fitness == f64::INFINITY
            || (!self.population_config.no_fitness_termination
                && self.best_fitness >= self.population_config.fitness_threshold)
    }

    /// Places each genome in the first species whose champion is
    /// within the compatibility threshold, creating new species for
    /// genomes that match none. Species left without members are removed.
    fn speciate(&mut self) {
        for species in &mut self.species {
            species.genomes.clear();
        }
        let threshold = self.population_config.compatibility_threshold;
        let mut born = 0;
        for genome in std::mem::take(&mut self.genomes) {
            let genetic_config = &self.genetic_config;
            match self
                .species
                .iter_mut()
                .find(|s| s.distance_to(&genome, genetic_config) < threshold)
            {
                Some(species) => species.add_genome(genome),
                None => {
                    self.species
                        .push(Species::new(SpeciesID(self.generation, born), genome));
                    born += 1;
                }
            }
        }
        self.species.retain(|s| !s.genomes.is_empty());
    }

    /// Records the fittest species champion as the population's
    /// best genome, if it is at least as fit as the current one.
    fn update_best(&mut self) {
        for species in &self.species {
            let champion = species.champion();
            if champion.fitness() >= self.best_fitness {
                self.best_fitness = champion.fitness();
                self.best_genome = Some(champion.clone());
            }
        }
    }

    /// Removes species which have not improved in [`max_stagnation`]
    /// generations, sparing the [`species_elitism`] best-ranked ones.
    /// Species must be ranked. Returns the number of species removed.
    ///
    /// [`max_stagnation`]: PopulationConfig::max_stagnation
    /// [`species_elitism`]: PopulationConfig::species_elitism
    fn remove_stagnant_species(&mut self) -> usize {
        let protected = self.population_config.species_elitism;
        let max_stagnation = self.population_config.max_stagnation;
        let before = self.species.len();
        let mut rank = 0;
        self.species.retain(|s| {
            let keep = rank < protected || s.stagnation() < max_stagnation;
            rank += 1;
            keep
        });
        before - self.species.len()
    }

    /// Removes species whose average fitness falls below
    /// [`bad_species_threshold`] times the mean species average.
    /// The best-ranked species is never removed. Returns the
    /// number of species removed.
    ///
    /// [`bad_species_threshold`]: PopulationConfig::bad_species_threshold
    fn remove_weak_species(&mut self) -> usize {
        let cutoff = self.population_config.bad_species_threshold
            * mean(self.species.iter().map(Species::average_fitness));
        let before = self.species.len();
        let mut rank = 0;
        self.species.retain(|s| {
            let keep = rank == 0 || s.average_fitness() >= cutoff;
            rank += 1;
            keep
        });
        before - self.species.len()
    }

    /// Serializes the population, its species and its
    /// innovation ledger to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        let record = PopulationRecord {
            generation: self.generation,
            average_fitness: self.average_fitness,
            best_fitness: self.best_fitness,
            best_genome: self.best_genome.clone(),
            species: self.species.clone(),
            genomes: self.genomes.clone(),
            innovations: self.ledger.entries().to_vec(),
        };
        Ok(serde_json::to_string(&record)?)
    }

    /// Restores a population serialized with [`Population::to_json`].
    ///
    /// The innovation ledger is rebuilt from the snapshot's ledger
    /// entries and every connection found in it, so that evolution
    /// can resume without reusing innovation numbers.
    ///
    /// # Errors
    /// Returns [`NeatError::CorruptSnapshot`] if the JSON is malformed,
    /// or if any genome does not match the configured input and output
    /// counts.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::GeneticConfig;
    /// use layerneat::{NeatConfig, Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = NeatConfig {
    ///     genetic: GeneticConfig::zero(),
    ///     population: PopulationConfig {
    ///         population_size: NonZeroUsize::new(5).unwrap(),
    ///         compatibility_threshold: 1.0,
    ///         max_stagnation: 15,
    ///         ..PopulationConfig::zero()
    ///     },
    /// };
    /// let mut population = Population::with_seed(config.population.clone(), config.genetic.clone(), 3);
    /// population.evaluate_fitness(|_, _| Ok(1.0));
    /// population.evolve().unwrap();
    ///
    /// let restored = Population::from_json(&population.to_json().unwrap(), config).unwrap();
    /// assert_eq!(restored.generation(), 1);
    /// assert_eq!(restored.genomes().count(), 5);
    /// ```
    pub fn from_json(json: &str, config: NeatConfig) -> Result<Population> {
        let record: PopulationRecord =
            serde_json::from_str(json).map_err(|e| NeatError::CorruptSnapshot(e.to_string()))?;
        let NeatConfig {
            genetic: genetic_config,
            population: population_config,
        } = config;
        let shape = (genetic_config.num_inputs.get(), genetic_config.num_outputs.get());

        let mut ledger = InnovationLedger::new();
        for entry in &record.innovations {
            ledger.record(entry.from, entry.to, entry.innovation);
        }
        let all_genomes = record
            .genomes
            .iter()
            .chain(record.best_genome.iter())
            .chain(
                record
                    .species
                    .iter()
                    .flat_map(|s| iter::once(s.champion()).chain(s.genomes())),
            );
        for genome in all_genomes {
            if (genome.inputs(), genome.outputs()) != shape {
                return Err(NeatError::CorruptSnapshot(format!(
                    "genome {} has {} inputs and {} outputs, expected {} and {}",
                    genome.id(),
                    genome.inputs(),
                    genome.outputs(),
                    shape.0,
                    shape.1,
                )));
            }
            genome.register_innovations(&mut ledger);
        }

        Ok(Population {
            genomes: record.genomes,
            species: record.species,
            ledger,
            best_genome: record.best_genome,
            best_fitness: record.best_fitness,
            average_fitness: record.average_fitness,
            generation: record.generation,
            last_fitnesses: vec![],
            rng: NeatRng::from_entropy(),
            population_config,
            genetic_config,
        })
    }

    /// Writes the population to `path` as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads a population saved with [`Population::save`].
    pub fn load<P: AsRef<Path>>(path: P, config: NeatConfig) -> Result<Population> {
        Population::from_json(&fs::read_to_string(path)?, config)
    }

    /// Returns an iterator over the population's current genomes.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genomes.iter()
    }

    /// Returns an iterator over the population's species,
    /// ranked from best to worst after each generation.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns the number of generations evolved so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the best genome ever found.
    pub fn best_genome(&self) -> Option<&Genome> {
        self.best_genome.as_ref()
    }

    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    /// Returns the mean of the species' average (shared) fitnesses
    /// in the last generation.
    pub fn average_fitness(&self) -> f64 {
        self.average_fitness
    }

    /// Returns the raw fitnesses the last evolved generation
    /// was evaluated with.
    pub fn last_fitnesses(&self) -> &[f64] {
        &self.last_fitnesses
    }

    pub fn ledger(&self) -> &InnovationLedger {
        &self.ledger
    }

    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }
}

/// Persisted form of a [`Population`].
#[derive(Serialize, Deserialize)]
struct PopulationRecord {
    generation: usize,
    #[serde(with = "crate::serde_float")]
    average_fitness: f64,
    #[serde(with = "crate::serde_float")]
    best_fitness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    best_genome: Option<Genome>,
    species: Vec<Species>,
    genomes: Vec<Genome>,
    #[serde(default)]
    innovations: Vec<LedgerEntry>,
}

fn fresh_genomes(
    population_config: &PopulationConfig,
    genetic_config: &GeneticConfig,
    ledger: &mut InnovationLedger,
    rng: &mut NeatRng,
) -> Vec<Genome> {
    (0..population_config.population_size.get())
        .map(|_| Genome::initial(genetic_config, ledger, rng))
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::NodeId;

    use std::num::NonZeroUsize;

    fn genetic() -> GeneticConfig {
        GeneticConfig {
            num_inputs: NonZeroUsize::new(2).unwrap(),
            num_outputs: NonZeroUsize::new(1).unwrap(),
            compatibility_disjoint_coefficient: 1.0,
            compatibility_weight_coefficient: 0.5,
            conn_add_prob: 0.3,
            conn_delete_prob: 0.1,
            node_add_prob: 0.2,
            node_delete_prob: 0.05,
            weight_init_type: crate::genomics::WeightInit::Normal,
            weight_init_stdev: 1.0,
            weight_min_value: -5.0,
            weight_max_value: 5.0,
            weight_mutate_rate: 0.8,
            weight_replace_rate: 0.1,
            activation_mutate_rate: 0.05,
            ..GeneticConfig::zero()
        }
    }

    fn pop_config() -> PopulationConfig {
        PopulationConfig {
            population_size: NonZeroUsize::new(30).unwrap(),
            fitness_threshold: 100.0,
            max_stagnation: 15,
            species_elitism: 2,
            elitism: 1,
            survival_threshold: 0.3,
            min_species_size: 2,
            compatibility_threshold: 2.0,
            bad_species_threshold: 0.2,
            ..PopulationConfig::zero()
        }
    }

    fn output_fitness(genome: &mut Genome, _: usize) -> Result<f64> {
        let output = genome.feed_forward(&[1.0, 0.5])?;
        Ok(output[0] + genome.connections().count() as f64 * 0.01)
    }

    #[test]
    fn evolve_keeps_size_and_species() {
        let mut population = Population::with_seed(pop_config(), genetic(), 11);
        for generation in 1..=10 {
            population.evaluate_fitness(output_fitness);
            population.evolve().unwrap();
            assert_eq!(population.generation(), generation);
            assert_eq!(population.genomes().count(), 30);
            assert!(population.species().count() > 0);
            assert!(population.species().all(|s| s.genomes().count() > 0));
        }
    }

    #[test]
    fn species_are_ranked() {
        let mut population = Population::with_seed(pop_config(), genetic(), 5);
        for _ in 0..5 {
            population.evaluate_fitness(output_fitness);
            population.evolve().unwrap();
            let ranked: Vec<f64> = population.species().map(Species::best_fitness).collect();
            assert!(ranked.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn best_fitness_never_decreases() {
        let mut population = Population::with_seed(pop_config(), genetic(), 3);
        let mut best = f64::NEG_INFINITY;
        for _ in 0..8 {
            population.evaluate_fitness(output_fitness);
            population.evolve().unwrap();
            assert!(population.best_fitness() >= best);
            best = population.best_fitness();
            assert_eq!(population.best_genome().map(Genome::fitness), Some(best));
        }
    }

    #[test]
    fn seeded_runs_are_deterministic() {
        let trajectory = |seed| {
            let mut population = Population::with_seed(pop_config(), genetic(), seed);
            let mut best = vec![];
            population
                .run(output_fitness, 8, |p, _| {
                    best.push(p.best_fitness());
                    ControlFlow::Continue(())
                })
                .unwrap();
            best
        };
        assert_eq!(trajectory(21), trajectory(21));
    }

    #[test]
    fn failed_evaluations_keep_previous_fitness() {
        let mut population = Population::with_seed(pop_config(), genetic(), 1);
        population.evaluate_fitness(|_, _| Ok(3.0));
        population.evaluate_fitness(|genome, _| genome.feed_forward(&[1.0]).map(|_| 9.0));
        assert!(population.genomes().all(|g| g.fitness() == 3.0));
    }

    #[test]
    fn run_stops_when_callback_breaks() {
        let mut population = Population::with_seed(pop_config(), genetic(), 2);
        population
            .run(output_fitness, 50, |_, evaluated| {
                if evaluated == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(population.generation(), 4);
    }

    #[test]
    fn infinite_fitness_terminates() {
        let config = PopulationConfig {
            no_fitness_termination: true,
            ..pop_config()
        };
        let mut population = Population::with_seed(config, genetic(), 2);
        let best = population
            .run(|_, _| Ok(f64::INFINITY), 50, |_, _| ControlFlow::Continue(()))
            .unwrap()
            .map(Genome::fitness);
        assert_eq!(best, Some(f64::INFINITY));
        assert_eq!(population.generation(), 1);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut population = Population::with_seed(pop_config(), genetic(), 8);
        for _ in 0..4 {
            population.evaluate_fitness(output_fitness);
            population.evolve().unwrap();
        }
        let config = NeatConfig {
            genetic: genetic(),
            population: pop_config(),
        };
        let restored = Population::from_json(&population.to_json().unwrap(), config).unwrap();

        assert_eq!(restored.generation(), population.generation());
        assert_eq!(restored.best_fitness(), population.best_fitness());
        assert_eq!(restored.species().count(), population.species().count());
        assert!(restored
            .genomes()
            .zip(population.genomes())
            .all(|(a, b)| a.is_equal(b)));
        assert_eq!(restored.ledger().len(), population.ledger().len());
        for entry in population.ledger().entries() {
            let mut ledger = restored.ledger().clone();
            assert_eq!(ledger.innovation_for(entry.from, entry.to), entry.innovation);
        }
    }

    /// Connections keyed by endpoints, since edges invented after
    /// loading draw fresh innovation numbers.
    fn wiring(population: &Population) -> Vec<Vec<(NodeId, NodeId, u64, bool)>> {
        population
            .genomes()
            .map(|genome| {
                let mut edges: Vec<_> = genome
                    .connections()
                    .map(|c| (c.from(), c.to(), c.weight().to_bits(), c.enabled()))
                    .collect();
                edges.sort_unstable();
                edges
            })
            .collect()
    }

    #[test]
    fn reseeded_snapshots_resume_identically() {
        let mut population = Population::with_seed(pop_config(), genetic(), 5);
        for _ in 0..3 {
            population.evaluate_fitness(output_fitness);
            population.evolve().unwrap();
        }
        let json = population.to_json().unwrap();
        let config = NeatConfig {
            genetic: genetic(),
            population: pop_config(),
        };

        let resume = || {
            let mut restored = Population::from_json(&json, config.clone()).unwrap();
            restored.reseed(77);
            let mut best = vec![];
            for _ in 0..4 {
                restored.evaluate_fitness(output_fitness);
                restored.evolve().unwrap();
                best.push(restored.best_fitness());
            }
            (restored, best)
        };
        let (first, first_best) = resume();
        let (second, second_best) = resume();

        assert_eq!(first.generation(), 7);
        assert_eq!(first_best, second_best);
        assert_eq!(first.species().count(), second.species().count());
        assert_eq!(wiring(&first), wiring(&second));
    }

    #[test]
    fn snapshot_without_ledger_rebuilds_it() {
        let mut population = Population::with_seed(pop_config(), genetic(), 8);
        population.evaluate_fitness(output_fitness);
        population.evolve().unwrap();

        let mut json: serde_json::Value = serde_json::from_str(&population.to_json().unwrap()).unwrap();
        json.as_object_mut().unwrap().remove("innovations");
        let config = NeatConfig {
            genetic: genetic(),
            population: pop_config(),
        };
        let restored = Population::from_json(&json.to_string(), config).unwrap();

        for genome in restored.genomes() {
            for connection in genome.connections() {
                let mut ledger = restored.ledger().clone();
                assert_eq!(
                    ledger.innovation_for(connection.from(), connection.to()),
                    connection.innovation()
                );
            }
        }
    }

    #[test]
    fn snapshot_with_wrong_shape_is_corrupt() {
        let population = Population::with_seed(pop_config(), genetic(), 8);
        let config = NeatConfig {
            genetic: GeneticConfig {
                num_inputs: NonZeroUsize::new(5).unwrap(),
                ..genetic()
            },
            population: pop_config(),
        };
        assert!(matches!(
            Population::from_json(&population.to_json().unwrap(), config),
            Err(NeatError::CorruptSnapshot(_))
        ));
        assert!(matches!(
            Population::from_json("{\"generation\": 3}", NeatConfig {
                genetic: genetic(),
                population: pop_config(),
            }),
            Err(NeatError::CorruptSnapshot(_))
        ));
    }
}
