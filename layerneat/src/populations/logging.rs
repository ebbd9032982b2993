//! Per-generation records of a population's progress.
use super::{Population, SpeciesID};

use crate::genomics::Genome;

use std::fmt;

/// How many genomes an [`EvolutionLogger`] copies into each [`Log`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Every member of every species.
    AllGenomes,
    /// One champion per species.
    SpeciesChampions,
    /// The best genome found so far.
    PopulationChampion,
    /// None at all; only figures are kept.
    NoGenomes,
}

/// State of a population right after a generation was evolved.
#[derive(Clone, Debug)]
pub struct Log {
    /// Generation count after evolving.
    pub generation: usize,
    pub species_count: usize,
    pub best_fitness: f64,
    pub average_fitness: f64,
    /// Summary of the raw fitnesses the generation was evaluated with.
    pub fitness_stats: Stats,
    pub members: GenerationMemberRecord,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: {} species, best {:.4}, average {:.4}, fitness [{}]",
            self.generation,
            self.species_count,
            self.best_fitness,
            self.average_fitness,
            self.fitness_stats,
        )
    }
}

/// Maximum, minimum, mean and median of a sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Summarizes a sample. An empty sample yields all zeros.
    ///
    /// # Examples
    /// ```
    /// use layerneat::logging::Stats;
    ///
    /// let stats = Stats::from([0.5, -2.0, 1.5, -1.0, 1.0].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut sorted: Vec<f64> = data.collect();
        sorted.sort_by(f64::total_cmp);
        let (first, last) = match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Stats {
                    maximum: 0.0,
                    minimum: 0.0,
                    mean: 0.0,
                    median: 0.0,
                }
            }
        };
        let half = sorted.len() / 2;
        Stats {
            maximum: last,
            minimum: first,
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            median: if sorted.len() % 2 == 1 {
                sorted[half]
            } else {
                (sorted[half - 1] + sorted[half]) / 2.0
            },
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max {:.4}, min {:.4}, mean {:.4}, median {:.4}",
            self.maximum, self.minimum, self.mean, self.median
        )
    }
}

/// Genomes copied into a [`Log`], as selected by its [`ReportingLevel`].
/// Species entries carry their stagnation counter.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    Species(Vec<(SpeciesID, Vec<Genome>, usize)>),
    SpeciesChampions(Vec<(SpeciesID, Genome, usize)>),
    /// `None` until a generation has been evolved.
    PopulationChampion(Option<Genome>),
    None,
}

/// Accumulates a [`Log`] per generation.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// # Examples
    /// ```
    /// use layerneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// assert_eq!(logger.iter().count(), 0);
    /// ```
    pub fn new(level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger { level, logs: Vec::new() }
    }

    /// Records the current state of `population`. Meant to be
    /// called right after [`Population::evolve`], or from the
    /// callback passed to [`Population::run`].
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::GeneticConfig;
    /// use layerneat::logging::{EvolutionLogger, ReportingLevel};
    /// use layerneat::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let population_config = PopulationConfig {
    ///     population_size: NonZeroUsize::new(10).unwrap(),
    ///     compatibility_threshold: 3.0,
    ///     max_stagnation: 15,
    ///     ..PopulationConfig::zero()
    /// };
    /// let mut population = Population::with_seed(population_config, GeneticConfig::zero(), 1);
    /// let mut logger = EvolutionLogger::new(ReportingLevel::SpeciesChampions);
    ///
    /// population.evaluate_fitness(|_, _| Ok(1.0));
    /// population.evolve().unwrap();
    /// logger.log(&population);
    ///
    /// let log = logger.iter().next().unwrap();
    /// assert_eq!(log.generation, 1);
    /// assert_eq!(log.fitness_stats.mean, 1.0);
    /// ```
    pub fn log(&mut self, population: &Population) {
        let members = match self.level {
            ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                population
                    .species()
                    .map(|s| (s.id(), s.genomes().cloned().collect(), s.stagnation()))
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                population
                    .species()
                    .map(|s| (s.id(), s.champion().clone(), s.stagnation()))
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => {
                GenerationMemberRecord::PopulationChampion(population.best_genome().cloned())
            }
            ReportingLevel::NoGenomes => GenerationMemberRecord::None,
        };
        self.logs.push(Log {
            generation: population.generation(),
            species_count: population.species().count(),
            best_fitness: population.best_fitness(),
            average_fitness: population.average_fitness(),
            fitness_stats: Stats::from(population.last_fitnesses().iter().copied()),
            members,
        });
    }

    /// Returns the recorded logs, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::genomics::GeneticConfig;
    use crate::PopulationConfig;

    use std::num::NonZeroUsize;

    #[test]
    fn stats_even_length_median() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.maximum, 4.0);
        assert_eq!(stats.minimum, 1.0);
        assert_eq!(stats.mean, 2.5);
    }

    #[test]
    fn stats_of_nothing() {
        let stats = Stats::from(std::iter::empty());
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.median, 0.0);
    }

    #[test]
    fn stats_with_infinity() {
        let stats = Stats::from([1.0, f64::INFINITY, 0.0].iter().copied());
        assert_eq!(stats.maximum, f64::INFINITY);
        assert_eq!(stats.median, 1.0);
    }

    #[test]
    fn reporting_levels() {
        let config = PopulationConfig {
            population_size: NonZeroUsize::new(6).unwrap(),
            max_stagnation: 10,
            compatibility_threshold: 1.0,
            ..PopulationConfig::zero()
        };
        let mut population = Population::with_seed(config, GeneticConfig::zero(), 2);
        let mut loggers: Vec<EvolutionLogger> = [
            ReportingLevel::AllGenomes,
            ReportingLevel::SpeciesChampions,
            ReportingLevel::PopulationChampion,
            ReportingLevel::NoGenomes,
        ]
        .iter()
        .map(|level| EvolutionLogger::new(*level))
        .collect();

        population.evaluate_fitness(|_, _| Ok(2.0));
        population.evolve().unwrap();
        for logger in &mut loggers {
            logger.log(&population);
        }

        let members: Vec<&GenerationMemberRecord> =
            loggers.iter().map(|l| &l.iter().next().unwrap().members).collect();
        match members[0] {
            GenerationMemberRecord::Species(species) => {
                assert_eq!(species.len(), 1);
                assert_eq!(species[0].0, SpeciesID(0, 0));
            }
            other => panic!("unexpected record {:?}", other),
        }
        match members[1] {
            GenerationMemberRecord::SpeciesChampions(champions) => {
                assert_eq!(champions[0].1.fitness(), 2.0)
            }
            other => panic!("unexpected record {:?}", other),
        }
        match members[2] {
            GenerationMemberRecord::PopulationChampion(Some(best)) => {
                assert_eq!(best.fitness(), 2.0)
            }
            other => panic!("unexpected record {:?}", other),
        }
        assert!(matches!(members[3], GenerationMemberRecord::None));
    }
}
