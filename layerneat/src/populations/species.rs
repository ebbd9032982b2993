use crate::genomics::{GeneticConfig, Genome, InnovationLedger};
use crate::populations::PopulationConfig;
use crate::rng::NeatRng;

use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

/// Chance that a child is a mutated copy of a single
/// parent, rather than the product of crossover.
const ASEXUAL_REPRODUCTION_CHANCE: f64 = 0.25;

/// Identifies a species by the generation it appeared in
/// and its position among the species founded during that
/// generation: the third species founded in generation 5
/// is `SpeciesID(5, 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize, pub usize);

/// A niche of genomes that lie within the [compatibility threshold]
/// of its _champion_, a copy of the fittest genome the species
/// has ever produced. Genomes compete for offspring mainly
/// against the rest of their species.
///
/// A species whose best fitness has not improved for
/// [`max_stagnation`] generations is removed.
///
/// [compatibility threshold]: PopulationConfig::compatibility_threshold
/// [`max_stagnation`]: PopulationConfig::max_stagnation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesID,
    champion: Genome,
    pub(super) genomes: Vec<Genome>,
    #[serde(with = "crate::serde_float")]
    best_fitness: f64,
    #[serde(with = "crate::serde_float")]
    average_fitness: f64,
    stagnation: usize,
}

impl Species {
    /// Founds a species whose champion and sole member is `champion`.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome};
    /// use layerneat::populations::{Species, SpeciesID};
    /// use layerneat::NeatRng;
    ///
    /// let species = Species::new(
    ///     SpeciesID(1, 0),
    ///     Genome::new(&GeneticConfig::zero(), &mut NeatRng::seeded(0)),
    /// );
    ///
    /// assert_eq!(species.id(), SpeciesID(1, 0));
    /// assert_eq!(species.genomes().count(), 1);
    /// ```
    pub fn new(id: SpeciesID, champion: Genome) -> Species {
        Species {
            id,
            genomes: vec![champion.clone()],
            champion,
            best_fitness: f64::NEG_INFINITY,
            average_fitness: 0.0,
            stagnation: 0,
        }
    }

    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' champion, the best genome it has produced.
    pub fn champion(&self) -> &Genome {
        &self.champion
    }

    /// Returns the highest fitness the species has ever reached.
    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    /// Returns the mean shared fitness of the species' members.
    pub fn average_fitness(&self) -> f64 {
        self.average_fitness
    }

    /// Returns the number of generations since
    /// the species' best fitness last improved.
    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    /// Members of the current generation, fittest first once ranked.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genomes.iter()
    }

    /// Returns the compatibility distance between the
    /// species' champion and `genome`.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::{GeneticConfig, Genome};
    /// use layerneat::populations::{Species, SpeciesID};
    /// use layerneat::NeatRng;
    ///
    /// let config = GeneticConfig {
    ///     compatibility_disjoint_coefficient: 1.0,
    ///     compatibility_weight_coefficient: 0.4,
    ///     ..GeneticConfig::zero()
    /// };
    /// let champion = Genome::new(&config, &mut NeatRng::seeded(0));
    /// let species = Species::new(SpeciesID(1, 0), champion.clone());
    ///
    /// assert_eq!(species.distance_to(&champion, &config), 0.0);
    /// ```
    pub fn distance_to(&self, genome: &Genome, config: &GeneticConfig) -> f64 {
        Genome::distance(&self.champion, genome, config, self.genomes.len())
    }

    pub fn add_genome(&mut self, genome: Genome) {
        self.genomes.push(genome);
    }

    /// Sorts members by decreasing fitness, and updates
    /// the champion and stagnation counter.
    ///
    /// # Panics
    /// Panics if any member's fitness is NaN.
    pub(super) fn update_champion(&mut self) {
        self.genomes.sort_by(|a, b| {
            b.fitness()
                .partial_cmp(&a.fitness())
                .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
        });
        match self.genomes.first() {
            Some(top) if top.fitness() > self.best_fitness => {
                self.best_fitness = top.fitness();
                self.champion = top.clone();
                self.stagnation = 0;
            }
            _ => self.stagnation += 1,
        }
    }

    /// Keeps the top [`survival_threshold`] fraction of members,
    /// but no fewer than [`min_species_size`] (nor than one).
    /// Members must be sorted.
    ///
    /// [`survival_threshold`]: PopulationConfig::survival_threshold
    /// [`min_species_size`]: PopulationConfig::min_species_size
    pub(super) fn cull(&mut self, config: &PopulationConfig) {
        let count = self.genomes.len();
        let survivors = ((count as f64 * config.survival_threshold).floor() as usize)
            .max(config.min_species_size)
            .max(1)
            .min(count);
        self.genomes.truncate(survivors);
    }

    /// Divides each member's fitness by the member count,
    /// and records the mean of the shared fitnesses.
    pub(super) fn share_fitness(&mut self) {
        let count = self.genomes.len() as f64;
        for genome in &mut self.genomes {
            genome.fitness /= count;
        }
        self.average_fitness = if self.genomes.is_empty() {
            0.0
        } else {
            self.genomes.iter().map(Genome::fitness).sum::<f64>() / count
        };
    }

    /// Returns the genomes copied as-is to the next generation:
    /// the champion, followed by the top members not already
    /// represented by it, up to [`elitism`] genomes in total.
    ///
    /// [`elitism`]: PopulationConfig::elitism
    pub(super) fn elite(&self, config: &PopulationConfig) -> Vec<Genome> {
        let others = self
            .genomes
            .iter()
            .filter(|g| g.id() != self.champion.id())
            .take(config.elitism.saturating_sub(1))
            .cloned();
        std::iter::once(self.champion.clone()).chain(others).collect()
    }

    /// Produces a mutated child from fitness-proportionally
    /// selected members: a copy of one parent, or the
    /// crossover of two.
    pub(super) fn produce_child(
        &self,
        config: &GeneticConfig,
        ledger: &mut InnovationLedger,
        rng: &mut NeatRng,
    ) -> Genome {
        let mut child = if rng.chance(ASEXUAL_REPRODUCTION_CHANCE) {
            self.roulette(rng).offspring(rng)
        } else {
            let first = self.roulette(rng);
            let second = self.roulette(rng);
            match first.fitness().partial_cmp(&second.fitness()) {
                Some(Ordering::Less) => second.crossover(first, rng),
                _ => first.crossover(second, rng),
            }
        };
        child.mutate(config, ledger, rng);
        child
    }

    /// Picks a member with probability proportional to its fitness.
    /// Falls back to a uniform pick if any fitness is negative or
    /// the total is not positive. An empty species yields its champion.
    fn roulette(&self, rng: &mut NeatRng) -> &Genome {
        if self.genomes.is_empty() {
            return &self.champion;
        }
        let total: f64 = self.genomes.iter().map(Genome::fitness).sum();
        if self.genomes.iter().any(|g| g.fitness() < 0.0) || !(total > 0.0 && total.is_finite()) {
            return &self.genomes[rng.below(self.genomes.len())];
        }

        let mut remaining = rng.uniform(0.0, total);
        for genome in &self.genomes {
            remaining -= genome.fitness();
            if remaining < 0.0 {
                return genome;
            }
        }
        &self.genomes[self.genomes.len() - 1]
    }
}
