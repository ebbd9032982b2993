use super::Species;

use crate::genomics::{GeneticConfig, Genome, InnovationLedger};
use crate::populations::PopulationConfig;
use crate::rng::NeatRng;

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a population's
/// next generation according to the specified configs
/// and each species' share of the total fitness.
pub(super) struct OffspringFactory<'a> {
    species: &'a [Species],
    ledger: &'a mut InnovationLedger,
    genetic_config: &'a GeneticConfig,
    population_config: &'a PopulationConfig,
    rng: &'a mut NeatRng,
}

impl<'a> OffspringFactory<'a> {
    /// `species` must be ranked best first.
    pub(super) fn new(
        species: &'a [Species],
        ledger: &'a mut InnovationLedger,
        genetic_config: &'a GeneticConfig,
        population_config: &'a PopulationConfig,
        rng: &'a mut NeatRng,
    ) -> OffspringFactory<'a> {
        OffspringFactory {
            species,
            ledger,
            genetic_config,
            population_config,
            rng,
        }
    }

    /// Generate the next generation: each species' elite plus
    /// its allotted children, topped up with a copy of
    /// `best_genome` and children of the best species if short.
    pub(super) fn generate_offspring(&mut self, best_genome: Option<&Genome>) -> Vec<Genome> {
        let population_size = self.population_config.population_size.get();
        let allotted = self.allot_offspring();
        let mut offspring = Vec::with_capacity(population_size);

        for (species, allotted) in self.species.iter().zip(allotted) {
            let elite = species.elite(self.population_config);
            let children = allotted.saturating_sub(elite.len());
            offspring.extend(elite);
            for _ in 0..children {
                offspring.push(species.produce_child(
                    self.genetic_config,
                    self.ledger,
                    self.rng,
                ));
            }
        }

        if offspring.len() < population_size {
            if let Some(best) = best_genome {
                offspring.push(best.offspring(self.rng));
            }
        }
        if let Some(best_species) = self.species.first() {
            while offspring.len() < population_size {
                offspring.push(best_species.produce_child(
                    self.genetic_config,
                    self.ledger,
                    self.rng,
                ));
            }
        }

        offspring.truncate(population_size);
        offspring
    }

    /// Number of offspring each species is entitled to, in
    /// proportion to its share of the summed average fitness.
    /// Species split the population evenly if that sum is
    /// not positive.
    fn allot_offspring(&self) -> Vec<usize> {
        let population_size = self.population_config.population_size.get();
        let total: f64 = self.species.iter().map(Species::average_fitness).sum();
        if !(total > 0.0 && total.is_finite()) {
            let even = population_size / self.species.len().max(1);
            return vec![even; self.species.len()];
        }
        self.species
            .iter()
            .map(|s| (s.average_fitness().max(0.0) / total * population_size as f64).floor() as usize)
            .collect()
    }
}
