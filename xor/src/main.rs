use layerneat::genomics::Genome;
use layerneat::logging::{EvolutionLogger, ReportingLevel, Stats};
use layerneat::{NeatConfig, Population, Result};

use std::env;
use std::ops::ControlFlow;

const ERROR_MARGIN: f64 = 0.3;
const MAX_GENERATIONS: usize = 300;

fn evaluate_xor(genome: &mut Genome, _generation: usize) -> Result<f64> {
    let values = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];

    let mut errors = [0.0; 4];
    for (i, (input, output)) in values.iter().enumerate() {
        errors[i] = (genome.feed_forward(input)?[0] - output).abs();
        if errors[i] < ERROR_MARGIN {
            errors[i] = 0.0;
        }
    }

    Ok((4.0 - errors.iter().sum::<f64>()).powi(2))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "xor.cfg".into());
    let output_path = args.next().unwrap_or_else(|| "champion.json".into());

    let config = NeatConfig::from_file(&config_path)?;
    log::info!("loaded configuration from {}", config_path);

    let mut population = Population::from_config(config);
    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);

    let champion = population
        .run(evaluate_xor, MAX_GENERATIONS, |population, generation| {
            logger.log(population);
            log::info!(
                "generation {}: {} species, best fitness {:.3}",
                generation,
                population.species().count(),
                population.best_fitness(),
            );
            ControlFlow::Continue(())
        })?
        .cloned();

    let best_per_generation = Stats::from(logger.iter().map(|log| log.fitness_stats.maximum));
    log::info!(
        "evolved {} generations; per-generation best fitness: {:?}",
        population.generation(),
        best_per_generation
    );

    match champion {
        Some(champion) => {
            champion.save(&output_path)?;
            println!(
                "champion {} (fitness {:.3}, {} nodes, {} connections) written to {}",
                champion.id(),
                champion.fitness(),
                champion.nodes().count(),
                champion.connections().count(),
                output_path
            );
        }
        None => println!("no champion found"),
    }
    Ok(())
}
