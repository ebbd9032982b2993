use layerneat::genomics::{
    Activation, GeneticConfig, Genome, InitialConnections, InnovationLedger, WeightInit,
};
use layerneat::{NeatError, NeatRng, Population, PopulationConfig};

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::ops::ControlFlow;

fn sized(inputs: usize, outputs: usize) -> GeneticConfig {
    GeneticConfig {
        num_inputs: NonZeroUsize::new(inputs).unwrap(),
        num_outputs: NonZeroUsize::new(outputs).unwrap(),
        ..GeneticConfig::zero()
    }
}

fn assert_feed_forward_layers(genome: &Genome) {
    for connection in genome.connections() {
        let from = genome.node(connection.from()).unwrap().layer();
        let to = genome.node(connection.to()).unwrap().layer();
        assert!(from < to, "{} breaks layer order in {}", connection, genome.id());
    }
}

#[test]
fn fixed_xor_network() {
    let config = GeneticConfig {
        num_hidden_layers: 1,
        initial_connections: InitialConnections::None,
        ..sized(2, 1)
    };
    let mut ledger = InnovationLedger::new();
    let mut genome = Genome::initial(&config, &mut ledger, &mut NeatRng::seeded(0));
    assert_eq!(genome.node(3).unwrap().layer(), 1);
    assert_eq!(genome.node(4).unwrap().layer(), 1);

    let edges = [
        (0, 3, 20.0),
        (1, 3, 20.0),
        (0, 4, -20.0),
        (1, 4, -20.0),
        (3, 2, 40.0),
        (4, 2, -70.0),
        (0, 2, -28.0),
        (1, 2, -28.0),
    ];
    for (from, to, weight) in edges.iter() {
        genome.connect(*from, *to, *weight, &mut ledger).unwrap();
    }

    let cases = [
        ([0.0, 0.0], 0.0),
        ([1.0, 0.0], 1.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];
    let mut restored = Genome::from_json(&genome.to_json().unwrap()).unwrap();
    assert!(restored.is_equal(&genome));
    for (input, expected) in cases.iter() {
        let output = genome.feed_forward(input).unwrap();
        assert!((output[0] - expected).abs() < 1e-3, "{:?} -> {}", input, output[0]);
        assert_eq!(restored.feed_forward(input).unwrap(), output);
    }
}

#[test]
fn innovation_sharing() {
    let config = sized(4, 4);
    let mut ledger = InnovationLedger::new();
    let mut rng = NeatRng::seeded(1);
    let mut genome = Genome::new(&config, &mut rng);
    for from in 0..4 {
        for to in 4..8 {
            if (from, to) != (3, 7) {
                genome.connect(from, to, 1.0, &mut ledger).unwrap();
            }
        }
    }

    // 3 -> 7 is the only edge add-connection can pick.
    let mut first = genome.clone();
    let mut second = genome.clone();
    let mut third = genome.clone();
    let a = first.mutate_add_connection(&config, &mut ledger, &mut rng).unwrap();
    let b = second.mutate_add_connection(&config, &mut ledger, &mut rng).unwrap();
    let c = third.mutate_add_connection(&config, &mut ledger, &mut rng).unwrap();

    assert_eq!(first.connection(a).unwrap().endpoints(), (3, 7));
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(ledger.innovation_for(3, 7), a);
}

#[test]
fn add_node_preserves_function() {
    let config = GeneticConfig {
        activation_default: Activation::Linear,
        weight_init_type: WeightInit::Normal,
        weight_init_stdev: 1.0,
        weight_min_value: -3.0,
        weight_max_value: 3.0,
        ..sized(3, 2)
    };
    let mut ledger = InnovationLedger::new();
    let mut rng = NeatRng::seeded(5);

    for _ in 0..10 {
        let mut original = Genome::initial(&config, &mut ledger, &mut rng);
        let mut grown = original.clone();
        grown
            .mutate_add_node(&config, &mut ledger, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(grown.nodes().count(), original.nodes().count() + 1);

        for _ in 0..100 {
            let input: Vec<f64> = (0..3).map(|_| rng.uniform(-1.0, 1.0)).collect();
            let before = original.feed_forward(&input).unwrap();
            let after = grown.feed_forward(&input).unwrap();
            for (b, a) in before.iter().zip(&after) {
                assert!((b - a).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn add_node_with_nonlinear_activation_keeps_invariants() {
    let config = GeneticConfig {
        activation_default: Activation::Tanh,
        weight_init_type: WeightInit::Uniform,
        weight_min_value: -2.0,
        weight_max_value: 2.0,
        ..sized(3, 2)
    };
    let mut ledger = InnovationLedger::new();
    let mut rng = NeatRng::seeded(6);

    for _ in 0..10 {
        let original = Genome::initial(&config, &mut ledger, &mut rng);
        let mut grown = original.clone();
        grown
            .mutate_add_node(&config, &mut ledger, &mut rng)
            .unwrap()
            .unwrap();
        assert_feed_forward_layers(&grown);

        let disabled: Vec<_> = grown.connections().filter(|c| !c.enabled()).collect();
        assert_eq!(disabled.len(), 1);
        let split = original.connection(disabled[0].innovation()).unwrap();
        assert_eq!(disabled[0].weight(), split.weight());
    }
}

#[test]
fn compatibility_distance_symmetry() {
    let genetic = GeneticConfig {
        compatibility_disjoint_coefficient: 1.0,
        compatibility_weight_coefficient: 0.4,
        conn_add_prob: 0.5,
        conn_delete_prob: 0.2,
        node_add_prob: 0.3,
        weight_init_type: WeightInit::Normal,
        weight_init_stdev: 1.0,
        weight_min_value: -5.0,
        weight_max_value: 5.0,
        weight_mutate_rate: 0.8,
        ..sized(3, 2)
    };
    let population = PopulationConfig {
        population_size: NonZeroUsize::new(10).unwrap(),
        no_fitness_termination: true,
        max_stagnation: 15,
        species_elitism: 1,
        survival_threshold: 0.5,
        compatibility_threshold: 1.0,
        ..PopulationConfig::zero()
    };
    let mut population = Population::with_seed(population, genetic.clone(), 4);
    population
        .run(|g, _| Ok(g.connections().count() as f64), 5, |_, _| ControlFlow::Continue(()))
        .unwrap();

    let genomes: Vec<&Genome> = population.genomes().collect();
    assert_eq!(genomes.len(), 10);
    for a in &genomes {
        for b in &genomes {
            for members in [1, 25, 40].iter() {
                let ab = Genome::distance(a, b, &genetic, *members);
                let ba = Genome::distance(b, a, &genetic, *members);
                assert!((ab - ba).abs() < 1e-12);
            }
        }
    }
}

fn stagnant_population(species_elitism: usize, reset_on_extinction: bool) -> Population {
    let population = PopulationConfig {
        population_size: NonZeroUsize::new(12).unwrap(),
        no_fitness_termination: true,
        max_stagnation: 4,
        species_elitism,
        reset_on_extinction,
        survival_threshold: 0.5,
        compatibility_threshold: 1.0,
        ..PopulationConfig::zero()
    };
    // Identical, immutable genomes form a single species.
    Population::with_seed(population, sized(2, 1), 9)
}

#[test]
fn stagnant_species_are_evicted() {
    let genetic = GeneticConfig {
        compatibility_disjoint_coefficient: 1.0,
        compatibility_weight_coefficient: 0.5,
        conn_add_prob: 0.4,
        node_add_prob: 0.2,
        weight_init_type: WeightInit::Normal,
        weight_init_stdev: 2.0,
        weight_min_value: -5.0,
        weight_max_value: 5.0,
        weight_mutate_rate: 0.5,
        ..sized(3, 1)
    };
    let population = PopulationConfig {
        population_size: NonZeroUsize::new(40).unwrap(),
        no_fitness_termination: true,
        reset_on_extinction: true,
        max_stagnation: 5,
        species_elitism: 2,
        survival_threshold: 0.5,
        compatibility_threshold: 0.8,
        ..PopulationConfig::zero()
    };
    let mut population = Population::with_seed(population, genetic, 12);
    let mut generations = 0;
    population
        .run(|_, _| Ok(0.0), 20, |population, evaluated| {
            generations += 1;
            for species in population.species().skip(2) {
                assert!(species.stagnation() < 5);
                assert!(evaluated - species.id().0 < 5);
            }
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(generations, 20);
}

#[test]
fn extinction_resets_population() {
    let mut population = stagnant_population(0, true);
    let mut species_counts = HashMap::new();
    population
        .run(|_, _| Ok(0.0), 20, |population, evaluated| {
            species_counts.insert(evaluated, population.species().count());
            assert_eq!(population.genomes().count(), 12);
            if let Some(species) = population.species().next() {
                assert!(species.stagnation() < 4);
            }
            ControlFlow::Continue(())
        })
        .unwrap();

    // The lone species stagnates for 4 generations after its first,
    // dies out, and is replaced by the reset population's species.
    assert_eq!(species_counts[&3], 1);
    assert_eq!(species_counts[&4], 0);
    assert_eq!(species_counts[&5], 1);
    assert_eq!(species_counts[&9], 0);
    assert_eq!(population.generation(), 20);
}

#[test]
fn extinction_without_reset_fails() {
    let mut population = stagnant_population(0, false);
    let result = population.run(|_, _| Ok(0.0), 20, |_, _| ControlFlow::Continue(()));
    assert!(matches!(result, Err(NeatError::EmptyPopulation)));
    assert_eq!(population.generation(), 4);
}

#[test]
fn elitist_species_survives_stagnation() {
    let mut population = stagnant_population(1, false);
    population
        .run(|_, _| Ok(0.0), 20, |population, evaluated| {
            assert_eq!(population.species().count(), 1);
            let species = population.species().next().unwrap();
            assert_eq!(species.id().0, 0);
            assert_eq!(species.stagnation(), evaluated);
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(population.generation(), 20);
}

#[test]
fn threshold_termination() {
    let population = PopulationConfig {
        population_size: NonZeroUsize::new(10).unwrap(),
        fitness_threshold: 5.0,
        max_stagnation: 15,
        survival_threshold: 0.5,
        compatibility_threshold: 1.0,
        ..PopulationConfig::zero()
    };
    let mut population = Population::with_seed(population, sized(2, 1), 3);
    let best = population
        .run(|_, generation| Ok(generation as f64 + 1.0), 100, |_, _| {
            ControlFlow::Continue(())
        })
        .unwrap()
        .map(Genome::fitness);

    assert_eq!(best, Some(5.0));
    assert_eq!(population.generation(), 5);
    assert_eq!(population.best_fitness(), 5.0);
}

#[test]
fn seeded_runs_share_trajectories() {
    let genetic = GeneticConfig {
        compatibility_disjoint_coefficient: 1.0,
        compatibility_weight_coefficient: 0.5,
        conn_add_prob: 0.3,
        node_add_prob: 0.1,
        weight_init_type: WeightInit::Normal,
        weight_init_stdev: 1.0,
        weight_min_value: -5.0,
        weight_max_value: 5.0,
        weight_mutate_rate: 0.8,
        ..sized(2, 1)
    };
    let population = PopulationConfig {
        population_size: NonZeroUsize::new(25).unwrap(),
        no_fitness_termination: true,
        max_stagnation: 10,
        species_elitism: 1,
        elitism: 1,
        survival_threshold: 0.3,
        compatibility_threshold: 1.5,
        ..PopulationConfig::zero()
    };
    let evaluate = |genome: &mut Genome, _: usize| -> layerneat::Result<f64> {
        let output = genome.feed_forward(&[0.3, -0.7])?;
        Ok(output[0])
    };
    let trajectory = || {
        let mut population = Population::with_seed(population.clone(), genetic.clone(), 77);
        let mut best = vec![];
        population
            .run(evaluate, 10, |p, _| {
                best.push(p.best_fitness());
                ControlFlow::Continue(())
            })
            .unwrap();
        best
    };
    assert_eq!(trajectory(), trajectory());
}

#[test]
fn zero_inputs_give_activation_at_zero() {
    let config = sized(3, 2);
    let mut genome = Genome::initial(&config, &mut InnovationLedger::new(), &mut NeatRng::seeded(0));
    assert_eq!(genome.feed_forward(&[0.0, 0.0, 0.0]).unwrap(), vec![0.5, 0.5]);
}
