//! District search with a synthetic energy model
//!
//! Runs a short search, then resumes it from its last generation checkpoint
//! with a larger generation limit.

use district_opt::{
    EvolutionEngine,
    compute::evolution::{EvaluationError, EvaluationOracle, FileCheckpointStore},
    schema::{
        CheckpointLabel, DistrictLayout, Fitness, Individual, NetworkList, OptimizationConfig,
        SearchConfig, SearchSpace,
    },
};
use std::ops::Range;
use std::time::Instant;

/// Toy district model: each installed technology has a fixed cost and
/// emission factor, connected buildings share the network.
struct SyntheticDistrict {
    space: SearchSpace,
    cost_per_unit: Vec<f64>,
    co2_per_unit: Vec<f64>,
}

impl SyntheticDistrict {
    fn new(space: SearchSpace) -> Self {
        let technologies = space.blocks().technology_activation.len();
        Self {
            cost_per_unit: (0..technologies).map(|t| 1.0 + t as f64 * 0.6).collect(),
            co2_per_unit: (0..technologies).map(|t| 3.0 / (1.0 + t as f64)).collect(),
            space,
        }
    }

    fn sum(genes: &[f64], range: &Range<usize>) -> f64 {
        genes[range.clone()].iter().sum()
    }
}

impl EvaluationOracle for SyntheticDistrict {
    fn update_network(
        &self,
        individual: &Individual,
        space: &SearchSpace,
        networks: &mut NetworkList,
    ) -> Result<(), EvaluationError> {
        let key = space.connection_key(&individual.genes);
        if !key.contains('1') {
            return Err(EvaluationError::Network {
                key,
                reason: "no building connected".to_string(),
            });
        }
        networks.insert(key);
        Ok(())
    }

    fn evaluate(&self, individual: &Individual) -> Result<Fitness, EvaluationError> {
        let genes = &individual.genes;
        let blocks = self.space.blocks();

        let activation = &genes[blocks.technology_activation.clone()];
        let shares = &genes[blocks.technology_shares.clone()];
        let connected = Self::sum(genes, &blocks.connections);
        let solar_share = Self::sum(genes, &blocks.solar_shares);
        let recovery = Self::sum(genes, &blocks.heat_recovery);

        let mut cost = 10.0 * connected;
        let mut co2 = 0.0;
        for (t, (&level, &share)) in activation.iter().zip(shares).enumerate() {
            cost += level * share * self.cost_per_unit[t];
            co2 += (1.0 - share) * self.co2_per_unit[t];
        }
        cost += 4.0 * solar_share + 2.0 * recovery;
        co2 = (co2 - 0.8 * solar_share - 0.3 * recovery).max(0.0) * connected;
        let primary_energy = cost * 0.4 + co2 * 1.5;

        Ok(Fitness::new(cost, co2, primary_energy))
    }
}

fn main() {
    env_logger::init();

    println!("=== District Search Demo ===\n");

    let checkpoint_dir = std::env::temp_dir().join("district-opt-demo");
    let config = OptimizationConfig {
        layout: DistrictLayout {
            buildings: 8,
            ..Default::default()
        },
        search: SearchConfig {
            initial_individuals: 12,
            max_generations: 6,
            ..Default::default()
        },
        random_seed: Some(42),
        ..Default::default()
    };

    let space = SearchSpace::from_layout(&config.layout);
    println!(
        "Genes: {} ({} discrete)",
        space.len(),
        space.discrete_count()
    );
    println!("Checkpoints: {}\n", checkpoint_dir.display());

    let store = FileCheckpointStore::new(&checkpoint_dir).expect("checkpoint directory");
    let mut engine = EvolutionEngine::new(
        config.clone(),
        SyntheticDistrict::new(space.clone()),
        store,
    )
    .expect("valid configuration");

    let start = Instant::now();
    let result = engine
        .run_with_callback(|p| {
            println!(
                "  Generation {:>2}: front={:>3} evaluated={:>3} failed={:>2} networks={:>3} eps={}",
                p.generation,
                p.population_size,
                p.evaluated,
                p.failed,
                p.network_patterns,
                p.eps_indicator
                    .map_or_else(|| "-".to_string(), |eps| format!("{:.4}", eps))
            );
        })
        .expect("search run");

    println!();
    println!("  Stop reason:    {:?}", result.stats.stop_reason);
    println!("  Evaluations:    {}", result.stats.evaluations);
    println!("  Failed:         {}", result.stats.failed_evaluations);
    println!("  Elapsed:        {:.2}s", start.elapsed().as_secs_f64());
    println!();

    println!("=== Resume from generation 6 ===\n");

    let resumed_config = OptimizationConfig {
        search: SearchConfig {
            max_generations: 10,
            ..config.search.clone()
        },
        ..config
    };
    let store = FileCheckpointStore::new(&checkpoint_dir).expect("checkpoint directory");
    let mut engine = EvolutionEngine::new(resumed_config, SyntheticDistrict::new(space), store)
        .expect("valid configuration");
    let result = engine
        .resume(CheckpointLabel::Generation(6))
        .expect("resume run");

    println!("  Generations:    {}", result.stats.generations);
    println!("  Front size:     {}", result.population.len());
    println!("  Eps history:    {:?}", result.eps_indicator);
    println!();

    println!("Front (cost, co2, primary energy):");
    let mut front: Vec<Fitness> = result.population.iter().filter_map(|i| i.fitness).collect();
    front.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    for f in front.iter().take(10) {
        println!("  {:>10.3} {:>10.3} {:>10.3}", f.cost, f.co2, f.primary_energy);
    }
}
