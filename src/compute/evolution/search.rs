//! Generational search loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::schema::{
    Checkpoint, CheckpointError, CheckpointLabel, ConfigError, Individual, NetworkList,
    OptimizationConfig, SearchProgress, SearchResult, SearchSpace, SearchStats, StopReason,
};

use super::checkpoint::CheckpointStore;
use super::genome::GenomeRng;
use super::indicator::{eps_indicator, relative_change};
use super::oracle::{EvaluationOracle, EvaluationReport, evaluate_pending};
use super::selection::select_pareto;

/// Errors that abort a search run.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error("Checkpoint {0} holds an empty population")]
    EmptyCheckpoint(CheckpointLabel),
}

/// Evolution engine that runs the search.
///
/// Each generation breeds offspring from the current population, evaluates
/// only the new individuals, and keeps the Pareto front of parents and
/// offspring as the next population.
pub struct EvolutionEngine<O, S> {
    config: OptimizationConfig,
    space: SearchSpace,
    oracle: O,
    store: S,
    seed: u64,
    rng: GenomeRng,
    population: Vec<Individual>,
    network_list: NetworkList,
    eps_history: Vec<f64>,
    tested: Vec<Individual>,
    generation: usize,
    totals: EvaluationReport,
    last_report: EvaluationReport,
    cancelled: Arc<AtomicBool>,
}

impl<O: EvaluationOracle, S: CheckpointStore> EvolutionEngine<O, S> {
    /// Create a new engine. The configuration is validated here, before
    /// anything is generated or evaluated.
    pub fn new(config: OptimizationConfig, oracle: O, store: S) -> Result<Self, SearchError> {
        config.validate()?;

        let space = SearchSpace::from_layout(&config.layout);
        let seed = config.random_seed.unwrap_or_else(rand::random);
        let network_list = NetworkList::seeded(space.full_network_key());

        Ok(Self {
            config,
            space,
            oracle,
            store,
            seed,
            rng: GenomeRng::new(seed),
            population: Vec::new(),
            network_list,
            eps_history: Vec::new(),
            tested: Vec::new(),
            generation: 0,
            totals: EvaluationReport::default(),
            last_report: EvaluationReport::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn network_list(&self) -> &NetworkList {
        &self.network_list
    }

    pub fn eps_history(&self) -> &[f64] {
        &self.eps_history
    }

    /// Last completed generation.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Generate and evaluate generation 0, then save the initial checkpoint.
    pub fn initialize(&mut self) -> Result<(), SearchError> {
        self.generation = 0;
        self.eps_history.clear();
        self.tested.clear();
        self.network_list = NetworkList::seeded(self.space.full_network_key());

        self.population = (0..self.config.search.initial_individuals)
            .map(|_| self.rng.random_individual(&self.space))
            .collect();

        let report = evaluate_pending(
            &self.oracle,
            &self.space,
            &mut self.network_list,
            &mut self.population,
        );
        self.record(report);

        log::info!(
            "Initial population evaluated: {} individuals ({} failed)",
            self.population.len(),
            report.failed
        );
        self.save_checkpoint(CheckpointLabel::Initial)
    }

    /// Restore the full search state from a stored checkpoint.
    ///
    /// The loaded population keeps its stored fitness and is not
    /// re-evaluated. The random stream is re-seeded from the configured
    /// seed and the restored generation.
    pub fn restore(&mut self, label: CheckpointLabel) -> Result<(), SearchError> {
        let checkpoint = self.store.load(label)?;
        checkpoint.check_space(&self.space)?;

        let population = checkpoint.individuals()?;
        if population.is_empty() {
            return Err(SearchError::EmptyCheckpoint(label));
        }

        self.population = population;
        self.generation = checkpoint.generation;
        self.network_list = checkpoint.network_list;
        self.eps_history = checkpoint.eps_indicator;
        self.tested = checkpoint
            .tested_population
            .into_iter()
            .map(Individual::new)
            .collect();
        self.rng = GenomeRng::new(resume_seed(self.seed, self.generation));

        log::info!(
            "Recovered checkpoint {label}: generation {}, {} individuals",
            self.generation,
            self.population.len()
        );
        Ok(())
    }

    /// Run one generation: vary, evaluate offspring, select, track, and
    /// checkpoint when the interval is reached.
    pub fn step(&mut self) -> Result<(), SearchError> {
        self.generation += 1;

        let offspring = self.breed();
        let parents = self.population.len();
        let mut pool = std::mem::take(&mut self.population);
        pool.extend(offspring);

        let report = evaluate_pending(
            &self.oracle,
            &self.space,
            &mut self.network_list,
            &mut pool[parents..],
        );
        self.record(report);
        self.tested = pool[parents..].to_vec();

        let previous: Vec<Individual> = pool[..parents].to_vec();
        self.population = select_pareto(pool);

        let eps = eps_indicator(&previous, &self.population);
        self.eps_history.push(eps);

        log::info!(
            "Generation {}: {} offspring evaluated ({} failed), {} survivors, eps = {:.6}",
            self.generation,
            report.evaluated + report.failed,
            report.failed,
            self.population.len(),
            eps
        );

        if self.generation % self.config.search.checkpoint_interval == 0 {
            self.save_checkpoint(CheckpointLabel::Generation(self.generation))?;
        }
        Ok(())
    }

    /// Produce offspring from the current population.
    ///
    /// Sequential parent pairs are recombined by uniform crossover, and a
    /// copy of every parent goes through flip, shuffle and unit mutation in
    /// turn. Parents themselves are never modified.
    fn breed(&mut self) -> Vec<Individual> {
        let variation = &self.config.variation;
        let mut offspring = Vec::with_capacity(self.population.len() * 2);

        for pair in self.population.chunks_exact(2) {
            let (child1, child2) = self.rng.crossover_uniform(
                &self.space,
                &pair[0],
                &pair[1],
                variation.crossover_probability,
            );
            offspring.push(child1);
            offspring.push(child2);
        }

        for parent in &self.population {
            let mut mutant = parent.offspring();
            self.rng
                .mutate_flip(&self.space, &mut mutant, variation.mutation_probability);
            self.rng
                .mutate_shuffle(&self.space, &mut mutant, variation.mutation_probability);
            self.rng.mutate_unit(
                &self.space,
                &mut mutant,
                variation.mutation_probability,
                variation.mutation_sigma,
            );
            offspring.push(mutant);
        }

        log::debug!(
            "Generation {}: bred {} offspring from {} parents",
            self.generation,
            offspring.len(),
            self.population.len()
        );
        offspring
    }

    fn record(&mut self, report: EvaluationReport) {
        self.last_report = report;
        self.totals.evaluated += report.evaluated;
        self.totals.failed += report.failed;
    }

    fn save_checkpoint(&mut self, label: CheckpointLabel) -> Result<(), SearchError> {
        let checkpoint = Checkpoint::capture(
            self.generation,
            &self.population,
            &self.network_list,
            &self.eps_history,
            &self.tested,
        )?;
        self.store.save(label, &checkpoint)?;
        log::info!("Saved checkpoint {label}");
        Ok(())
    }

    /// Get current progress.
    pub fn progress(&self, start: Instant) -> SearchProgress {
        SearchProgress {
            generation: self.generation,
            max_generations: self.config.search.max_generations,
            population_size: self.population.len(),
            evaluated: self.last_report.evaluated,
            failed: self.last_report.failed,
            eps_indicator: if self.generation == 0 {
                None
            } else {
                self.eps_history.last().copied()
            },
            network_patterns: self.network_list.len(),
            elapsed_seconds: start.elapsed().as_secs_f64(),
        }
    }

    /// Check if the search should stop. Only called at generation
    /// boundaries.
    fn should_stop(&self, start: Instant) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        let search = &self.config.search;
        if self.generation >= search.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if start.elapsed().as_secs_f64() >= search.max_time_seconds {
            return Some(StopReason::TimeBudget);
        }

        if let Some(margin) = search.eps_margin
            && relative_change(&self.eps_history).is_some_and(|change| change < margin)
        {
            return Some(StopReason::Converged);
        }

        None
    }

    /// Run a fresh search with progress callback.
    pub fn run_with_callback<F>(&mut self, callback: F) -> Result<SearchResult, SearchError>
    where
        F: Fn(&SearchProgress),
    {
        let start = Instant::now();
        self.totals = EvaluationReport::default();

        self.initialize()?;
        callback(&self.progress(start));

        self.run_loop(start, callback)
    }

    /// Run a fresh search (blocking).
    pub fn run(&mut self) -> Result<SearchResult, SearchError> {
        self.run_with_callback(|_| {})
    }

    /// Continue a previous run from a stored checkpoint, with progress callback.
    pub fn resume_with_callback<F>(
        &mut self,
        label: CheckpointLabel,
        callback: F,
    ) -> Result<SearchResult, SearchError>
    where
        F: Fn(&SearchProgress),
    {
        let start = Instant::now();
        self.totals = EvaluationReport::default();
        self.last_report = EvaluationReport::default();

        self.restore(label)?;
        callback(&self.progress(start));

        self.run_loop(start, callback)
    }

    /// Continue a previous run from a stored checkpoint (blocking).
    pub fn resume(&mut self, label: CheckpointLabel) -> Result<SearchResult, SearchError> {
        self.resume_with_callback(label, |_| {})
    }

    fn run_loop<F>(&mut self, start: Instant, callback: F) -> Result<SearchResult, SearchError>
    where
        F: Fn(&SearchProgress),
    {
        let stop_reason = loop {
            if let Some(reason) = self.should_stop(start) {
                break reason;
            }

            self.step()?;
            callback(&self.progress(start));
        };

        match stop_reason {
            StopReason::MaxGenerations => log::info!("Final generation reached"),
            reason => log::info!("Stopping criteria reached: {reason:?}"),
        }
        self.save_checkpoint(CheckpointLabel::Final)?;
        log::info!(
            "Search complete: {} individuals in final population",
            self.population.len()
        );

        Ok(SearchResult {
            population: self.population.clone(),
            eps_indicator: self.eps_history.clone(),
            stats: SearchStats {
                generations: self.generation,
                evaluations: self.totals.evaluated,
                failed_evaluations: self.totals.failed,
                elapsed_seconds: start.elapsed().as_secs_f64(),
                stop_reason,
            },
        })
    }
}

/// Seed for the random stream after resuming at `generation`.
fn resume_seed(seed: u64, generation: usize) -> u64 {
    seed ^ (generation as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::evolution::{EvaluationError, FileCheckpointStore, MemoryCheckpointStore};
    use crate::schema::{DistrictLayout, Fitness, SearchConfig, VariationConfig};
    use std::sync::atomic::AtomicUsize;

    type Oracle = fn(&Individual) -> Result<Fitness, EvaluationError>;

    fn first_gene(ind: &Individual) -> Result<Fitness, EvaluationError> {
        let g = ind.genes[0];
        Ok(Fitness::new(g, g, g))
    }

    /// Conflicting objectives so fronts hold several members.
    fn tradeoff(ind: &Individual) -> Result<Fitness, EvaluationError> {
        let cost: f64 = ind.genes.iter().sum();
        let co2: f64 = ind.genes.iter().map(|g| 1.0 - g.min(1.0)).sum();
        Ok(Fitness::new(cost, co2, ind.genes[0]))
    }

    fn config(buildings: usize, initial: usize, generations: usize) -> OptimizationConfig {
        OptimizationConfig {
            layout: DistrictLayout {
                buildings,
                ..Default::default()
            },
            search: SearchConfig {
                initial_individuals: initial,
                max_generations: generations,
                checkpoint_interval: 1,
                max_time_seconds: 3600.0,
                eps_margin: None,
            },
            variation: VariationConfig::default(),
            random_seed: Some(42),
        }
    }

    fn assert_front_of(front: &[Individual], pool: &[Individual]) {
        for member in front {
            assert!(pool.iter().all(|other| !other.dominates(member)));
        }
        for candidate in pool {
            let kept = front.iter().any(|m| m.genes == candidate.genes);
            if !kept {
                assert!(front.iter().any(|m| m.dominates(candidate)));
            }
        }
    }

    #[test]
    fn test_single_generation_scenario() {
        let mut store = MemoryCheckpointStore::new();
        let mut engine =
            EvolutionEngine::new(config(1, 2, 1), first_gene as Oracle, &mut store).unwrap();
        let result = engine.run().unwrap();
        drop(engine);

        assert_eq!(result.stats.generations, 1);
        assert_eq!(result.stats.stop_reason, StopReason::MaxGenerations);

        let initial = store.load(CheckpointLabel::Initial).unwrap();
        let last = store.load(CheckpointLabel::Final).unwrap();
        assert_eq!(initial.generation, 0);
        assert_eq!(last.generation, 1);
        assert!(!last.population.is_empty());
        assert_eq!(last.eps_indicator.len(), 1);

        // Rebuild the pool the final population was selected from.
        let mut pool = initial.individuals().unwrap();
        pool.extend(last.tested_population.iter().map(|genes| {
            let probe = Individual::new(genes.clone());
            let fitness = first_gene(&probe).unwrap();
            Individual::evaluated(probe.genes, fitness)
        }));
        assert_front_of(&last.individuals().unwrap(), &pool);
    }

    #[test]
    fn test_runs_exact_generation_count() {
        let mut store = MemoryCheckpointStore::new();
        let mut engine =
            EvolutionEngine::new(config(3, 6, 4), tradeoff as Oracle, &mut store).unwrap();
        let result = engine.run().unwrap();
        drop(engine);

        assert_eq!(result.stats.generations, 4);
        assert_eq!(result.eps_indicator.len(), 4);
        assert!(!result.population.is_empty());
        for g in 1..=4 {
            assert!(store.contains(CheckpointLabel::Generation(g)));
        }
        assert!(store.contains(CheckpointLabel::Initial));
        assert!(store.contains(CheckpointLabel::Final));
    }

    #[test]
    fn test_checkpoint_interval() {
        let mut store = MemoryCheckpointStore::new();
        let mut cfg = config(2, 4, 5);
        cfg.search.checkpoint_interval = 2;
        let mut engine = EvolutionEngine::new(cfg, tradeoff as Oracle, &mut store).unwrap();
        engine.run().unwrap();
        drop(engine);

        assert!(store.contains(CheckpointLabel::Generation(2)));
        assert!(store.contains(CheckpointLabel::Generation(4)));
        assert!(!store.contains(CheckpointLabel::Generation(3)));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_population_members_are_legal_and_non_dominated() {
        let mut engine = EvolutionEngine::new(
            config(5, 8, 6),
            tradeoff as Oracle,
            MemoryCheckpointStore::new(),
        )
        .unwrap();
        let result = engine.run().unwrap();

        for member in &result.population {
            assert!(engine.space().contains(&member.genes));
            assert!(member.is_valid());
        }
        assert_front_of(&result.population, &result.population);
    }

    #[test]
    fn test_each_new_individual_evaluated_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn counting(ind: &Individual) -> Result<Fitness, EvaluationError> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            tradeoff(ind)
        }

        let mut engine = EvolutionEngine::new(
            config(2, 5, 3),
            counting as Oracle,
            MemoryCheckpointStore::new(),
        )
        .unwrap();

        let sizes = std::cell::RefCell::new(Vec::new());
        let result = engine
            .run_with_callback(|p| sizes.borrow_mut().push((p.population_size, p.evaluated)))
            .unwrap();
        let sizes = sizes.into_inner();

        // Generation 0 evaluates the initial population.
        assert_eq!(sizes[0], (5, 5));
        // Later generations evaluate 2 * floor(n / 2) + n offspring.
        for window in sizes.windows(2) {
            let parents = window[0].0;
            assert_eq!(window[1].1, 2 * (parents / 2) + parents);
        }
        let expected: usize = sizes.iter().map(|&(_, evaluated)| evaluated).sum();
        assert_eq!(CALLS.load(Ordering::SeqCst), expected);
        assert_eq!(result.stats.evaluations, expected);
    }

    #[test]
    fn test_zero_time_budget_stops_at_first_boundary() {
        let mut store = MemoryCheckpointStore::new();
        let mut cfg = config(2, 4, 50);
        cfg.search.max_time_seconds = 0.0;
        let mut engine = EvolutionEngine::new(cfg, tradeoff as Oracle, &mut store).unwrap();
        let result = engine.run().unwrap();
        drop(engine);

        assert_eq!(result.stats.generations, 0);
        assert_eq!(result.stats.stop_reason, StopReason::TimeBudget);
        assert_eq!(store.load(CheckpointLabel::Final).unwrap().generation, 0);
    }

    #[test]
    fn test_cancellation() {
        let mut engine = EvolutionEngine::new(
            config(2, 4, 100),
            tradeoff as Oracle,
            MemoryCheckpointStore::new(),
        )
        .unwrap();
        let cancel = engine.cancel_handle();

        // Cancel immediately
        cancel.store(true, Ordering::Relaxed);

        let result = engine.run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(result.stats.generations, 0);
    }

    #[test]
    fn test_converges_on_flat_front() {
        fn flat(_: &Individual) -> Result<Fitness, EvaluationError> {
            Ok(Fitness::new(1.0, 1.0, 1.0))
        }

        let mut cfg = config(1, 2, 20);
        cfg.search.eps_margin = Some(0.001);
        cfg.variation.crossover_probability = 0.0;
        let mut engine =
            EvolutionEngine::new(cfg, flat as Oracle, MemoryCheckpointStore::new()).unwrap();
        let result = engine.run().unwrap();

        assert_eq!(result.stats.stop_reason, StopReason::Converged);
        assert_eq!(result.stats.generations, 2);
        assert_eq!(result.eps_indicator, vec![0.0, 0.0]);
    }

    #[test]
    fn test_failing_oracle_does_not_abort() {
        fn broken(_: &Individual) -> Result<Fitness, EvaluationError> {
            Err(EvaluationError::Simulation("no convergence".into()))
        }

        let mut engine = EvolutionEngine::new(
            config(1, 2, 2),
            broken as Oracle,
            MemoryCheckpointStore::new(),
        )
        .unwrap();
        let result = engine.run().unwrap();

        assert_eq!(result.stats.generations, 2);
        assert_eq!(result.stats.evaluations, 0);
        assert!(result.stats.failed_evaluations > 0);
        assert!(
            result
                .population
                .iter()
                .all(|ind| ind.fitness.is_some_and(|f| f.is_penalty()))
        );
    }

    #[test]
    fn test_invalid_config_rejected_before_start() {
        let result = EvolutionEngine::new(
            config(0, 2, 1),
            first_gene as Oracle,
            MemoryCheckpointStore::new(),
        );
        assert!(matches!(
            result,
            Err(SearchError::Config(ConfigError::NoBuildings))
        ));
    }

    #[test]
    fn test_restore_is_exact() {
        let mut store = MemoryCheckpointStore::new();
        {
            let mut engine =
                EvolutionEngine::new(config(3, 6, 3), tradeoff as Oracle, &mut store).unwrap();
            engine.run().unwrap();
        }
        let saved = store.load(CheckpointLabel::Generation(2)).unwrap();

        let mut engine =
            EvolutionEngine::new(config(3, 6, 3), tradeoff as Oracle, &mut store).unwrap();
        engine.restore(CheckpointLabel::Generation(2)).unwrap();

        assert_eq!(engine.generation(), 2);
        assert_eq!(engine.population(), saved.individuals().unwrap().as_slice());
        assert_eq!(engine.network_list(), &saved.network_list);
        assert_eq!(engine.eps_history(), saved.eps_indicator.as_slice());
    }

    #[test]
    fn test_resume_continues_to_limit() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn counting(ind: &Individual) -> Result<Fitness, EvaluationError> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            tradeoff(ind)
        }

        let mut store = MemoryCheckpointStore::new();
        {
            let mut engine =
                EvolutionEngine::new(config(2, 4, 2), tradeoff as Oracle, &mut store).unwrap();
            engine.run().unwrap();
        }
        let saved = store.load(CheckpointLabel::Generation(2)).unwrap();

        let mut engine =
            EvolutionEngine::new(config(2, 4, 3), counting as Oracle, &mut store).unwrap();
        let result = engine.resume(CheckpointLabel::Generation(2)).unwrap();
        drop(engine);

        assert_eq!(result.stats.generations, 3);
        assert_eq!(result.eps_indicator.len(), 3);
        assert_eq!(&result.eps_indicator[..2], saved.eps_indicator.as_slice());
        // The restored population is not re-evaluated; only its offspring are.
        let parents = saved.population.len();
        assert_eq!(CALLS.load(Ordering::SeqCst), 2 * (parents / 2) + parents);
        assert!(store.contains(CheckpointLabel::Generation(3)));
    }

    #[test]
    fn test_infinite_objectives_checkpoint_and_resume() {
        fn unbounded_cost(ind: &Individual) -> Result<Fitness, EvaluationError> {
            let g = ind.genes[0];
            if g == 0.0 {
                Ok(Fitness::new(f64::INFINITY, 1.0, 1.0))
            } else {
                Ok(Fitness::new(g, 10.0 - g, g))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileCheckpointStore::new(dir.path()).unwrap();
            let mut engine =
                EvolutionEngine::new(config(2, 8, 3), unbounded_cost as Oracle, store).unwrap();
            let result = engine.run().unwrap();
            assert!(result.eps_indicator.iter().all(|eps| eps.is_finite()));
            assert!(
                result
                    .population
                    .iter()
                    .all(|ind| ind.fitness.is_some_and(|f| f.is_finite()))
            );
        }

        let store = FileCheckpointStore::new(dir.path()).unwrap();
        for label in [
            CheckpointLabel::Initial,
            CheckpointLabel::Generation(1),
            CheckpointLabel::Generation(2),
            CheckpointLabel::Generation(3),
            CheckpointLabel::Final,
        ] {
            let checkpoint = store.load(label).unwrap();
            assert!(checkpoint.population_fitness.iter().all(Fitness::is_finite));
        }

        let mut engine =
            EvolutionEngine::new(config(2, 8, 4), unbounded_cost as Oracle, store).unwrap();
        let result = engine.resume(CheckpointLabel::Generation(3)).unwrap();
        assert_eq!(result.stats.generations, 4);
        assert_eq!(result.eps_indicator.len(), 4);
    }

    #[test]
    fn test_resume_missing_checkpoint_fails() {
        let mut engine = EvolutionEngine::new(
            config(1, 2, 2),
            first_gene as Oracle,
            MemoryCheckpointStore::new(),
        )
        .unwrap();

        assert!(matches!(
            engine.resume(CheckpointLabel::Generation(7)),
            Err(SearchError::Checkpoint(CheckpointError::NotFound(
                CheckpointLabel::Generation(7)
            )))
        ));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let mut engine = EvolutionEngine::new(
                config(3, 6, 3),
                tradeoff as Oracle,
                MemoryCheckpointStore::new(),
            )
            .unwrap();
            engine.run().unwrap()
        };

        let a = run();
        let b = run();
        assert_eq!(a.population, b.population);
        assert_eq!(a.eps_indicator, b.eps_indicator);
    }
}
