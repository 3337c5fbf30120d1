//! Multi-objective evolutionary search over district energy configurations.
//!
//! # Overview
//!
//! The search system consists of:
//!
//! - **Genome Operations** (`genome`): Random generation, repair, crossover and mutation
//! - **Selection** (`selection`): Pareto non-dominated filtering
//! - **Indicator** (`indicator`): Epsilon indicator between successive fronts
//! - **Oracle** (`oracle`): Pluggable network check and simulation of candidates
//! - **Checkpoints** (`checkpoint`): Stores for saving and resuming runs
//! - **Search** (`search`): The generational loop tying these together
//!
//! # Example
//!
//! ```rust,no_run
//! use district_opt::compute::evolution::{EvaluationError, EvolutionEngine, FileCheckpointStore};
//! use district_opt::schema::{Fitness, Individual, OptimizationConfig};
//!
//! let config = OptimizationConfig::default();
//! let store = FileCheckpointStore::new("checkpoints").unwrap();
//!
//! // Any `Fn(&Individual) -> Result<Fitness, EvaluationError>` is an oracle.
//! let oracle = |ind: &Individual| -> Result<Fitness, EvaluationError> {
//!     let load: f64 = ind.genes.iter().sum();
//!     Ok(Fitness::new(load, 10.0 - load, load * 0.5))
//! };
//!
//! let mut engine = EvolutionEngine::new(config, oracle, store).unwrap();
//! let result = engine
//!     .run_with_callback(|progress| {
//!         println!(
//!             "Generation {}: {} on the front",
//!             progress.generation, progress.population_size
//!         );
//!     })
//!     .unwrap();
//!
//! println!("Stopped after {} generations", result.stats.generations);
//! ```

mod checkpoint;
mod genome;
mod indicator;
mod oracle;
mod search;
mod selection;

pub use checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore, load_checkpoint};
pub use genome::GenomeRng;
pub use indicator::{eps_indicator, relative_change};
pub use oracle::{EvaluationError, EvaluationOracle, EvaluationReport, evaluate_pending};
pub use search::{EvolutionEngine, SearchError};
pub use selection::{pareto_indices, select_pareto};
