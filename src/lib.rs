//! District Opt - Multi-objective search for district energy networks.
//!
//! This crate searches the configuration space of a district energy
//! network (which conversion technologies run, their capacity shares,
//! heat recovery, solar, and which buildings join the network) for
//! designs that trade off cost, CO2 emissions and primary energy.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, gene layout, individuals and checkpoint types
//! - `compute`: Variation operators, Pareto selection and the search loop
//!
//! Simulating a design is left to the caller through the
//! [`EvaluationOracle`](compute::evolution::EvaluationOracle) trait.
//!
//! # Example
//!
//! ```rust,no_run
//! use district_opt::{
//!     compute::evolution::{EvaluationError, MemoryCheckpointStore},
//!     schema::{Fitness, Individual, OptimizationConfig},
//!     EvolutionEngine,
//! };
//!
//! let mut config = OptimizationConfig::default();
//! config.layout.buildings = 4;
//! config.random_seed = Some(7);
//!
//! let oracle = |ind: &Individual| -> Result<Fitness, EvaluationError> {
//!     let connected: f64 = ind.genes.iter().sum();
//!     Ok(Fitness::new(connected, 1.0 / (1.0 + connected), connected.sqrt()))
//! };
//!
//! let mut engine =
//!     EvolutionEngine::new(config, oracle, MemoryCheckpointStore::new()).unwrap();
//! let result = engine.run().unwrap();
//!
//! println!("Front size after search: {}", result.population.len());
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{EvolutionEngine, SearchError};
pub use schema::{Fitness, Individual, OptimizationConfig, SearchSpace};
