//! Compute module - Search algorithms over district configurations.

pub mod evolution;

pub use evolution::{EvolutionEngine, SearchError};
