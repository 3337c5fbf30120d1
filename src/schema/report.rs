//! Progress and result types reported by the search engine.

use serde::{Deserialize, Serialize};

use super::Individual;

/// Snapshot reported after generation 0 and after every later generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Completed generation.
    pub generation: usize,
    /// Configured generation limit.
    pub max_generations: usize,
    /// Size of the population after selection.
    pub population_size: usize,
    /// Individuals evaluated during this generation.
    pub evaluated: usize,
    /// Individuals penalized during this generation.
    pub failed: usize,
    /// Epsilon indicator of this generation (none for generation 0).
    pub eps_indicator: Option<f64>,
    /// Connection patterns explored so far.
    pub network_patterns: usize,
    /// Wall-clock seconds since the run (or resume) started.
    pub elapsed_seconds: f64,
}

/// Final result of a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Non-dominated population at termination.
    pub population: Vec<Individual>,
    /// Epsilon indicator history, one value per generation.
    pub eps_indicator: Vec<f64>,
    /// Statistics from the run.
    pub stats: SearchStats,
}

/// Statistics from a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStats {
    /// Last completed generation.
    pub generations: usize,
    /// Oracle evaluations that produced a fitness in this run.
    pub evaluations: usize,
    /// Evaluations that ended with the penalty fitness.
    pub failed_evaluations: usize,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason the search stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Wall-clock budget exhausted.
    TimeBudget,
    /// Epsilon indicator settled below the configured margin.
    Converged,
    /// User cancelled.
    Cancelled,
}
