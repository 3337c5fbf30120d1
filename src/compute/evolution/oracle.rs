//! Seam to the external energy-system simulation.
//!
//! The search core never computes objectives itself. It hands each design
//! to an [`EvaluationOracle`], which owns the scenario context (demand,
//! network layout, technology data) and returns cost, emissions and
//! primary energy.

use std::panic::{self, AssertUnwindSafe};

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::schema::{Fitness, Individual, NetworkList, SearchSpace};

/// Evaluation failure reported by an oracle.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum EvaluationError {
    #[error("Simulation failed: {0}")]
    Simulation(String),
    #[error("Network check failed for pattern {key}: {reason}")]
    Network { key: String, reason: String },
    #[error("Evaluation panicked: {0}")]
    Panicked(String),
    #[error("Evaluation returned non-finite objectives {0:?}")]
    NonFinite(Fitness),
}

/// External evaluator of candidate designs.
///
/// Implementations must be deterministic for a fixed individual and
/// scenario. `evaluate` may run on several threads at once;
/// `update_network` is always called from a single thread.
pub trait EvaluationOracle: Sync {
    /// Register the individual's connection pattern, sizing its network if
    /// the pattern has not been seen before.
    ///
    /// The default records the key without further work.
    fn update_network(
        &self,
        individual: &Individual,
        space: &SearchSpace,
        networks: &mut NetworkList,
    ) -> Result<(), EvaluationError> {
        networks.insert(space.connection_key(&individual.genes));
        Ok(())
    }

    /// Compute (cost, CO2, primary energy) for one design.
    ///
    /// Results with an infinite or NaN objective are treated as failures
    /// and penalized.
    fn evaluate(&self, individual: &Individual) -> Result<Fitness, EvaluationError>;
}

impl<F> EvaluationOracle for F
where
    F: Fn(&Individual) -> Result<Fitness, EvaluationError> + Sync,
{
    fn evaluate(&self, individual: &Individual) -> Result<Fitness, EvaluationError> {
        self(individual)
    }
}

/// Outcome counts of one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Individuals that received a real fitness.
    pub evaluated: usize,
    /// Individuals that received the penalty fitness.
    pub failed: usize,
}

/// Evaluate every individual whose fitness is missing.
///
/// Network updates run first, one at a time. The simulations then run in
/// parallel and write back into their own slot, so completion order never
/// changes which individual gets which fitness. A failing or panicking
/// evaluation only penalizes its own individual.
pub fn evaluate_pending<O: EvaluationOracle + ?Sized>(
    oracle: &O,
    space: &SearchSpace,
    networks: &mut NetworkList,
    population: &mut [Individual],
) -> EvaluationReport {
    let mut network_failures = 0;
    for individual in population.iter_mut().filter(|ind| !ind.is_valid()) {
        if let Err(err) = oracle.update_network(individual, space, networks) {
            log::warn!("Network update failed, penalizing individual: {err}");
            individual.fitness = Some(Fitness::penalty());
            network_failures += 1;
        }
    }

    let simulations = run_evaluations(oracle, population);

    EvaluationReport {
        evaluated: simulations.evaluated,
        failed: network_failures + simulations.failed,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run_evaluations<O: EvaluationOracle + ?Sized>(
    oracle: &O,
    population: &mut [Individual],
) -> EvaluationReport {
    // Parallel evaluation
    population
        .par_iter_mut()
        .filter(|ind| !ind.is_valid())
        .map(|ind| evaluate_one(oracle, ind))
        .reduce(EvaluationReport::default, merge_reports)
}

#[cfg(target_arch = "wasm32")]
fn run_evaluations<O: EvaluationOracle + ?Sized>(
    oracle: &O,
    population: &mut [Individual],
) -> EvaluationReport {
    // Sequential evaluation for WASM
    population
        .iter_mut()
        .filter(|ind| !ind.is_valid())
        .map(|ind| evaluate_one(oracle, ind))
        .fold(EvaluationReport::default(), merge_reports)
}

fn evaluate_one<O: EvaluationOracle + ?Sized>(
    oracle: &O,
    individual: &mut Individual,
) -> EvaluationReport {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| oracle.evaluate(individual)))
        .unwrap_or_else(|payload| Err(EvaluationError::Panicked(panic_message(&*payload))))
        .and_then(|fitness| {
            if fitness.is_finite() {
                Ok(fitness)
            } else {
                Err(EvaluationError::NonFinite(fitness))
            }
        });

    match outcome {
        Ok(fitness) => {
            individual.fitness = Some(fitness);
            EvaluationReport {
                evaluated: 1,
                failed: 0,
            }
        }
        Err(err) => {
            log::warn!("Evaluation failed, penalizing individual: {err}");
            individual.fitness = Some(Fitness::penalty());
            EvaluationReport {
                evaluated: 0,
                failed: 1,
            }
        }
    }
}

fn merge_reports(a: EvaluationReport, b: EvaluationReport) -> EvaluationReport {
    EvaluationReport {
        evaluated: a.evaluated + b.evaluated,
        failed: a.failed + b.failed,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
