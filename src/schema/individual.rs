//! Candidate designs and their objective values.

use serde::{Deserialize, Serialize};

/// Objective values of an evaluated design. All three are minimized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fitness {
    /// Life-cycle cost.
    pub cost: f64,
    /// Greenhouse-gas emissions.
    pub co2: f64,
    /// Primary-energy use.
    pub primary_energy: f64,
}

impl Fitness {
    pub fn new(cost: f64, co2: f64, primary_energy: f64) -> Self {
        Self {
            cost,
            co2,
            primary_energy,
        }
    }

    /// Worst-case fitness assigned to designs whose evaluation failed.
    /// Dominated by every successfully evaluated design.
    pub fn penalty() -> Self {
        Self::new(f64::MAX, f64::MAX, f64::MAX)
    }

    pub fn is_penalty(&self) -> bool {
        *self == Self::penalty()
    }

    /// Whether every objective is a finite number.
    pub fn is_finite(&self) -> bool {
        self.objectives().iter().all(|value| value.is_finite())
    }

    /// Objectives as an array, in (cost, CO2, primary energy) order.
    #[inline]
    pub fn objectives(&self) -> [f64; 3] {
        [self.cost, self.co2, self.primary_energy]
    }

    /// Pareto dominance: no worse in every objective, strictly better in one.
    pub fn dominates(&self, other: &Fitness) -> bool {
        let mut strictly_better = false;
        for (a, b) in self.objectives().into_iter().zip(other.objectives()) {
            if a > b {
                return false;
            }
            if a < b {
                strictly_better = true;
            }
        }
        strictly_better
    }
}

impl From<(f64, f64, f64)> for Fitness {
    fn from((cost, co2, primary_energy): (f64, f64, f64)) -> Self {
        Self::new(cost, co2, primary_energy)
    }
}

/// A candidate design: gene vector plus cached fitness.
///
/// `fitness == None` means the design must be (re-)evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub genes: Vec<f64>,
    pub fitness: Option<Fitness>,
}

impl Individual {
    /// Create an unevaluated individual.
    pub fn new(genes: Vec<f64>) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }

    /// Create an individual with known fitness.
    pub fn evaluated(genes: Vec<f64>, fitness: Fitness) -> Self {
        Self {
            genes,
            fitness: Some(fitness),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.fitness.is_some()
    }

    /// Copy the genes into a fresh, unevaluated individual.
    pub fn offspring(&self) -> Self {
        Self::new(self.genes.clone())
    }

    /// Dominance on cached fitness; unevaluated individuals never dominate
    /// and are never dominated.
    pub fn dominates(&self, other: &Individual) -> bool {
        match (&self.fitness, &other.fitness) {
            (Some(a), Some(b)) => a.dominates(b),
            _ => false,
        }
    }
}
