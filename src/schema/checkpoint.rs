//! Persisted search state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Fitness, Individual, NetworkList, SearchSpace};

/// Which snapshot of a run a checkpoint holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckpointLabel {
    /// Evaluated generation 0.
    Initial,
    /// Periodic snapshot after the given generation.
    Generation(usize),
    /// Snapshot written when the loop stops.
    Final,
}

impl CheckpointLabel {
    /// File name used by file-backed stores.
    pub fn file_name(&self) -> String {
        match self {
            Self::Initial => "checkpoint_initial.json".to_string(),
            Self::Generation(g) => format!("checkpoint_{g}.json"),
            Self::Final => "checkpoint_final.json".to_string(),
        }
    }
}

impl fmt::Display for CheckpointLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Generation(g) => write!(f, "{g}"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// Full search state needed to resume a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Last completed generation.
    pub generation: usize,
    /// Gene vectors of the current population.
    pub population: Vec<Vec<f64>>,
    /// Explored connection patterns.
    pub network_list: NetworkList,
    /// Epsilon indicator per completed generation.
    pub eps_indicator: Vec<f64>,
    /// Gene vectors evaluated during the last generation.
    pub tested_population: Vec<Vec<f64>>,
    /// Fitness of each population member, aligned by position.
    pub population_fitness: Vec<Fitness>,
}

impl Checkpoint {
    /// Snapshot an evaluated population.
    pub fn capture(
        generation: usize,
        population: &[Individual],
        network_list: &NetworkList,
        eps_indicator: &[f64],
        tested_population: &[Individual],
    ) -> Result<Self, CheckpointError> {
        let population_fitness = population
            .iter()
            .enumerate()
            .map(|(index, ind)| ind.fitness.ok_or(CheckpointError::Unevaluated { index }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            generation,
            population: population.iter().map(|ind| ind.genes.clone()).collect(),
            network_list: network_list.clone(),
            eps_indicator: eps_indicator.to_vec(),
            tested_population: tested_population
                .iter()
                .map(|ind| ind.genes.clone())
                .collect(),
            population_fitness,
        })
    }

    /// Rebuild the population with its cached fitness.
    pub fn individuals(&self) -> Result<Vec<Individual>, CheckpointError> {
        if self.population.len() != self.population_fitness.len() {
            return Err(CheckpointError::Misaligned {
                population: self.population.len(),
                fitness: self.population_fitness.len(),
            });
        }

        Ok(self
            .population
            .iter()
            .zip(&self.population_fitness)
            .map(|(genes, &fitness)| Individual::evaluated(genes.clone(), fitness))
            .collect())
    }

    /// Check that every stored gene vector fits the search space: length,
    /// bounds and discreteness.
    pub fn check_space(&self, space: &SearchSpace) -> Result<(), CheckpointError> {
        for (index, genes) in self.population.iter().enumerate() {
            if genes.len() != space.len() {
                return Err(CheckpointError::GeneCount {
                    index,
                    found: genes.len(),
                    expected: space.len(),
                });
            }
            if let Some(gene) = (0..genes.len()).find(|&i| !space.is_legal(i, genes[i])) {
                return Err(CheckpointError::IllegalGene {
                    index,
                    gene,
                    value: genes[gene],
                });
            }
        }
        Ok(())
    }
}

/// Checkpoint persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Checkpoint encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No checkpoint stored under label {0}")]
    NotFound(CheckpointLabel),
    #[error("Population member {index} has no fitness")]
    Unevaluated { index: usize },
    #[error("Population has {population} members but {fitness} fitness values")]
    Misaligned { population: usize, fitness: usize },
    #[error("Population member {index} has {found} genes, expected {expected}")]
    GeneCount {
        index: usize,
        found: usize,
        expected: usize,
    },
    #[error("Population member {index} has illegal value {value} at gene {gene}")]
    IllegalGene { index: usize, gene: usize, value: f64 },
}
