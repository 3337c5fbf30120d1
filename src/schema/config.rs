//! Configuration types for district energy optimization runs.

use serde::{Deserialize, Serialize};

/// Top-level optimization configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// District layout the gene vector is derived from.
    pub layout: DistrictLayout,
    /// Population, generation and stopping settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Crossover and mutation settings.
    #[serde(default)]
    pub variation: VariationConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Technologies and buildings available to the district network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictLayout {
    /// Highest activation code of each conversion technology.
    /// Code 0 means the technology is not installed.
    #[serde(default = "default_technology_codes")]
    pub technology_codes: Vec<u32>,
    /// Number of heat-recovery options (on/off).
    #[serde(default = "default_heat_recovery")]
    pub heat_recovery: usize,
    /// Number of solar technologies (on/off each, plus `solar + 1` capacity shares).
    #[serde(default = "default_solar")]
    pub solar: usize,
    /// Number of buildings that may be connected to the network.
    pub buildings: usize,
}

impl Default for DistrictLayout {
    fn default() -> Self {
        Self {
            technology_codes: default_technology_codes(),
            heat_recovery: default_heat_recovery(),
            solar: default_solar(),
            buildings: 1,
        }
    }
}

impl DistrictLayout {
    /// Number of conversion technologies.
    #[inline]
    pub fn technologies(&self) -> usize {
        self.technology_codes.len()
    }
}

fn default_technology_codes() -> Vec<u32> {
    vec![4, 2, 2, 1, 1, 1]
}
fn default_heat_recovery() -> usize {
    2
}
fn default_solar() -> usize {
    3
}

/// Population and stopping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of individuals generated for generation 0.
    #[serde(default = "default_initial_individuals")]
    pub initial_individuals: usize,
    /// Maximum number of generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Save a checkpoint every N generations.
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,
    /// Wall-clock budget in seconds, checked at generation boundaries.
    #[serde(default = "default_max_time_seconds")]
    pub max_time_seconds: f64,
    /// Stop once the relative change of the epsilon indicator drops below
    /// this margin. Disabled when `None`.
    #[serde(default)]
    pub eps_margin: Option<f64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            initial_individuals: default_initial_individuals(),
            max_generations: default_max_generations(),
            checkpoint_interval: default_checkpoint_interval(),
            max_time_seconds: default_max_time_seconds(),
            eps_margin: None,
        }
    }
}

fn default_initial_individuals() -> usize {
    2
}
fn default_max_generations() -> usize {
    5
}
fn default_checkpoint_interval() -> usize {
    1
}
fn default_max_time_seconds() -> f64 {
    7.0 * 24.0 * 3600.0
}

/// Variation operator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationConfig {
    /// Per-gene swap probability of uniform crossover (0.0-1.0).
    #[serde(default = "default_crossover_probability")]
    pub crossover_probability: f64,
    /// Per-gene mutation probability (0.0-1.0).
    #[serde(default = "default_mutation_probability")]
    pub mutation_probability: f64,
    /// Half-width of the unit perturbation applied to capacity shares.
    #[serde(default = "default_mutation_sigma")]
    pub mutation_sigma: f64,
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            crossover_probability: default_crossover_probability(),
            mutation_probability: default_mutation_probability(),
            mutation_sigma: default_mutation_sigma(),
        }
    }
}

fn default_crossover_probability() -> f64 {
    0.5
}
fn default_mutation_probability() -> f64 {
    0.5
}
fn default_mutation_sigma() -> f64 {
    0.2
}

impl OptimizationConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.buildings == 0 {
            return Err(ConfigError::NoBuildings);
        }
        if self.search.initial_individuals == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.search.checkpoint_interval == 0 {
            return Err(ConfigError::InvalidCheckpointInterval);
        }
        if !self.search.max_time_seconds.is_finite() || self.search.max_time_seconds < 0.0 {
            return Err(ConfigError::InvalidTimeBudget(self.search.max_time_seconds));
        }
        if let Some(margin) = self.search.eps_margin
            && !(margin.is_finite() && margin >= 0.0)
        {
            return Err(ConfigError::InvalidEpsMargin(margin));
        }

        let check_probability = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidProbability { name, value })
            }
        };
        check_probability(self.variation.crossover_probability, "crossover_probability")?;
        check_probability(self.variation.mutation_probability, "mutation_probability")?;

        if !self.variation.mutation_sigma.is_finite() || self.variation.mutation_sigma < 0.0 {
            return Err(ConfigError::InvalidSigma(self.variation.mutation_sigma));
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Layout must contain at least one building")]
    NoBuildings,
    #[error("Initial population must contain at least one individual")]
    EmptyPopulation,
    #[error("Checkpoint interval must be non-zero")]
    InvalidCheckpointInterval,
    #[error("Time budget must be finite and non-negative, got {0}")]
    InvalidTimeBudget(f64),
    #[error("Epsilon margin must be finite and non-negative, got {0}")]
    InvalidEpsMargin(f64),
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("Mutation sigma must be finite and non-negative, got {0}")]
    InvalidSigma(f64),
    #[error("Bound vectors differ in length: lower={lower}, upper={upper}")]
    BoundLengthMismatch { lower: usize, upper: usize },
    #[error("Gene {index}: lower bound {lower} exceeds upper bound {upper}")]
    InvertedBound { index: usize, lower: f64, upper: f64 },
    #[error("Gene {index} is discrete but has non-integral bounds [{lower}, {upper}]")]
    NonIntegralBound { index: usize, lower: f64, upper: f64 },
    #[error("Discrete gene count {discrete} exceeds gene count {genes}")]
    DiscreteCountTooLarge { discrete: usize, genes: usize },
    #[error("Gene block {name} ({start}..{end}) lies outside the {genes} genes")]
    BlockOutOfRange {
        name: &'static str,
        start: usize,
        end: usize,
        genes: usize,
    },
}
