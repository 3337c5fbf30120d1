//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random generation, bound repair, crossover, and the three
//! mutation operators (flip, shuffle, unit perturbation).

use std::ops::Range;

use rand::prelude::*;
use rand_distr::Triangular;

use crate::schema::{Individual, SearchSpace};

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a random individual within the search space.
    pub fn random_individual(&mut self, space: &SearchSpace) -> Individual {
        let genes = (0..space.len())
            .map(|index| self.sample_gene(space, index))
            .collect();
        Individual::new(genes)
    }

    /// Uniform random legal value for one gene.
    pub fn sample_gene(&mut self, space: &SearchSpace, index: usize) -> f64 {
        let (lo, hi) = space.bounds(index);
        if space.is_discrete(index) {
            self.rng.gen_range(lo as i64..=hi as i64) as f64
        } else if lo < hi {
            self.rng.gen_range(lo..=hi)
        } else {
            lo
        }
    }

    /// Bring every gene back into its legal range.
    ///
    /// Out-of-range values are resampled uniformly inside the range rather
    /// than clamped, so solutions do not pile up on the bounds. Discrete
    /// genes are then rounded to the nearest integer.
    pub fn repair(&mut self, space: &SearchSpace, genes: &mut [f64]) {
        for (index, gene) in genes.iter_mut().enumerate() {
            let (lo, hi) = space.bounds(index);
            if !gene.is_finite() || *gene < lo || *gene > hi {
                *gene = self.sample_gene(space, index);
            } else if space.is_discrete(index) {
                *gene = gene.round();
            }
        }
    }

    /// Uniform crossover: each gene position is swapped between the two
    /// children with the given probability.
    pub fn crossover_uniform(
        &mut self,
        space: &SearchSpace,
        parent1: &Individual,
        parent2: &Individual,
        probability: f64,
    ) -> (Individual, Individual) {
        let mut child1 = parent1.offspring();
        let mut child2 = parent2.offspring();

        for (a, b) in child1.genes.iter_mut().zip(child2.genes.iter_mut()) {
            if self.rng.gen_bool(probability) {
                std::mem::swap(a, b);
            }
        }

        self.repair(space, &mut child1.genes);
        self.repair(space, &mut child2.genes);
        (child1, child2)
    }

    /// Flip mutation on the discrete prefix.
    ///
    /// Each discrete gene is, with the given probability, replaced by a
    /// different legal value drawn uniformly. Binary genes therefore toggle.
    /// Genes whose range holds a single value are left alone.
    pub fn mutate_flip(
        &mut self,
        space: &SearchSpace,
        individual: &mut Individual,
        probability: f64,
    ) {
        for index in 0..space.discrete_count() {
            if !self.rng.gen_bool(probability) {
                continue;
            }

            let (lo, hi) = space.bounds(index);
            let (lo, hi) = (lo as i64, hi as i64);
            if hi <= lo {
                continue;
            }

            let current = individual.genes[index].round() as i64;
            let mut value = self.rng.gen_range(lo..hi);
            if value >= current {
                value += 1;
            }
            individual.genes[index] = value as f64;
        }

        self.repair(space, &mut individual.genes);
        individual.fitness = None;
    }

    /// Shuffle mutation inside the on/off blocks.
    ///
    /// With the given probability, each position is swapped with another
    /// position of the same block. The number of active options per block
    /// is preserved, only which ones are active changes.
    pub fn mutate_shuffle(
        &mut self,
        space: &SearchSpace,
        individual: &mut Individual,
        probability: f64,
    ) {
        for block in space.blocks().shuffle_blocks() {
            self.shuffle_block(&mut individual.genes, block, probability);
        }

        self.repair(space, &mut individual.genes);
        individual.fitness = None;
    }

    fn shuffle_block(&mut self, genes: &mut [f64], block: Range<usize>, probability: f64) {
        if block.len() < 2 {
            return;
        }

        for index in block.clone() {
            if self.rng.gen_bool(probability) {
                let mut other = self.rng.gen_range(block.start..block.end - 1);
                if other >= index {
                    other += 1;
                }
                genes.swap(index, other);
            }
        }
    }

    /// Unit perturbation on capacity shares.
    ///
    /// Each share is, with the given probability, moved by a delta drawn
    /// from a triangular distribution on `[-sigma, sigma]` peaking at zero.
    /// Shares pushed outside their bounds are resampled by [`Self::repair`].
    pub fn mutate_unit(
        &mut self,
        space: &SearchSpace,
        individual: &mut Individual,
        probability: f64,
        sigma: f64,
    ) {
        if sigma > 0.0
            && let Ok(delta) = Triangular::new(-sigma, sigma, 0.0)
        {
            for block in space.blocks().share_blocks() {
                for index in block {
                    if self.rng.gen_bool(probability) {
                        individual.genes[index] += delta.sample(&mut self.rng);
                    }
                }
            }
        }

        self.repair(space, &mut individual.genes);
        individual.fitness = None;
    }
}
