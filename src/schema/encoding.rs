//! Gene vector layout and per-gene bounds.
//!
//! An individual is a flat vector of `f64` genes split into contiguous blocks:
//!
//! | Block                      | Kind       | Range          |
//! |----------------------------|------------|----------------|
//! | technology activation      | discrete   | `0..=code_max` |
//! | heat recovery              | discrete   | `0..=1`        |
//! | solar activation           | discrete   | `0..=1`        |
//! | building connections       | discrete   | `0..=1`        |
//! | technology capacity shares | continuous | `0.0..=1.0`    |
//! | solar capacity shares      | continuous | `0.0..=1.0`    |
//!
//! All discrete blocks form a prefix of length `discrete_count`. The solar
//! share block holds one gene per solar technology plus a trailing share,
//! so evaluation models indexing it positionally see `solar + 1` genes.

use std::ops::Range;

use super::{ConfigError, DistrictLayout};

/// Index ranges of each block inside the gene vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneBlocks {
    pub technology_activation: Range<usize>,
    pub heat_recovery: Range<usize>,
    pub solar_activation: Range<usize>,
    pub connections: Range<usize>,
    pub technology_shares: Range<usize>,
    pub solar_shares: Range<usize>,
}

impl GeneBlocks {
    /// Lay out blocks back to back for the given layout.
    pub fn from_layout(layout: &DistrictLayout) -> Self {
        let mut cursor = 0;
        let mut next = |len: usize| {
            let range = cursor..cursor + len;
            cursor += len;
            range
        };

        Self {
            technology_activation: next(layout.technologies()),
            heat_recovery: next(layout.heat_recovery),
            solar_activation: next(layout.solar),
            connections: next(layout.buildings),
            technology_shares: next(layout.technologies()),
            solar_shares: next(layout.solar + 1),
        }
    }

    /// Blocks whose genes share identical bounds, so swapping positions
    /// inside them never leaves the legal range.
    pub fn shuffle_blocks(&self) -> [Range<usize>; 3] {
        [
            self.heat_recovery.clone(),
            self.solar_activation.clone(),
            self.connections.clone(),
        ]
    }

    /// Continuous capacity-share genes.
    pub fn share_blocks(&self) -> [Range<usize>; 2] {
        [self.technology_shares.clone(), self.solar_shares.clone()]
    }

    fn named(&self) -> [(&'static str, &Range<usize>); 6] {
        [
            ("technology_activation", &self.technology_activation),
            ("heat_recovery", &self.heat_recovery),
            ("solar_activation", &self.solar_activation),
            ("connections", &self.connections),
            ("technology_shares", &self.technology_shares),
            ("solar_shares", &self.solar_shares),
        ]
    }
}

/// Bounds and discreteness of every gene.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    lower: Vec<f64>,
    upper: Vec<f64>,
    discrete_count: usize,
    blocks: GeneBlocks,
}

impl SearchSpace {
    /// Derive bounds from a district layout.
    ///
    /// The layout is assumed well formed; run [`OptimizationConfig::validate`]
    /// first to reject empty building lists.
    ///
    /// [`OptimizationConfig::validate`]: super::OptimizationConfig::validate
    pub fn from_layout(layout: &DistrictLayout) -> Self {
        let blocks = GeneBlocks::from_layout(layout);
        let binary = layout.heat_recovery + layout.solar + layout.buildings;
        let shares = layout.technologies() + layout.solar + 1;

        let mut lower = Vec::with_capacity(blocks.solar_shares.end);
        let mut upper = Vec::with_capacity(blocks.solar_shares.end);

        lower.extend(std::iter::repeat_n(0.0, layout.technologies()));
        upper.extend(layout.technology_codes.iter().map(|&code| f64::from(code)));

        lower.extend(std::iter::repeat_n(0.0, binary));
        upper.extend(std::iter::repeat_n(1.0, binary));

        lower.extend(std::iter::repeat_n(0.0, shares));
        upper.extend(std::iter::repeat_n(1.0, shares));

        Self {
            lower,
            upper,
            discrete_count: blocks.connections.end,
            blocks,
        }
    }

    /// Build a search space from explicit bound vectors.
    pub fn new(
        lower: Vec<f64>,
        upper: Vec<f64>,
        discrete_count: usize,
        blocks: GeneBlocks,
    ) -> Result<Self, ConfigError> {
        if lower.len() != upper.len() {
            return Err(ConfigError::BoundLengthMismatch {
                lower: lower.len(),
                upper: upper.len(),
            });
        }
        let genes = lower.len();
        if discrete_count > genes {
            return Err(ConfigError::DiscreteCountTooLarge {
                discrete: discrete_count,
                genes,
            });
        }

        for (index, (&lo, &hi)) in lower.iter().zip(&upper).enumerate() {
            if !(lo <= hi) {
                return Err(ConfigError::InvertedBound {
                    index,
                    lower: lo,
                    upper: hi,
                });
            }
            if index < discrete_count && (lo.fract() != 0.0 || hi.fract() != 0.0) {
                return Err(ConfigError::NonIntegralBound {
                    index,
                    lower: lo,
                    upper: hi,
                });
            }
        }

        for (name, range) in blocks.named() {
            if range.start > range.end || range.end > genes {
                return Err(ConfigError::BlockOutOfRange {
                    name,
                    start: range.start,
                    end: range.end,
                    genes,
                });
            }
        }

        Ok(Self {
            lower,
            upper,
            discrete_count,
            blocks,
        })
    }

    /// Number of genes per individual.
    #[inline]
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// Check if the space has no genes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Number of leading genes that must hold integer values.
    pub fn discrete_count(&self) -> usize {
        self.discrete_count
    }

    pub fn blocks(&self) -> &GeneBlocks {
        &self.blocks
    }

    #[inline]
    pub fn is_discrete(&self, index: usize) -> bool {
        index < self.discrete_count
    }

    /// Bounds of a single gene.
    #[inline]
    pub fn bounds(&self, index: usize) -> (f64, f64) {
        (self.lower[index], self.upper[index])
    }

    /// Check whether a gene value is legal at the given index.
    pub fn is_legal(&self, index: usize, value: f64) -> bool {
        let (lo, hi) = self.bounds(index);
        (lo..=hi).contains(&value) && (!self.is_discrete(index) || value.fract() == 0.0)
    }

    /// Check a full gene vector against length, bounds and discreteness.
    pub fn contains(&self, genes: &[f64]) -> bool {
        genes.len() == self.len()
            && genes
                .iter()
                .enumerate()
                .all(|(index, &value)| self.is_legal(index, value))
    }

    /// Network-list key of a gene vector: one `'0'`/`'1'` per building.
    pub fn connection_key(&self, genes: &[f64]) -> String {
        genes[self.blocks.connections.clone()]
            .iter()
            .map(|&flag| if flag >= 0.5 { '1' } else { '0' })
            .collect()
    }

    /// Key of the network connecting every building.
    pub fn full_network_key(&self) -> String {
        "1".repeat(self.blocks.connections.len())
    }
}
