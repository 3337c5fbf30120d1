//! Pareto selection over the combined parent and offspring pool.

use crate::schema::Individual;

/// Keep every individual not dominated by another member of the pool.
///
/// Members with identical objective values do not dominate each other, so
/// all of them survive. The survivor count is whatever the front holds;
/// the population grows or shrinks accordingly. Unevaluated members are
/// dropped.
pub fn select_pareto(pool: Vec<Individual>) -> Vec<Individual> {
    let keep: Vec<bool> = pool
        .iter()
        .map(|candidate| {
            candidate.is_valid() && !pool.iter().any(|other| other.dominates(candidate))
        })
        .collect();

    pool.into_iter()
        .zip(keep)
        .filter_map(|(individual, keep)| keep.then_some(individual))
        .collect()
}

/// Indices of the non-dominated members of `pool`.
pub fn pareto_indices(pool: &[Individual]) -> Vec<usize> {
    (0..pool.len())
        .filter(|&i| pool[i].is_valid() && !pool.iter().any(|other| other.dominates(&pool[i])))
        .collect()
}
