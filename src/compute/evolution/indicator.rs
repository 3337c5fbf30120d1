//! Epsilon indicator between successive Pareto fronts.

use crate::schema::Individual;

/// Additive epsilon indicator `I(previous, current)`.
///
/// Objectives are normalized to `[0, 1]` over the union of both fronts,
/// then the indicator is the smallest shift that lets `previous` weakly
/// dominate every member of `current`:
///
/// ```text
/// I = max_{c in current} min_{p in previous} max_k (p_k - c_k)
/// ```
///
/// Positive values mean the new front moved past the old one; zero means
/// no progress. Unevaluated, penalized and non-finite members are ignored,
/// and `0.0` is returned when either side has nothing left to compare.
pub fn eps_indicator(previous: &[Individual], current: &[Individual]) -> f64 {
    let previous = objective_points(previous);
    let current = objective_points(current);
    if previous.is_empty() || current.is_empty() {
        return 0.0;
    }

    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for point in previous.iter().chain(&current) {
        for k in 0..3 {
            min[k] = min[k].min(point[k]);
            max[k] = max[k].max(point[k]);
        }
    }
    let span: [f64; 3] = std::array::from_fn(|k| {
        let span = max[k] - min[k];
        if span > 0.0 { span } else { 1.0 }
    });
    let normalize = |point: &[f64; 3]| -> [f64; 3] {
        std::array::from_fn(|k| (point[k] - min[k]) / span[k])
    };

    let previous: Vec<[f64; 3]> = previous.iter().map(normalize).collect();
    let current: Vec<[f64; 3]> = current.iter().map(normalize).collect();

    current
        .iter()
        .map(|c| {
            previous
                .iter()
                .map(|p| (0..3).map(|k| p[k] - c[k]).fold(f64::NEG_INFINITY, f64::max))
                .fold(f64::INFINITY, f64::min)
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Relative change between the last two indicator values.
///
/// Returns `None` until two values exist, or when the change is undefined
/// (previous value zero, current value non-zero).
pub fn relative_change(history: &[f64]) -> Option<f64> {
    let [.., previous, last] = history else {
        return None;
    };

    if *previous == 0.0 {
        return (*last == 0.0).then_some(0.0);
    }
    Some(((last - previous) / previous).abs())
}

fn objective_points(front: &[Individual]) -> Vec<[f64; 3]> {
    front
        .iter()
        .filter_map(|ind| ind.fitness)
        .filter(|f| f.is_finite() && !f.is_penalty())
        .map(|f| f.objectives())
        .collect()
}
