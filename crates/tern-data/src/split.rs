//! Seeded random partitioning of a dataset.

use datafusion::arrow::array::BooleanArray;
use log::debug;
use tern_random::XorShiftRandom;

use crate::dataset::Dataset;
use crate::error::{DataError, DataResult};

/// Allowed distance between the sum of the split weights and 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Partitions the rows of `dataset` into `weights.len()` disjoint datasets.
///
/// Each row, in source order, draws one value `x` in `[0, 1)` from a
/// generator seeded with `seed` and lands in the subset `i` whose interval
/// `[w_0 + .. + w_{i-1}, w_0 + .. + w_i)` contains `x`. Subset sizes are
/// therefore only approximately proportional to the weights; no rounding
/// of row counts takes place. A zero weight always yields an empty subset.
pub fn random_split(dataset: &Dataset, weights: &[f64], seed: i64) -> DataResult<Vec<Dataset>> {
    let bounds = cumulative_bounds(weights)?;
    let mut rng = XorShiftRandom::new(seed);
    let assignment = (0..dataset.num_rows())
        .map(|_| {
            let x = rng.next_double();
            bounds
                .iter()
                .position(|(lower, upper)| *lower <= x && x < *upper)
                .unwrap_or(bounds.len() - 1)
        })
        .collect::<Vec<_>>();
    let subsets = (0..bounds.len())
        .map(|i| {
            let mask = assignment.iter().map(|a| *a == i).collect::<Vec<_>>();
            dataset.filter(&BooleanArray::from(mask))
        })
        .collect::<DataResult<Vec<_>>>()?;
    debug!(
        "split {} rows with seed {seed} into {:?}",
        dataset.num_rows(),
        subsets.iter().map(|s| s.num_rows()).collect::<Vec<_>>()
    );
    Ok(subsets)
}

/// Splits `dataset` into a training and a test subset.
pub fn train_test_split(
    dataset: &Dataset,
    weights: [f64; 2],
    seed: i64,
) -> DataResult<(Dataset, Dataset)> {
    let mut subsets = random_split(dataset, &weights, seed)?.into_iter();
    match (subsets.next(), subsets.next()) {
        (Some(train), Some(test)) => Ok((train, test)),
        _ => Err(DataError::internal("expected two subsets from the split")),
    }
}

fn cumulative_bounds(weights: &[f64]) -> DataResult<Vec<(f64, f64)>> {
    if weights.is_empty() {
        return Err(DataError::invalid("split weights must not be empty"));
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(DataError::invalid(format!(
            "split weights must be non-negative: {w}"
        )));
    }
    let sum = weights.iter().sum::<f64>();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(DataError::invalid(format!(
            "split weights must sum to 1.0, got {sum}"
        )));
    }
    let mut lower = 0.0;
    let mut bounds = weights
        .iter()
        .map(|w| {
            let upper = lower + w / sum;
            let bound = (lower, upper);
            lower = upper;
            bound
        })
        .collect::<Vec<_>>();
    // Accumulated rounding must not leave a gap below 1.0. Trailing zero
    // weights keep their empty interval.
    if let Some(last) = bounds.iter_mut().rev().find(|(lower, upper)| upper > lower) {
        last.1 = 1.0;
    }
    for bound in bounds.iter_mut() {
        bound.1 = bound.1.min(1.0);
        bound.0 = bound.0.min(bound.1);
    }
    Ok(bounds)
}
