//! Joint, weighted quantile normalisation of score matrices.
//!
//! All matrices are mapped onto one reference distribution: the weighted mean
//! of their sorted values. Each entry is then replaced by the reference value
//! at its rank, so every output matrix has the same value distribution while
//! keeping its own ordering.

use ferroclust_common::error::{FerroclustError, Result};
use ferroclust_common::matrix::ScoreMatrix;
use ferroclust_common::stats::{argsort, sorted};

/// Normalise `matrices` jointly. `weights[i]` is the blend weight of
/// `matrices[i]`; when all weights are zero every matrix counts equally.
/// Ranks are ordinal: ties keep their original order. NaN entries stay NaN;
/// a matrix with missing values contributes its observed distribution,
/// stretched over all ranks, so the reference stays monotone.
pub fn quantile_normalize_scores(matrices: &[&ScoreMatrix], weights: &[f64]) -> Result<Vec<ScoreMatrix>> {
    if matrices.len() != weights.len() {
        return Err(FerroclustError::ShapeMismatch {
            expected: format!("{} weights", matrices.len()),
            found: format!("{} weights", weights.len()),
        });
    }
    let Some(first) = matrices.first() else {
        return Ok(Vec::new());
    };
    if let Some(bad) = matrices.iter().find(|m| m.shape() != first.shape()) {
        return Err(FerroclustError::shape(first.shape(), bad.shape()));
    }

    let weight_sum: f64 = weights.iter().sum();
    let weights: Vec<f64> = if weight_sum == 0.0 {
        vec![1.0 / matrices.len() as f64; matrices.len()]
    } else {
        weights.iter().map(|w| w / weight_sum).collect()
    };

    let n = first.values().len();
    let resampled: Vec<Option<Vec<f64>>> = matrices.iter().map(|m| resample(m.values(), n)).collect();
    let reference: Vec<f64> = (0..n)
        .map(|rank| reference_at(rank, &resampled, &weights))
        .collect();

    matrices
        .iter()
        .map(|matrix| {
            let values = matrix.values();
            let count = values.iter().filter(|v| !v.is_nan()).count();
            let mut normalized = vec![f64::NAN; n];
            for (rank, index) in argsort(values).into_iter().take(count).enumerate() {
                normalized[index] = interpolate(&reference, scaled_rank(rank, count, n));
            }
            matrix.with_values(normalized)
        })
        .collect()
}

/// Non-NaN values of `values`, sorted and stretched to `n` evenly spaced
/// quantiles. `None` when there is no number at all.
fn resample(values: &[f64], n: usize) -> Option<Vec<f64>> {
    let numbers: Vec<f64> = sorted(values).into_iter().filter(|v| !v.is_nan()).collect();
    if numbers.is_empty() {
        return None;
    }
    if numbers.len() == n {
        return Some(numbers);
    }
    Some(
        (0..n)
            .map(|rank| interpolate(&numbers, scaled_rank(rank, n, numbers.len())))
            .collect(),
    )
}

/// Position of `rank` out of `from` ranks on a scale of `to` ranks.
fn scaled_rank(rank: usize, from: usize, to: usize) -> f64 {
    if from <= 1 {
        return 0.0;
    }
    rank as f64 * (to - 1) as f64 / (from - 1) as f64
}

/// Linear interpolation of a sorted slice at a fractional index.
fn interpolate(values: &[f64], position: f64) -> f64 {
    let lo = (position.floor() as usize).min(values.len() - 1);
    let frac = position - lo as f64;
    if frac <= 0.0 || lo + 1 >= values.len() {
        return values[lo];
    }
    values[lo] * (1.0 - frac) + values[lo + 1] * frac
}

/// Weighted mean at `rank` over the matrices that hold any number.
fn reference_at(rank: usize, resampled: &[Option<Vec<f64>>], weights: &[f64]) -> f64 {
    let present: Vec<(f64, f64)> = resampled
        .iter()
        .zip(weights)
        .filter_map(|(values, &weight)| values.as_ref().map(|v| (v[rank], weight)))
        .collect();
    if present.is_empty() {
        return f64::NAN;
    }
    let weight_sum: f64 = present.iter().map(|(_, w)| w).sum();
    if weight_sum == 0.0 {
        return present.iter().map(|(v, _)| v).sum::<f64>() / present.len() as f64;
    }
    present.iter().map(|(v, w)| v * w).sum::<f64>() / weight_sum
}
