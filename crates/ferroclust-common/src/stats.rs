//! Small order statistics used by the scoring functions.
//!
//! Sorting is total: NaN sorts after every number, whatever its sign bit.

use std::cmp::Ordering;

/// Ascending order with every NaN last.
pub fn nan_last_cmp(a: &f64, b: &f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.total_cmp(b),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    }
}

/// Indices that would sort `data` ascending. Stable; NaN entries come last.
pub fn argsort(data: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..data.len()).collect();
    indices.sort_by(|&a, &b| nan_last_cmp(&data[a], &data[b]));
    indices
}

/// Ascending copy of `data`, NaN entries last.
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut values = data.to_vec();
    values.sort_by(nan_last_cmp);
    values
}

/// Ascending copy of the non-NaN entries of `data`.
fn sorted_numbers(data: &[f64]) -> Vec<f64> {
    let mut values: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Quantile `q` in [0, 1] with linear interpolation between order statistics.
/// NaN entries are ignored. Returns 0.0 when no number remains.
pub fn quantile(data: &[f64], q: f64) -> f64 {
    let values = sorted_numbers(data);
    if values.is_empty() {
        return 0.0;
    }
    let q = q.clamp(0.0, 1.0);
    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let idx = q * (n - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = idx - lo as f64;
    values[lo] * (1.0 - frac) + values[hi] * frac
}

/// Mean after dropping `floor(n * trim)` values from each tail, where `n`
/// counts the non-NaN entries. Returns 0.0 when no number remains.
pub fn trim_mean(data: &[f64], trim: f64) -> f64 {
    let values = sorted_numbers(data);
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len();
    let k = ((n as f64 * trim.clamp(0.0, 0.5)).floor() as usize).min((n - 1) / 2);
    let kept = &values[k..n - k];
    kept.iter().sum::<f64>() / kept.len() as f64
}
