//! Feature-matrix kernels: deltas, stacking and global normalization.

use ndarray::{Array, Array2, ArrayView2, Axis, Dimension, Zip};

use crate::error::{PrepError, Result};

/// Regression-style delta over a `[frames, dims]` matrix.
///
/// Row `j` is `sum_{k=-n..=n} k * x[j + k] / (2 * sum_{i=1..=n} i^2)`, where
/// out-of-range frames repeat the first/last frame. Output has the same shape
/// as the input.
pub fn delta(features: ArrayView2<'_, f64>, n: usize) -> Result<Array2<f64>> {
    if n == 0 {
        return Err(PrepError::InvalidArgument(
            "delta window radius must be >= 1".into(),
        ));
    }
    let (n_frames, dim) = features.dim();
    if n_frames == 0 {
        return Err(PrepError::InvalidArgument(
            "delta needs at least one frame".into(),
        ));
    }

    let denom: f64 = (1..=n).map(|i| 2.0 * (i * i) as f64).sum();
    let last = n_frames - 1;

    let mut out = Array2::<f64>::zeros((n_frames, dim));
    for (j, mut row) in out.outer_iter_mut().enumerate() {
        // +k and -k taps pair up; offset 0 has zero weight.
        for k in 1..=n {
            let ahead = features.row((j + k).min(last));
            let behind = features.row(j.saturating_sub(k));
            let w = k as f64;
            Zip::from(&mut row)
                .and(&ahead)
                .and(&behind)
                .for_each(|o, &a, &b| *o += w * (a - b));
        }
        row.mapv_inplace(|v| v / denom);
    }
    Ok(out)
}

/// Concatenate matrices with the same frame count along the feature axis.
pub fn stack_columns(parts: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
    Ok(ndarray::concatenate(Axis(1), parts)?)
}

/// Scalar statistics removed by [`normalize_global`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalStats {
    pub mean: f64,
    pub std: f64,
}

/// Subtract the mean and divide by the population standard deviation of
/// *all* elements.
///
/// A zero (or non-finite) deviation leaves the centered values unscaled.
pub fn normalize_global<D: Dimension>(x: &mut Array<f64, D>) -> Option<GlobalStats> {
    let mean = x.mean()?;
    let std = x.std(0.0);
    x.mapv_inplace(|v| v - mean);
    if std > 0.0 && std.is_finite() {
        x.mapv_inplace(|v| v / std);
    }
    Some(GlobalStats { mean, std })
}
