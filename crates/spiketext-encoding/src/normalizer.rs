// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Embedding Normalizer
//!
//! Maps unbounded raw embedding values into `[0, 1]` for spike encoding.
//!
//! ```text
//! left  = mean - bias * std
//! right = mean + bias * std
//!
//! v = +bias               if x >= right
//!     -bias               if x <= left
//!     (x - mean) / std    otherwise
//!
//! out = (v + |bias|) / (2 * bias)
//! ```
//!
//! Saturation is decided on the raw value, so a raw value sitting exactly on
//! a boundary maps to exactly `0.0` or `1.0`.

use ndarray::{Array1, ArrayView1};

use crate::error::{EncodingError, Result};
use crate::stats::GlobalStats;

/// Default clipping width, in standard deviations
pub const DEFAULT_BIAS: f32 = 3.0;

/// Pure normalization function bound to fixed statistics and bias
#[derive(Debug, Clone)]
pub struct EmbeddingNormalizer {
    stats: GlobalStats,
    dim: usize,
    bias: f64,
    std_dev: f64,
    left_boundary: f64,
    right_boundary: f64,
    zero_fallback: Array1<f32>,
}

impl EmbeddingNormalizer {
    /// # Errors
    /// - `EncodingError::DegenerateVocabulary` if `stats.variance` is not positive
    /// - `EncodingError::InvalidBias` if `bias` is not a positive finite number
    pub fn new(stats: GlobalStats, dim: usize, bias: f32) -> Result<Self> {
        if !(stats.variance > 0.0) || !stats.variance.is_finite() {
            return Err(EncodingError::DegenerateVocabulary(format!(
                "cannot normalize with variance {}",
                stats.variance
            )));
        }
        if !(bias.is_finite() && bias > 0.0) {
            return Err(EncodingError::InvalidBias(bias));
        }

        let bias = bias as f64;
        let std_dev = stats.std_dev();
        let mut normalizer = Self {
            left_boundary: stats.mean - bias * std_dev,
            right_boundary: stats.mean + bias * std_dev,
            stats,
            dim,
            bias,
            std_dev,
            zero_fallback: Array1::zeros(dim),
        };
        normalizer.zero_fallback = normalizer.transform(Array1::<f32>::zeros(dim).view());
        Ok(normalizer)
    }

    /// Normalize one raw vector
    ///
    /// # Errors
    /// `EncodingError::DimensionMismatch` if `raw` is not `dim` long.
    pub fn normalize(&self, raw: ArrayView1<'_, f32>) -> Result<Array1<f32>> {
        if raw.len() != self.dim {
            return Err(EncodingError::DimensionMismatch {
                expected: self.dim,
                actual: raw.len(),
            });
        }
        Ok(self.transform(raw))
    }

    /// Caller guarantees `raw.len() == self.dim()`
    pub(crate) fn transform(&self, raw: ArrayView1<'_, f32>) -> Array1<f32> {
        raw.mapv(|x| self.normalize_value(x))
    }

    /// Normalize a single raw scalar
    #[inline]
    pub fn normalize_value(&self, x: f32) -> f32 {
        let x = x as f64;
        let clipped = if x >= self.right_boundary {
            self.bias
        } else if x <= self.left_boundary {
            -self.bias
        } else {
            (x - self.stats.mean) / self.std_dev
        };
        ((clipped + self.bias.abs()) / (2.0 * self.bias)) as f32
    }

    /// Normalized all-zeros vector, used for unknown tokens and padding
    pub fn zero_fallback(&self) -> &Array1<f32> {
        &self.zero_fallback
    }

    /// `(left, right)` raw-value saturation boundaries
    pub fn boundaries(&self) -> (f64, f64) {
        (self.left_boundary, self.right_boundary)
    }

    pub fn stats(&self) -> &GlobalStats {
        &self.stats
    }

    pub fn bias(&self) -> f32 {
        self.bias as f32
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}
