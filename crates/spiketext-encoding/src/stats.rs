// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Global vocabulary statistics
//!
//! Mean and variance are taken over the flattened set of all values in the
//! vocabulary, not per dimension. Accumulation is done in `f64`, in
//! vocabulary load order, so the same file gives bit-identical statistics.

use ndarray::Array1;
use tracing::debug;

use crate::error::{EncodingError, Result};
use crate::vocab::Vocabulary;

/// Statistics computed once per vocabulary load
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalStats {
    /// Scalar mean over all values
    pub mean: f64,
    /// Scalar population variance (ddof = 0) over all values
    pub variance: f64,
    /// Per-dimension mean vector
    pub dim_mean: Array1<f64>,
}

impl GlobalStats {
    /// Compute statistics over a vocabulary
    ///
    /// # Errors
    /// `EncodingError::DegenerateVocabulary` if the vocabulary is empty or all
    /// values are identical (zero variance).
    pub fn compute(vocab: &Vocabulary) -> Result<Self> {
        if vocab.is_empty() {
            return Err(EncodingError::DegenerateVocabulary(
                "vocabulary contains no entries".to_string(),
            ));
        }

        let count = (vocab.len() * vocab.dim()) as f64;
        let mut dim_sum = Array1::<f64>::zeros(vocab.dim());
        for (_, vector) in vocab.iter() {
            dim_sum.zip_mut_with(vector, |acc, &v| *acc += v as f64);
        }

        let mean = dim_sum.sum() / count;
        let variance = vocab
            .values()
            .map(|v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / count;
        let dim_mean = dim_sum / vocab.len() as f64;

        if !(variance > 0.0) {
            return Err(EncodingError::DegenerateVocabulary(format!(
                "global variance is {} over {} values",
                variance, count
            )));
        }

        debug!(mean, variance, tokens = vocab.len(), "Computed global embedding statistics");
        Ok(Self {
            mean,
            variance,
            dim_mean,
        })
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_vocabulary() {
        let vocab =
            Vocabulary::from_entries(2, vec![("good", vec![1.0, 1.0]), ("bad", vec![-1.0, -1.0])])
                .unwrap();
        let stats = GlobalStats::compute(&vocab).unwrap();

        assert!(stats.mean.abs() < 1e-12);
        assert!((stats.variance - 1.0).abs() < 1e-12);
        assert_eq!(stats.dim_mean.to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_per_dimension_mean() {
        let vocab =
            Vocabulary::from_entries(2, vec![("a", vec![1.0, 4.0]), ("b", vec![3.0, 0.0])]).unwrap();
        let stats = GlobalStats::compute(&vocab).unwrap();

        assert_eq!(stats.dim_mean.to_vec(), vec![2.0, 2.0]);
        assert!((stats.mean - 2.0).abs() < 1e-12);
        // values 1,4,3,0 around mean 2 -> (1 + 4 + 1 + 4) / 4
        assert!((stats.variance - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_rejected() {
        let vocab =
            Vocabulary::from_entries(2, vec![("a", vec![0.5, 0.5]), ("b", vec![0.5, 0.5])]).unwrap();
        assert!(matches!(
            GlobalStats::compute(&vocab),
            Err(EncodingError::DegenerateVocabulary(_))
        ));
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let vocab = Vocabulary::from_entries(3, Vec::<(&str, Vec<f32>)>::new()).unwrap();
        assert!(matches!(
            GlobalStats::compute(&vocab),
            Err(EncodingError::DegenerateVocabulary(_))
        ));
    }

    #[test]
    fn test_stats_are_bit_identical_across_loads() {
        let entries: Vec<(String, Vec<f32>)> = (0..200)
            .map(|i| {
                let x = i as f32 * 0.137;
                (format!("tok{}", i), vec![x.sin() * 1e3, x.cos() * 1e-3, x])
            })
            .collect();

        let first = GlobalStats::compute(&Vocabulary::from_entries(3, entries.clone()).unwrap())
            .unwrap();
        for _ in 0..5 {
            let again =
                GlobalStats::compute(&Vocabulary::from_entries(3, entries.clone()).unwrap())
                    .unwrap();
            assert_eq!(again.mean.to_bits(), first.mean.to_bits());
            assert_eq!(again.variance.to_bits(), first.variance.to_bits());
        }
    }
}
