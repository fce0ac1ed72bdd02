// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Samples, encoded samples and the in-memory tensor dataset

use ndarray::{s, Array2, Array3};
use std::ops::Range;

use crate::error::{EncodingError, Result};

/// One labeled line of a `sentence<TAB>label` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub sentence: String,
    pub label: i64,
}

impl Sample {
    pub fn new(sentence: impl Into<String>, label: i64) -> Self {
        Self {
            sentence: sentence.into(),
            label,
        }
    }
}

/// Fixed-length sequence of normalized vectors, shape `(sentence_length, embedding_dim)`
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSample {
    pub values: Array2<f32>,
    pub label: i64,
}

impl EncodedSample {
    pub fn sentence_length(&self) -> usize {
        self.values.nrows()
    }

    pub fn embedding_dim(&self) -> usize {
        self.values.ncols()
    }
}

/// Parameters that generated a dataset; also the cache key
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetKey {
    pub data_type: String,
    pub bias: f32,
    pub dataset_name: String,
    pub embedding_dim: usize,
    pub sentence_length: usize,
}

impl DatasetKey {
    /// Deterministic cache file name
    ///
    /// ```
    /// use spiketext_encoding::DatasetKey;
    ///
    /// let key = DatasetKey {
    ///     data_type: "test".into(),
    ///     bias: 3.0,
    ///     dataset_name: "sst2".into(),
    ///     embedding_dim: 100,
    ///     sentence_length: 20,
    /// };
    /// assert_eq!(key.file_name(), "new_test_u_3v_sst2_glove100d_sent_len20.tensor_dataset");
    /// ```
    pub fn file_name(&self) -> String {
        format!(
            "new_{}_u_{}v_{}_glove{}d_sent_len{}.tensor_dataset",
            self.data_type, self.bias, self.dataset_name, self.embedding_dim, self.sentence_length
        )
    }
}

/// Ordered collection of encoded samples sharing one shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorDataset {
    samples: Vec<EncodedSample>,
}

impl TensorDataset {
    /// # Errors
    /// `EncodingError::DimensionMismatch` if samples disagree on shape.
    pub fn new(samples: Vec<EncodedSample>) -> Result<Self> {
        if let Some(first) = samples.first() {
            let shape = first.values.dim();
            if let Some(bad) = samples.iter().find(|s| s.values.dim() != shape) {
                let (rows, cols) = bad.values.dim();
                return Err(EncodingError::DimensionMismatch {
                    expected: shape.0 * shape.1,
                    actual: rows * cols,
                });
            }
        }
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&EncodedSample> {
        self.samples.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EncodedSample> {
        self.samples.iter()
    }

    pub fn samples(&self) -> &[EncodedSample] {
        &self.samples
    }

    /// `(sentence_length, embedding_dim)` of every sample, `None` when empty
    pub fn sample_shape(&self) -> Option<(usize, usize)> {
        self.samples.first().map(|s| s.values.dim())
    }

    /// Stack a contiguous range of samples into a `(B, L, D)` model input
    ///
    /// The range is clamped to the dataset length.
    pub fn inputs(&self, range: Range<usize>) -> Array3<f32> {
        let range = self.clamp(range);
        let (len, dim) = self.sample_shape().unwrap_or((0, 0));
        let mut batch = Array3::zeros((range.len(), len, dim));
        for (row, sample) in self.samples[range].iter().enumerate() {
            batch.slice_mut(s![row, .., ..]).assign(&sample.values);
        }
        batch
    }

    /// Labels for the same range as [`TensorDataset::inputs`]
    pub fn labels(&self, range: Range<usize>) -> Vec<i64> {
        let range = self.clamp(range);
        self.samples[range].iter().map(|s| s.label).collect()
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end.min(self.samples.len());
        range.start.min(end)..end
    }
}

impl IntoIterator for TensorDataset {
    type Item = EncodedSample;
    type IntoIter = std::vec::IntoIter<EncodedSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fill: f32, label: i64) -> EncodedSample {
        EncodedSample {
            values: Array2::from_elem((3, 2), fill),
            label,
        }
    }

    #[test]
    fn test_inputs_stack_in_order() {
        let dataset = TensorDataset::new(vec![sample(0.1, 0), sample(0.2, 1), sample(0.3, 1)]).unwrap();
        let batch = dataset.inputs(1..3);

        assert_eq!(batch.dim(), (2, 3, 2));
        assert_eq!(batch[[0, 0, 0]], 0.2);
        assert_eq!(batch[[1, 2, 1]], 0.3);
        assert_eq!(dataset.labels(1..3), vec![1, 1]);
    }

    #[test]
    fn test_range_is_clamped() {
        let dataset = TensorDataset::new(vec![sample(0.1, 0)]).unwrap();
        assert_eq!(dataset.inputs(0..10).dim(), (1, 3, 2));
        assert_eq!(dataset.inputs(5..10).dim(), (0, 3, 2));
    }

    #[test]
    fn test_mixed_shapes_rejected() {
        let odd = EncodedSample {
            values: Array2::zeros((4, 2)),
            label: 0,
        };
        assert!(TensorDataset::new(vec![sample(0.0, 0), odd]).is_err());
    }
}
