// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Spiking Convolution Block
//!
//! Parallel [`ConvBranch`]es, one per filter width, concatenated in filter
//! order and fed as input current into one shared [`LifLayer`].
//!
//! ```text
//! (B, L, D) ─┬─ branch w=3 ─ (B, F) ─┐
//!            ├─ branch w=4 ─ (B, F) ─┼─ concat (B, n×F) ─ LIF ─ spikes (B, n×F)
//!            └─ branch w=5 ─ (B, F) ─┘
//! ```

use ndarray::{concatenate, s, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::Rng;

use crate::conv::{ConvBranch, ConvGradients};
use crate::error::{Result, SnnError};
use crate::lif::{LifLayer, LifOutput};

#[derive(Debug, Clone, PartialEq)]
pub struct BlockOutput {
    /// Concatenated max-pooled activations, the LIF input current
    pub pooled: Array2<f32>,
    pub spikes: Array2<f32>,
}

/// Gradients of the block for one step
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGradients {
    pub branches: Vec<ConvGradients>,
    pub input: Array3<f32>,
}

#[derive(Debug, Clone)]
pub struct SpikingConvBlock {
    branches: Vec<ConvBranch>,
    lif: LifLayer,
    sentence_length: usize,
    embedding_dim: usize,
}

impl SpikingConvBlock {
    /// # Errors
    /// - `SnnError::InvalidConfig` for an empty filter list, a zero width or a
    ///   zero embedding dimension
    /// - `SnnError::WindowTooWide` if a width exceeds `sentence_length`
    pub fn new<R: Rng>(
        filters: &[usize],
        filter_num: usize,
        sentence_length: usize,
        embedding_dim: usize,
        lif: LifLayer,
        rng: &mut R,
    ) -> Result<Self> {
        if embedding_dim == 0 {
            return Err(SnnError::InvalidConfig("embedding_dim must be positive".to_string()));
        }
        if filters.is_empty() || filter_num == 0 {
            return Err(SnnError::InvalidConfig(
                "at least one filter width and one filter per width are required".to_string(),
            ));
        }
        for &width in filters {
            if width == 0 {
                return Err(SnnError::InvalidConfig("filter width 0".to_string()));
            }
            if width > sentence_length {
                return Err(SnnError::WindowTooWide {
                    width,
                    sentence_length,
                });
            }
        }

        let branches = filters
            .iter()
            .map(|&width| ConvBranch::new(filter_num, width, embedding_dim, rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            branches,
            lif,
            sentence_length,
            embedding_dim,
        })
    }

    pub fn branches(&self) -> &[ConvBranch] {
        &self.branches
    }

    pub fn branches_mut(&mut self) -> &mut [ConvBranch] {
        &mut self.branches
    }

    pub fn lif(&self) -> &LifLayer {
        &self.lif
    }

    /// Width of the concatenated feature vector
    pub fn feature_dim(&self) -> usize {
        self.branches.iter().map(ConvBranch::filter_num).sum()
    }

    pub fn forward(&mut self, input: ArrayView3<'_, f32>) -> Result<BlockOutput> {
        let (batch, len, dim) = input.dim();
        if len != self.sentence_length || dim != self.embedding_dim {
            return Err(SnnError::ShapeMismatch {
                expected: vec![batch, self.sentence_length, self.embedding_dim],
                actual: vec![batch, len, dim],
            });
        }

        let pooled = self
            .branches
            .iter_mut()
            .map(|branch| branch.forward(input))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<ArrayView2<'_, f32>> = pooled.iter().map(|p| p.view()).collect();
        let pooled = concatenate(Axis(1), &views).map_err(|e| {
            SnnError::InvalidConfig(format!("cannot concatenate branch outputs: {}", e))
        })?;

        let LifOutput { spikes, .. } = self.lif.step(pooled.view());
        Ok(BlockOutput { pooled, spikes })
    }

    /// Backpropagate a gradient on the spikes `(B, feature_dim)`
    pub fn backward(&self, grad_spikes: ArrayView2<'_, f32>) -> Result<BlockGradients> {
        let grad_pooled = self.lif.backward(grad_spikes, None)?;

        let mut offset = 0;
        let mut branches = Vec::with_capacity(self.branches.len());
        let mut grad_input: Option<Array3<f32>> = None;
        for branch in &self.branches {
            let end = offset + branch.filter_num();
            let grads = branch.backward(&grad_pooled.slice(s![.., offset..end]).to_owned())?;
            match grad_input.as_mut() {
                Some(acc) => *acc += &grads.input,
                None => grad_input = Some(grads.input.clone()),
            }
            branches.push(grads);
            offset = end;
        }

        Ok(BlockGradients {
            branches,
            input: grad_input.ok_or(SnnError::NoForwardCache)?,
        })
    }

    /// Reset LIF state and drop cached activations
    pub fn reset(&mut self) {
        self.lif.reset();
        for branch in &mut self.branches {
            branch.clear_cache();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surrogate::SpikingActivation;
    use ndarray::Array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn block(filters: &[usize]) -> Result<SpikingConvBlock> {
        let mut rng = StdRng::seed_from_u64(7);
        let lif = LifLayer::new(0.95, 1.0, SpikingActivation::default())?;
        SpikingConvBlock::new(filters, 4, 6, 3, lif, &mut rng)
    }

    #[test]
    fn test_output_shape_and_binary_spikes() {
        let mut block = block(&[2, 3, 4]).unwrap();
        let input = Array::from_shape_fn((5, 6, 3), |(b, l, d)| ((b + l + d) % 3) as f32);
        let out = block.forward(input.view()).unwrap();

        assert_eq!(block.feature_dim(), 12);
        assert_eq!(out.pooled.dim(), (5, 12));
        assert_eq!(out.spikes.dim(), (5, 12));
        assert!(out.spikes.iter().all(|&s| s == 0.0 || s == 1.0));
    }

    #[test]
    fn test_branch_order_is_filter_order() {
        let mut block = block(&[2, 5]).unwrap();
        let input = Array::from_elem((1, 6, 3), 0.5);
        let out = block.forward(input.view()).unwrap();

        let mut second = block.branches()[1].clone();
        let expected = second.forward(input.view()).unwrap();
        assert_eq!(out.pooled.slice(s![.., 4..8]), expected);
    }

    #[test]
    fn test_filter_wider_than_sentence() {
        assert!(matches!(
            block(&[3, 7]),
            Err(SnnError::WindowTooWide { width: 7, sentence_length: 6 })
        ));
    }

    #[test]
    fn test_wrong_sentence_length() {
        let mut block = block(&[2]).unwrap();
        let input = Array::zeros((1, 5, 3));
        assert!(matches!(
            block.forward(input.view()),
            Err(SnnError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_backward_shapes() {
        let mut block = block(&[2, 3]).unwrap();
        let input = Array::from_elem((2, 6, 3), 0.8);
        block.forward(input.view()).unwrap();

        let grads = block.backward(Array::ones((2, 8)).view()).unwrap();
        assert_eq!(grads.branches.len(), 2);
        assert_eq!(grads.branches[0].weight.dim(), (4, 2, 3));
        assert_eq!(grads.branches[1].weight.dim(), (4, 3, 3));
        assert_eq!(grads.input.dim(), (2, 6, 3));
    }

    #[test]
    fn test_zero_embedding_dim_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        let lif = LifLayer::new(0.95, 1.0, SpikingActivation::default()).unwrap();
        assert!(matches!(
            SpikingConvBlock::new(&[2], 4, 6, 0, lif, &mut rng),
            Err(SnnError::InvalidConfig(_))
        ));
    }
}
