// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Convolution Branch
//!
//! One n-gram detector bank: `filter_num` kernels of shape `(width, D)` slide
//! along the sentence axis only (the embedding axis is covered in full), and
//! each kernel's response is max-pooled over every position.
//!
//! ```text
//! input (B, L, D) -> conv (B, F, L - w + 1) -> max over positions -> (B, F)
//! ```

use ndarray::{s, Array1, Array2, Array3, ArrayView3, Axis};
use rand::Rng;
use rayon::prelude::*;

use crate::error::{Result, SnnError};

/// Activations kept from the last forward pass
#[derive(Debug, Clone)]
struct ConvCache {
    input: Array3<f32>,
    argmax: Array2<usize>,
}

#[derive(Debug, Clone)]
pub struct ConvBranch {
    /// `(filter_num, width, embedding_dim)`
    weight: Array3<f32>,
    bias: Array1<f32>,
    cache: Option<ConvCache>,
}

/// Gradients of one branch
#[derive(Debug, Clone, PartialEq)]
pub struct ConvGradients {
    pub weight: Array3<f32>,
    pub bias: Array1<f32>,
    pub input: Array3<f32>,
}

impl ConvBranch {
    /// Kaiming-uniform (`a = sqrt(5)`) weights and uniform biases, both bounded by `1/sqrt(fan_in)`
    pub fn new<R: Rng>(
        filter_num: usize,
        width: usize,
        embedding_dim: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if filter_num == 0 || width == 0 || embedding_dim == 0 {
            return Err(SnnError::InvalidConfig(format!(
                "conv branch needs non-zero dimensions, got filter_num={} width={} embedding_dim={}",
                filter_num, width, embedding_dim
            )));
        }
        let bound = 1.0 / ((width * embedding_dim) as f32).sqrt();
        let weight = Array3::from_shape_fn((filter_num, width, embedding_dim), |_| {
            rng.gen_range(-bound..=bound)
        });
        let bias = Array1::from_shape_fn(filter_num, |_| rng.gen_range(-bound..=bound));
        Ok(Self {
            weight,
            bias,
            cache: None,
        })
    }

    /// # Errors
    /// `SnnError::ShapeMismatch` if the shapes disagree.
    pub fn from_parts(weight: Array3<f32>, bias: Array1<f32>) -> Result<Self> {
        if bias.len() != weight.dim().0 {
            return Err(SnnError::ShapeMismatch {
                expected: vec![weight.dim().0],
                actual: vec![bias.len()],
            });
        }
        Ok(Self {
            weight,
            bias,
            cache: None,
        })
    }

    pub fn width(&self) -> usize {
        self.weight.dim().1
    }

    pub fn filter_num(&self) -> usize {
        self.weight.dim().0
    }

    pub fn embedding_dim(&self) -> usize {
        self.weight.dim().2
    }

    /// Number of inputs feeding one output unit
    pub fn fan_in(&self) -> usize {
        self.width() * self.embedding_dim()
    }

    pub fn weight(&self) -> &Array3<f32> {
        &self.weight
    }

    pub fn weight_mut(&mut self) -> &mut Array3<f32> {
        &mut self.weight
    }

    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    /// Full convolution map `(B, F, L - w + 1)`
    pub fn feature_map(&self, input: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        let positions = self.positions(input.dim())?;
        let (batch, _, _) = input.dim();
        let mut out = Array3::zeros((batch, self.filter_num(), positions));

        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(input.axis_iter(Axis(0)).into_par_iter())
            .for_each(|(mut out_b, in_b)| {
                // (P, F) accumulated one kernel row at a time
                let mut acc = Array2::<f32>::zeros((positions, self.filter_num()));
                for k in 0..self.width() {
                    let window = in_b.slice(s![k..k + positions, ..]);
                    let kernel_row = self.weight.slice(s![.., k, ..]);
                    acc += &window.dot(&kernel_row.t());
                }
                acc += &self.bias;
                out_b.assign(&acc.t());
            });

        Ok(out)
    }

    /// Convolve and max-pool over all positions, `(B, L, D) -> (B, F)`
    pub fn forward(&mut self, input: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        let map = self.feature_map(input)?;
        let (batch, filters, _) = map.dim();

        let mut pooled = Array2::zeros((batch, filters));
        let mut argmax = Array2::zeros((batch, filters));
        for ((b, f), value) in pooled.indexed_iter_mut() {
            let (idx, max) = map
                .slice(s![b, f, ..])
                .iter()
                .copied()
                .enumerate()
                .fold((0usize, f32::NEG_INFINITY), |best, (i, v)| {
                    if v > best.1 {
                        (i, v)
                    } else {
                        best
                    }
                });
            *value = max;
            argmax[[b, f]] = idx;
        }

        self.cache = Some(ConvCache {
            input: input.to_owned(),
            argmax,
        });
        Ok(pooled)
    }

    /// Route `grad_pooled` `(B, F)` back through the max position of each kernel
    pub fn backward(&self, grad_pooled: &Array2<f32>) -> Result<ConvGradients> {
        let cache = self.cache.as_ref().ok_or(SnnError::NoForwardCache)?;
        let (batch, filters) = cache.argmax.dim();
        if grad_pooled.dim() != (batch, filters) {
            return Err(SnnError::ShapeMismatch {
                expected: vec![batch, filters],
                actual: grad_pooled.shape().to_vec(),
            });
        }

        let mut grad_weight = Array3::zeros(self.weight.raw_dim());
        let mut grad_input = Array3::zeros(cache.input.raw_dim());
        let grad_bias = grad_pooled.sum_axis(Axis(0));
        let width = self.width();

        for ((b, f), &g) in grad_pooled.indexed_iter() {
            if g == 0.0 {
                continue;
            }
            let p = cache.argmax[[b, f]];
            let window = cache.input.slice(s![b, p..p + width, ..]);
            grad_weight
                .slice_mut(s![f, .., ..])
                .scaled_add(g, &window);
            grad_input
                .slice_mut(s![b, p..p + width, ..])
                .scaled_add(g, &self.weight.slice(s![f, .., ..]));
        }

        Ok(ConvGradients {
            weight: grad_weight,
            bias: grad_bias,
            input: grad_input,
        })
    }

    pub(crate) fn clear_cache(&mut self) {
        self.cache = None;
    }

    fn positions(&self, shape: (usize, usize, usize)) -> Result<usize> {
        let (batch, sentence_length, dim) = shape;
        if dim != self.embedding_dim() {
            return Err(SnnError::ShapeMismatch {
                expected: vec![batch, sentence_length, self.embedding_dim()],
                actual: vec![batch, sentence_length, dim],
            });
        }
        if self.width() > sentence_length {
            return Err(SnnError::WindowTooWide {
                width: self.width(),
                sentence_length,
            });
        }
        Ok(sentence_length - self.width() + 1)
    }
}
