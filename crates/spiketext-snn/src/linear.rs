// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fully connected layer, `y = x W^T + b` with `W` stored as `(out, in)`

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use crate::error::{Result, SnnError};

#[derive(Debug, Clone)]
pub struct Linear {
    weight: Array2<f32>,
    bias: Array1<f32>,
    last_input: Option<Array2<f32>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradients {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
    pub input: Array2<f32>,
}

impl Linear {
    /// Kaiming-uniform (`a = sqrt(5)`) weights and uniform biases, both bounded by `1/sqrt(in)`
    pub fn new<R: Rng>(in_features: usize, out_features: usize, rng: &mut R) -> Result<Self> {
        if in_features == 0 || out_features == 0 {
            return Err(SnnError::InvalidConfig(format!(
                "linear layer needs non-zero dimensions, got {} -> {}",
                in_features, out_features
            )));
        }
        let bound = 1.0 / (in_features as f32).sqrt();
        let weight =
            Array2::from_shape_fn((out_features, in_features), |_| rng.gen_range(-bound..=bound));
        let bias = Array1::from_shape_fn(out_features, |_| rng.gen_range(-bound..=bound));
        Ok(Self {
            weight,
            bias,
            last_input: None,
        })
    }

    pub fn from_parts(weight: Array2<f32>, bias: Array1<f32>) -> Result<Self> {
        if bias.len() != weight.nrows() {
            return Err(SnnError::ShapeMismatch {
                expected: vec![weight.nrows()],
                actual: vec![bias.len()],
            });
        }
        Ok(Self {
            weight,
            bias,
            last_input: None,
        })
    }

    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn weight(&self) -> &Array2<f32> {
        &self.weight
    }

    pub fn weight_mut(&mut self) -> &mut Array2<f32> {
        &mut self.weight
    }

    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    pub fn forward(&mut self, input: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        if input.ncols() != self.in_features() {
            return Err(SnnError::ShapeMismatch {
                expected: vec![input.nrows(), self.in_features()],
                actual: input.shape().to_vec(),
            });
        }
        let out = input.dot(&self.weight.t()) + &self.bias;
        self.last_input = Some(input.to_owned());
        Ok(out)
    }

    pub fn backward(&self, grad_output: ArrayView2<'_, f32>) -> Result<LinearGradients> {
        let input = self.last_input.as_ref().ok_or(SnnError::NoForwardCache)?;
        if grad_output.dim() != (input.nrows(), self.out_features()) {
            return Err(SnnError::ShapeMismatch {
                expected: vec![input.nrows(), self.out_features()],
                actual: grad_output.shape().to_vec(),
            });
        }
        Ok(LinearGradients {
            weight: grad_output.t().dot(input),
            bias: grad_output.sum_axis(Axis(0)),
            input: grad_output.dot(&self.weight),
        })
    }

    pub(crate) fn clear_cache(&mut self) {
        self.last_input = None;
    }
}
