// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Surrogate Spike Activation
//!
//! The forward pass is a hard step on the membrane margin
//! `x = potential - threshold`; the backward pass substitutes a smooth
//! derivative so gradients can flow through spikes.
//!
//! ```text
//! fire(x)                   = 1 if x >= 0 else 0
//! FastSigmoid  grad(x)      = 1 / (slope * |x| + 1)^2
//! Sigmoid      grad(x)      = slope * s * (1 - s),  s = 1 / (1 + e^(-slope * x))
//! StraightThrough grad(x)   = 1
//! ```

use ndarray::{Array, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

/// Default fast-sigmoid slope
pub const DEFAULT_SLOPE: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpikingActivation {
    FastSigmoid { slope: f32 },
    Sigmoid { slope: f32 },
    StraightThrough,
}

impl Default for SpikingActivation {
    fn default() -> Self {
        SpikingActivation::FastSigmoid {
            slope: DEFAULT_SLOPE,
        }
    }
}

impl SpikingActivation {
    pub fn fast_sigmoid(slope: f32) -> Self {
        SpikingActivation::FastSigmoid { slope }
    }

    /// Heaviside step on the margin
    #[inline(always)]
    pub fn fire(&self, margin: f32) -> f32 {
        if margin >= 0.0 {
            1.0
        } else {
            0.0
        }
    }

    #[inline]
    pub fn surrogate_grad(&self, margin: f32) -> f32 {
        match *self {
            SpikingActivation::FastSigmoid { slope } => {
                let denom = slope * margin.abs() + 1.0;
                1.0 / (denom * denom)
            }
            SpikingActivation::Sigmoid { slope } => {
                let s = 1.0 / (1.0 + (-slope * margin).exp());
                slope * s * (1.0 - s)
            }
            SpikingActivation::StraightThrough => 1.0,
        }
    }

    pub fn fire_array<S, D>(&self, margin: &ArrayBase<S, D>) -> Array<f32, D>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        margin.mapv(|x| self.fire(x))
    }

    pub fn grad_array<S, D>(&self, margin: &ArrayBase<S, D>) -> Array<f32, D>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        margin.mapv(|x| self.surrogate_grad(x))
    }
}
