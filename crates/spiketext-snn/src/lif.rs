// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # LIF (Leaky Integrate-and-Fire) Layer
//!
//! A batch of LIF units with owned membrane state.
//!
//! ## Model Dynamics
//!
//! ```text
//! Membrane Potential Update (one call = one time step):
//!     Subtract: V(t+1) = beta × V(t) + I - threshold × S(t)
//!     Zero:     V(t+1) = beta × V(t) × (1 - S(t)) + I
//!     None:     V(t+1) = beta × V(t) + I
//!
//!     Where:
//!     - beta = decay factor (0-1)
//!     - I = input current for this step
//!     - S(t) = spike emitted on the previous step (detached)
//!
//! Firing Check:
//!     S(t+1) = 1 if V(t+1) ≥ threshold else 0
//! ```
//!
//! State persists across calls until [`LifLayer::reset`] or until a batch of
//! a different shape arrives, which starts again from zero potential.

use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SnnError};
use crate::surrogate::SpikingActivation;

/// Default firing threshold
pub const DEFAULT_THRESHOLD: f32 = 1.0;

/// How the potential is reduced after a spike
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetMechanism {
    #[default]
    Subtract,
    Zero,
    None,
}

/// Spikes and membrane potential after one step
#[derive(Debug, Clone, PartialEq)]
pub struct LifOutput {
    pub spikes: Array2<f32>,
    pub membrane: Array2<f32>,
}

#[derive(Debug, Clone)]
pub struct LifLayer {
    beta: f32,
    threshold: f32,
    activation: SpikingActivation,
    reset_mechanism: ResetMechanism,
    potential: Array2<f32>,
    spikes: Array2<f32>,
    /// `potential - threshold` of the last step, kept for backward
    last_margin: Option<Array2<f32>>,
}

impl LifLayer {
    /// # Errors
    /// `SnnError::InvalidConfig` if `beta` is outside `[0, 1]` or `threshold` is not positive.
    pub fn new(beta: f32, threshold: f32, activation: SpikingActivation) -> Result<Self> {
        if !(0.0..=1.0).contains(&beta) {
            return Err(SnnError::InvalidConfig(format!(
                "beta must be within [0, 1], got {}",
                beta
            )));
        }
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(SnnError::InvalidConfig(format!(
                "threshold must be positive, got {}",
                threshold
            )));
        }
        Ok(Self {
            beta,
            threshold,
            activation,
            reset_mechanism: ResetMechanism::default(),
            potential: Array2::zeros((0, 0)),
            spikes: Array2::zeros((0, 0)),
            last_margin: None,
        })
    }

    pub fn with_reset_mechanism(mut self, reset_mechanism: ResetMechanism) -> Self {
        self.reset_mechanism = reset_mechanism;
        self
    }

    /// Advance every unit by one step
    pub fn step(&mut self, input: ArrayView2<'_, f32>) -> LifOutput {
        if self.potential.dim() != input.dim() {
            self.potential = Array2::zeros(input.dim());
            self.spikes = Array2::zeros(input.dim());
        }

        let beta = self.beta;
        let threshold = self.threshold;
        match self.reset_mechanism {
            ResetMechanism::Subtract => {
                Zip::from(&mut self.potential)
                    .and(&input)
                    .and(&self.spikes)
                    .for_each(|v, &i, &s| *v = beta * *v + i - threshold * s);
            }
            ResetMechanism::Zero => {
                Zip::from(&mut self.potential)
                    .and(&input)
                    .and(&self.spikes)
                    .for_each(|v, &i, &s| *v = beta * *v * (1.0 - s) + i);
            }
            ResetMechanism::None => {
                Zip::from(&mut self.potential)
                    .and(&input)
                    .for_each(|v, &i| *v = beta * *v + i);
            }
        }

        let margin = self.potential.mapv(|v| v - threshold);
        self.spikes = self.activation.fire_array(&margin);
        self.last_margin = Some(margin);

        LifOutput {
            spikes: self.spikes.clone(),
            membrane: self.potential.clone(),
        }
    }

    /// Gradient with respect to the last step's input
    ///
    /// `grad_spikes` flows through the surrogate; `grad_membrane`, when given,
    /// flows straight through since `dV/dI = 1`. Earlier steps are not reached.
    pub fn backward(
        &self,
        grad_spikes: ArrayView2<'_, f32>,
        grad_membrane: Option<ArrayView2<'_, f32>>,
    ) -> Result<Array2<f32>> {
        let margin = self.last_margin.as_ref().ok_or(SnnError::NoForwardCache)?;
        check_dim(margin.dim(), grad_spikes.dim())?;

        let mut grad = self.activation.grad_array(margin) * &grad_spikes;
        if let Some(grad_membrane) = grad_membrane {
            check_dim(margin.dim(), grad_membrane.dim())?;
            grad += &grad_membrane;
        }
        Ok(grad)
    }

    /// Zero the membrane potential and forget the previous spikes
    pub fn reset(&mut self) {
        self.potential.fill(0.0);
        self.spikes.fill(0.0);
        self.last_margin = None;
    }

    pub fn potential(&self) -> &Array2<f32> {
        &self.potential
    }

    pub fn beta(&self) -> f32 {
        self.beta
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn activation(&self) -> SpikingActivation {
        self.activation
    }

    pub fn reset_mechanism(&self) -> ResetMechanism {
        self.reset_mechanism
    }
}

fn check_dim(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        return Err(SnnError::ShapeMismatch {
            expected: vec![expected.0, expected.1],
            actual: vec![actual.0, actual.1],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn layer(beta: f32) -> LifLayer {
        LifLayer::new(beta, DEFAULT_THRESHOLD, SpikingActivation::default()).unwrap()
    }

    #[test]
    fn test_integrates_until_threshold() {
        let mut lif = layer(0.5);
        let input = array![[0.6]];

        let out = lif.step(input.view());
        assert_eq!(out.spikes[[0, 0]], 0.0);
        assert!((out.membrane[[0, 0]] - 0.6).abs() < 1e-6);

        // 0.5 * 0.6 + 0.6 = 0.9
        let out = lif.step(input.view());
        assert_eq!(out.spikes[[0, 0]], 0.0);

        // 0.5 * 0.9 + 0.6 = 1.05
        let out = lif.step(input.view());
        assert_eq!(out.spikes[[0, 0]], 1.0);
    }

    #[test]
    fn test_fires_exactly_at_threshold() {
        let mut lif = layer(0.9);
        let out = lif.step(array![[1.0, 0.999]].view());
        assert_eq!(out.spikes, array![[1.0, 0.0]]);
    }

    #[test]
    fn test_subtract_reset() {
        let mut lif = layer(1.0);
        lif.step(array![[1.5]].view());
        // 1.5 + 0.0 - 1.0
        let out = lif.step(array![[0.0]].view());
        assert!((out.membrane[[0, 0]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_reset() {
        let mut lif = layer(1.0).with_reset_mechanism(ResetMechanism::Zero);
        lif.step(array![[1.5]].view());
        let out = lif.step(array![[0.25]].view());
        assert!((out.membrane[[0, 0]] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_shape_change_reinitializes() {
        let mut lif = layer(1.0);
        lif.step(array![[0.7, 0.7]].view());
        let out = lif.step(array![[0.7], [0.7]].view());
        assert_eq!(out.membrane, array![[0.7], [0.7]]);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut lif = layer(1.0);
        lif.step(array![[0.7]].view());
        lif.reset();
        assert_eq!(lif.potential()[[0, 0]], 0.0);
        assert!(matches!(
            lif.backward(array![[1.0]].view(), None),
            Err(SnnError::NoForwardCache)
        ));
    }

    #[test]
    fn test_backward_uses_surrogate_and_membrane_path() {
        let mut lif = layer(0.0);
        lif.step(array![[1.0, 1.04]].view());
        let grad = lif
            .backward(array![[1.0, 1.0]].view(), Some(array![[0.5, 0.0]].view()))
            .unwrap();
        assert!((grad[[0, 0]] - 1.5).abs() < 1e-6);
        assert!((grad[[0, 1]] - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(LifLayer::new(1.5, 1.0, SpikingActivation::default()).is_err());
        assert!(LifLayer::new(0.5, 0.0, SpikingActivation::default()).is_err());
    }
}
