// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Output stage: linear projection to `label_num` currents, then a LIF layer
//! exposing both its spikes and its membrane potential.

use ndarray::{Array2, ArrayView2};
use rand::Rng;

use crate::error::Result;
use crate::lif::{LifLayer, LifOutput};
use crate::linear::{Linear, LinearGradients};

#[derive(Debug, Clone)]
pub struct OutputSpikeLayer {
    linear: Linear,
    lif: LifLayer,
}

impl OutputSpikeLayer {
    /// # Errors
    /// `SnnError::InvalidConfig` if `in_features` or `label_num` is zero.
    pub fn new<R: Rng>(
        in_features: usize,
        label_num: usize,
        lif: LifLayer,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Self {
            linear: Linear::new(in_features, label_num, rng)?,
            lif,
        })
    }

    pub fn linear(&self) -> &Linear {
        &self.linear
    }

    pub fn linear_mut(&mut self) -> &mut Linear {
        &mut self.linear
    }

    pub fn lif(&self) -> &LifLayer {
        &self.lif
    }

    /// `(B, in_features)` spikes to `(B, label_num)` spikes and membrane potential
    pub fn forward(&mut self, spikes: ArrayView2<'_, f32>) -> Result<LifOutput> {
        let current = self.linear.forward(spikes)?;
        Ok(self.lif.step(current.view()))
    }

    pub fn backward(
        &self,
        grad_spikes: ArrayView2<'_, f32>,
        grad_membrane: ArrayView2<'_, f32>,
    ) -> Result<LinearGradients> {
        let grad_current: Array2<f32> = self.lif.backward(grad_spikes, Some(grad_membrane))?;
        self.linear.backward(grad_current.view())
    }

    pub fn reset(&mut self) {
        self.lif.reset();
        self.linear.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surrogate::SpikingActivation;
    use ndarray::array;

    #[test]
    fn test_membrane_tracks_linear_current() {
        let lif = LifLayer::new(0.5, 1.0, SpikingActivation::default()).unwrap();
        let mut layer = OutputSpikeLayer {
            linear: Linear::from_parts(array![[1.0, 1.0], [0.0, 0.25]], array![0.0, 0.0]).unwrap(),
            lif,
        };

        let out = layer.forward(array![[1.0, 1.0]].view()).unwrap();
        assert_eq!(out.membrane, array![[2.0, 0.25]]);
        assert_eq!(out.spikes, array![[1.0, 0.0]]);

        // 0.5 * 2.0 + 2.0 - 1.0 and 0.5 * 0.25 + 0.25
        let out = layer.forward(array![[1.0, 1.0]].view()).unwrap();
        assert_eq!(out.membrane, array![[2.0, 0.375]]);
    }

    #[test]
    fn test_zero_in_features_rejected() {
        use crate::error::SnnError;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(2);
        let lif = LifLayer::new(0.5, 1.0, SpikingActivation::default()).unwrap();
        assert!(matches!(
            OutputSpikeLayer::new(0, 2, lif, &mut rng),
            Err(SnnError::InvalidConfig(_))
        ));
    }
}
