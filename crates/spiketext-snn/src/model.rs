// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Spiking TextCNN
//!
//! ```text
//! (B, L, D) -> SpikingConvBlock -> spikes_1 (B, n×F)
//!           -> OutputSpikeLayer -> spikes_2 (B, label_num), membrane_2 (B, label_num)
//! ```
//!
//! One `forward` call is one time step. Both LIF layers keep their membrane
//! state between calls; call [`SpikingTextCnn::reset`] between independent
//! sequences of the same batch size.

use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use spiketext_config::ModelConfig;
use tracing::{debug, info};

use crate::block::SpikingConvBlock;
use crate::error::{Result, SnnError};
use crate::init::{OffsetTable, WeightInitializer};
use crate::lif::LifLayer;
use crate::monitor::{DeadNeuronMonitor, FIRST_LIF_KEY};
use crate::output::OutputSpikeLayer;
use crate::surrogate::SpikingActivation;

/// Result of one forward step
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    /// First LIF layer spikes `(B, n×F)`
    pub spikes_1: Array2<f32>,
    /// Output spikes `(B, label_num)`
    pub spikes_2: Array2<f32>,
    /// Output membrane potential `(B, label_num)`
    pub membrane_2: Array2<f32>,
}

/// Parameter gradients of one step, hidden state detached
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    /// One `(F, w, D)` array per branch, in filter order
    pub conv_weights: Vec<Array3<f32>>,
    pub conv_biases: Vec<Array1<f32>>,
    pub linear_weight: Array2<f32>,
    pub linear_bias: Array1<f32>,
    pub input: Array3<f32>,
}

#[derive(Debug, Clone)]
pub struct SpikingTextCnn {
    config: ModelConfig,
    block: SpikingConvBlock,
    output: OutputSpikeLayer,
    weight_shifted: bool,
}

impl SpikingTextCnn {
    /// Build with the base random draw only, seeded from `config.seed`
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Self::with_activation(config, SpikingActivation::fast_sigmoid(config.slope))
    }

    /// Same as [`SpikingTextCnn::new`] with an explicit surrogate for both LIF layers
    pub fn with_activation(config: &ModelConfig, activation: SpikingActivation) -> Result<Self> {
        validate(config)?;

        let mut rng = StdRng::seed_from_u64(config.seed);

        let lif1 = LifLayer::new(config.beta, config.threshold, activation)?;
        let block = SpikingConvBlock::new(
            &config.filters,
            config.filter_num,
            config.sentence_length,
            config.hidden_dim,
            lif1,
            &mut rng,
        )?;

        let lif2 = LifLayer::new(config.beta, config.threshold, activation)?;
        let output = OutputSpikeLayer::new(block.feature_dim(), config.label_num, lif2, &mut rng)?;

        info!(
            filters = ?config.filters,
            filter_num = config.filter_num,
            features = block.feature_dim(),
            labels = config.label_num,
            "Built spiking TextCNN"
        );

        Ok(Self {
            config: config.clone(),
            block,
            output,
            weight_shifted: false,
        })
    }

    /// Build and apply the configured positive weight offset once
    pub fn with_offsets(config: &ModelConfig, table: OffsetTable) -> Result<Self> {
        let mut model = Self::new(config)?;
        WeightInitializer::new(table).initialize(
            &mut model,
            &config.initial_method,
            config.positive_init_rate,
        )?;
        Ok(model)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn block(&self) -> &SpikingConvBlock {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut SpikingConvBlock {
        &mut self.block
    }

    pub fn output(&self) -> &OutputSpikeLayer {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut OutputSpikeLayer {
        &mut self.output
    }

    pub fn is_weight_shifted(&self) -> bool {
        self.weight_shifted
    }

    pub(crate) fn mark_weight_shifted(&mut self) {
        self.weight_shifted = true;
    }

    /// One time step over a `(B, L, D)` batch
    ///
    /// With `dead_neuron_checker` enabled and a monitor given, the batch sum of
    /// the first layer's spikes is appended under key 0.
    pub fn forward(
        &mut self,
        input: ArrayView3<'_, f32>,
        monitor: Option<&DeadNeuronMonitor>,
    ) -> Result<ModelOutput> {
        let block_out = self.block.forward(input)?;
        let out = self.output.forward(block_out.spikes.view())?;

        if self.config.dead_neuron_checker {
            if let Some(monitor) = monitor {
                monitor.append(FIRST_LIF_KEY, block_out.spikes.sum_axis(Axis(0)));
            }
        }

        debug!(
            batch = input.dim().0,
            spikes_1 = block_out.spikes.sum(),
            spikes_2 = out.spikes.sum(),
            "Forward step"
        );

        Ok(ModelOutput {
            spikes_1: block_out.spikes,
            spikes_2: out.spikes,
            membrane_2: out.membrane,
        })
    }

    /// Gradients of the last forward step given upstream gradients on its outputs
    ///
    /// # Errors
    /// `SnnError::NoForwardCache` without a preceding forward pass.
    pub fn backward(
        &self,
        grad_spikes: ArrayView2<'_, f32>,
        grad_membrane: ArrayView2<'_, f32>,
    ) -> Result<Gradients> {
        let linear = self.output.backward(grad_spikes, grad_membrane)?;
        let block = self.block.backward(linear.input.view())?;

        let (conv_weights, conv_biases): (Vec<_>, Vec<_>) = block
            .branches
            .into_iter()
            .map(|grads| (grads.weight, grads.bias))
            .unzip();

        Ok(Gradients {
            conv_weights,
            conv_biases,
            linear_weight: linear.weight,
            linear_bias: linear.bias,
            input: block.input,
        })
    }

    /// Zero both LIF layers and drop cached activations
    pub fn reset(&mut self) {
        self.block.reset();
        self.output.reset();
    }
}

fn validate(config: &ModelConfig) -> Result<()> {
    if config.hidden_dim == 0 || config.sentence_length == 0 {
        return Err(SnnError::InvalidConfig(
            "hidden_dim and sentence_length must be positive".to_string(),
        ));
    }
    if config.label_num == 0 {
        return Err(SnnError::InvalidConfig("label_num must be positive".to_string()));
    }
    if !(config.slope.is_finite() && config.slope > 0.0) {
        return Err(SnnError::InvalidConfig(format!(
            "surrogate slope must be positive, got {}",
            config.slope
        )));
    }
    Ok(())
}
