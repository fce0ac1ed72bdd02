// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # SpikeText - Spiking TextCNN for Sentence Classification
//!
//! SpikeText turns pretrained word embeddings into bounded input currents and
//! runs them through a convolutional spiking network of leaky
//! integrate-and-fire neurons.
//!
//! ## Feature Flags
//!
//! - **`encoding`** (default): vocabulary loading, normalization, sentence encoding, dataset cache
//! - **`snn`** (default): spiking TextCNN, weight initializer, dead neuron monitor
//!
//! ## Usage
//!
//! ```rust,no_run
//! use spiketext::prelude::*;
//!
//! let config = load_config(None, None)?;
//! validate_config(&config)?;
//!
//! let dataset = TensorEncoder::from_config(&config.encoder)?.build_dataset()?;
//! let mut model = SpikingTextCnn::with_offsets(&config.model, OffsetTable::default())?;
//! let monitor = DeadNeuronMonitor::new();
//!
//! let out = model.forward(dataset.inputs(0..32).view(), Some(&monitor))?;
//! println!("membrane: {:?}", out.membrane_2.dim());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: spiketext-config, spiketext-observability  │
//! │  (TOML config + overrides, tracing setup)               │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Data: spiketext-encoding                               │
//! │  (vocabulary → stats → normalizer → encoder → cache)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Network: spiketext-snn                                 │
//! │  (conv branches → LIF → linear → LIF, monitor)          │
//! └─────────────────────────────────────────────────────────┘
//! ```

// Re-export foundation
pub use spiketext_config as config;
pub use spiketext_observability as observability;

// Re-export components
#[cfg(feature = "encoding")]
pub use spiketext_encoding as encoding;

#[cfg(feature = "snn")]
pub use spiketext_snn as snn;

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::config::{
        load_config, validate_config, EncoderConfig, LoggingConfig, ModelConfig, SpikeTextConfig,
    };
    pub use crate::observability::{init_logging, CrateDebugFlags};

    #[cfg(feature = "encoding")]
    pub use crate::encoding::{
        DatasetKey, EmbeddingNormalizer, EncodedSample, EncodingError, GlobalStats, Sample,
        SentenceEncoder, TensorDataset, TensorDatasetBuilder, TensorEncoder, Vocabulary,
    };

    #[cfg(feature = "snn")]
    pub use crate::snn::{
        DeadNeuronMonitor, Gradients, InitMethod, LifLayer, ModelOutput, OffsetTable,
        SnnError, SpikingActivation, SpikingTextCnn, WeightInitializer,
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let config = SpikeTextConfig::default();
        assert_eq!(config.model.filters, vec![3, 4, 5]);
    }
}
