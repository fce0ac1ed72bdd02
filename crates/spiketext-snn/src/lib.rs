// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # spiketext-snn
//!
//! Spiking TextCNN over normalized sentence tensors.
//!
//! ## Architecture
//!
//! - [`ConvBranch`]: one filter width, convolution over the sentence axis plus max-pool
//! - [`SpikingConvBlock`]: parallel branches feeding one shared [`LifLayer`]
//! - [`OutputSpikeLayer`]: [`Linear`] projection feeding a second LIF layer
//! - [`WeightInitializer`]: one-shot positive weight shift from an [`OffsetTable`]
//! - [`DeadNeuronMonitor`]: caller-owned sink for first-layer spike sums
//!
//! ## Usage
//!
//! ```rust
//! use ndarray::Array3;
//! use spiketext_config::ModelConfig;
//! use spiketext_snn::{DeadNeuronMonitor, OffsetTable, SpikingTextCnn};
//!
//! let config = ModelConfig {
//!     filters: vec![2, 3],
//!     filter_num: 8,
//!     hidden_dim: 4,
//!     sentence_length: 5,
//!     dead_neuron_checker: true,
//!     ..ModelConfig::default()
//! };
//! let mut model = SpikingTextCnn::with_offsets(&config, OffsetTable::default())?;
//! let monitor = DeadNeuronMonitor::new();
//!
//! let batch = Array3::from_elem((2, 5, 4), 0.5);
//! let out = model.forward(batch.view(), Some(&monitor))?;
//! assert_eq!(out.membrane_2.dim(), (2, 2));
//! assert_eq!(monitor.len(0), 1);
//! # Ok::<(), spiketext_snn::SnnError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod block;
pub mod conv;
pub mod error;
pub mod init;
pub mod lif;
pub mod linear;
pub mod model;
pub mod monitor;
pub mod output;
pub mod surrogate;

pub use block::{BlockGradients, BlockOutput, SpikingConvBlock};
pub use conv::{ConvBranch, ConvGradients};
pub use error::{Result, SnnError};
pub use init::{InitMethod, LayerKind, OffsetTable, WeightInitializer, DEFAULT_OFFSET_FAN_IN};
pub use lif::{LifLayer, LifOutput, ResetMechanism, DEFAULT_THRESHOLD};
pub use linear::{Linear, LinearGradients};
pub use model::{Gradients, ModelOutput, SpikingTextCnn};
pub use monitor::{DeadNeuronMonitor, MonitorSnapshot, FIRST_LIF_KEY};
pub use output::OutputSpikeLayer;
pub use surrogate::{SpikingActivation, DEFAULT_SLOPE};
