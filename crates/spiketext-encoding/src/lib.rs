// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # spiketext-encoding
//!
//! Converts labeled sentences into fixed-shape tensors of embedding values
//! normalized into `[0, 1]`, ready to be treated as input currents by a
//! spiking network.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use spiketext_config::EncoderConfig;
//! use spiketext_encoding::TensorEncoder;
//!
//! let config = EncoderConfig::default();
//! let pipeline = TensorEncoder::from_config(&config)?;
//! let dataset = pipeline.build_dataset()?;
//! let batch = dataset.inputs(0..32); // (32, sentence_length, embedding_dim)
//! # Ok::<(), spiketext_encoding::EncodingError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cache;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod samples;
pub mod stats;
pub mod tokenizer;
pub mod vocab;

pub use cache::{
    load_dataset, save_dataset, source_digest, verify_file, CacheHeader, CacheStatus,
    TensorDatasetBuilder,
};
pub use dataset::{DatasetKey, EncodedSample, Sample, TensorDataset};
pub use encoder::SentenceEncoder;
pub use error::{EncodingError, Result};
pub use normalizer::{EmbeddingNormalizer, DEFAULT_BIAS};
pub use pipeline::TensorEncoder;
pub use samples::read_samples;
pub use stats::GlobalStats;
pub use tokenizer::clean_tokenize;
pub use vocab::Vocabulary;
