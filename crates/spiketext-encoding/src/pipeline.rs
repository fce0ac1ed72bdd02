// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Encoding Pipeline
//!
//! Wires the pieces together from an [`EncoderConfig`]:
//!
//! ```text
//! vocab file -> Vocabulary -> GlobalStats -> EmbeddingNormalizer
//!                                                   |
//! data file  -> Samples ------------------> SentenceEncoder -> TensorDataset -> cache
//! ```

use spiketext_config::EncoderConfig;
use std::sync::Arc;
use tracing::info;

use crate::cache::{source_digest, TensorDatasetBuilder};
use crate::dataset::{DatasetKey, TensorDataset};
use crate::encoder::SentenceEncoder;
use crate::error::Result;
use crate::normalizer::EmbeddingNormalizer;
use crate::samples::read_samples;
use crate::stats::GlobalStats;
use crate::vocab::Vocabulary;

/// End-to-end text to tensor-dataset encoder
#[derive(Debug, Clone)]
pub struct TensorEncoder {
    config: EncoderConfig,
    encoder: SentenceEncoder,
}

impl TensorEncoder {
    /// Load the vocabulary and derive normalization statistics
    pub fn from_config(config: &EncoderConfig) -> Result<Self> {
        let vocab = Vocabulary::load(&config.vocab_path, config.embedding_dim)?;
        Self::with_vocabulary(config, Arc::new(vocab))
    }

    /// Build from an already loaded vocabulary
    pub fn with_vocabulary(config: &EncoderConfig, vocab: Arc<Vocabulary>) -> Result<Self> {
        let stats = GlobalStats::compute(&vocab)?;
        info!(
            tokens = vocab.len(),
            mean = stats.mean,
            variance = stats.variance,
            "Computed vocabulary statistics"
        );

        let normalizer = EmbeddingNormalizer::new(stats, vocab.dim(), config.bias)?;
        let encoder = SentenceEncoder::new(vocab, Arc::new(normalizer), config.sentence_length)?
            .with_lowercase(config.lowercase);

        Ok(Self {
            config: config.clone(),
            encoder,
        })
    }

    pub fn encoder(&self) -> &SentenceEncoder {
        &self.encoder
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn key(&self) -> DatasetKey {
        DatasetKey {
            data_type: self.config.data_type.clone(),
            bias: self.config.bias,
            dataset_name: self.config.dataset_name.clone(),
            embedding_dim: self.config.embedding_dim,
            sentence_length: self.config.sentence_length,
        }
    }

    /// Digest of the vocabulary and data files
    pub fn source_digest(&self) -> Result<u64> {
        source_digest(&[&self.config.vocab_path, &self.config.data_path])
    }

    fn builder(&self) -> Result<TensorDatasetBuilder> {
        Ok(TensorDatasetBuilder::new(&self.config.cache_dir, self.key())
            .with_source_digest(self.source_digest()?))
    }

    /// Encode the configured data file, reusing a fresh cache file when present
    pub fn build_dataset(&self) -> Result<TensorDataset> {
        let builder = self.builder()?;
        if let Some(dataset) = builder.load_cached()? {
            return Ok(dataset);
        }

        let samples = read_samples(&self.config.data_path)?;
        info!(
            coverage = format!("{:.3}", self.encoder.coverage(&samples)),
            "Vocabulary coverage"
        );
        builder.build(self.encoder.encode_all(&samples))
    }
}
