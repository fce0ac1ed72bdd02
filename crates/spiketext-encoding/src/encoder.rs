// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Sentence Encoder
//!
//! Turns a raw sentence into a fixed `(sentence_length, embedding_dim)` block
//! of normalized vectors:
//!
//! ```text
//! position j < token count, token known   -> normalize(vocab[token])
//! position j < token count, token unknown -> zero fallback
//! position j >= token count               -> zero fallback (padding)
//! tokens past sentence_length             -> dropped
//! ```

use ndarray::Array2;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

use crate::dataset::{EncodedSample, Sample};
use crate::error::{EncodingError, Result};
use crate::normalizer::EmbeddingNormalizer;
use crate::tokenizer::clean_tokenize;
use crate::vocab::Vocabulary;

/// Deterministic sentence → tensor encoder
///
/// Holds only shared immutable state, so one encoder can be used from many
/// threads at once.
#[derive(Debug, Clone)]
pub struct SentenceEncoder {
    vocab: Arc<Vocabulary>,
    normalizer: Arc<EmbeddingNormalizer>,
    sentence_length: usize,
    lowercase: bool,
}

impl SentenceEncoder {
    /// # Errors
    /// `EncodingError::DimensionMismatch` if vocabulary and normalizer dimensions differ.
    pub fn new(
        vocab: Arc<Vocabulary>,
        normalizer: Arc<EmbeddingNormalizer>,
        sentence_length: usize,
    ) -> Result<Self> {
        if vocab.dim() != normalizer.dim() {
            return Err(EncodingError::DimensionMismatch {
                expected: normalizer.dim(),
                actual: vocab.dim(),
            });
        }
        Ok(Self {
            vocab,
            normalizer,
            sentence_length,
            lowercase: false,
        })
    }

    /// Lowercase sentences before vocabulary lookup
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn sentence_length(&self) -> usize {
        self.sentence_length
    }

    pub fn embedding_dim(&self) -> usize {
        self.normalizer.dim()
    }

    pub fn normalizer(&self) -> &EmbeddingNormalizer {
        &self.normalizer
    }

    /// Encode one sentence; the label is passed through unchanged
    pub fn encode(&self, sentence: &str, label: i64) -> EncodedSample {
        let tokens = clean_tokenize(sentence, self.lowercase);
        let fallback = self.normalizer.zero_fallback();
        let mut values = Array2::zeros((self.sentence_length, self.embedding_dim()));

        for (j, mut row) in values.rows_mut().into_iter().enumerate() {
            let normalized = tokens
                .get(j)
                .and_then(|token| self.vocab.get(token))
                .map(|raw| self.normalizer.transform(raw.view()));
            match normalized {
                Some(vector) => row.assign(&vector),
                None => row.assign(fallback),
            }
        }

        if tokens.len() > self.sentence_length {
            debug!(
                tokens = tokens.len(),
                kept = self.sentence_length,
                "Sentence truncated"
            );
        }

        EncodedSample { values, label }
    }

    pub fn encode_sample(&self, sample: &Sample) -> EncodedSample {
        self.encode(&sample.sentence, sample.label)
    }

    /// Encode many samples in parallel, preserving input order
    pub fn encode_all(&self, samples: &[Sample]) -> Vec<EncodedSample> {
        let encoded: Vec<EncodedSample> = samples
            .par_iter()
            .map(|sample| self.encode_sample(sample))
            .collect();
        info!(samples = encoded.len(), "Encoded samples");
        encoded
    }

    /// Fraction of tokens across `samples` (within `sentence_length`) found in the vocabulary
    pub fn coverage(&self, samples: &[Sample]) -> f64 {
        let (known, total) = samples
            .par_iter()
            .map(|sample| {
                let tokens = clean_tokenize(&sample.sentence, self.lowercase);
                let kept = &tokens[..tokens.len().min(self.sentence_length)];
                let known = kept.iter().filter(|t| self.vocab.contains(t)).count();
                (known, kept.len())
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));
        if total == 0 {
            return 0.0;
        }
        known as f64 / total as f64
    }
}
