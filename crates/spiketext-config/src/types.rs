// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `spiketext.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SpikeTextConfig {
    pub encoder: EncoderConfig,
    pub model: ModelConfig,
    pub logging: LoggingConfig,
}

/// Embedding normalization and dataset encoding configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Whitespace-delimited pretrained embedding file (token followed by D floats)
    pub vocab_path: PathBuf,
    /// Tab-separated `sentence<TAB>label` file
    pub data_path: PathBuf,
    pub dataset_name: String,
    /// Split tag used in the cache file name ("train", "test", ...)
    pub data_type: String,
    pub embedding_dim: usize,
    pub sentence_length: usize,
    /// Clipping width in standard deviations around the vocabulary mean
    pub bias: f32,
    pub lowercase: bool,
    /// Directory holding `.tensor_dataset` cache files
    pub cache_dir: PathBuf,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            vocab_path: PathBuf::from("data/glove.6B.100d.txt"),
            data_path: PathBuf::from("data/sst2/train.txt"),
            dataset_name: "sst2".to_string(),
            data_type: "train".to_string(),
            embedding_dim: 100,
            sentence_length: 20,
            bias: 3.0,
            lowercase: false,
            cache_dir: PathBuf::from("data/sst2"),
        }
    }
}

/// Spiking TextCNN architecture and initialization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Convolution window widths, one branch per entry
    pub filters: Vec<usize>,
    /// Output channels per branch
    pub filter_num: usize,
    /// Embedding dimension covered by every filter
    pub hidden_dim: usize,
    pub sentence_length: usize,
    /// LIF decay factor
    pub beta: f32,
    pub threshold: f32,
    /// Fast-sigmoid surrogate slope
    pub slope: f32,
    pub label_num: usize,
    pub dead_neuron_checker: bool,
    pub initial_method: String,
    pub positive_init_rate: f32,
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            filters: vec![3, 4, 5],
            filter_num: 100,
            hidden_dim: 100,
            sentence_length: 20,
            beta: 0.95,
            threshold: 1.0,
            slope: 25.0,
            label_num: 2,
            dead_neuron_checker: false,
            initial_method: "kaiming_uniform".to_string(),
            positive_init_rate: 0.8,
            seed: 42,
        }
    }
}

impl ModelConfig {
    /// Width of the concatenated spike vector emitted by the convolution block
    pub fn feature_dim(&self) -> usize {
        self.filters.len() * self.filter_num
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level (trace, debug, info, warn, error)
    pub level: String,
    /// Crates to log at debug level regardless of `level`
    pub debug_crates: Vec<String>,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            debug_crates: Vec::new(),
            with_target: false,
        }
    }
}
