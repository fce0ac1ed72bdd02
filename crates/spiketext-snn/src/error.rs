// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the spiking network

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnnError {
    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Filter width {width} exceeds sentence length {sentence_length}")]
    WindowTooWide { width: usize, sentence_length: usize },

    #[error("Unknown initialization method '{0}'")]
    UnknownInitMethod(String),

    #[error("No weight offset for {layer} layer, method '{method}', rate {rate}")]
    MissingOffset {
        layer: String,
        method: String,
        rate: f32,
    },

    #[error("Model weights have already been shifted by an initializer")]
    AlreadyInitialized,

    #[error("Backward pass requires a preceding forward pass")]
    NoForwardCache,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SnnError {
    fn from(err: serde_json::Error) -> Self {
        SnnError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SnnError>;
