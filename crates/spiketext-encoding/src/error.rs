// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for vocabulary loading, normalization and dataset caching

use thiserror::Error;

/// Encoding pipeline errors
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed vocabulary line {line}: {reason}")]
    VocabFormat { line: usize, reason: String },

    #[error("Degenerate vocabulary: {0}")]
    DegenerateVocabulary(String),

    #[error("Invalid clipping bias {0}: must be a positive finite number")]
    InvalidBias(f32),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Malformed sample line {line}: {reason}")]
    SampleFormat { line: usize, reason: String },

    #[error("Cache serialization error: {0}")]
    CacheSerialization(String),

    #[error("Cache file corrupted: {0}")]
    CacheCorrupted(String),

    #[error("Cache version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: u32,
        expected_version: u32,
    },
}

pub type Result<T> = std::result::Result<T, EncodingError>;
