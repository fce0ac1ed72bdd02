// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pretrained embedding vocabulary
//!
//! File format: one token per line, the token followed by exactly D
//! whitespace-separated floats (GloVe text format). Blank lines are skipped.

use ahash::AHashMap;
use ndarray::Array1;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{EncodingError, Result};

/// Token → raw embedding vector, all of the same dimension
///
/// Entries keep their load order, so reductions over the vocabulary are
/// reproducible across processes.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    dim: usize,
    tokens: Vec<String>,
    vectors: Vec<Array1<f32>>,
    index: AHashMap<String, usize>,
}

impl Vocabulary {
    /// Load a vocabulary file
    ///
    /// # Errors
    /// `EncodingError::VocabFormat` for the first line with the wrong number of
    /// fields or a non-numeric value. No partial vocabulary is returned.
    pub fn load<P: AsRef<Path>>(path: P, dim: usize) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut vocab = Self::empty(dim);

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let (token, vector) = parse_line(&line, dim, idx + 1)?;
            vocab.insert(token, vector);
        }

        info!(
            path = %path.display(),
            tokens = vocab.len(),
            dim,
            "Loaded vocabulary"
        );
        Ok(vocab)
    }

    /// Build a vocabulary from in-memory entries
    ///
    /// # Errors
    /// `EncodingError::DimensionMismatch` if any vector is not `dim` long.
    pub fn from_entries<I, S>(dim: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut vocab = Self::empty(dim);
        for (token, values) in entries {
            if values.len() != dim {
                return Err(EncodingError::DimensionMismatch {
                    expected: dim,
                    actual: values.len(),
                });
            }
            vocab.insert(token.into(), Array1::from(values));
        }
        Ok(vocab)
    }

    fn empty(dim: usize) -> Self {
        Self {
            dim,
            tokens: Vec::new(),
            vectors: Vec::new(),
            index: AHashMap::new(),
        }
    }

    // A duplicate token keeps its first position and takes the latest vector
    fn insert(&mut self, token: String, vector: Array1<f32>) {
        if let Some(&slot) = self.index.get(&token) {
            debug!(token = %token, "Duplicate vocabulary token replaced");
            self.vectors[slot] = vector;
            return;
        }
        self.index.insert(token.clone(), self.tokens.len());
        self.tokens.push(token);
        self.vectors.push(vector);
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, token: &str) -> Option<&Array1<f32>> {
        self.index.get(token).map(|&slot| &self.vectors[slot])
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Iterate over `(token, vector)` pairs in load order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array1<f32>)> {
        self.tokens
            .iter()
            .map(String::as_str)
            .zip(self.vectors.iter())
    }

    /// Iterate over every scalar of every vector, in load order
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.vectors.iter().flat_map(|vector| vector.iter().copied())
    }
}

fn parse_line(line: &str, dim: usize, line_no: usize) -> Result<(String, Array1<f32>)> {
    let mut fields = line.split_whitespace();
    let token = fields
        .next()
        .ok_or_else(|| EncodingError::VocabFormat {
            line: line_no,
            reason: "empty line".to_string(),
        })?
        .to_string();

    let values = fields
        .map(|field| {
            field.parse::<f32>().map_err(|_| EncodingError::VocabFormat {
                line: line_no,
                reason: format!("non-numeric value '{}' for token '{}'", field, token),
            })
        })
        .collect::<Result<Vec<f32>>>()?;

    if values.len() != dim {
        return Err(EncodingError::VocabFormat {
            line: line_no,
            reason: format!(
                "expected {} values for token '{}', found {}",
                dim,
                token,
                values.len()
            ),
        });
    }

    Ok((token, Array1::from(values)))
}
