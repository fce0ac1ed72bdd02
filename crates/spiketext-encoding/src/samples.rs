// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Labeled data file reader (`sentence<TAB>label` per line)

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::dataset::Sample;
use crate::error::{EncodingError, Result};

/// Read every sample of a labeled data file
///
/// Blank lines are skipped. Only the first two tab-separated fields are used.
///
/// # Errors
/// `EncodingError::SampleFormat` when a line has no tab or the label is not an integer.
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        samples.push(parse_sample(&line, idx + 1)?);
    }

    info!(path = %path.display(), samples = samples.len(), "Read labeled samples");
    Ok(samples)
}

fn parse_sample(line: &str, line_no: usize) -> Result<Sample> {
    let mut fields = line.split('\t');
    let sentence = fields.next().unwrap_or_default().trim();
    let label_field = fields.next().ok_or_else(|| EncodingError::SampleFormat {
        line: line_no,
        reason: "missing tab-separated label".to_string(),
    })?;

    let label = label_field
        .trim()
        .parse::<i64>()
        .map_err(|_| EncodingError::SampleFormat {
            line: line_no,
            reason: format!("label '{}' is not an integer", label_field.trim()),
        })?;

    Ok(Sample::new(sentence, label))
}
