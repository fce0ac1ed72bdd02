// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Tensor Dataset Cache
//!
//! Encoded datasets are persisted under a file name derived from their
//! generating parameters ([`DatasetKey::file_name`]). An existing file is
//! authoritative and never rewritten, unless both it and the caller carry a
//! source digest and the two differ, or the file cannot be read back as a
//! cache of the current format. Writes go through a temporary file in the
//! same directory followed by a rename, so an interrupted write never leaves
//! a partial file under the final name.
//!
//! ## Format
//! ```text
//! [Header]
//! - Magic: "STXDS" (5 bytes)
//! - Version: u32 (4 bytes)
//! - Flags: u8 (1 byte) - bit 0: source digest present
//! - Source digest: u64 (8 bytes, xxh64 of vocabulary + data file contents)
//! - Checksum: u64 (8 bytes, xxh64 of payload)
//! [Data]
//! - Bincode-serialized Vec<SerializableSample>
//! ```

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use xxhash_rust::xxh64::{xxh64, Xxh64};

use ndarray::Array2;

use crate::dataset::{DatasetKey, EncodedSample, TensorDataset};
use crate::error::{EncodingError, Result};

/// Magic number for dataset cache files
const MAGIC: &[u8; 5] = b"STXDS";

/// Current format version
const FORMAT_VERSION: u32 = 1;

const FLAG_HAS_DIGEST: u8 = 1;

/// Flat, serde-friendly form of an [`EncodedSample`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableSample {
    pub label: i64,
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f32>,
}

impl From<&EncodedSample> for SerializableSample {
    fn from(sample: &EncodedSample) -> Self {
        let (rows, cols) = sample.values.dim();
        Self {
            label: sample.label,
            rows,
            cols,
            values: sample.values.iter().copied().collect(),
        }
    }
}

impl TryFrom<SerializableSample> for EncodedSample {
    type Error = EncodingError;

    fn try_from(sample: SerializableSample) -> Result<Self> {
        let values = Array2::from_shape_vec((sample.rows, sample.cols), sample.values)
            .map_err(|e| EncodingError::CacheCorrupted(format!("bad sample shape: {}", e)))?;
        Ok(EncodedSample {
            values,
            label: sample.label,
        })
    }
}

/// Fixed-size header preceding the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHeader {
    pub version: u32,
    pub source_digest: Option<u64>,
    pub checksum: u64,
}

/// Freshness of a cache file relative to the current sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Missing,
    Fresh,
    Stale { recorded: u64, current: u64 },
    /// Foreign, truncated, corrupted or other-version file under the cache name
    Unreadable { reason: String },
}

/// Digest of the files a dataset is generated from
///
/// Order matters: the same files in a different order give a different digest.
pub fn source_digest<P: AsRef<Path>>(paths: &[P]) -> Result<u64> {
    let mut hasher = Xxh64::new(0);
    let mut buf = vec![0u8; 64 * 1024];
    for path in paths {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        // Separator so ("ab","c") and ("a","bc") differ
        hasher.update(&[0xff]);
    }
    Ok(hasher.digest())
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("dataset");
    path.with_file_name(format!(".{}.tmp.{}", file_name, std::process::id()))
}

/// Write a dataset to `path`, atomically replacing any existing file
pub fn save_dataset<P: AsRef<Path>>(
    dataset: &TensorDataset,
    path: P,
    source_digest: Option<u64>,
) -> Result<()> {
    let path = path.as_ref();
    let records: Vec<SerializableSample> = dataset.iter().map(SerializableSample::from).collect();
    let data = bincode::serialize(&records)
        .map_err(|e| EncodingError::CacheSerialization(e.to_string()))?;

    let temp = temp_path(path);
    let written = write_file(&temp, &data, source_digest).and_then(|()| {
        fs::rename(&temp, path)?;
        Ok(())
    });
    if written.is_err() {
        let _ = fs::remove_file(&temp);
    }
    written
}

fn write_file(path: &Path, data: &[u8], source_digest: Option<u64>) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(MAGIC)?;
    file.write_all(&FORMAT_VERSION.to_le_bytes())?;

    let flags = if source_digest.is_some() { FLAG_HAS_DIGEST } else { 0 };
    file.write_all(&[flags])?;
    file.write_all(&source_digest.unwrap_or(0).to_le_bytes())?;
    file.write_all(&xxh64(data, 0).to_le_bytes())?;
    file.write_all(data)?;
    file.flush()?;
    file.get_ref().sync_all()?;

    Ok(())
}

fn read_header<R: Read>(reader: &mut R) -> Result<CacheHeader> {
    let mut magic = [0u8; 5];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(EncodingError::CacheCorrupted(format!(
            "invalid magic number {:?}",
            magic
        )));
    }

    let mut word = [0u8; 4];
    reader.read_exact(&mut word)?;
    let version = u32::from_le_bytes(word);
    if version != FORMAT_VERSION {
        return Err(EncodingError::VersionMismatch {
            file_version: version,
            expected_version: FORMAT_VERSION,
        });
    }

    let mut flags = [0u8; 1];
    reader.read_exact(&mut flags)?;

    let mut long = [0u8; 8];
    reader.read_exact(&mut long)?;
    let digest = u64::from_le_bytes(long);
    reader.read_exact(&mut long)?;
    let checksum = u64::from_le_bytes(long);

    Ok(CacheHeader {
        version,
        source_digest: (flags[0] & FLAG_HAS_DIGEST != 0).then_some(digest),
        checksum,
    })
}

/// Read only the header of a cache file
pub fn load_header<P: AsRef<Path>>(path: P) -> Result<CacheHeader> {
    let mut reader = BufReader::new(File::open(path)?);
    read_header(&mut reader)
}

/// Read the header and check the payload checksum without decoding it
pub fn verify_file<P: AsRef<Path>>(path: P) -> Result<CacheHeader> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = read_header(&mut reader)?;

    let mut hasher = Xxh64::new(0);
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    if hasher.digest() != header.checksum {
        return Err(EncodingError::CacheCorrupted(
            "checksum mismatch: file may be corrupted".to_string(),
        ));
    }
    Ok(header)
}

/// Load and verify a dataset cache file
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<(CacheHeader, TensorDataset)> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = read_header(&mut reader)?;

    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    if xxh64(&data, 0) != header.checksum {
        return Err(EncodingError::CacheCorrupted(
            "checksum mismatch: file may be corrupted".to_string(),
        ));
    }

    let records: Vec<SerializableSample> = bincode::deserialize(&data)
        .map_err(|e| EncodingError::CacheCorrupted(e.to_string()))?;
    let samples = records
        .into_iter()
        .map(EncodedSample::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok((header, TensorDataset::new(samples)?))
}

/// Collects encoded samples into a dataset and persists it once per key
#[derive(Debug, Clone)]
pub struct TensorDatasetBuilder {
    cache_dir: PathBuf,
    key: DatasetKey,
    source_digest: Option<u64>,
}

impl TensorDatasetBuilder {
    pub fn new(cache_dir: impl Into<PathBuf>, key: DatasetKey) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            key,
            source_digest: None,
        }
    }

    /// Record the digest of the generating sources for staleness checks
    pub fn with_source_digest(mut self, digest: u64) -> Self {
        self.source_digest = Some(digest);
        self
    }

    pub fn key(&self) -> &DatasetKey {
        &self.key
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(self.key.file_name())
    }

    /// Compare the cache file on disk against the current source digest
    ///
    /// A file or caller without a digest cannot be checked and counts as fresh.
    /// A file that fails header or checksum verification is `Unreadable`.
    pub fn cache_status(&self) -> CacheStatus {
        let path = self.cache_path();
        if !path.exists() {
            return CacheStatus::Missing;
        }

        let header = match verify_file(&path) {
            Ok(header) => header,
            Err(e) => {
                return CacheStatus::Unreadable {
                    reason: e.to_string(),
                }
            }
        };
        match (header.source_digest, self.source_digest) {
            (Some(recorded), Some(current)) if recorded != current => {
                CacheStatus::Stale { recorded, current }
            }
            _ => CacheStatus::Fresh,
        }
    }

    /// Load the cached dataset if present, readable and fresh
    pub fn load_cached(&self) -> Result<Option<TensorDataset>> {
        let path = self.cache_path();
        match self.cache_status() {
            CacheStatus::Fresh => match load_dataset(&path) {
                Ok((_, dataset)) => {
                    info!(
                        path = %path.display(),
                        samples = dataset.len(),
                        "Loaded cached dataset"
                    );
                    Ok(Some(dataset))
                }
                Err(EncodingError::Io(e)) => Err(EncodingError::Io(e)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cached dataset could not be decoded");
                    Ok(None)
                }
            },
            CacheStatus::Unreadable { reason } => {
                warn!(path = %path.display(), reason = %reason, "Ignoring unreadable dataset cache");
                Ok(None)
            }
            CacheStatus::Missing | CacheStatus::Stale { .. } => Ok(None),
        }
    }

    /// Build the dataset and persist it unless a fresh cache file already exists
    pub fn build(&self, samples: Vec<EncodedSample>) -> Result<TensorDataset> {
        let dataset = TensorDataset::new(samples)?;
        let path = self.cache_path();

        match self.cache_status() {
            CacheStatus::Fresh => {
                debug!(path = %path.display(), "Cache file exists, not overwriting");
                return Ok(dataset);
            }
            CacheStatus::Missing => {}
            CacheStatus::Stale { recorded, current } => {
                warn!(
                    path = %path.display(),
                    recorded = format!("{:016x}", recorded),
                    current = format!("{:016x}", current),
                    "Cached dataset was generated from different sources, regenerating"
                );
            }
            CacheStatus::Unreadable { reason } => {
                warn!(
                    path = %path.display(),
                    reason = %reason,
                    "Existing cache file is not a readable dataset, regenerating"
                );
            }
        }

        fs::create_dir_all(&self.cache_dir)?;
        save_dataset(&dataset, &path, self.source_digest)?;
        info!(path = %path.display(), samples = dataset.len(), "Wrote dataset cache");
        Ok(dataset)
    }
}
