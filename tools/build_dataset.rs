// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Encode a labeled data file into a cached tensor dataset.
//!
//! Configuration comes from `spiketext.toml` (or `--config`), then
//! `SPIKETEXT_*` environment variables, then the flags below. Per-crate debug
//! logging: `--debug-spiketext-encoding`, `--debug-all`.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use spiketext::config::{
    apply_cli_overrides, apply_environment_overrides, load_config, validate_config, ConfigError,
    SpikeTextConfig,
};
use spiketext::encoding::TensorEncoder;
use spiketext::observability::{debug_flags_help, init_logging, parse_debug_flags};

/// Build the `.tensor_dataset` cache for one data split
#[derive(Parser, Debug)]
#[command(name = "build_dataset", version, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Path to spiketext.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Embedding file, one token and D floats per line
    #[arg(long)]
    vocab: Option<PathBuf>,

    /// Labeled data file, `sentence<TAB>label` per line
    #[arg(long)]
    data: Option<PathBuf>,

    /// Split tag used in the cache file name
    #[arg(long)]
    data_type: Option<String>,

    #[arg(long)]
    dataset_name: Option<String>,

    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Clipping width in standard deviations
    #[arg(long)]
    bias: Option<f32>,

    #[arg(long)]
    embedding_dim: Option<usize>,

    #[arg(long)]
    sentence_length: Option<usize>,

    /// Lowercase sentences before vocabulary lookup
    #[arg(long, default_value_t = false)]
    lowercase: bool,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                overrides.insert(key.to_string(), value);
            }
        };
        put("vocab_path", self.vocab.as_ref().map(|p| p.display().to_string()));
        put("data_path", self.data.as_ref().map(|p| p.display().to_string()));
        put("data_type", self.data_type.clone());
        put("dataset_name", self.dataset_name.clone());
        put("cache_dir", self.cache_dir.as_ref().map(|p| p.display().to_string()));
        put("bias", self.bias.map(|v| v.to_string()));
        put("embedding_dim", self.embedding_dim.map(|v| v.to_string()));
        put("sentence_length", self.sentence_length.map(|v| v.to_string()));
        if self.lowercase {
            put("lowercase", Some("true".to_string()));
        }
        overrides
    }
}

/// Load the config file, falling back to defaults when none is found
///
/// The flag is true when defaults were used.
fn resolve_config(args: &Args) -> Result<(SpikeTextConfig, bool)> {
    let overrides = args.overrides();
    match load_config(args.config.as_deref(), Some(&overrides)) {
        Ok(config) => Ok((config, false)),
        Err(ConfigError::FileNotFound(_)) if args.config.is_none() => {
            let mut config = SpikeTextConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &overrides);
            Ok((config, true))
        }
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

fn main() -> Result<()> {
    // Debug flags are not clap arguments; strip them before parsing
    let debug_flags = parse_debug_flags();
    let args = Args::parse_from(std::env::args().filter(|arg| !arg.starts_with("--debug-")));

    let (config, defaulted) = resolve_config(&args)?;
    init_logging(&debug_flags, &config.logging)?;
    if defaulted {
        warn!("No spiketext.toml found, using defaults");
    }
    validate_config(&config).context("Invalid configuration")?;

    info!(
        vocab = %config.encoder.vocab_path.display(),
        data = %config.encoder.data_path.display(),
        "Encoding dataset"
    );

    let pipeline = TensorEncoder::from_config(&config.encoder)
        .context("Failed to prepare the encoder")?;
    let dataset = pipeline
        .build_dataset()
        .context("Failed to build the dataset")?;

    let path = config.encoder.cache_dir.join(pipeline.key().file_name());
    info!(
        samples = dataset.len(),
        shape = ?dataset.sample_shape(),
        path = %path.display(),
        "Dataset ready"
    );
    Ok(())
}
