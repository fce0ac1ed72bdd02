// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run a freshly initialized spiking TextCNN over an encoded dataset and
//! report firing activity and dead first-layer neurons.
//!
//! Useful for choosing `positive_init_rate`: a rate that is too low leaves
//! most first-layer neurons silent from the start.

use std::ops::Range;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ndarray::Axis;
use tracing::info;

use spiketext::config::{load_config, validate_config, SpikeTextConfig};
use spiketext::encoding::TensorEncoder;
use spiketext::observability::{debug_flags_help, init_logging, parse_debug_flags};
use spiketext::snn::{DeadNeuronMonitor, OffsetTable, SpikingTextCnn, FIRST_LIF_KEY};

#[derive(Parser, Debug)]
#[command(name = "probe_network", version, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Path to spiketext.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 64)]
    batch_size: usize,

    /// Time steps per batch
    #[arg(long, default_value_t = 1)]
    steps: usize,

    /// Override `model.positive_init_rate`
    #[arg(long)]
    rate: Option<f32>,

    /// Write the dead neuron monitor contents as JSON
    #[arg(long)]
    monitor_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let debug_flags = parse_debug_flags();
    let args = Args::parse_from(std::env::args().filter(|arg| !arg.starts_with("--debug-")));

    let mut config: SpikeTextConfig =
        load_config(args.config.as_deref(), None).context("Failed to load configuration")?;
    if let Some(rate) = args.rate {
        config.model.positive_init_rate = rate;
    }
    config.model.dead_neuron_checker = true;
    init_logging(&debug_flags, &config.logging)?;
    validate_config(&config).context("Invalid configuration")?;

    let dataset = TensorEncoder::from_config(&config.encoder)
        .and_then(|pipeline| pipeline.build_dataset())
        .context("Failed to build the dataset")?;
    let mut model = SpikingTextCnn::with_offsets(&config.model, OffsetTable::default())
        .context("Failed to build the model")?;
    let monitor = DeadNeuronMonitor::new();

    let mut correct = 0usize;
    let mut output_spikes = 0.0f32;

    for range in batch_ranges(dataset.len(), args.batch_size) {
        let inputs = dataset.inputs(range.clone());
        let labels = dataset.labels(range);

        model.reset();
        let mut membrane_total = None;
        for _ in 0..args.steps.max(1) {
            let out = model.forward(inputs.view(), Some(&monitor))?;
            output_spikes += out.spikes_2.sum();
            membrane_total = Some(match membrane_total {
                Some(total) => total + &out.membrane_2,
                None => out.membrane_2,
            });
        }

        if let Some(total) = membrane_total {
            for (row, &label) in total.axis_iter(Axis(0)).zip(&labels) {
                let predicted = row
                    .iter()
                    .enumerate()
                    .fold((0usize, f32::NEG_INFINITY), |best, (i, &v)| {
                        if v > best.1 {
                            (i, v)
                        } else {
                            best
                        }
                    })
                    .0;
                if predicted as i64 == label {
                    correct += 1;
                }
            }
        }
    }

    let dead = monitor.dead_neurons(FIRST_LIF_KEY);
    info!(
        samples = dataset.len(),
        rate = config.model.positive_init_rate,
        untrained_accuracy = format!("{:.3}", correct as f64 / dataset.len().max(1) as f64),
        output_spikes,
        dead_neurons = dead.len(),
        first_layer = config.model.feature_dim(),
        "Probe finished"
    );

    if let Some(path) = &args.monitor_out {
        monitor
            .export_json(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Monitor exported");
    }
    Ok(())
}

/// Consecutive `[start, end)` batches covering `0..len`; the last may be short
fn batch_ranges(len: usize, batch_size: usize) -> impl Iterator<Item = Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..len)
        .step_by(batch_size)
        .map(move |start| start..start.saturating_add(batch_size).min(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_ranges_cover_dataset() {
        let ranges: Vec<_> = batch_ranges(10, 4).collect();
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);
        assert_eq!(batch_ranges(3, 0).count(), 3);
    }

    #[test]
    fn test_huge_batch_size_does_not_overflow() {
        let ranges: Vec<_> = batch_ranges(5, usize::MAX).collect();
        assert_eq!(ranges, vec![0..5]);
        let ranges: Vec<_> = batch_ranges(5, usize::MAX - 1).collect();
        assert_eq!(ranges, vec![0..5]);
    }
}
