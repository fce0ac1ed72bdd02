// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end: text files -> cached tensor dataset -> spiking TextCNN.

use std::fs;
use std::path::Path;

use spiketext::prelude::*;
use spiketext::snn::FIRST_LIF_KEY;
use tempfile::tempdir;

const VOCAB: &str = "\
good 0.9 0.4 -0.2 0.1
bad -0.8 -0.5 0.3 0.0
film 0.1 0.2 0.3 0.4
not -0.3 0.6 -0.1 0.2
great 1.2 0.8 -0.4 0.3
";

const DATA: &str = "\
a good film\t1
not a good film\t0
bad\t0
great great great film that is not bad\t1
";

fn write_inputs(dir: &Path) -> SpikeTextConfig {
    fs::write(dir.join("vocab.txt"), VOCAB).unwrap();
    fs::write(dir.join("train.txt"), DATA).unwrap();

    let mut config = SpikeTextConfig::default();
    config.encoder = EncoderConfig {
        vocab_path: dir.join("vocab.txt"),
        data_path: dir.join("train.txt"),
        dataset_name: "toy".to_string(),
        data_type: "train".to_string(),
        embedding_dim: 4,
        sentence_length: 6,
        bias: 3.0,
        lowercase: false,
        cache_dir: dir.join("cache"),
    };
    config.model = ModelConfig {
        filters: vec![2, 3],
        filter_num: 5,
        hidden_dim: 4,
        sentence_length: 6,
        dead_neuron_checker: true,
        ..ModelConfig::default()
    };
    config
}

#[test]
fn test_config_validates() {
    let dir = tempdir().unwrap();
    let config = write_inputs(dir.path());
    validate_config(&config).unwrap();
}

#[test]
fn test_dataset_feeds_model() {
    let dir = tempdir().unwrap();
    let config = write_inputs(dir.path());

    let dataset = TensorEncoder::from_config(&config.encoder)
        .unwrap()
        .build_dataset()
        .unwrap();
    assert_eq!(dataset.len(), 4);
    assert!(dataset
        .iter()
        .all(|s| s.values.iter().all(|&v| (0.0..=1.0).contains(&v))));

    let mut model = SpikingTextCnn::with_offsets(&config.model, OffsetTable::default()).unwrap();
    let monitor = DeadNeuronMonitor::new();
    let out = model
        .forward(dataset.inputs(0..dataset.len()).view(), Some(&monitor))
        .unwrap();

    assert_eq!(out.spikes_1.dim(), (4, config.model.feature_dim()));
    assert_eq!(out.membrane_2.dim(), (4, config.model.label_num));
    assert_eq!(monitor.entries(FIRST_LIF_KEY).len(), 1);
}

#[test]
fn test_cached_dataset_gives_identical_model_output() {
    let dir = tempdir().unwrap();
    let config = write_inputs(dir.path());

    let fresh = TensorEncoder::from_config(&config.encoder)
        .unwrap()
        .build_dataset()
        .unwrap();
    let cached = TensorEncoder::from_config(&config.encoder)
        .unwrap()
        .build_dataset()
        .unwrap();

    let mut a = SpikingTextCnn::new(&config.model).unwrap();
    let mut b = SpikingTextCnn::new(&config.model).unwrap();
    assert_eq!(
        a.forward(fresh.inputs(0..4).view(), None).unwrap(),
        b.forward(cached.inputs(0..4).view(), None).unwrap()
    );
}

#[test]
fn test_unknown_tokens_and_padding_share_fallback() {
    let dir = tempdir().unwrap();
    let config = write_inputs(dir.path());
    let pipeline = TensorEncoder::from_config(&config.encoder).unwrap();

    // "a" is not in the vocabulary; positions 3.. are padding
    let sample = pipeline.encoder().encode("a good film", 1);
    let fallback = pipeline.encoder().normalizer().zero_fallback().clone();
    assert_eq!(sample.values.row(0), fallback);
    for row in 3..6 {
        assert_eq!(sample.values.row(row), fallback);
    }
}

#[test]
fn test_model_rejects_mismatched_dataset() {
    let dir = tempdir().unwrap();
    let config = write_inputs(dir.path());
    let dataset = TensorEncoder::from_config(&config.encoder)
        .unwrap()
        .build_dataset()
        .unwrap();

    let wider = ModelConfig {
        hidden_dim: 8,
        ..config.model.clone()
    };
    let mut model = SpikingTextCnn::new(&wider).unwrap();
    assert!(matches!(
        model.forward(dataset.inputs(0..2).view(), None),
        Err(SnnError::ShapeMismatch { .. })
    ));
}
