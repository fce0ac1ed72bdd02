// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Network-level behavior: weight offsets, dead neuron reporting and
//! multi-step LIF dynamics through the full model.

use ndarray::{s, Array3};
use spiketext_config::ModelConfig;
use spiketext_snn::{
    DeadNeuronMonitor, InitMethod, LayerKind, OffsetTable, SnnError, SpikingTextCnn,
    WeightInitializer, FIRST_LIF_KEY,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn small_config() -> ModelConfig {
    ModelConfig {
        filters: vec![2, 3, 4],
        filter_num: 6,
        hidden_dim: 8,
        sentence_length: 7,
        label_num: 2,
        ..ModelConfig::default()
    }
}

fn ramp_input(batch: usize, config: &ModelConfig) -> Array3<f32> {
    Array3::from_shape_fn(
        (batch, config.sentence_length, config.hidden_dim),
        |(b, l, d)| ((b * 13 + l * 5 + d * 3) % 10) as f32 / 10.0,
    )
}

// ============================================================================
// Weight Initializer
// ============================================================================

#[test]
fn test_offset_shifts_every_weight_by_table_constant() {
    let config = small_config();
    let table = OffsetTable::default();
    let expected_conv = table
        .get(LayerKind::Conv, InitMethod::KaimingUniform, 0.8)
        .unwrap();
    let expected_linear = table
        .get(LayerKind::Linear, InitMethod::KaimingUniform, 0.8)
        .unwrap();

    let before = SpikingTextCnn::new(&config).unwrap();
    let mut after = before.clone();
    WeightInitializer::new(table)
        .initialize(&mut after, "kaiming_uniform", 0.8)
        .unwrap();

    for (b, a) in before
        .block()
        .branches()
        .iter()
        .zip(after.block().branches())
    {
        let diff = a.weight() - b.weight();
        assert!(diff.iter().all(|d| (d - expected_conv).abs() < 1e-6));
        assert_eq!(a.bias(), b.bias(), "biases are not shifted");
    }

    let diff = after.output().linear().weight() - before.output().linear().weight();
    assert!(diff.iter().all(|d| (d - expected_linear).abs() < 1e-6));
    assert!(after.is_weight_shifted());
}

#[test]
fn test_second_initialize_is_rejected_without_mutation() {
    let mut model = SpikingTextCnn::with_offsets(&small_config(), OffsetTable::default()).unwrap();
    let snapshot = model.block().branches()[0].weight().clone();

    let result = WeightInitializer::default().initialize(&mut model, "kaiming_uniform", 0.8);
    assert!(matches!(result, Err(SnnError::AlreadyInitialized)));
    assert_eq!(model.block().branches()[0].weight(), &snapshot);
}

#[test]
fn test_failed_lookup_leaves_model_untouched() {
    let mut model = SpikingTextCnn::new(&small_config()).unwrap();
    let snapshot = model.output().linear().weight().clone();
    let initializer = WeightInitializer::default();

    assert!(matches!(
        initializer.initialize(&mut model, "kaiming_uniform", 0.75),
        Err(SnnError::MissingOffset { .. })
    ));
    assert!(matches!(
        initializer.initialize(&mut model, "orthogonal", 0.8),
        Err(SnnError::UnknownInitMethod(_))
    ));
    assert_eq!(model.output().linear().weight(), &snapshot);
    assert!(!model.is_weight_shifted());

    // Still usable once a valid call is made
    initializer
        .initialize(&mut model, "kaiming_uniform", 0.6)
        .unwrap();
}

#[test]
fn test_xavier_redraw_stays_within_bound() {
    let config = small_config();
    let mut model = SpikingTextCnn::new(&config).unwrap();
    let offset = OffsetTable::default()
        .get(LayerKind::Linear, InitMethod::XavierUniform, 0.5)
        .unwrap();
    assert_eq!(offset, 0.0);

    WeightInitializer::default()
        .initialize(&mut model, "xavier", 0.5)
        .unwrap();

    let linear = model.output().linear();
    let bound = (6.0 / (linear.in_features() + linear.out_features()) as f32).sqrt();
    assert!(linear.weight().iter().all(|w| w.abs() <= bound));
}

#[test]
fn test_higher_rate_raises_first_layer_activity() {
    let config = small_config();
    let input = ramp_input(4, &config);

    let mut low = SpikingTextCnn::new(&config).unwrap();
    let mut high = low.clone();
    let table = OffsetTable::default().with_offset(LayerKind::Conv, InitMethod::KaimingUniform, 0.95, 0.5);
    let table = table.with_offset(LayerKind::Linear, InitMethod::KaimingUniform, 0.95, 0.5);
    WeightInitializer::new(table)
        .initialize(&mut high, "kaiming", 0.95)
        .unwrap();

    let low_spikes = low.forward(input.view(), None).unwrap().spikes_1.sum();
    let high_spikes = high.forward(input.view(), None).unwrap().spikes_1.sum();
    assert!(high_spikes > low_spikes);
}

// ============================================================================
// Dead Neuron Monitor
// ============================================================================

#[test]
fn test_silenced_neuron_reports_zero_across_all_passes() {
    let mut config = small_config();
    config.dead_neuron_checker = true;
    let mut model = SpikingTextCnn::new(&config).unwrap();

    // Filter 0 of the first branch can never reach threshold on non-negative input
    model.block_mut().branches_mut()[0]
        .weight_mut()
        .slice_mut(s![0, .., ..])
        .fill(-10.0);

    let monitor = DeadNeuronMonitor::new();
    let input = ramp_input(3, &config);
    let passes = 5;
    for _ in 0..passes {
        model.forward(input.view(), Some(&monitor)).unwrap();
    }

    let entries = monitor.entries(FIRST_LIF_KEY);
    assert_eq!(entries.len(), passes);
    assert!(entries.iter().all(|sums| sums[0] == 0.0));
    assert!(entries.iter().all(|sums| sums.len() == config.feature_dim()));
    assert!(monitor.dead_neurons(FIRST_LIF_KEY).contains(&0));
}

#[test]
fn test_monitor_sums_match_spike_counts() {
    let mut config = small_config();
    config.dead_neuron_checker = true;
    let mut model = SpikingTextCnn::with_offsets(&config, OffsetTable::default()).unwrap();
    let monitor = DeadNeuronMonitor::new();

    let mut total = 0.0;
    for _ in 0..3 {
        let out = model.forward(ramp_input(2, &config).view(), Some(&monitor)).unwrap();
        total += out.spikes_1.sum();
    }
    let accumulated = monitor.accumulated(FIRST_LIF_KEY).unwrap();
    assert!((accumulated.sum() - total).abs() < 1e-4);
}

// ============================================================================
// Multi-step Dynamics
// ============================================================================

#[test]
fn test_constant_input_accumulates_membrane() {
    let config = small_config();
    let mut model = SpikingTextCnn::new(&config).unwrap();
    let input = ramp_input(1, &config);

    let first = model.forward(input.view(), None).unwrap();
    let second = model.forward(input.view(), None).unwrap();
    assert_ne!(first.membrane_2, second.membrane_2);
}

#[test]
fn test_batch_size_change_restarts_state() {
    let config = small_config();
    let mut stepped = SpikingTextCnn::new(&config).unwrap();
    let mut fresh = stepped.clone();

    stepped.forward(ramp_input(4, &config).view(), None).unwrap();
    let a = stepped.forward(ramp_input(2, &config).view(), None).unwrap();
    let b = fresh.forward(ramp_input(2, &config).view(), None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_default_architecture_shapes() {
    let config = ModelConfig::default();
    let mut model = SpikingTextCnn::with_offsets(&config, OffsetTable::default()).unwrap();
    let input = Array3::from_elem((2, config.sentence_length, config.hidden_dim), 0.5);

    let out = model.forward(input.view(), None).unwrap();
    assert_eq!(out.spikes_1.dim(), (2, 300));
    assert_eq!(out.spikes_2.dim(), (2, 2));
    assert!(out
        .spikes_1
        .iter()
        .chain(out.spikes_2.iter())
        .all(|&s| s == 0.0 || s == 1.0));
}
