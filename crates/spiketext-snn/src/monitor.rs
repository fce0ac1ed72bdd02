// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Dead Neuron Monitor
//!
//! Caller-owned diagnostic sink. Each forward pass with checking enabled
//! appends the per-neuron spike sum of one batch under a layer key. A neuron
//! whose sums stay at zero across every entry never fired and is reported as
//! dead. Entries are only removed by an explicit [`DeadNeuronMonitor::clear`].

use ndarray::Array1;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Layer key used for the first LIF layer's spikes
pub const FIRST_LIF_KEY: usize = 0;

#[derive(Debug, Default)]
pub struct DeadNeuronMonitor {
    entries: Mutex<BTreeMap<usize, Vec<Array1<f32>>>>,
}

/// Serializable copy of the monitor contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub entries: BTreeMap<usize, Vec<Vec<f32>>>,
}

impl DeadNeuronMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one per-neuron activation sum; appends are ordered by lock acquisition
    pub fn append(&self, key: usize, sums: Array1<f32>) {
        let mut entries = self.entries.lock();
        let list = entries.entry(key).or_default();
        list.push(sums);
        debug!(key, entries = list.len(), "Monitor entry appended");
    }

    pub fn entries(&self, key: usize) -> Vec<Array1<f32>> {
        self.entries.lock().get(&key).cloned().unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<usize> {
        self.entries.lock().keys().copied().collect()
    }

    pub fn len(&self, key: usize) -> usize {
        self.entries.lock().get(&key).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().values().all(Vec::is_empty)
    }

    /// Element-wise sum of every entry under `key`
    pub fn accumulated(&self, key: usize) -> Option<Array1<f32>> {
        let entries = self.entries.lock();
        let list = entries.get(&key)?;
        let mut iter = list.iter();
        let mut total = iter.next()?.clone();
        for entry in iter {
            total += entry;
        }
        Some(total)
    }

    /// Indices of neurons that never fired across all entries under `key`
    pub fn dead_neurons(&self, key: usize) -> Vec<usize> {
        self.accumulated(key)
            .map(|total| {
                total
                    .iter()
                    .enumerate()
                    .filter(|(_, &sum)| sum == 0.0)
                    .map(|(idx, _)| idx)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let entries = self.entries.lock();
        MonitorSnapshot {
            entries: entries
                .iter()
                .map(|(key, list)| (*key, list.iter().map(|a| a.to_vec()).collect()))
                .collect(),
        }
    }

    /// Write the snapshot as JSON
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.snapshot())?;
        Ok(())
    }
}
