// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Positive-Biased Weight Initialization
//!
//! After the base random draw, every convolution and linear weight is shifted
//! by one constant looked up in an [`OffsetTable`] keyed by layer kind,
//! initialization method and positive init rate. A larger shift puts more
//! units in their firing regime from the first step.
//!
//! For a uniform draw on `[-b, b]`, shifting by `c = b (2r - 1)` makes a
//! fraction `r` of the weights positive. The default table uses
//! `b = 1/sqrt(300)`, the kaiming bound of a width-3 filter over 100-d
//! embeddings.

use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::error::{Result, SnnError};
use crate::model::SpikingTextCnn;

/// Fan-in the default table is calibrated for
pub const DEFAULT_OFFSET_FAN_IN: usize = 300;

/// Rates carried by the default table, as hundredths
const DEFAULT_RATES: [u32; 5] = [50, 60, 70, 80, 90];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    Conv,
    Linear,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Conv => write!(f, "conv"),
            LayerKind::Linear => write!(f, "linear"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InitMethod {
    KaimingUniform,
    /// Redraws base weights Xavier-uniform before the shift
    XavierUniform,
    /// Leave the base draw untouched
    None,
}

impl fmt::Display for InitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitMethod::KaimingUniform => write!(f, "kaiming_uniform"),
            InitMethod::XavierUniform => write!(f, "xavier_uniform"),
            InitMethod::None => write!(f, "none"),
        }
    }
}

impl FromStr for InitMethod {
    type Err = SnnError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "kaiming_uniform" | "kaiming" => Ok(InitMethod::KaimingUniform),
            "xavier_uniform" | "xavier" => Ok(InitMethod::XavierUniform),
            "none" => Ok(InitMethod::None),
            _ => Err(SnnError::UnknownInitMethod(tag.to_string())),
        }
    }
}

/// Rate in hundredths, so 0.8 and 0.80000001 share a key
fn rate_key(rate: f32) -> Option<u32> {
    if !(0.0..=1.0).contains(&rate) {
        return None;
    }
    Some((rate * 100.0).round() as u32)
}

/// Explicit `(layer, method, rate) -> offset` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetTable {
    offsets: BTreeMap<(LayerKind, InitMethod, u32), f32>,
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self::calibrated(DEFAULT_OFFSET_FAN_IN)
    }
}

impl OffsetTable {
    pub fn empty() -> Self {
        Self {
            offsets: BTreeMap::new(),
        }
    }

    /// Entries for rates 0.5 to 0.9 computed as `bound * (2r - 1)`, `bound = 1/sqrt(fan_in)`
    pub fn calibrated(fan_in: usize) -> Self {
        let bound = 1.0 / (fan_in.max(1) as f64).sqrt();
        let mut table = Self::empty();
        for layer in [LayerKind::Conv, LayerKind::Linear] {
            for method in [InitMethod::KaimingUniform, InitMethod::XavierUniform] {
                for rate in DEFAULT_RATES {
                    let offset = bound * (2.0 * rate as f64 / 100.0 - 1.0);
                    table.offsets.insert((layer, method, rate), offset as f32);
                }
            }
        }
        table
    }

    pub fn with_offset(mut self, layer: LayerKind, method: InitMethod, rate: f32, offset: f32) -> Self {
        self.insert(layer, method, rate, offset);
        self
    }

    /// Rates outside `[0, 1]` are ignored
    pub fn insert(&mut self, layer: LayerKind, method: InitMethod, rate: f32, offset: f32) {
        if let Some(key) = rate_key(rate) {
            self.offsets.insert((layer, method, key), offset);
        }
    }

    /// `InitMethod::None` always maps to zero
    pub fn get(&self, layer: LayerKind, method: InitMethod, rate: f32) -> Option<f32> {
        if method == InitMethod::None {
            return Some(0.0);
        }
        let key = rate_key(rate)?;
        self.offsets.get(&(layer, method, key)).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    fn lookup(&self, layer: LayerKind, method: InitMethod, rate: f32) -> Result<f32> {
        self.get(layer, method, rate)
            .ok_or_else(|| SnnError::MissingOffset {
                layer: layer.to_string(),
                method: method.to_string(),
                rate,
            })
    }
}

/// Applies a positive weight offset exactly once per model
#[derive(Debug, Clone, Default)]
pub struct WeightInitializer {
    table: OffsetTable,
}

impl WeightInitializer {
    pub fn new(table: OffsetTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &OffsetTable {
        &self.table
    }

    /// Shift every conv and linear weight of `model` in place
    ///
    /// Nothing is mutated when an error is returned.
    ///
    /// # Errors
    /// - `SnnError::AlreadyInitialized` on a model that was already shifted
    /// - `SnnError::UnknownInitMethod` for an unrecognized `method` tag
    /// - `SnnError::MissingOffset` when the table has no entry for `rate`
    pub fn initialize(&self, model: &mut SpikingTextCnn, method: &str, rate: f32) -> Result<()> {
        if model.is_weight_shifted() {
            return Err(SnnError::AlreadyInitialized);
        }
        let method: InitMethod = method.parse()?;
        let conv_offset = self.table.lookup(LayerKind::Conv, method, rate)?;
        let linear_offset = self.table.lookup(LayerKind::Linear, method, rate)?;

        if method == InitMethod::XavierUniform {
            let mut rng = StdRng::seed_from_u64(model.config().seed.wrapping_add(1));
            for branch in model.block_mut().branches_mut() {
                redraw_xavier_conv(branch.weight_mut(), &mut rng);
            }
            redraw_xavier_linear(model.output_mut().linear_mut().weight_mut(), &mut rng);
        }

        for branch in model.block_mut().branches_mut() {
            branch.weight_mut().mapv_inplace(|w| w + conv_offset);
        }
        model
            .output_mut()
            .linear_mut()
            .weight_mut()
            .mapv_inplace(|w| w + linear_offset);
        model.mark_weight_shifted();

        info!(
            method = %method,
            rate,
            conv_offset,
            linear_offset,
            "Applied positive weight offset"
        );
        Ok(())
    }
}

/// Conv weights `(F, w, D)` seen as a one-channel 2-D kernel: fan_in = w*D, fan_out = F*w*D
fn redraw_xavier_conv<R: Rng>(weight: &mut Array3<f32>, rng: &mut R) {
    let (filters, width, dim) = weight.dim();
    let receptive = (width * dim) as f32;
    let bound = (6.0 / (receptive + filters as f32 * receptive)).sqrt();
    weight.mapv_inplace(|_| rng.gen_range(-bound..=bound));
}

fn redraw_xavier_linear<R: Rng>(weight: &mut Array2<f32>, rng: &mut R) {
    let (out, inp) = weight.dim();
    let bound = (6.0 / (inp + out) as f32).sqrt();
    weight.mapv_inplace(|_| rng.gen_range(-bound..=bound));
}
