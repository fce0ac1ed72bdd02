// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! # spiketext-observability
//!
//! Logging setup shared by every SpikeText binary and test harness.
//!
//! All library crates log through `tracing` macros only; this crate owns the
//! subscriber. Per-crate debug output is switched on with `--debug-<crate>`
//! flags, the `SPIKETEXT_DEBUG` variable, or `logging.debug_crates` in the
//! config file.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known SpikeText crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "spiketext",
    "spiketext-config",
    "spiketext-encoding",
    "spiketext-snn",
];
