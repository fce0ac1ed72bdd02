// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization

use anyhow::{anyhow, Result};
use spiketext_config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Build the filter for the console layer
///
/// `RUST_LOG` wins when set; otherwise the filter is assembled from the
/// configured level plus per-crate debug flags.
pub fn build_env_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut flags = debug_flags.clone();
    for crate_name in &config.debug_crates {
        flags.enable(crate_name);
    }

    let directives = flags.to_filter_string(&config.level.to_lowercase());
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", directives, e))
}

/// Initialize console logging
///
/// # Errors
/// Fails if the level string is not a valid filter or a global subscriber
/// has already been installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(debug_flags, config)?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter);

    Registry::default()
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!(
        debug_crates = ?debug_flags.enabled_crates,
        "Logging initialized"
    );
    Ok(())
}

/// Initialize logging with default settings
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<()> {
    init_logging(debug_flags, &LoggingConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "spiketext_snn=notalevel".to_string(),
            ..LoggingConfig::default()
        };
        assert!(build_env_filter(&CrateDebugFlags::default(), &config).is_err());
    }

    #[test]
    fn test_config_debug_crates_accepted() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            debug_crates: vec!["spiketext-encoding".to_string()],
            with_target: true,
        };
        assert!(build_env_filter(&CrateDebugFlags::default(), &config).is_ok());
    }
}
