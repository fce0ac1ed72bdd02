// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures encoder and model settings are within valid ranges and agree with
//! each other before any vocabulary is loaded or any weight is drawn.

use crate::{ConfigError, ConfigResult, SpikeTextConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    Mismatch { field1: String, field2: String, value1: usize, value2: usize },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::Mismatch { field1, field2, value1, value2 } => {
                write!(
                    f,
                    "Mismatch: {} = {} but {} = {}",
                    field1, value1, field2, value2
                )
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Required fields
/// - Value ranges (bias, beta, threshold, init rate)
/// - Encoder/model agreement (embedding dim, sentence length)
/// - Filter widths that fit the sentence
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &SpikeTextConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);
    validate_shapes(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_required_fields(config: &SpikeTextConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.encoder.dataset_name.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "encoder.dataset_name".to_string(),
        });
    }
    if config.encoder.data_type.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "encoder.data_type".to_string(),
        });
    }
    if config.model.filters.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "model.filters".to_string(),
        });
    }
}

fn validate_value_ranges(config: &SpikeTextConfig, errors: &mut Vec<ConfigValidationError>) {
    let encoder = &config.encoder;
    let model = &config.model;

    if !(encoder.bias.is_finite() && encoder.bias > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "encoder.bias".to_string(),
            reason: "must be a positive number".to_string(),
        });
    }

    for (field, value) in [
        ("encoder.embedding_dim", encoder.embedding_dim),
        ("encoder.sentence_length", encoder.sentence_length),
        ("model.filter_num", model.filter_num),
        ("model.label_num", model.label_num),
    ] {
        if value == 0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: field.to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
    }

    if !(0.0..=1.0).contains(&model.beta) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "model.beta".to_string(),
            reason: "must be between 0.0 and 1.0".to_string(),
        });
    }
    if !(model.threshold.is_finite() && model.threshold > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "model.threshold".to_string(),
            reason: "must be a positive number".to_string(),
        });
    }
    if !(model.slope.is_finite() && model.slope > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "model.slope".to_string(),
            reason: "must be a positive number".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&model.positive_init_rate) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "model.positive_init_rate".to_string(),
            reason: "must be between 0.0 and 1.0".to_string(),
        });
    }
}

fn validate_shapes(config: &SpikeTextConfig, errors: &mut Vec<ConfigValidationError>) {
    let encoder = &config.encoder;
    let model = &config.model;

    if encoder.embedding_dim != model.hidden_dim {
        errors.push(ConfigValidationError::Mismatch {
            field1: "encoder.embedding_dim".to_string(),
            field2: "model.hidden_dim".to_string(),
            value1: encoder.embedding_dim,
            value2: model.hidden_dim,
        });
    }
    if encoder.sentence_length != model.sentence_length {
        errors.push(ConfigValidationError::Mismatch {
            field1: "encoder.sentence_length".to_string(),
            field2: "model.sentence_length".to_string(),
            value1: encoder.sentence_length,
            value2: model.sentence_length,
        });
    }

    for (idx, &width) in model.filters.iter().enumerate() {
        if width == 0 || width > model.sentence_length {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("model.filters[{}]", idx),
                reason: format!(
                    "window width {} must be in 1..={} (sentence_length)",
                    width, model.sentence_length
                ),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SpikeTextConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_sentence_length_mismatch() {
        let mut config = SpikeTextConfig::default();
        config.model.sentence_length = 30;

        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("encoder.sentence_length"));
                assert!(msg.contains("model.sentence_length"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_wider_than_sentence() {
        let mut config = SpikeTextConfig::default();
        config.model.filters = vec![3, 25];

        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("model.filters[1]"));
                assert!(!msg.contains("model.filters[0]"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_beta_and_bias_reported_together() {
        let mut config = SpikeTextConfig::default();
        config.model.beta = 1.5;
        config.encoder.bias = 0.0;

        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("model.beta"));
                assert!(msg.contains("encoder.bias"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_filters() {
        let mut config = SpikeTextConfig::default();
        config.model.filters.clear();

        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("model.filters")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
