// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, SpikeTextConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "spiketext.toml";

/// Find the SpikeText configuration file
///
/// Search order:
/// 1. `SPIKETEXT_CONFIG_PATH` environment variable
/// 2. Current working directory: `./spiketext.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("SPIKETEXT_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by SPIKETEXT_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet SPIKETEXT_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the file is not found or contains invalid TOML.
/// Validation is a separate step (`validate_config`).
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SpikeTextConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: SpikeTextConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `SPIKETEXT_LOG_LEVEL` -> `logging.level`
/// - `SPIKETEXT_CACHE_DIR` -> `encoder.cache_dir`
/// - `SPIKETEXT_BIAS` -> `encoder.bias`
/// - `SPIKETEXT_EMBEDDING_DIM` -> `encoder.embedding_dim` and `model.hidden_dim`
/// - `SPIKETEXT_SENTENCE_LENGTH` -> `encoder.sentence_length` and `model.sentence_length`
/// - `SPIKETEXT_BETA` -> `model.beta`
/// - `SPIKETEXT_POSITIVE_INIT_RATE` -> `model.positive_init_rate`
///
/// Unparseable numeric values are ignored.
pub fn apply_environment_overrides(config: &mut SpikeTextConfig) {
    let vars: HashMap<String, String> = [
        ("log_level", "SPIKETEXT_LOG_LEVEL"),
        ("cache_dir", "SPIKETEXT_CACHE_DIR"),
        ("bias", "SPIKETEXT_BIAS"),
        ("embedding_dim", "SPIKETEXT_EMBEDDING_DIM"),
        ("sentence_length", "SPIKETEXT_SENTENCE_LENGTH"),
        ("beta", "SPIKETEXT_BETA"),
        ("positive_init_rate", "SPIKETEXT_POSITIVE_INIT_RATE"),
    ]
    .into_iter()
    .filter_map(|(key, var)| env::var(var).ok().map(|value| (key.to_string(), value)))
    .collect();

    apply_cli_overrides(config, &vars);
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of overrides (e.g., `{"bias": "2.5", "sentence_length": "32"}`)
pub fn apply_cli_overrides(config: &mut SpikeTextConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("vocab_path") {
        config.encoder.vocab_path = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("data_path") {
        config.encoder.data_path = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("cache_dir") {
        config.encoder.cache_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("dataset_name") {
        config.encoder.dataset_name = value.clone();
    }
    if let Some(value) = cli_args.get("data_type") {
        config.encoder.data_type = value.clone();
    }
    if let Some(bias) = parse_arg::<f32>(cli_args, "bias") {
        config.encoder.bias = bias;
    }

    // Shared dimensions are kept in lockstep between encoder and model
    if let Some(dim) = parse_arg::<usize>(cli_args, "embedding_dim") {
        config.encoder.embedding_dim = dim;
        config.model.hidden_dim = dim;
    }
    if let Some(len) = parse_arg::<usize>(cli_args, "sentence_length") {
        config.encoder.sentence_length = len;
        config.model.sentence_length = len;
    }

    if let Some(beta) = parse_arg::<f32>(cli_args, "beta") {
        config.model.beta = beta;
    }
    if let Some(rate) = parse_arg::<f32>(cli_args, "positive_init_rate") {
        config.model.positive_init_rate = rate;
    }
    if let Some(value) = cli_args.get("initial_method") {
        config.model.initial_method = value.clone();
    }
    if let Some(value) = cli_args.get("dead_neuron_checker") {
        config.model.dead_neuron_checker = parse_flag(value);
    }
    if let Some(value) = cli_args.get("lowercase") {
        config.encoder.lowercase = parse_flag(value);
    }
}

fn parse_arg<T: std::str::FromStr>(args: &HashMap<String, String>, key: &str) -> Option<T> {
    args.get(key).and_then(|value| value.trim().parse::<T>().ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var("SPIKETEXT_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("SPIKETEXT_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("SPIKETEXT_CONFIG_PATH", "/definitely/not/here.toml");
        let result = find_config_file();
        env::remove_var("SPIKETEXT_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("spiketext.toml");

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[encoder]").unwrap();
        writeln!(file, "bias = 2.0").unwrap();
        writeln!(file, "[model]").unwrap();
        writeln!(file, "filters = [2, 3]").unwrap();
        writeln!(file, "filter_num = 8").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.encoder.bias, 2.0);
        assert_eq!(config.model.filters, vec![2, 3]);
        assert_eq!(config.model.filter_num, 8);
        // Untouched sections keep their defaults
        assert_eq!(config.model.label_num, 2);
        assert_eq!(config.encoder.sentence_length, 20);
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = SpikeTextConfig::default();

        env::set_var("SPIKETEXT_SENTENCE_LENGTH", "32");
        env::set_var("SPIKETEXT_BETA", "0.5");
        env::set_var("SPIKETEXT_BIAS", "not-a-number");

        apply_environment_overrides(&mut config);

        env::remove_var("SPIKETEXT_SENTENCE_LENGTH");
        env::remove_var("SPIKETEXT_BETA");
        env::remove_var("SPIKETEXT_BIAS");

        assert_eq!(config.encoder.sentence_length, 32);
        assert_eq!(config.model.sentence_length, 32);
        assert_eq!(config.model.beta, 0.5);
        assert_eq!(config.encoder.bias, 3.0);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = SpikeTextConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("embedding_dim".to_string(), "300".to_string());
        cli_args.insert("dead_neuron_checker".to_string(), "True".to_string());
        cli_args.insert("initial_method".to_string(), "xavier".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.encoder.embedding_dim, 300);
        assert_eq!(config.model.hidden_dim, 300);
        assert!(config.model.dead_neuron_checker);
        assert_eq!(config.model.initial_method, "xavier");
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("spiketext.toml");

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[encoder]").unwrap();
        writeln!(file, "bias = 1.0").unwrap();
        writeln!(file, "cache_dir = \"file-dir\"").unwrap();

        env::set_var("SPIKETEXT_BIAS", "2.0");
        env::set_var("SPIKETEXT_CACHE_DIR", "env-dir");

        let mut cli_args = HashMap::new();
        cli_args.insert("cache_dir".to_string(), "cli-dir".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("SPIKETEXT_BIAS");
        env::remove_var("SPIKETEXT_CACHE_DIR");

        // CLI wins for cache_dir, env wins for bias (no CLI override)
        assert_eq!(config.encoder.cache_dir, PathBuf::from("cli-dir"));
        assert_eq!(config.encoder.bias, 2.0);
    }
}
