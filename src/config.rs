//! Layered configuration (C8).
//!
//! Precedence, lowest to highest: a built-in puzzle profile → an on-disk TOML config file →
//! environment variables (`ANACRYPTOGRAM_STORE_PATH`, `ANACRYPTOGRAM_MODEL_PATH`) → CLI flags.
//! Missing vocabulary/model/store paths are fatal at startup ([`Error::Config`]).

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Error, Result};

const STORE_PATH_VAR: &str = "ANACRYPTOGRAM_STORE_PATH";
const MODEL_PATH_VAR: &str = "ANACRYPTOGRAM_MODEL_PATH";
const DEFAULT_STORE_PATH: &str = "./anacryptogram.db";

/// The on-disk shape of a `--config` TOML file. Every field is optional: a value left unset here
/// falls through to the environment, then to CLI flags, then to a hard default.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// Path to the newline-delimited vocabulary word list.
    pub vocabulary_path: Option<PathBuf>,
    /// Path to the persistent store file.
    pub store_path: Option<PathBuf>,
    /// Directory containing the reference oracle's `lemma_counts.csv` / `transitions.csv`.
    pub model_path: Option<PathBuf>,
    /// Softmax temperature for selection (`sample_weighted`). Defaults to `1.0` if absent here and
    /// not overridden by a CLI flag.
    pub temperature: Option<f64>,
}

impl FileConfig {
    /// Loads a config file, returning the default (all-`None`) config if `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("could not read config file {path:?}: {e}")))?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid config file {path:?}: {e}")))
    }
}

/// CLI-supplied overrides, collected before resolution. `None` means "not passed on the command
/// line"; every field mirrors one of [`FileConfig`]'s.
#[derive(Debug, Default)]
pub struct CliOverrides {
    /// `--vocabulary <path>`
    pub vocabulary_path: Option<PathBuf>,
    /// `--store <path>`
    pub store_path: Option<PathBuf>,
    /// `--model <path>`
    pub model_path: Option<PathBuf>,
    /// `--temperature <f64>`
    pub temperature: Option<f64>,
}

/// The fully resolved configuration the rest of the crate runs with.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Path to the newline-delimited vocabulary word list.
    pub vocabulary_path: PathBuf,
    /// Path to the persistent store file.
    pub store_path: PathBuf,
    /// Directory containing the reference oracle's count files, if a concrete oracle is wanted.
    pub model_path: Option<PathBuf>,
    /// Softmax selection temperature.
    pub temperature: f64,
}

/// Resolves the final configuration by applying, in increasing precedence: `file`, process
/// environment variables, then `cli`.
///
/// `vocabulary_path` has no environment-variable layer (only file and CLI) since §4.8 names only
/// the store and model paths as environment-controlled.
pub fn resolve(file: FileConfig, cli: CliOverrides) -> Result<ResolvedConfig> {
    let env_vars = read_env();

    let vocabulary_path = cli
        .vocabulary_path
        .or(file.vocabulary_path)
        .ok_or_else(|| Error::Config("no vocabulary path configured".to_string()))?;

    let store_path = cli
        .store_path
        .or_else(|| env_vars.get(STORE_PATH_VAR).map(PathBuf::from))
        .or(file.store_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

    let model_path = cli
        .model_path
        .or_else(|| env_vars.get(MODEL_PATH_VAR).map(PathBuf::from))
        .or(file.model_path);

    let temperature = cli.temperature.or(file.temperature).unwrap_or(1.0);

    Ok(ResolvedConfig {
        vocabulary_path,
        store_path,
        model_path,
        temperature,
    })
}

fn read_env() -> HashMap<String, String> {
    [STORE_PATH_VAR, MODEL_PATH_VAR]
        .iter()
        .filter_map(|name| env::var(name).ok().map(|v| (name.to_string(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_win_over_file_config() {
        let file = FileConfig {
            vocabulary_path: Some(PathBuf::from("/file/vocab.txt")),
            store_path: Some(PathBuf::from("/file/store.db")),
            model_path: None,
            temperature: Some(0.5),
        };
        let cli = CliOverrides {
            vocabulary_path: None,
            store_path: Some(PathBuf::from("/cli/store.db")),
            model_path: None,
            temperature: Some(2.0),
        };
        let resolved = resolve(file, cli).unwrap();
        assert_eq!(resolved.vocabulary_path, PathBuf::from("/file/vocab.txt"));
        assert_eq!(resolved.store_path, PathBuf::from("/cli/store.db"));
        assert_eq!(resolved.temperature, 2.0);
    }

    #[test]
    fn missing_vocabulary_path_is_a_config_error() {
        let err = resolve(FileConfig::default(), CliOverrides::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn store_path_falls_back_to_documented_default() {
        let file = FileConfig {
            vocabulary_path: Some(PathBuf::from("/vocab.txt")),
            ..Default::default()
        };
        let resolved = resolve(file, CliOverrides::default()).unwrap();
        assert_eq!(resolved.store_path, PathBuf::from(DEFAULT_STORE_PATH));
    }
}
