//! Command line configuration
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `thyme.toml` in the working directory, or the file given with `--config`
//! 3. `THYME__*` environment variables (a `.env` file is read first), nested keys separated
//!    by `__`, e.g. `THYME__PROCESSOR__NAMESPACE`
//! 4. command line flags

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;
use thyme_template::ProcessorOptions;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory templates are loaded from
    pub docroot: PathBuf,
    /// Prefix for `@{/...}` links
    pub context_name: String,
    /// Accept-Language header of the simulated request
    pub accept_language: Option<String>,
    pub processor: ProcessorOptions,
    pub logging: LoggingConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            docroot: PathBuf::from("."),
            context_name: String::new(),
            accept_language: None,
            processor: ProcessorOptions::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            json: false,
        }
    }
}

impl CliConfig {
    /// Load the layered configuration; an explicitly named file must exist
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        // .env is optional
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("thyme").required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("THYME")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }
}
